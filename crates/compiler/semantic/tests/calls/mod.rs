//! Function-call, builtin-call, and constructor validation tests.

use crate::common::*;
use lumen_compiler_diagnostics::DiagnosticCode;
use lumen_compiler_semantic::*;

/// `fn helper(x: f32) -> f32` without a body.
fn helper_fn(b: &mut ModuleBuilder) -> FunctionId {
    let f32_ = b.module.types.f32_();
    let param = b.param("x", f32_, &[]);
    let mut func = b.empty_function("helper");
    func.params.push(param);
    func.return_type = f32_;
    b.module.add_function(func)
}

#[test]
fn call_arity_must_match() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let helper = helper_fn(&mut b);
    let call = b.call_expr(helper, vec![], f32_);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::ArgumentCountMismatch);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::ArgumentCountMismatch,
        "too few arguments in call to 'helper', expected 1, got 0",
    );
}

#[test]
fn call_argument_types_must_match() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let u32_ = b.module.types.u32_();
    let helper = helper_fn(&mut b);
    let arg = b.expr_value(u32_);
    let call = b.call_expr(helper, vec![arg], f32_);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::ArgumentTypeMismatch);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::ArgumentTypeMismatch,
        "type mismatch for argument 1 in call to 'helper', expected 'f32', got 'u32'",
    );
}

#[test]
fn entry_points_cannot_be_called() {
    let mut b = ModuleBuilder::new();
    let void = b.module.types.void();
    let ep = b.fragment_entry("main");
    let ep = b.module.add_function(ep);
    let call = b.call_expr(ep, vec![], void);
    let stmt = b.stmt(StatementKind::Call(call));
    b.fn_with_body("caller", vec![stmt]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::CallToEntryPoint);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::CallToEntryPoint,
        "entry point functions cannot be the target of a function call",
    );
}

#[test]
fn must_use_results_cannot_be_dropped() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let helper = helper_fn(&mut b);
    let attr = b.attr(AttributeKind::MustUse);
    b.module.functions[helper].attributes.push(attr);

    let arg = b.expr_value(f32_);
    let call = b.call_expr(helper, vec![arg], f32_);
    let stmt = b.stmt(StatementKind::Call(call));
    b.fn_with_body("main", vec![stmt]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::UnusedResult);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::UnusedResult,
        "ignoring return value of function 'helper' annotated with @must_use",
    );
}

#[test]
fn plain_result_drop_is_allowed() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let helper = helper_fn(&mut b);
    let arg = b.expr_value(f32_);
    let call = b.call_expr(helper, vec![arg], f32_);
    let stmt = b.stmt(StatementKind::Call(call));
    b.fn_with_body("main", vec![stmt]);
    assert_valid(&mut b);
}

#[test]
fn void_calls_cannot_be_used_as_values() {
    let mut b = ModuleBuilder::new();
    let void = b.module.types.void();
    let callee = b.empty_function("sideeffect");
    let callee = b.module.add_function(callee);
    let call = b.call_expr(callee, vec![], void);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::VoidValueUsed);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::VoidValueUsed,
        "function 'sideeffect' does not return a value",
    );
}

#[test]
fn pointer_arguments_must_view_the_whole_root() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let vec2 = b.module.types.vec(f32_, 2);
    let ptr = b
        .module
        .types
        .pointer(f32_, AddressSpace::Function, Access::ReadWrite);

    let param = b.param("p", ptr, &[]);
    let mut callee = b.empty_function("consume");
    callee.params.push(param);
    let callee = b.module.add_function(callee);

    // The argument points at a component of a vec2 variable: its store type
    // differs from the root identifier's.
    let root = b.local(LocalKind::Var, "v", vec2);
    let arg = b.expr_value(ptr);
    b.module.expressions[arg].root = Some(DeclRef::Local(root));
    let void = b.module.types.void();
    let call = b.call_expr(callee, vec![arg], void);
    let stmt = b.stmt(StatementKind::Call(call));
    b.fn_with_body("main", vec![stmt]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::PointerAliasing);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::PointerAliasing,
        "arguments of pointer type must not point to a subset of the originating variable",
    );
}

#[test]
fn unrestricted_pointer_parameters_allow_subviews() {
    let mut b = ModuleBuilder::new();
    b.module.allowed_features |= LanguageFeatures::UNRESTRICTED_POINTER_PARAMETERS;
    let f32_ = b.module.types.f32_();
    let vec2 = b.module.types.vec(f32_, 2);
    let ptr = b
        .module
        .types
        .pointer(f32_, AddressSpace::Function, Access::ReadWrite);

    let param = b.param("p", ptr, &[]);
    let mut callee = b.empty_function("consume");
    callee.params.push(param);
    let callee = b.module.add_function(callee);

    let root = b.local(LocalKind::Var, "v", vec2);
    let arg = b.expr_value(ptr);
    b.module.expressions[arg].root = Some(DeclRef::Local(root));
    let void = b.module.types.void();
    let call = b.call_expr(callee, vec![arg], void);
    let stmt = b.stmt(StatementKind::Call(call));
    b.fn_with_body("main", vec![stmt]);
    assert_valid(&mut b);
}

#[test]
fn functions_cannot_be_called_at_module_scope() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let helper = helper_fn(&mut b);
    let arg = b.expr_value(f32_);
    let call = b.call_expr(helper, vec![arg], f32_);
    let id = b.var("g", f32_, AddressSpace::Private);
    b.module.globals[id].initializer = Some(call);

    let diagnostics = assert_error(&mut b, DiagnosticCode::ModuleScopeCall);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::ModuleScopeCall,
        "functions cannot be called at module-scope",
    );
}

#[test]
fn texture_offsets_must_be_small_const_expressions() {
    // A component out of [-8, 7] is rejected.
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let i32_ = b.module.types.i32_();
    let vec2i = b.module.types.vec(i32_, 2);
    let vec4 = b.module.types.vec(f32_, 4);
    let tex = b.expr_value(f32_);
    let sampler = b.expr_value(f32_);
    let coords = b.expr_value(f32_);
    let offset = b.expr_const(vec2i, ConstValue::IntVec(vec![-9, 0]));
    let call = b.builtin_call_expr(
        BuiltinFn::TextureSample,
        vec![tex, sampler, coords, offset],
        vec4,
    );
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::ArgumentOutOfRange);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::ArgumentOutOfRange,
        "each component of the offset argument must be at least -8 and at most 7. offset \
         component 0 is -9",
    );

    // A non-constant offset is rejected.
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let i32_ = b.module.types.i32_();
    let vec2i = b.module.types.vec(i32_, 2);
    let vec4 = b.module.types.vec(f32_, 4);
    let tex = b.expr_value(f32_);
    let sampler = b.expr_value(f32_);
    let coords = b.expr_value(f32_);
    let offset = b.expr_value(vec2i);
    let call = b.builtin_call_expr(
        BuiltinFn::TextureSample,
        vec![tex, sampler, coords, offset],
        vec4,
    );
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::NonConstArgument);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::NonConstArgument,
        "the offset argument must be a const-expression",
    );
}

#[test]
fn gather_components_are_range_checked() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let i32_ = b.module.types.i32_();
    let vec4 = b.module.types.vec(f32_, 4);
    let component = b.expr_const(i32_, ConstValue::Int(5));
    let tex = b.expr_value(f32_);
    let sampler = b.expr_value(f32_);
    let coords = b.expr_value(f32_);
    let call = b.builtin_call_expr(
        BuiltinFn::TextureGather,
        vec![component, tex, sampler, coords],
        vec4,
    );
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::ArgumentOutOfRange);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::ArgumentOutOfRange,
        "the component argument must be at least 0 and at most 3. component is 5",
    );
}

#[test]
fn workgroup_uniform_load_rejects_atomics() {
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let atomic = b.module.types.atomic(u32_);
    let ptr = b
        .module
        .types
        .pointer(atomic, AddressSpace::Workgroup, Access::ReadWrite);
    let arg = b.expr_value(ptr);
    let call = b.builtin_call_expr(BuiltinFn::WorkgroupUniformLoad, vec![arg], u32_);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::AtomicInWorkgroupLoad);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::AtomicInWorkgroupLoad,
        "workgroupUniformLoad must not be called with an argument that contains an atomic type",
    );
}

#[test]
fn subgroup_broadcast_needs_extension_and_const_lane() {
    // Without the extension the call is rejected outright.
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let u32_ = b.module.types.u32_();
    let value = b.expr_value(f32_);
    let lane = b.expr_const(u32_, ConstValue::Uint(0));
    let call = b.builtin_call_expr(BuiltinFn::SubgroupBroadcast, vec![value, lane], f32_);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::RequiresExtension);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::RequiresExtension,
        "cannot call built-in function 'subgroupBroadcast' without extension subgroups",
    );

    // With the extension, the lane index must be a const-expression.
    let mut b = ModuleBuilder::new();
    b.module.enabled_extensions |= Extensions::SUBGROUPS;
    let f32_ = b.module.types.f32_();
    let u32_ = b.module.types.u32_();
    let value = b.expr_value(f32_);
    let lane = b.expr_value(u32_);
    let call = b.builtin_call_expr(BuiltinFn::SubgroupBroadcast, vec![value, lane], f32_);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: call,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::NonConstArgument);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::NonConstArgument,
        "the sourceLaneIndex argument of subgroupBroadcast must be a const-expression",
    );
}

#[test]
fn array_constructor_arity_and_element_types() {
    // Too few elements.
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let array = b.module.types.array(f32_, ArrayCount::Constant(4));
    let e0 = b.expr_value(f32_);
    let e1 = b.expr_value(f32_);
    let ctor = b.constructor_expr(array, vec![e0, e1]);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: ctor,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::ConstructorArity);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::ConstructorArity,
        "array constructor has too few elements: expected 4, found 2",
    );

    // Unconvertible element type.
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let bool_ = b.module.types.bool_();
    let array = b.module.types.array(f32_, ArrayCount::Constant(1));
    let e0 = b.expr_value(bool_);
    let ctor = b.constructor_expr(array, vec![e0]);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: ctor,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidConstructor);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidConstructor,
        "'bool' cannot be used to construct an array of 'f32'",
    );
}

#[test]
fn runtime_and_override_sized_arrays_cannot_be_constructed() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let runtime = b.module.types.array(f32_, ArrayCount::Runtime);
    let ctor = b.constructor_expr(runtime, vec![]);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: ctor,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidConstructor);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidConstructor,
        "cannot construct a runtime-sized array",
    );

    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let override_sized = b.module.types.array(f32_, ArrayCount::Override);
    let ctor = b.constructor_expr(override_sized, vec![]);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: ctor,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidConstructor);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidConstructor,
        "cannot construct an array that has an override-expression count",
    );
}

#[test]
fn struct_constructor_arity_and_member_types() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let u32_ = b.module.types.u32_();
    let s = b.struct_of("Pair", &[("a", f32_), ("b", u32_)]);

    // Too few inputs.
    let e0 = b.expr_value(f32_);
    let ctor = b.constructor_expr(s, vec![e0]);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: ctor,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::ConstructorArity);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::ConstructorArity,
        "structure constructor has too few inputs: expected 2, found 1",
    );

    // Mismatched member type.
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let u32_ = b.module.types.u32_();
    let s = b.struct_of("Pair", &[("a", f32_), ("b", u32_)]);
    let e0 = b.expr_value(f32_);
    let e1 = b.expr_value(f32_);
    let ctor = b.constructor_expr(s, vec![e0, e1]);
    let lhs = b.phony();
    let assign = b.stmt(StatementKind::Assign {
        lhs,
        rhs: ctor,
        compound: false,
    });
    b.fn_with_body("main", vec![assign]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::TypeMismatch);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::TypeMismatch,
        "type in structure constructor does not match struct member type: expected 'u32', \
         found 'f32'",
    );
}

#[test]
fn dropped_constructor_values_are_reported() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let array = b.module.types.array(f32_, ArrayCount::Constant(1));
    let e0 = b.expr_value(f32_);
    let ctor = b.constructor_expr(array, vec![e0]);
    let stmt = b.stmt(StatementKind::Call(ctor));
    b.fn_with_body("main", vec![stmt]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::UnusedResult);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::UnusedResult,
        "value constructor evaluated but not used",
    );
}
