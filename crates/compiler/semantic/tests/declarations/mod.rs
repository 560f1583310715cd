//! Declaration validation tests: globals, overrides, locals, structs,
//! arrays, and parameters.

use crate::common::*;
use lumen_compiler_diagnostics::DiagnosticCode;
use lumen_compiler_semantic::*;

#[test]
fn module_var_requires_an_address_space() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let id = b.var("g", f32_, AddressSpace::Private);
    b.module.globals[id].kind = GlobalKind::Var {
        explicit_address_space: false,
        explicit_access: false,
    };
    let diagnostics = assert_error(&mut b, DiagnosticCode::MissingAddressSpace);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::MissingAddressSpace,
        "must provide an address space",
    );
}

#[test]
fn module_var_must_not_use_function_address_space() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    b.var("g", f32_, AddressSpace::Function);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAddressSpace);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidAddressSpace,
        "module-scope 'var' must not use address space 'function'",
    );
}

#[test]
fn resource_var_requires_group_and_binding() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    b.var("u", f32_, AddressSpace::Uniform);
    let diagnostics = assert_error(&mut b, DiagnosticCode::MissingResourceBinding);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::MissingResourceBinding,
        "resource variables require @group and @binding attributes",
    );
}

#[test]
fn non_resource_var_must_not_carry_bindings() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    b.resource("p", f32_, AddressSpace::Private, 0, 0);
    assert_error(&mut b, DiagnosticCode::UnexpectedResourceBinding);
}

#[test]
fn module_var_initializer_must_not_be_runtime() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let init = b.expr_value(f32_);
    let id = b.var("g", f32_, AddressSpace::Private);
    b.module.globals[id].initializer = Some(init);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidInitializer);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidInitializer,
        "must be a constant or override-expression",
    );
}

#[test]
fn uniform_var_must_not_have_an_initializer() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let init = b.expr_const(f32_, ConstValue::Float(1.0));
    let id = b.resource("u", f32_, AddressSpace::Uniform, 0, 0);
    b.module.globals[id].initializer = Some(init);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidInitializer);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidInitializer,
        "var initializers are only supported for the address spaces 'private' and 'function'",
    );
}

#[test]
fn initializer_type_must_match_store_type() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let i32_ = b.module.types.i32_();
    let init = b.expr_const(i32_, ConstValue::Int(1));
    let id = b.var("g", f32_, AddressSpace::Private);
    b.module.globals[id].initializer = Some(init);
    let diagnostics = assert_error(&mut b, DiagnosticCode::TypeMismatch);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::TypeMismatch,
        "cannot initialize var of type 'f32' with value of type 'i32'",
    );
}

#[test]
fn override_ids_must_be_unique() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    b.override_var("a", f32_, Some(7));
    b.override_var("b", f32_, Some(7));

    let diagnostics = assert_error(&mut b, DiagnosticCode::DuplicateOverrideId);
    let error = diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::DuplicateOverrideId)
        .unwrap();
    assert_eq!(error.message, "@id values must be unique");
    assert!(error.notes[0]
        .1
        .contains("a override with an ID of 7 was previously declared here"));
}

#[test]
fn override_store_type_must_be_scalar() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let vec4 = b.module.types.vec(f32_, 4);
    b.override_var("o", vec4, None);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidStoreType);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidStoreType,
        "cannot be used as the type of a 'override'",
    );
}

#[test]
fn storage_access_mode_write_is_rejected() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let id = b.resource("s", f32_, AddressSpace::Storage, 0, 0);
    b.module.globals[id].access = Access::Write;
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAccessMode);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidAccessMode,
        "access mode 'write' is not valid for the 'storage' address space",
    );
}

#[test]
fn atomics_require_storage_or_workgroup() {
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let atomic = b.module.types.atomic(u32_);
    b.var("a", atomic, AddressSpace::Private);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAtomicUsage);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidAtomicUsage,
        "atomic variables must have <storage> or <workgroup> address space",
    );
}

#[test]
fn storage_atomics_require_read_write_access() {
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let atomic = b.module.types.atomic(u32_);
    // Builder defaults storage access to 'read'.
    b.resource("a", atomic, AddressSpace::Storage, 0, 0);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAtomicUsage);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidAtomicUsage,
        "must have read_write access mode",
    );
}

#[test]
fn workgroup_atomics_are_allowed() {
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let atomic = b.module.types.atomic(u32_);
    b.var("a", atomic, AddressSpace::Workgroup);
    assert_valid(&mut b);
}

#[test]
fn atomic_composites_note_the_atomic_declaration() {
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let atomic = b.module.types.atomic(u32_);
    let s = b.struct_of("Counters", &[("count", atomic)]);
    let atomic_span = b.span();
    b.module.atomic_composites.insert(s, atomic_span);
    b.var("c", s, AddressSpace::Private);

    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAtomicUsage);
    let error = diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::InvalidAtomicUsage)
        .unwrap();
    assert!(error.notes[0].1.contains("atomic sub-type of 'Counters'"));
}

#[test]
fn structs_need_at_least_one_member() {
    let mut b = ModuleBuilder::new();
    b.struct_with("Empty", vec![]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::EmptyStruct);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::EmptyStruct,
        "structures must have at least one member",
    );
}

#[test]
fn runtime_array_must_be_last_member() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let runtime = b.module.types.array(f32_, ArrayCount::Runtime);
    b.struct_with(
        "S",
        vec![member("data", runtime), member("len", f32_).at_offset(16)],
    );
    let diagnostics = assert_error(&mut b, DiagnosticCode::MisplacedRuntimeArray);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::MisplacedRuntimeArray,
        "runtime arrays may only appear as the last member of a struct",
    );
}

#[test]
fn runtime_sized_structs_cannot_nest() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let runtime = b.module.types.array(f32_, ArrayCount::Runtime);
    let inner = b.struct_of("Inner", &[("data", runtime)]);
    b.struct_of("Outer", &[("inner", inner), ("tail", f32_)]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::MisplacedRuntimeArray);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::MisplacedRuntimeArray,
        "cannot be nested inside another struct",
    );
}

#[test]
fn override_sized_arrays_only_in_workgroup() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let override_sized = b.module.types.array(f32_, ArrayCount::Override);

    // Allowed as the store type of a workgroup variable.
    b.var("w", override_sized, AddressSpace::Workgroup);
    assert_valid(&mut b);

    // Rejected as a function-scope variable type.
    let local = b.local(LocalKind::Var, "l", override_sized);
    let decl = b.stmt(StatementKind::VarDecl {
        local,
        initializer: None,
    });
    b.fn_with_body("f", vec![decl]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::OverrideSizedArrayUsage);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::OverrideSizedArrayUsage,
        "can only be used as the store type of a 'var<workgroup>'",
    );
}

#[test]
fn function_var_must_be_constructible() {
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let atomic = b.module.types.atomic(u32_);
    let local = b.local(LocalKind::Var, "a", atomic);
    let decl = b.stmt(StatementKind::VarDecl {
        local,
        initializer: None,
    });
    b.fn_with_body("f", vec![decl]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::NonConstructibleType);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::NonConstructibleType,
        "function-scope 'var' must have a constructible type",
    );
}

#[test]
fn let_requires_constructible_or_pointer() {
    let mut b = ModuleBuilder::new();
    let tex = b
        .module
        .types
        .intern(TypeData::Texture {
            dim: TextureDimension::D2,
        });
    let local = b.local(LocalKind::Let, "t", tex);
    let decl = b.stmt(StatementKind::VarDecl {
        local,
        initializer: None,
    });
    b.fn_with_body("f", vec![decl]);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidStoreType);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidStoreType,
        "cannot be used as the type of a 'let'",
    );

    // A pointer-typed let is fine.
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let ptr = b
        .module
        .types
        .pointer(f32_, AddressSpace::Function, Access::ReadWrite);
    let local = b.local(LocalKind::Let, "p", ptr);
    let decl = b.stmt(StatementKind::VarDecl {
        local,
        initializer: None,
    });
    b.fn_with_body("f", vec![decl]);
    assert_valid(&mut b);
}

#[test]
fn pointer_parameters_are_restricted_to_function_and_private() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let ptr = b
        .module
        .types
        .pointer(f32_, AddressSpace::Storage, Access::Read);
    let param = b.param("p", ptr, &[]);
    let mut func = b.empty_function("f");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAddressSpace);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidAddressSpace,
        "function parameter of pointer type cannot be in 'storage' address space",
    );
}

#[test]
fn unrestricted_pointer_parameters_feature_lifts_the_restriction() {
    let mut b = ModuleBuilder::new();
    b.module.allowed_features |= LanguageFeatures::UNRESTRICTED_POINTER_PARAMETERS;
    let f32_ = b.module.types.f32_();
    let ptr = b
        .module
        .types
        .pointer(f32_, AddressSpace::Storage, Access::Read);
    let param = b.param("p", ptr, &[]);
    let mut func = b.empty_function("f");
    func.params.push(param);
    b.module.add_function(func);
    assert_valid(&mut b);
}

#[test]
fn plain_parameters_must_be_constructible() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let runtime = b.module.types.array(f32_, ArrayCount::Runtime);
    let param = b.param("p", runtime, &[]);
    let mut func = b.empty_function("f");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::NonConstructibleType);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::NonConstructibleType,
        "type of function parameter must be constructible",
    );
}

#[test]
fn pixel_local_vars_must_be_structs_of_scalars() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let vec2 = b.module.types.vec(f32_, 2);
    let s = b.struct_of("P", &[("v", vec2)]);
    b.var("p", s, AddressSpace::PixelLocal);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidStoreType);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidStoreType,
        "can only be of the type 'i32', 'u32' or 'f32'",
    );
}

#[test]
fn push_constant_requires_the_extension() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    b.var("pc", f32_, AddressSpace::PushConstant);
    let diagnostics = assert_error(&mut b, DiagnosticCode::RequiresExtension);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::RequiresExtension,
        "requires enabling extension 'push_constant'",
    );
}

#[test]
fn alias_of_an_invalid_array_is_rejected() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let runtime = b.module.types.array(f32_, ArrayCount::Runtime);
    let nested = b.module.types.array(runtime, ArrayCount::Constant(2));
    let span = b.span();
    let type_span = b.span();
    b.module.aliases.push(TypeAlias {
        name: "Rows".into(),
        ty: nested,
        span,
        type_span,
    });

    let diagnostics = validation::validate_module(&b.module);
    assert_error_in(&diagnostics, DiagnosticCode::MisplacedRuntimeArray);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::MisplacedRuntimeArray,
        "an array element type cannot contain a runtime-sized array",
    );
}
