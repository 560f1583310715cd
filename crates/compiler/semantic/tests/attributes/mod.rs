//! Attribute validator tests: builtin / location / color / index /
//! interpolate / invariant legality per stage and direction.

use crate::common::*;
use lumen_compiler_diagnostics::DiagnosticCode;
use lumen_compiler_semantic::*;

#[test]
fn builtin_position_requires_vec4_f32() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let vec3 = b.module.types.vec(f32_, 3);
    let spec = member("pos", vec3).with_attr(AttributeKind::Builtin(BuiltinValue::Position));
    b.struct_with("VertexOut", vec![spec]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidBuiltinType);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidBuiltinType,
        "store type of @builtin(position) must be 'vec4<f32>'",
    );
}

#[test]
fn builtin_position_is_not_a_vertex_input() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let vec4 = b.module.types.vec(f32_, 4);
    let param = b.param(
        "pos",
        vec4,
        &[AttributeKind::Builtin(BuiltinValue::Position)],
    );
    let mut func = b.vertex_entry("main");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::StageMismatch);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::StageMismatch,
        "@builtin(position) cannot be used for vertex shader input",
    );
}

#[test]
fn compute_invocation_builtins() {
    // vec3<u32> global_invocation_id as a compute input is accepted.
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let vec3u = b.module.types.vec(u32_, 3);
    let param = b.param(
        "gid",
        vec3u,
        &[AttributeKind::Builtin(BuiltinValue::GlobalInvocationId)],
    );
    let mut func = b.compute_entry("main");
    func.params.push(param);
    b.module.add_function(func);
    assert_valid(&mut b);

    // The same builtin with a signed vector type is rejected.
    let mut b = ModuleBuilder::new();
    let i32_ = b.module.types.i32_();
    let vec3i = b.module.types.vec(i32_, 3);
    let param = b.param(
        "gid",
        vec3i,
        &[AttributeKind::Builtin(BuiltinValue::GlobalInvocationId)],
    );
    let mut func = b.compute_entry("main");
    func.params.push(param);
    b.module.add_function(func);
    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidBuiltinType);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidBuiltinType,
        "must be 'vec3<u32>'",
    );
}

#[test]
fn location_is_forbidden_in_compute() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let param = b.param("x", f32_, &[AttributeKind::Location(0)]);
    let mut func = b.compute_entry("main");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::StageMismatch);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::StageMismatch,
        "@location cannot be used by compute shaders",
    );
}

#[test]
fn location_requires_a_numeric_type() {
    let mut b = ModuleBuilder::new();
    let bool_ = b.module.types.bool_();
    let param = b.param("flag", bool_, &[AttributeKind::Location(0)]);
    let mut func = b.fragment_entry("main");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAttributeTarget);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidAttributeTarget,
        "cannot apply @location to declaration of type 'bool'",
    );
    let error = diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::InvalidAttributeTarget)
        .unwrap();
    assert!(error.notes[0]
        .1
        .contains("numeric scalar or numeric vector type"));
}

#[test]
fn color_requires_the_framebuffer_fetch_extension() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let vec4 = b.module.types.vec(f32_, 4);
    let param = b.param("c", vec4, &[AttributeKind::Color(0)]);
    let mut func = b.fragment_entry("main");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::RequiresExtension);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::RequiresExtension,
        "use of @color requires enabling extension 'framebuffer_fetch'",
    );
}

#[test]
fn color_is_fragment_input_only() {
    let mut b = ModuleBuilder::new();
    b.module.enabled_extensions |= Extensions::FRAMEBUFFER_FETCH;
    let f32_ = b.module.types.f32_();
    let vec4 = b.module.types.vec(f32_, 4);

    // Fragment input: fine.
    let param = b.param("c", vec4, &[AttributeKind::Color(0)]);
    let mut func = b.fragment_entry("main");
    func.params.push(param);
    b.module.add_function(func);
    assert_valid(&mut b);

    // Vertex input: rejected.
    let mut b = ModuleBuilder::new();
    b.module.enabled_extensions |= Extensions::FRAMEBUFFER_FETCH;
    let f32_ = b.module.types.f32_();
    let vec4 = b.module.types.vec(f32_, 4);
    let param = b.param("c", vec4, &[AttributeKind::Color(0)]);
    let mut func = b.vertex_entry("main");
    func.params.push(param);
    b.module.add_function(func);
    let diagnostics = assert_error(&mut b, DiagnosticCode::StageMismatch);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::StageMismatch,
        "@color can only be used for fragment shader input",
    );
}

#[test]
fn index_pairs_only_with_location_zero() {
    let mut b = ModuleBuilder::new();
    b.module.enabled_extensions |= Extensions::DUAL_SOURCE_BLENDING;
    let f32_ = b.module.types.f32_();
    let vec4 = b.module.types.vec(f32_, 4);
    let mut func = b.fragment_entry("main");
    func.return_type = vec4;
    func.return_attributes = b.attrs(&[AttributeKind::Location(1), AttributeKind::Index(0)]);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidIndexPairing);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidIndexPairing,
        "@index can only be used with @location(0)",
    );
}

#[test]
fn dual_source_blending_outputs_are_accepted() {
    let mut b = ModuleBuilder::new();
    b.module.enabled_extensions |= Extensions::DUAL_SOURCE_BLENDING;
    let f32_ = b.module.types.f32_();
    let vec4 = b.module.types.vec(f32_, 4);
    let mut func = b.fragment_entry("main");
    func.return_type = vec4;
    func.return_attributes = b.attrs(&[AttributeKind::Location(0), AttributeKind::Index(1)]);
    b.module.add_function(func);
    assert_valid(&mut b);
}

#[test]
fn flat_interpolation_must_not_have_a_sampling_parameter() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let spec = member("v", f32_)
        .with_attr(AttributeKind::Location(0))
        .with_attr(AttributeKind::Interpolate {
            ty: InterpolationType::Flat,
            sampling: Some(InterpolationSampling::Center),
        });
    b.struct_with("Io", vec![spec]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::MisplacedAttribute);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::MisplacedAttribute,
        "flat interpolation attribute must not have a sampling parameter",
    );
}

#[test]
fn integral_fragment_inputs_require_flat_interpolation() {
    let mut b = ModuleBuilder::new();
    let i32_ = b.module.types.i32_();
    let param = b.param("id", i32_, &[AttributeKind::Location(0)]);
    let mut func = b.fragment_entry("main");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::InvalidAttributeTarget);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::InvalidAttributeTarget,
        "integral user-defined fragment inputs must have a flat interpolation attribute",
    );

    // With @interpolate(flat) the input is accepted.
    let mut b = ModuleBuilder::new();
    let i32_ = b.module.types.i32_();
    let param = b.param(
        "id",
        i32_,
        &[
            AttributeKind::Location(0),
            AttributeKind::Interpolate {
                ty: InterpolationType::Flat,
                sampling: None,
            },
        ],
    );
    let mut func = b.fragment_entry("main");
    func.params.push(param);
    b.module.add_function(func);
    assert_valid(&mut b);
}

#[test]
fn invariant_requires_the_position_builtin() {
    let mut b = ModuleBuilder::new();
    let f32_ = b.module.types.f32_();
    let spec = member("v", f32_)
        .with_attr(AttributeKind::Invariant)
        .with_attr(AttributeKind::Location(0));
    b.struct_with("Io", vec![spec]);

    let diagnostics = assert_error(&mut b, DiagnosticCode::MisplacedAttribute);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::MisplacedAttribute,
        "@invariant must be applied to a position builtin",
    );
}

#[test]
fn subgroup_builtins_require_the_extension() {
    let mut b = ModuleBuilder::new();
    let u32_ = b.module.types.u32_();
    let param = b.param(
        "lane",
        u32_,
        &[AttributeKind::Builtin(BuiltinValue::SubgroupInvocationId)],
    );
    let mut func = b.compute_entry("main");
    func.params.push(param);
    b.module.add_function(func);

    let diagnostics = assert_error(&mut b, DiagnosticCode::RequiresExtension);
    assert_message_contains(
        &diagnostics,
        DiagnosticCode::RequiresExtension,
        "requires enabling extension 'subgroups'",
    );
}
