//! Pipeline IO attribute validation.
//!
//! Each validator takes the attribute, the annotated declaration's store
//! type, the pipeline stage (or `None` at declaration time, when the stage is
//! not yet known), and the IO direction where it matters. Stage and direction
//! constraints are only enforced once a stage is known; store-type
//! constraints always apply.

use crate::attribute::{Attribute, AttributeKind, BuiltinValue, InterpolationType};
use crate::extensions::Extensions;
use crate::module::PipelineStage;
use crate::types::{TypeData, TypeId};
use crate::validation::Validator;
use crate::Span;
use lumen_compiler_diagnostics::DiagnosticCode;

/// Store-type requirement of a builtin value.
enum RequiredType {
    Vec4F32,
    Vec3U32,
    F32,
    U32,
    Bool,
}

impl RequiredType {
    const fn description(&self) -> &'static str {
        match self {
            Self::Vec4F32 => "'vec4<f32>'",
            Self::Vec3U32 => "'vec3<u32>'",
            Self::F32 => "'f32'",
            Self::U32 => "'u32'",
            Self::Bool => "'bool'",
        }
    }
}

/// Fixed table: each builtin's required store type.
const fn required_type_of(builtin: BuiltinValue) -> RequiredType {
    match builtin {
        BuiltinValue::Position => RequiredType::Vec4F32,
        BuiltinValue::GlobalInvocationId
        | BuiltinValue::LocalInvocationId
        | BuiltinValue::NumWorkgroups
        | BuiltinValue::WorkgroupId => RequiredType::Vec3U32,
        BuiltinValue::FragDepth => RequiredType::F32,
        BuiltinValue::FrontFacing => RequiredType::Bool,
        BuiltinValue::LocalInvocationIndex
        | BuiltinValue::VertexIndex
        | BuiltinValue::InstanceIndex
        | BuiltinValue::SampleIndex
        | BuiltinValue::SampleMask
        | BuiltinValue::SubgroupInvocationId
        | BuiltinValue::SubgroupSize => RequiredType::U32,
    }
}

/// Fixed table: whether a builtin is usable for the given stage/direction.
fn stage_direction_ok(builtin: BuiltinValue, stage: PipelineStage, is_input: bool) -> bool {
    use PipelineStage::*;
    match builtin {
        BuiltinValue::Position => {
            (is_input && stage == Fragment) || (!is_input && stage == Vertex)
        }
        BuiltinValue::GlobalInvocationId
        | BuiltinValue::LocalInvocationId
        | BuiltinValue::NumWorkgroups
        | BuiltinValue::WorkgroupId
        | BuiltinValue::LocalInvocationIndex => stage == Compute && is_input,
        BuiltinValue::FragDepth => stage == Fragment && !is_input,
        BuiltinValue::FrontFacing | BuiltinValue::SampleIndex => stage == Fragment && is_input,
        BuiltinValue::VertexIndex | BuiltinValue::InstanceIndex => stage == Vertex && is_input,
        BuiltinValue::SampleMask => stage == Fragment,
        BuiltinValue::SubgroupInvocationId | BuiltinValue::SubgroupSize => stage == Compute,
    }
}

impl Validator<'_> {
    pub(crate) fn builtin_attribute(
        &mut self,
        attr: &Attribute,
        builtin: BuiltinValue,
        store_ty: TypeId,
        stage: Option<PipelineStage>,
        is_input: bool,
    ) -> bool {
        let types = self.types();
        let ty = types.unwrap_ref(store_ty);

        let is_subgroup = matches!(
            builtin,
            BuiltinValue::SubgroupInvocationId | BuiltinValue::SubgroupSize
        );
        if is_subgroup
            && !self
                .module()
                .enabled_extensions
                .contains(Extensions::SUBGROUPS)
        {
            self.error(
                DiagnosticCode::RequiresExtension,
                format!(
                    "use of @builtin({builtin}) attribute requires enabling extension 'subgroups'"
                ),
                attr.span,
            );
            return false;
        }

        let required = required_type_of(builtin);
        let type_ok = match required {
            RequiredType::Vec4F32 => matches!(
                types.data(ty),
                TypeData::Vector { elem, width: 4 } if types.data(elem) == TypeData::F32
            ),
            RequiredType::Vec3U32 => {
                types.is_unsigned_integer_vector(ty)
                    && matches!(types.data(ty), TypeData::Vector { width: 3, .. })
            }
            RequiredType::F32 => types.data(ty) == TypeData::F32,
            RequiredType::U32 => types.data(ty) == TypeData::U32,
            RequiredType::Bool => types.data(ty) == TypeData::Bool,
        };
        if !type_ok {
            self.error(
                DiagnosticCode::InvalidBuiltinType,
                format!(
                    "store type of @builtin({builtin}) must be {}",
                    required.description()
                ),
                attr.span,
            );
            return false;
        }

        if let Some(stage) = stage {
            if !stage_direction_ok(builtin, stage, is_input) {
                if is_subgroup {
                    self.error(
                        DiagnosticCode::StageMismatch,
                        format!("@builtin({builtin}) is only valid as a compute shader input"),
                        attr.span,
                    );
                } else {
                    self.error(
                        DiagnosticCode::StageMismatch,
                        format!(
                            "@builtin({builtin}) cannot be used for {stage} shader {}",
                            if is_input { "input" } else { "output" }
                        ),
                        attr.span,
                    );
                }
                return false;
            }
        }

        true
    }

    pub(crate) fn location_attribute(
        &mut self,
        attr: &Attribute,
        store_ty: TypeId,
        stage: Option<PipelineStage>,
        decl_span: Span,
    ) -> bool {
        if stage == Some(PipelineStage::Compute) {
            self.error(
                DiagnosticCode::StageMismatch,
                format!("{} cannot be used by compute shaders", attr.kind),
                attr.span,
            );
            return false;
        }

        let types = self.types();
        let ty = types.unwrap_ref(store_ty);
        if !types.is_numeric_scalar_or_vector(ty) {
            self.error(
                DiagnosticCode::InvalidAttributeTarget,
                format!(
                    "cannot apply @location to declaration of type '{}'",
                    types.friendly_name(ty)
                ),
                decl_span,
            );
            self.note_last(
                attr.span,
                "@location must only be applied to declarations of numeric scalar or numeric \
                 vector type",
            );
            return false;
        }

        true
    }

    pub(crate) fn color_attribute(
        &mut self,
        attr: &Attribute,
        store_ty: TypeId,
        stage: Option<PipelineStage>,
        decl_span: Span,
        is_input: Option<bool>,
    ) -> bool {
        if !self
            .module()
            .enabled_extensions
            .contains(Extensions::FRAMEBUFFER_FETCH)
        {
            self.error(
                DiagnosticCode::RequiresExtension,
                "use of @color requires enabling extension 'framebuffer_fetch'",
                attr.span,
            );
            return false;
        }

        let is_stage_non_fragment = stage.is_some_and(|s| s != PipelineStage::Fragment);
        let is_output = !is_input.unwrap_or(true);
        if is_stage_non_fragment || is_output {
            self.error(
                DiagnosticCode::StageMismatch,
                "@color can only be used for fragment shader input",
                attr.span,
            );
            return false;
        }

        let types = self.types();
        let ty = types.unwrap_ref(store_ty);
        if !types.is_numeric_scalar_or_vector(ty) {
            self.error(
                DiagnosticCode::InvalidAttributeTarget,
                format!(
                    "cannot apply @color to declaration of type '{}'",
                    types.friendly_name(ty)
                ),
                decl_span,
            );
            self.note_last(
                attr.span,
                "@color must only be applied to declarations of numeric scalar or numeric \
                 vector type",
            );
            return false;
        }

        true
    }

    pub(crate) fn index_attribute(
        &mut self,
        attr: &Attribute,
        stage: Option<PipelineStage>,
        is_input: Option<bool>,
    ) -> bool {
        if !self
            .module()
            .enabled_extensions
            .contains(Extensions::DUAL_SOURCE_BLENDING)
        {
            self.error(
                DiagnosticCode::RequiresExtension,
                "use of @index requires enabling extension 'dual_source_blending'",
                attr.span,
            );
            return false;
        }

        let is_stage_non_fragment = stage.is_some_and(|s| s != PipelineStage::Fragment);
        let used_as_input = is_input.unwrap_or(false);
        if is_stage_non_fragment || used_as_input {
            self.error(
                DiagnosticCode::StageMismatch,
                format!("{} can only be used for fragment shader output", attr.kind),
                attr.span,
            );
            return false;
        }

        true
    }

    pub(crate) fn interpolate_attribute(
        &mut self,
        attr: &Attribute,
        store_ty: TypeId,
        stage: Option<PipelineStage>,
    ) -> bool {
        if stage == Some(PipelineStage::Compute) {
            self.error(
                DiagnosticCode::StageMismatch,
                format!("{} cannot be used by compute shaders", attr.kind),
                attr.span,
            );
            return false;
        }

        let AttributeKind::Interpolate { ty: itype, sampling } = attr.kind else {
            crate::ice!("interpolate_attribute called with a non-interpolate attribute");
        };

        let types = self.types();
        let ty = types.unwrap_ref(store_ty);
        if types.is_integer_scalar_or_vector(ty) && itype != InterpolationType::Flat {
            self.error(
                DiagnosticCode::InvalidAttributeTarget,
                "interpolation type must be 'flat' for integral user-defined IO types",
                attr.span,
            );
            return false;
        }

        if sampling.is_some() && itype == InterpolationType::Flat {
            self.error(
                DiagnosticCode::MisplacedAttribute,
                "flat interpolation attribute must not have a sampling parameter",
                attr.span,
            );
            return false;
        }

        true
    }

    pub(crate) fn invariant_attribute(
        &mut self,
        attr: &Attribute,
        stage: Option<PipelineStage>,
    ) -> bool {
        if stage == Some(PipelineStage::Compute) {
            self.error(
                DiagnosticCode::StageMismatch,
                format!("{} cannot be used by compute shaders", attr.kind),
                attr.span,
            );
            return false;
        }
        true
    }
}
