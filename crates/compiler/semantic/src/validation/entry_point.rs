//! Entry-point interface validation.
//!
//! A stateful scan over an entry point's parameters and return type: every
//! IO-carrying declaration (a parameter, the return type, or a struct member
//! of either) must carry exactly one pipeline IO attribute, builtins and
//! `(location, index)` pairs must be unique per direction group, and the
//! entry-point-wide invariants (vertex position, compute workgroup size, no
//! resource binding aliasing) hold over the transitively referenced globals.

use crate::attribute::{Attribute, AttributeKind, BuiltinValue};
use crate::module::{FunctionId, GlobalKind, PipelineStage};
use crate::types::TypeData;
use crate::Span;
use crate::validation::Validator;
use indexmap::IndexMap;
use lumen_compiler_diagnostics::DiagnosticCode;
use rustc_hash::FxHashSet;

/// Per-direction-group IO attribute state. Cleared between the parameter
/// group and the return-type group so inputs and outputs are tracked
/// independently; fragment input colors are tracked for the whole entry
/// point.
#[derive(Default)]
struct IoState {
    builtins: FxHashSet<BuiltinValue>,
    locations_and_indices: FxHashSet<(u32, u32)>,
    colors: FxHashSet<u32>,
    first_nonzero_location: Option<Span>,
    first_nonzero_index: Option<Span>,
}

impl IoState {
    fn reset_direction_group(&mut self) {
        self.builtins.clear();
        self.locations_and_indices.clear();
        self.first_nonzero_location = None;
        self.first_nonzero_index = None;
    }
}

impl Validator<'_> {
    pub(crate) fn validate_entry_point(&mut self, function_id: FunctionId) -> bool {
        let module = self.module();
        let types = self.types();
        let func = module.function(function_id);
        let stage = func.stage;

        let mut state = IoState::default();

        for param in &func.params {
            if !self.validate_io_declaration(
                &param.attributes,
                param.ty,
                param.span,
                function_id,
                stage,
                true,
                &mut state,
            ) {
                return false;
            }
        }

        // Builtins and locations in the return type are tracked independently
        // from those used in parameters.
        state.reset_direction_group();

        if !types.is_void(func.return_type) {
            if !self.validate_io_declaration(
                &func.return_attributes,
                func.return_type,
                func.span,
                function_id,
                stage,
                false,
                &mut state,
            ) {
                return false;
            }
        }

        if stage == Some(PipelineStage::Vertex)
            && !state.builtins.contains(&BuiltinValue::Position)
        {
            // The position output may also come from a referenced
            // module-scope builtin variable.
            let found = func.transitively_referenced_globals.iter().any(|&gid| {
                crate::attribute::builtin_of(&module.global(gid).attributes)
                    .is_some_and(|(b, _)| b == BuiltinValue::Position)
            });
            if !found {
                self.error(
                    DiagnosticCode::MissingVertexPosition,
                    "a vertex shader must include the 'position' builtin in its return type",
                    func.span,
                );
                return false;
            }
        }

        if stage == Some(PipelineStage::Compute) && func.workgroup_size().is_none() {
            self.error(
                DiagnosticCode::MissingWorkgroupSize,
                "a compute shader must include 'workgroup_size' in its attributes",
                func.span,
            );
            return false;
        }

        // Bindings must not alias within a shader stage.
        let mut binding_points = IndexMap::new();
        for &gid in &func.transitively_referenced_globals {
            let global = module.global(gid);
            if !matches!(global.kind, GlobalKind::Var { .. }) {
                continue;
            }
            let Some(bp) = global.binding_point else {
                continue;
            };
            if let Some(&first) = binding_points.get(&(bp.group, bp.binding)) {
                let first_span = module.global(first).span;
                self.error(
                    DiagnosticCode::BindingCollision,
                    format!(
                        "entry point '{}' references multiple variables that use the same \
                         resource binding @group({}), @binding({})",
                        func.name, bp.group, bp.binding
                    ),
                    global.span,
                );
                self.note_last(first_span, "first resource binding usage declared here");
                return false;
            }
            binding_points.insert((bp.group, bp.binding), gid);
        }

        true
    }

    /// Validate the IO attributes of one parameter or the return type, then
    /// recurse into struct members.
    #[allow(clippy::too_many_arguments)]
    fn validate_io_declaration(
        &mut self,
        attrs: &[Attribute],
        ty: crate::types::TypeId,
        span: Span,
        function_id: FunctionId,
        stage: Option<PipelineStage>,
        is_input: bool,
        state: &mut IoState,
    ) -> bool {
        let module = self.module();
        let types = self.types();

        if !self.validate_io_attributes(attrs, ty, span, function_id, stage, is_input, false, state)
        {
            return false;
        }

        if let TypeData::Struct(struct_id) = types.data(types.unwrap_ref(ty)) {
            let decl = types.struct_decl(struct_id);
            for member in &decl.members {
                if !self.validate_io_attributes(
                    &member.attributes,
                    member.ty,
                    member.span,
                    function_id,
                    stage,
                    is_input,
                    true,
                    state,
                ) {
                    let func = module.function(function_id);
                    self.note_last(
                        func.span,
                        format!("while analyzing entry point '{}'", func.name),
                    );
                    return false;
                }
            }
        }

        true
    }

    /// The per-declaration state machine: scan attributes, consume at most
    /// one pipeline IO attribute, and check uniqueness against the current
    /// direction group.
    #[allow(clippy::too_many_arguments)]
    fn validate_io_attributes(
        &mut self,
        attrs: &[Attribute],
        ty: crate::types::TypeId,
        span: Span,
        function_id: FunctionId,
        stage: Option<PipelineStage>,
        is_input: bool,
        is_struct_member: bool,
        state: &mut IoState,
    ) -> bool {
        let module = self.module();
        let types = self.types();
        let func = module.function(function_id);

        let mut pipeline_io: Option<&Attribute> = None;
        let mut location_attr: Option<(&Attribute, u32)> = None;
        let mut index_attr: Option<(&Attribute, u32)> = None;
        let mut color_attr: Option<(&Attribute, u32)> = None;
        let mut interpolate_attr: Option<&Attribute> = None;
        let mut invariant_attr: Option<&Attribute> = None;

        // A second pipeline IO attribute is an immediate conflict naming the
        // first.
        macro_rules! consume_pipeline_io {
            ($attr:expr) => {
                if let Some(previous) = pipeline_io {
                    self.error(
                        DiagnosticCode::ConflictingPipelineIo,
                        "multiple entry point IO attributes",
                        $attr.span,
                    );
                    self.note_last(
                        previous.span,
                        format!("previously consumed {}", previous.kind),
                    );
                    return false;
                } else {
                    pipeline_io = Some($attr);
                }
            };
        }

        for attr in attrs {
            let ok = match attr.kind {
                AttributeKind::Builtin(builtin) => {
                    consume_pipeline_io!(attr);
                    if state.builtins.contains(&builtin) {
                        self.error(
                            DiagnosticCode::DuplicateBuiltin,
                            format!(
                                "@builtin({builtin}) appears multiple times as pipeline {}",
                                if is_input { "input" } else { "output" }
                            ),
                            func.span,
                        );
                        return false;
                    }
                    if !self.builtin_attribute(attr, builtin, ty, stage, is_input) {
                        return false;
                    }
                    state.builtins.insert(builtin);
                    true
                }
                AttributeKind::Location(value) => {
                    consume_pipeline_io!(attr);
                    location_attr = Some((attr, value));
                    self.location_attribute(attr, ty, stage, span)
                }
                AttributeKind::Index(value) => {
                    index_attr = Some((attr, value));
                    self.index_attribute(attr, stage, Some(is_input))
                }
                AttributeKind::Color(value) => {
                    consume_pipeline_io!(attr);
                    color_attr = Some((attr, value));
                    self.color_attribute(attr, ty, stage, span, Some(is_input))
                }
                AttributeKind::Interpolate { .. } => {
                    interpolate_attr = Some(attr);
                    self.interpolate_attribute(attr, ty, stage)
                }
                AttributeKind::Invariant => {
                    invariant_attr = Some(attr);
                    self.invariant_attribute(attr, stage)
                }
                _ => true,
            };
            if !ok {
                return false;
            }
        }

        let unwrapped = types.unwrap_ref(ty);
        let is_struct = matches!(types.data(unwrapped), TypeData::Struct(_));

        if is_struct_member && is_struct {
            self.error(
                DiagnosticCode::NestedEntryPointIo,
                "nested structures cannot be used for entry point IO",
                span,
            );
            return false;
        }

        if !is_struct && pipeline_io.is_none() {
            let mut message = String::from("missing entry point IO attribute");
            if !is_struct_member {
                message.push_str(if is_input {
                    " on parameter"
                } else {
                    " on return type"
                });
            }
            self.error(DiagnosticCode::MissingPipelineIo, message, span);
            return false;
        }

        if location_attr.is_some()
            && types.is_integer_scalar_or_vector(unwrapped)
            && interpolate_attr.is_none()
        {
            if stage == Some(PipelineStage::Vertex) && !is_input {
                self.error(
                    DiagnosticCode::InvalidAttributeTarget,
                    "integral user-defined vertex outputs must have a flat interpolation \
                     attribute",
                    span,
                );
                return false;
            }
            if stage == Some(PipelineStage::Fragment) && is_input {
                self.error(
                    DiagnosticCode::InvalidAttributeTarget,
                    "integral user-defined fragment inputs must have a flat interpolation \
                     attribute",
                    span,
                );
                return false;
            }
        }

        if let Some((attr, _)) = index_attr {
            // Dual-source blending restricts @index to location 0.
            if location_attr.map(|(_, loc)| loc).unwrap_or(1) != 0 {
                self.error(
                    DiagnosticCode::InvalidIndexPairing,
                    "@index can only be used with @location(0)",
                    attr.span,
                );
                return false;
            }
        }

        if let Some((attr, location)) = location_attr {
            if state.first_nonzero_location.is_none() && location > 0 {
                state.first_nonzero_location = Some(attr.span);
            }
            if state.first_nonzero_index.is_none() {
                if let Some((iattr, index)) = index_attr {
                    if index > 0 {
                        state.first_nonzero_index = Some(iattr.span);
                    }
                }
            }
            if let (Some(location_span), Some(index_span)) =
                (state.first_nonzero_location, state.first_nonzero_index)
            {
                self.error(
                    DiagnosticCode::InvalidIndexPairing,
                    "pipeline cannot use both non-zero @index and non-zero @location",
                    index_span,
                );
                self.note_last(location_span, "non-zero @location declared here");
                return false;
            }

            let index = index_attr.map(|(_, v)| v).unwrap_or(0);
            if !state.locations_and_indices.insert((location, index)) {
                let mut message = format!("@location({location}) ");
                if index_attr.is_some() {
                    message.push_str(&format!("@index({index}) "));
                }
                message.push_str("appears multiple times");
                self.error(DiagnosticCode::DuplicateLocation, message, attr.span);
                return false;
            }
        }

        if let Some((attr, color)) = color_attr {
            if !state.colors.insert(color) {
                self.error(
                    DiagnosticCode::DuplicateColor,
                    format!("@color({color}) appears multiple times"),
                    attr.span,
                );
                return false;
            }
        }

        if let Some(attr) = interpolate_attr {
            let on_location = pipeline_io
                .is_some_and(|io| matches!(io.kind, AttributeKind::Location(_)));
            if !on_location {
                self.error(
                    DiagnosticCode::MisplacedAttribute,
                    "@interpolate can only be used with @location",
                    attr.span,
                );
                return false;
            }
        }

        if let Some(attr) = invariant_attr {
            let has_position = pipeline_io.is_some_and(|io| {
                matches!(io.kind, AttributeKind::Builtin(BuiltinValue::Position))
            });
            if !has_position {
                self.error(
                    DiagnosticCode::MisplacedAttribute,
                    "@invariant must be applied to a position builtin",
                    attr.span,
                );
                return false;
            }
        }

        true
    }
}
