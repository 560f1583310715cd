//! Declaration validation: module-scope variables, function-scope variables,
//! overrides, parameters, structs, arrays, and aliases.

use crate::attribute::AttributeKind;
use crate::expression::{EvaluationStage, ExpressionId};
use crate::module::{FunctionId, GlobalId, GlobalKind, LocalId, PipelineStage};
use crate::predicates;
use crate::types::{Access, AddressSpace, ArrayCount, StructId, TypeData, TypeId};
use crate::validation::Validator;
use crate::Span;
use lumen_compiler_diagnostics::DiagnosticCode;

impl Validator<'_> {
    // -----------------------------------------------------------------------
    // Structs
    // -----------------------------------------------------------------------

    /// Validate a struct declaration. `stage` is `None` at declaration time;
    /// member-level pipeline IO checks run unconditionally so diagnostics are
    /// attached where the struct is declared.
    pub(crate) fn validate_struct(
        &mut self,
        struct_id: StructId,
        stage: Option<PipelineStage>,
    ) -> bool {
        let types = self.types();
        let decl = types.struct_decl(struct_id);

        if decl.members.is_empty() {
            self.error(
                DiagnosticCode::EmptyStruct,
                "structures must have at least one member",
                decl.span,
            );
            return false;
        }

        let mut locations_and_indices = rustc_hash::FxHashSet::default();
        let mut colors = rustc_hash::FxHashSet::default();

        let member_count = decl.members.len();
        for (i, member) in decl.members.iter().enumerate() {
            if let TypeData::Array { count, .. } = types.data(member.ty) {
                if !self.validate_array(member.ty, member.type_span) {
                    return false;
                }
                if matches!(count, ArrayCount::Runtime) && i + 1 != member_count {
                    self.error(
                        DiagnosticCode::MisplacedRuntimeArray,
                        "runtime arrays may only appear as the last member of a struct",
                        member.span,
                    );
                    return false;
                }
                if types.is_array_with_override_count(member.ty) {
                    self.raise_array_with_override_count_error(member.type_span);
                    return false;
                }
            } else if !predicates::is_fixed_footprint(types, member.ty) {
                self.error(
                    DiagnosticCode::MisplacedRuntimeArray,
                    "a struct that contains a runtime array cannot be nested inside another \
                     struct",
                    member.span,
                );
                return false;
            }

            let mut has_position = false;
            let mut index_attr = None;
            let mut location_attr = None;
            let mut color_attr = None;
            let mut invariant_attr = None;
            let mut interpolate_attr = None;
            for attr in &member.attributes {
                let ok = match attr.kind {
                    AttributeKind::Invariant => {
                        invariant_attr = Some(attr);
                        self.invariant_attribute(attr, stage)
                    }
                    AttributeKind::Location(value) => {
                        location_attr = Some((attr, value));
                        self.location_attribute(attr, member.ty, stage, member.span)
                    }
                    AttributeKind::Index(value) => {
                        index_attr = Some((attr, value));
                        self.index_attribute(attr, stage, None)
                    }
                    AttributeKind::Color(value) => {
                        color_attr = Some((attr, value));
                        self.color_attribute(attr, member.ty, stage, member.span, None)
                    }
                    AttributeKind::Builtin(builtin) => {
                        if !self.builtin_attribute(attr, builtin, member.ty, stage, false) {
                            false
                        } else {
                            has_position |= builtin == crate::attribute::BuiltinValue::Position;
                            true
                        }
                    }
                    AttributeKind::Interpolate { .. } => {
                        interpolate_attr = Some(attr);
                        self.interpolate_attribute(attr, member.ty, stage)
                    }
                    AttributeKind::Size(_) => {
                        if !creation_fixed_footprint(types, member.ty) {
                            self.error(
                                DiagnosticCode::MisplacedAttribute,
                                "@size can only be applied to members where the member's type \
                                 size can be fully determined at shader creation time",
                                attr.span,
                            );
                            false
                        } else {
                            true
                        }
                    }
                    _ => true,
                };
                if !ok {
                    return false;
                }
            }

            if let Some(attr) = invariant_attr {
                if !has_position {
                    self.error(
                        DiagnosticCode::MisplacedAttribute,
                        "@invariant must be applied to a position builtin",
                        attr.span,
                    );
                    return false;
                }
            }

            if let Some((attr, _)) = index_attr {
                // Dual-source blending targets are restricted to location 0.
                if location_attr.map(|(_, loc)| loc).unwrap_or(1) != 0 {
                    self.error(
                        DiagnosticCode::InvalidIndexPairing,
                        "@index can only be used with @location(0)",
                        attr.span,
                    );
                    return false;
                }
            }

            if let Some(attr) = interpolate_attr {
                if location_attr.is_none() {
                    self.error(
                        DiagnosticCode::MisplacedAttribute,
                        "@interpolate can only be used with @location",
                        attr.span,
                    );
                    return false;
                }
            }

            if let Some((attr, location)) = location_attr {
                let index = index_attr.map(|(_, v)| v).unwrap_or(0);
                if !locations_and_indices.insert((location, index)) {
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
                if !colors.insert(color) {
                    self.error(
                        DiagnosticCode::DuplicateColor,
                        format!("@color({color}) appears multiple times"),
                        attr.span,
                    );
                    return false;
                }
            }
        }

        true
    }

    // -----------------------------------------------------------------------
    // Arrays and aliases
    // -----------------------------------------------------------------------

    /// Validate an array type at one of its declaration sites.
    pub(crate) fn validate_array(&mut self, array_ty: TypeId, el_source: Span) -> bool {
        let types = self.types();
        let TypeData::Array { elem, .. } = types.data(array_ty) else {
            crate::ice!("validate_array called on non-array type");
        };

        if !predicates::is_plain(types, elem) {
            self.error(
                DiagnosticCode::InvalidStoreType,
                format!(
                    "{} cannot be used as an element type of an array",
                    types.friendly_name(elem)
                ),
                el_source,
            );
            return false;
        }

        if !predicates::is_fixed_footprint(types, elem) {
            self.error(
                DiagnosticCode::MisplacedRuntimeArray,
                "an array element type cannot contain a runtime-sized array",
                el_source,
            );
            return false;
        }

        if types.is_array_with_override_count(elem) {
            self.raise_array_with_override_count_error(el_source);
            return false;
        }

        true
    }

    pub(crate) fn validate_alias(&mut self, alias: &crate::module::TypeAlias) -> bool {
        // Aliases carry no rules of their own; their aliased array types are
        // still checked at the alias declaration.
        if matches!(self.types().data(alias.ty), TypeData::Array { .. }) {
            return self.validate_array(alias.ty, alias.type_span);
        }
        true
    }

    pub(crate) fn raise_array_with_override_count_error(&mut self, source: Span) {
        self.error(
            DiagnosticCode::OverrideSizedArrayUsage,
            "array with an 'override' element count can only be used as the store type of a \
             'var<workgroup>'",
            source,
        );
    }

    // -----------------------------------------------------------------------
    // Module-scope variables
    // -----------------------------------------------------------------------

    pub(crate) fn validate_global(&mut self, global_id: GlobalId) -> bool {
        let module = self.module();
        let types = self.types();
        let global = module.global(global_id);

        if global.address_space != AddressSpace::Workgroup
            && types.is_array_with_override_count(global.ty)
        {
            self.raise_array_with_override_count_error(global.span);
            return false;
        }
        if matches!(types.data(global.ty), TypeData::Array { .. })
            && !self.validate_array(global.ty, global.span)
        {
            return false;
        }

        if let Some(init) = global.initializer {
            if !self.validate_module_scope_expression(init) {
                return false;
            }
        }

        let ok = match global.kind {
            GlobalKind::Var {
                explicit_address_space,
                ..
            } => {
                if let Some(init) = global.initializer {
                    if module.expression(init).stage > EvaluationStage::Override {
                        self.error(
                            DiagnosticCode::InvalidInitializer,
                            "module-scope 'var' initializer must be a constant or \
                             override-expression",
                            module.expression(init).span,
                        );
                        return false;
                    }
                }

                if !explicit_address_space && !types.is_handle(global.ty) {
                    self.error(
                        DiagnosticCode::MissingAddressSpace,
                        "module-scope 'var' declarations that are not of texture or sampler \
                         types must provide an address space",
                        global.span,
                    );
                    return false;
                }

                self.validate_var(global_id)
            }
            GlobalKind::Override { .. } => self.validate_override(global_id),
            GlobalKind::Const => self.check_initializer_type(
                "const",
                global.ty,
                global.initializer,
                global.span,
            ),
        };
        if !ok {
            return false;
        }

        if global.address_space == AddressSpace::Function {
            self.error(
                DiagnosticCode::InvalidAddressSpace,
                "module-scope 'var' must not use address space 'function'",
                global.span,
            );
            return false;
        }

        match global.address_space {
            AddressSpace::Uniform | AddressSpace::Storage | AddressSpace::Handle => {
                // Each resource variable must declare both group and binding.
                if global.binding_point.is_none() {
                    self.error(
                        DiagnosticCode::MissingResourceBinding,
                        "resource variables require @group and @binding attributes",
                        global.span,
                    );
                    return false;
                }
            }
            _ => {
                let has_binding_attr = global.binding_point.is_some()
                    || global.attributes.iter().any(|a| {
                        matches!(a.kind, AttributeKind::Group(_) | AttributeKind::Binding(_))
                    });
                if has_binding_attr {
                    self.error(
                        DiagnosticCode::UnexpectedResourceBinding,
                        "non-resource variables must not have @group or @binding attributes",
                        global.span,
                    );
                    return false;
                }
            }
        }

        true
    }

    /// Checks shared by module-scope and function-scope `var` declarations.
    fn validate_var(&mut self, global_id: GlobalId) -> bool {
        let module = self.module();
        let types = self.types();
        let global = module.global(global_id);
        let GlobalKind::Var {
            explicit_address_space,
            explicit_access,
        } = global.kind
        else {
            crate::ice!("validate_var called on a non-var declaration");
        };

        if !predicates::is_storable(types, global.ty) {
            self.error(
                DiagnosticCode::InvalidStoreType,
                format!(
                    "{} cannot be used as the type of a var",
                    types.friendly_name(global.ty)
                ),
                global.span,
            );
            return false;
        }

        if types.is_handle(global.ty) && explicit_address_space {
            // Texture and sampler variables always live in 'handle'.
            self.error(
                DiagnosticCode::InvalidAddressSpace,
                format!(
                    "variables of type '{}' must not specify an address space",
                    types.friendly_name(global.ty)
                ),
                global.span,
            );
            return false;
        }

        if explicit_access && global.address_space != AddressSpace::Storage {
            self.error(
                DiagnosticCode::InvalidAccessMode,
                "only variables in <storage> address space may specify an access mode",
                global.span,
            );
            return false;
        }

        if global.initializer.is_some()
            && !matches!(
                global.address_space,
                AddressSpace::Private | AddressSpace::Function
            )
        {
            self.error(
                DiagnosticCode::InvalidInitializer,
                format!(
                    "var of address space '{}' cannot have an initializer. var initializers \
                     are only supported for the address spaces 'private' and 'function'",
                    global.address_space
                ),
                global.span,
            );
            return false;
        }

        if !self.check_type_access_address_space(
            global.ty,
            global.access,
            global.address_space,
            global.span,
        ) {
            return false;
        }

        self.check_initializer_type("var", global.ty, global.initializer, global.span)
    }

    fn validate_override(&mut self, global_id: GlobalId) -> bool {
        let module = self.module();
        let types = self.types();
        let global = module.global(global_id);

        if let Some(init) = global.initializer {
            if module.expression(init).stage > EvaluationStage::Override {
                self.error(
                    DiagnosticCode::InvalidInitializer,
                    "'override' initializer must be an override-expression",
                    module.expression(init).span,
                );
                return false;
            }
        }

        if let GlobalKind::Override { id: Some(id) } = global.kind {
            if let Some(first) = self.first_override_with_id(id) {
                if first != global_id {
                    let attr_span = global
                        .attribute("id")
                        .map(|a| a.span)
                        .unwrap_or(global.span);
                    let first_span = module
                        .global(first)
                        .attribute("id")
                        .map(|a| a.span)
                        .unwrap_or(module.global(first).span);
                    self.error(
                        DiagnosticCode::DuplicateOverrideId,
                        "@id values must be unique",
                        attr_span,
                    );
                    self.note_last(
                        first_span,
                        format!("a override with an ID of {id} was previously declared here:"),
                    );
                    return false;
                }
            }
        }

        if !types.is_scalar(global.ty) {
            self.error(
                DiagnosticCode::InvalidStoreType,
                format!(
                    "{} cannot be used as the type of a 'override'",
                    types.friendly_name(global.ty)
                ),
                global.span,
            );
            return false;
        }

        self.check_initializer_type("override", global.ty, global.initializer, global.span)
    }

    // -----------------------------------------------------------------------
    // Function-scope variables
    // -----------------------------------------------------------------------

    pub(crate) fn validate_local_decl(
        &mut self,
        local_id: LocalId,
        initializer: Option<ExpressionId>,
    ) -> bool {
        let module = self.module();
        let types = self.types();
        let local = module.local(local_id);

        if types.is_array_with_override_count(local.ty) {
            self.raise_array_with_override_count_error(local.type_span);
            return false;
        }
        if matches!(types.data(local.ty), TypeData::Array { .. })
            && !self.validate_array(local.ty, local.type_span)
        {
            return false;
        }

        match local.kind {
            crate::module::LocalKind::Var => {
                if !types.is_constructible(local.ty) {
                    self.error(
                        DiagnosticCode::NonConstructibleType,
                        "function-scope 'var' must have a constructible type",
                        local.type_span,
                    );
                    return false;
                }
                if !self.check_type_access_address_space(
                    local.ty,
                    Access::ReadWrite,
                    AddressSpace::Function,
                    local.span,
                ) {
                    return false;
                }
                self.check_initializer_type("var", local.ty, initializer, local.span)
            }
            crate::module::LocalKind::Let => {
                let constructible_or_pointer = types.is_constructible(local.ty)
                    || matches!(types.data(local.ty), TypeData::Pointer { .. });
                if !constructible_or_pointer {
                    self.error(
                        DiagnosticCode::InvalidStoreType,
                        format!(
                            "{} cannot be used as the type of a 'let'",
                            types.friendly_name(local.ty)
                        ),
                        local.span,
                    );
                    return false;
                }
                self.check_initializer_type("let", local.ty, initializer, local.span)
            }
            crate::module::LocalKind::Const => {
                self.check_initializer_type("const", local.ty, initializer, local.span)
            }
        }
    }

    /// The initializer's value type must match the declared store type.
    fn check_initializer_type(
        &mut self,
        decl_kind: &str,
        store_ty: TypeId,
        initializer: Option<ExpressionId>,
        span: Span,
    ) -> bool {
        let Some(init) = initializer else {
            return true;
        };
        let module = self.module();
        let types = self.types();
        let init_ty = module.expression(init).ty;
        let value_ty = types.unwrap_ref(init_ty);
        if store_ty != value_ty && types.conversion_rank(value_ty, store_ty).is_none() {
            self.error(
                DiagnosticCode::TypeMismatch,
                format!(
                    "cannot initialize {} of type '{}' with value of type '{}'",
                    decl_kind,
                    types.friendly_name(store_ty),
                    types.friendly_name(init_ty)
                ),
                span,
            );
            return false;
        }
        true
    }

    // -----------------------------------------------------------------------
    // Parameters
    // -----------------------------------------------------------------------

    pub(crate) fn validate_parameter(&mut self, function: FunctionId, index: usize) -> bool {
        let module = self.module();
        let types = self.types();
        let param = &module.function(function).params[index];

        if let TypeData::Pointer { space, .. } = types.data(param.ty) {
            let ok = match space {
                AddressSpace::Function | AddressSpace::Private => true,
                AddressSpace::Storage | AddressSpace::Uniform | AddressSpace::Workgroup => module
                    .allowed_features
                    .contains(crate::extensions::LanguageFeatures::UNRESTRICTED_POINTER_PARAMETERS),
                _ => false,
            };
            if !ok {
                self.error(
                    DiagnosticCode::InvalidAddressSpace,
                    format!(
                        "function parameter of pointer type cannot be in '{space}' address space"
                    ),
                    param.span,
                );
                return false;
            }
        }

        if predicates::is_plain(types, param.ty) {
            if !types.is_constructible(param.ty) {
                self.error(
                    DiagnosticCode::NonConstructibleType,
                    "type of function parameter must be constructible",
                    param.type_span,
                );
                return false;
            }
        } else if !matches!(
            types.data(param.ty),
            TypeData::Texture { .. } | TypeData::Sampler { .. } | TypeData::Pointer { .. }
        ) {
            self.error(
                DiagnosticCode::InvalidStoreType,
                format!(
                    "type of function parameter cannot be {}",
                    types.friendly_name(param.ty)
                ),
                param.span,
            );
            return false;
        }

        true
    }

    // -----------------------------------------------------------------------
    // Type/access/address-space compatibility
    // -----------------------------------------------------------------------

    pub(crate) fn check_type_access_address_space(
        &mut self,
        store_ty: TypeId,
        access: Access,
        address_space: AddressSpace,
        source: Span,
    ) -> bool {
        let module = self.module();
        let types = self.types();

        if !self.address_space_layout(store_ty, address_space, source) {
            return false;
        }

        match address_space {
            AddressSpace::PixelLocal => {
                if let TypeData::Struct(struct_id) = types.data(store_ty) {
                    let decl = types.struct_decl(struct_id);
                    for member in &decl.members {
                        if !matches!(
                            types.data(member.ty),
                            TypeData::I32 | TypeData::U32 | TypeData::F32
                        ) {
                            self.error(
                                DiagnosticCode::InvalidStoreType,
                                "struct members used in the 'pixel_local' address space can \
                                 only be of the type 'i32', 'u32' or 'f32'",
                                member.span,
                            );
                            self.note_last(
                                source,
                                format!(
                                    "struct '{}' used in the 'pixel_local' address space here",
                                    decl.name
                                ),
                            );
                            return false;
                        }
                    }
                } else {
                    self.error(
                        DiagnosticCode::InvalidStoreType,
                        "'pixel_local' variable only support struct storage types",
                        source,
                    );
                    return false;
                }
            }
            AddressSpace::PushConstant => {
                if !module
                    .enabled_extensions
                    .contains(crate::extensions::Extensions::PUSH_CONSTANT)
                {
                    self.error(
                        DiagnosticCode::RequiresExtension,
                        "use of variable address space 'push_constant' requires enabling \
                         extension 'push_constant'",
                        source,
                    );
                    return false;
                }
            }
            AddressSpace::Storage => {
                if access == Access::Write {
                    // The storage address space only allows 'read' and
                    // 'read_write'.
                    self.error(
                        DiagnosticCode::InvalidAccessMode,
                        "access mode 'write' is not valid for the 'storage' address space",
                        source,
                    );
                    return false;
                }
            }
            _ => {}
        }

        let atomic_error = || -> Option<&'static str> {
            if !matches!(
                address_space,
                AddressSpace::Storage | AddressSpace::Workgroup
            ) {
                return Some("atomic variables must have <storage> or <workgroup> address space");
            }
            if address_space == AddressSpace::Storage && access != Access::ReadWrite {
                return Some(
                    "atomic variables in <storage> address space must have read_write access mode",
                );
            }
            None
        };

        match types.data(store_ty) {
            TypeData::Atomic { .. } => {
                if let Some(message) = atomic_error() {
                    self.error(DiagnosticCode::InvalidAtomicUsage, message, source);
                    return false;
                }
            }
            TypeData::Struct(_) | TypeData::Array { .. } => {
                if let Some(&atomic_span) = module.atomic_composites.get(&store_ty) {
                    if let Some(message) = atomic_error() {
                        self.error(DiagnosticCode::InvalidAtomicUsage, message, source);
                        self.note_last(
                            atomic_span,
                            format!(
                                "atomic sub-type of '{}' is declared here",
                                types.friendly_name(store_ty)
                            ),
                        );
                        return false;
                    }
                }
            }
            _ => {}
        }

        true
    }
}

/// Whether the type's size is fully determined at shader-creation time:
/// fixed footprint with no override-sized arrays anywhere inside.
fn creation_fixed_footprint(types: &crate::types::TypeRegistry, ty: TypeId) -> bool {
    match types.data(ty) {
        TypeData::Array { elem, count, .. } => {
            matches!(count, ArrayCount::Constant(_)) && creation_fixed_footprint(types, elem)
        }
        TypeData::Struct(id) => {
            let members: Vec<TypeId> = types.struct_decl(id).members.iter().map(|m| m.ty).collect();
            members
                .into_iter()
                .all(|m| creation_fixed_footprint(types, m))
        }
        _ => predicates::is_fixed_footprint(types, ty),
    }
}
