//! Address-space memory-layout validation.
//!
//! Host-shareable address spaces (`uniform`, `storage`, `push_constant`)
//! require fully defined layouts. Uniform buffers additionally impose the
//! 16-byte rules: struct/array members align to 16, struct-typed members are
//! followed at 16-byte multiples, and array strides are 16-byte multiples.
//! The `relaxed_uniform_layout` extension bypasses the 16-byte rules.
//!
//! Each (type, address space) pair is checked at most once per pass via the
//! validator's memo set; shared struct types reused across many declarations
//! cost one traversal.

use crate::extensions::Extensions;
use crate::types::{round_up, AddressSpace, TypeData, TypeId, TypeRegistry};
use crate::validation::Validator;
use crate::Span;
use lumen_compiler_diagnostics::DiagnosticCode;

/// Alignment a member type must satisfy in the given address space: the
/// natural alignment, rounded up to 16 for uniform-buffer structs and arrays.
fn required_alignment_of(types: &TypeRegistry, ty: TypeId, space: AddressSpace) -> u32 {
    let natural = types.align_of(ty);
    let is_uniform_struct_or_array = space == AddressSpace::Uniform
        && matches!(types.data(ty), TypeData::Struct(_) | TypeData::Array { .. });
    if is_uniform_struct_or_array {
        round_up(16, natural)
    } else {
        natural
    }
}

impl Validator<'_> {
    /// Check that `store_ty` has a valid layout in `address_space`. `source`
    /// is the declaration that triggered the check and is quoted in a
    /// trailing note so the user sees why this type's layout matters.
    pub(crate) fn address_space_layout(
        &mut self,
        store_ty: TypeId,
        address_space: AddressSpace,
        source: Span,
    ) -> bool {
        let module = self.module();
        let types = self.types();

        if self.layout_already_checked(store_ty, address_space) {
            return true;
        }
        if !address_space.is_host_shareable() {
            return true;
        }

        let relaxed = module
            .enabled_extensions
            .contains(Extensions::RELAXED_UNIFORM_LAYOUT);

        // f16 is supported in 'uniform' and 'storage', but not yet behind a
        // push-constant interface.
        if types.data(types.deepest_element(store_ty)) == TypeData::F16
            && address_space == AddressSpace::PushConstant
        {
            self.error(
                DiagnosticCode::UnsupportedLayout,
                "using f16 types in 'push_constant' address space is not implemented yet",
                source,
            );
            return false;
        }

        if let TypeData::Struct(struct_id) = types.data(store_ty) {
            let decl = types.struct_decl(struct_id);
            for (i, member) in decl.members.iter().enumerate() {
                let required_align = required_alignment_of(types, member.ty, address_space);

                if !self.address_space_layout(member.ty, address_space, member.type_span) {
                    self.note_last(
                        decl.span,
                        format!(
                            "see layout of struct:\n{}",
                            types.struct_layout_string(struct_id)
                        ),
                    );
                    self.note_usage(store_ty, address_space, source);
                    return false;
                }

                if member.offset % required_align != 0 && !relaxed {
                    self.error(
                        DiagnosticCode::InvalidMemberOffset,
                        format!(
                            "the offset of a struct member of type '{}' in address space '{}' \
                             must be a multiple of {} bytes, but '{}' is currently at offset {}. \
                             Consider setting @align({}) on this member",
                            types.friendly_name(types.unwrap_ref(member.ty)),
                            address_space,
                            required_align,
                            member.name,
                            member.offset,
                            required_align
                        ),
                        member.span,
                    );
                    self.note_last(
                        decl.span,
                        format!(
                            "see layout of struct:\n{}",
                            types.struct_layout_string(struct_id)
                        ),
                    );
                    if let TypeData::Struct(member_struct) = types.data(member.ty) {
                        self.note_last(
                            types.struct_decl(member_struct).span,
                            format!(
                                "and layout of struct member:\n{}",
                                types.struct_layout_string(member_struct)
                            ),
                        );
                    }
                    self.note_usage(store_ty, address_space, source);
                    return false;
                }

                // For uniform buffers, the gap after a struct-typed member
                // must be a multiple of 16 bytes.
                if i > 0 {
                    let prev = &decl.members[i - 1];
                    let prev_is_uniform_struct = address_space == AddressSpace::Uniform
                        && matches!(types.data(prev.ty), TypeData::Struct(_));
                    if prev_is_uniform_struct {
                        let gap = member.offset - prev.offset;
                        if gap % 16 != 0 && !relaxed {
                            self.error(
                                DiagnosticCode::InvalidUniformSpacing,
                                format!(
                                    "uniform storage requires that the number of bytes between \
                                     the start of the previous member of type struct and the \
                                     current member be a multiple of 16 bytes, but there are \
                                     currently {} bytes between '{}' and '{}'. Consider setting \
                                     @align(16) on this member",
                                    gap, prev.name, member.name
                                ),
                                member.span,
                            );
                            self.note_last(
                                decl.span,
                                format!(
                                    "see layout of struct:\n{}",
                                    types.struct_layout_string(struct_id)
                                ),
                            );
                            if let TypeData::Struct(prev_struct) = types.data(prev.ty) {
                                self.note_last(
                                    types.struct_decl(prev_struct).span,
                                    format!(
                                        "and layout of previous member struct:\n{}",
                                        types.struct_layout_string(prev_struct)
                                    ),
                                );
                            }
                            self.note_usage(store_ty, address_space, source);
                            return false;
                        }
                    }
                }

                // An explicitly specified alignment must itself satisfy the
                // address space's requirement.
                if !relaxed {
                    if let Some((align, align_span)) = member.attributes.iter().find_map(|a| {
                        match a.kind {
                            crate::attribute::AttributeKind::Align(v) => Some((v, a.span)),
                            _ => None,
                        }
                    }) {
                        if align % required_align != 0 {
                            self.error(
                                DiagnosticCode::InvalidAlignmentAttribute,
                                format!(
                                    "alignment must be a multiple of {} bytes for the {} \
                                     address space",
                                    required_align, address_space
                                ),
                                align_span,
                            );
                            self.note_usage(store_ty, address_space, source);
                            return false;
                        }
                    }
                }
            }
        }

        if let TypeData::Array { elem, .. } = types.data(store_ty) {
            if !self.address_space_layout(elem, address_space, source) {
                return false;
            }

            if address_space == AddressSpace::Uniform && !relaxed {
                let stride = types.array_stride(store_ty);
                if stride % 16 != 0 {
                    // The language has no stride attribute, so suggest how the
                    // author can pad the element type instead.
                    let hint = if types.is_scalar(elem) {
                        "Consider using a vector or struct as the element type instead."
                    } else if matches!(
                        types.data(elem),
                        TypeData::Vector { elem: ve, .. } if types.size_of(ve) == 4
                    ) {
                        "Consider using a vec4 instead."
                    } else if matches!(types.data(elem), TypeData::Struct(_)) {
                        "Consider using the @size attribute on the last struct member."
                    } else {
                        "Consider wrapping the element type in a struct and using the @size \
                         attribute."
                    };
                    self.error(
                        DiagnosticCode::InvalidArrayStride,
                        format!(
                            "uniform storage requires that array elements are aligned to 16 \
                             bytes, but array element of type '{}' has a stride of {} bytes. {}",
                            types.friendly_name(elem),
                            stride,
                            hint
                        ),
                        source,
                    );
                    return false;
                }
            }
        }

        true
    }

    fn note_usage(&mut self, store_ty: TypeId, address_space: AddressSpace, source: Span) {
        let name = self.types().friendly_name(store_ty);
        self.note_last(
            source,
            format!("'{}' used in address space '{}' here", name, address_space),
        );
    }
}
