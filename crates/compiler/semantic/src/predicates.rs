//! Type and storage classification predicates.
//!
//! Pure queries over the type arena; nearly every validation rule consults
//! one of these. Each is an exhaustive match over the closed set of type
//! kinds so that adding a kind forces every predicate to be revisited.

use crate::types::{ArrayCount, TypeData, TypeId, TypeRegistry};

/// Plain types: scalars, atomics, vectors, matrices, arrays, and structs.
pub fn is_plain(types: &TypeRegistry, ty: TypeId) -> bool {
    match types.data(ty) {
        TypeData::Bool
        | TypeData::I32
        | TypeData::U32
        | TypeData::F32
        | TypeData::F16
        | TypeData::AbstractInt
        | TypeData::AbstractFloat
        | TypeData::Atomic { .. }
        | TypeData::Vector { .. }
        | TypeData::Matrix { .. }
        | TypeData::Array { .. }
        | TypeData::Struct(_) => true,
        TypeData::Pointer { .. }
        | TypeData::Reference { .. }
        | TypeData::Sampler { .. }
        | TypeData::Texture { .. }
        | TypeData::Void => false,
    }
}

/// Fixed-footprint types: sized without runtime information, i.e. anything
/// plain that does not contain a runtime-sized array.
pub fn is_fixed_footprint(types: &TypeRegistry, ty: TypeId) -> bool {
    match types.data(ty) {
        TypeData::Vector { .. } | TypeData::Matrix { .. } | TypeData::Atomic { .. } => true,
        TypeData::Array { elem, count, .. } => {
            !matches!(count, ArrayCount::Runtime) && is_fixed_footprint(types, elem)
        }
        TypeData::Struct(id) => {
            let members: Vec<TypeId> = types.struct_decl(id).members.iter().map(|m| m.ty).collect();
            members.into_iter().all(|m| is_fixed_footprint(types, m))
        }
        TypeData::Bool
        | TypeData::I32
        | TypeData::U32
        | TypeData::F32
        | TypeData::F16
        | TypeData::AbstractInt
        | TypeData::AbstractFloat => true,
        TypeData::Pointer { .. }
        | TypeData::Reference { .. }
        | TypeData::Sampler { .. }
        | TypeData::Texture { .. }
        | TypeData::Void => false,
    }
}

/// Host-shareable types: concrete numeric scalars and compositions of them.
/// Textures, samplers, and bools never cross the host boundary.
pub fn is_host_shareable(types: &TypeRegistry, ty: TypeId) -> bool {
    match types.data(ty) {
        TypeData::I32 | TypeData::U32 | TypeData::F32 | TypeData::F16 => true,
        TypeData::Atomic { inner } => is_host_shareable(types, inner),
        TypeData::Vector { elem, .. }
        | TypeData::Matrix { elem, .. }
        | TypeData::Array { elem, .. } => is_host_shareable(types, elem),
        TypeData::Struct(id) => {
            let members: Vec<TypeId> = types.struct_decl(id).members.iter().map(|m| m.ty).collect();
            members.into_iter().all(|m| is_host_shareable(types, m))
        }
        TypeData::Bool
        | TypeData::AbstractInt
        | TypeData::AbstractFloat
        | TypeData::Pointer { .. }
        | TypeData::Reference { .. }
        | TypeData::Sampler { .. }
        | TypeData::Texture { .. }
        | TypeData::Void => false,
    }
}

/// Storable types: anything plain, plus textures and samplers.
pub fn is_storable(types: &TypeRegistry, ty: TypeId) -> bool {
    is_plain(types, ty)
        || matches!(
            types.data(ty),
            TypeData::Sampler { .. } | TypeData::Texture { .. }
        )
}
