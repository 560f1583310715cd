//! # Type System
//!
//! The resolved type arena. Types are interned: structurally identical type
//! data maps to the same [`TypeId`], so downstream sets keyed on `TypeId`
//! (notably the layout-check memo set) treat every use of a shared type as
//! one entry. Struct types are nominal and live in their own arena; two
//! structs with identical members still get distinct ids.
//!
//! Layout arithmetic (natural alignment, size, array stride) follows the
//! language's memory-layout rules; struct member offsets are whatever the
//! resolver computed after applying `@align`/`@size` attributes.

use crate::attribute::AttributeList;
use crate::Span;
use index_vec::{define_index_type, IndexVec};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;

define_index_type! {
    /// Identity of an interned type.
    pub struct TypeId = u32;
}

define_index_type! {
    /// Identity of a struct declaration.
    pub struct StructId = u32;
}

/// The memory region a variable lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSpace {
    /// No address space was written and none could be inferred.
    Undefined,
    Function,
    Private,
    Workgroup,
    Uniform,
    Storage,
    Handle,
    PushConstant,
    PixelLocal,
}

impl AddressSpace {
    /// Whether values in this address space cross the host/device boundary
    /// and therefore need a fully defined memory layout.
    pub const fn is_host_shareable(self) -> bool {
        matches!(self, Self::Uniform | Self::Storage | Self::PushConstant)
    }
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::Function => "function",
            Self::Private => "private",
            Self::Workgroup => "workgroup",
            Self::Uniform => "uniform",
            Self::Storage => "storage",
            Self::Handle => "handle",
            Self::PushConstant => "push_constant",
            Self::PixelLocal => "pixel_local",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "read_write",
        };
        f.write_str(name)
    }
}

/// Element count of an array type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayCount {
    /// Count known at shader-creation time.
    Constant(u32),
    /// Runtime-sized (only valid as the last member of a storage struct).
    Runtime,
    /// Count is an override-expression, fixed at pipeline-creation time.
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D2Array,
    D3,
    Cube,
}

/// The closed set of resolved type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeData {
    Bool,
    I32,
    U32,
    F32,
    F16,
    AbstractInt,
    AbstractFloat,
    Atomic {
        inner: TypeId,
    },
    Vector {
        elem: TypeId,
        width: u32,
    },
    Matrix {
        columns: u32,
        rows: u32,
        elem: TypeId,
    },
    Array {
        elem: TypeId,
        count: ArrayCount,
        /// Explicit stride, if the resolver applied one; `None` means the
        /// natural stride.
        stride: Option<u32>,
    },
    Struct(StructId),
    Pointer {
        store: TypeId,
        space: AddressSpace,
        access: Access,
    },
    /// A memory view produced by using a variable; assignment targets must
    /// resolve to one of these.
    Reference {
        store: TypeId,
        space: AddressSpace,
        access: Access,
    },
    Sampler {
        comparison: bool,
    },
    Texture {
        dim: TextureDimension,
    },
    Void,
}

/// A laid-out struct member.
#[derive(Debug, Clone)]
pub struct StructMember {
    pub name: SmolStr,
    pub ty: TypeId,
    /// Byte offset from the start of the struct, after `@align`/`@size`.
    pub offset: u32,
    /// Alignment the resolver used for this member.
    pub align: u32,
    /// Size the resolver used for this member, including `@size` padding.
    pub size: u32,
    pub attributes: AttributeList,
    pub span: Span,
    pub type_span: Span,
}

/// A struct declaration with its computed layout.
#[derive(Debug, Clone)]
pub struct StructType {
    pub name: SmolStr,
    pub members: Vec<StructMember>,
    pub align: u32,
    pub size: u32,
    pub span: Span,
}

/// Arena of interned types and declared structs.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexVec<TypeId, TypeData>,
    structs: IndexVec<StructId, StructType>,
    interned: FxHashMap<TypeData, TypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type, returning the existing id for structurally identical
    /// data.
    pub fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.interned.get(&data) {
            return id;
        }
        let id = self.types.push(data);
        self.interned.insert(data, id);
        id
    }

    /// Register a struct declaration and intern its nominal type.
    pub fn add_struct(&mut self, decl: StructType) -> (StructId, TypeId) {
        let struct_id = self.structs.push(decl);
        let type_id = self.intern(TypeData::Struct(struct_id));
        (struct_id, type_id)
    }

    pub fn data(&self, ty: TypeId) -> TypeData {
        self.types[ty]
    }

    pub fn struct_decl(&self, id: StructId) -> &StructType {
        &self.structs[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, TypeData)> + '_ {
        self.types.iter_enumerated().map(|(id, data)| (id, *data))
    }

    pub fn struct_ids(&self) -> impl Iterator<Item = StructId> {
        (0..self.structs.len()).map(StructId::from_usize)
    }

    // Shorthand constructors used throughout the resolver and tests.

    pub fn bool_(&mut self) -> TypeId {
        self.intern(TypeData::Bool)
    }

    pub fn i32_(&mut self) -> TypeId {
        self.intern(TypeData::I32)
    }

    pub fn u32_(&mut self) -> TypeId {
        self.intern(TypeData::U32)
    }

    pub fn f32_(&mut self) -> TypeId {
        self.intern(TypeData::F32)
    }

    pub fn f16_(&mut self) -> TypeId {
        self.intern(TypeData::F16)
    }

    pub fn void(&mut self) -> TypeId {
        self.intern(TypeData::Void)
    }

    pub fn vec(&mut self, elem: TypeId, width: u32) -> TypeId {
        self.intern(TypeData::Vector { elem, width })
    }

    pub fn matrix(&mut self, columns: u32, rows: u32, elem: TypeId) -> TypeId {
        self.intern(TypeData::Matrix {
            columns,
            rows,
            elem,
        })
    }

    pub fn array(&mut self, elem: TypeId, count: ArrayCount) -> TypeId {
        self.intern(TypeData::Array {
            elem,
            count,
            stride: None,
        })
    }

    pub fn atomic(&mut self, inner: TypeId) -> TypeId {
        self.intern(TypeData::Atomic { inner })
    }

    pub fn pointer(&mut self, store: TypeId, space: AddressSpace, access: Access) -> TypeId {
        self.intern(TypeData::Pointer {
            store,
            space,
            access,
        })
    }

    pub fn reference(&mut self, store: TypeId, space: AddressSpace, access: Access) -> TypeId {
        self.intern(TypeData::Reference {
            store,
            space,
            access,
        })
    }

    // Classification helpers.

    pub fn is_scalar(&self, ty: TypeId) -> bool {
        matches!(
            self.data(ty),
            TypeData::Bool
                | TypeData::I32
                | TypeData::U32
                | TypeData::F32
                | TypeData::F16
                | TypeData::AbstractInt
                | TypeData::AbstractFloat
        )
    }

    pub fn is_numeric_scalar(&self, ty: TypeId) -> bool {
        matches!(
            self.data(ty),
            TypeData::I32
                | TypeData::U32
                | TypeData::F32
                | TypeData::F16
                | TypeData::AbstractInt
                | TypeData::AbstractFloat
        )
    }

    pub fn is_integer_scalar(&self, ty: TypeId) -> bool {
        matches!(
            self.data(ty),
            TypeData::I32 | TypeData::U32 | TypeData::AbstractInt
        )
    }

    pub fn is_signed_integer_scalar(&self, ty: TypeId) -> bool {
        matches!(self.data(ty), TypeData::I32 | TypeData::AbstractInt)
    }

    pub fn is_abstract(&self, ty: TypeId) -> bool {
        matches!(
            self.data(ty),
            TypeData::AbstractInt | TypeData::AbstractFloat
        )
    }

    pub fn is_numeric_scalar_or_vector(&self, ty: TypeId) -> bool {
        match self.data(ty) {
            TypeData::Vector { elem, .. } => self.is_numeric_scalar(elem),
            _ => self.is_numeric_scalar(ty),
        }
    }

    pub fn is_integer_scalar_or_vector(&self, ty: TypeId) -> bool {
        match self.data(ty) {
            TypeData::Vector { elem, .. } => self.is_integer_scalar(elem),
            _ => self.is_integer_scalar(ty),
        }
    }

    pub fn is_unsigned_integer_vector(&self, ty: TypeId) -> bool {
        matches!(self.data(ty), TypeData::Vector { elem, .. } if self.data(elem) == TypeData::U32)
    }

    pub fn is_handle(&self, ty: TypeId) -> bool {
        matches!(
            self.data(ty),
            TypeData::Sampler { .. } | TypeData::Texture { .. }
        )
    }

    pub fn is_void(&self, ty: TypeId) -> bool {
        self.data(ty) == TypeData::Void
    }

    /// Strip a reference wrapper; the implicit load applied to value uses.
    pub fn unwrap_ref(&self, ty: TypeId) -> TypeId {
        match self.data(ty) {
            TypeData::Reference { store, .. } => store,
            _ => ty,
        }
    }

    /// Innermost element of vector/matrix/array nesting.
    pub fn deepest_element(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        loop {
            current = match self.data(current) {
                TypeData::Vector { elem, .. }
                | TypeData::Matrix { elem, .. }
                | TypeData::Array { elem, .. } => elem,
                _ => return current,
            };
        }
    }

    pub fn is_array_with_override_count(&self, ty: TypeId) -> bool {
        matches!(
            self.data(self.unwrap_ref(ty)),
            TypeData::Array {
                count: ArrayCount::Override,
                ..
            }
        )
    }

    /// Whether a value of this type can be created with a value constructor:
    /// fixed footprint, no atomics, no runtime-sized arrays, and no handle or
    /// memory-view types anywhere inside.
    pub fn is_constructible(&self, ty: TypeId) -> bool {
        match self.data(ty) {
            TypeData::Bool
            | TypeData::I32
            | TypeData::U32
            | TypeData::F32
            | TypeData::F16
            | TypeData::AbstractInt
            | TypeData::AbstractFloat => true,
            TypeData::Vector { elem, .. } | TypeData::Matrix { elem, .. } => {
                self.is_constructible(elem)
            }
            TypeData::Array { elem, count, .. } => {
                matches!(count, ArrayCount::Constant(_)) && self.is_constructible(elem)
            }
            TypeData::Struct(id) => {
                let members: Vec<TypeId> =
                    self.struct_decl(id).members.iter().map(|m| m.ty).collect();
                members.into_iter().all(|m| self.is_constructible(m))
            }
            TypeData::Atomic { .. }
            | TypeData::Pointer { .. }
            | TypeData::Reference { .. }
            | TypeData::Sampler { .. }
            | TypeData::Texture { .. }
            | TypeData::Void => false,
        }
    }

    /// Implicit-conversion rank from `from` to `to`; `None` when no implicit
    /// conversion exists. Lower ranks are preferred conversions.
    pub fn conversion_rank(&self, from: TypeId, to: TypeId) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        match (self.data(from), self.data(to)) {
            (TypeData::AbstractFloat, TypeData::F32) => Some(1),
            (TypeData::AbstractFloat, TypeData::F16) => Some(2),
            (TypeData::AbstractInt, TypeData::I32) => Some(3),
            (TypeData::AbstractInt, TypeData::U32) => Some(4),
            (TypeData::AbstractInt, TypeData::AbstractFloat) => Some(5),
            (TypeData::AbstractInt, TypeData::F32) => Some(6),
            (TypeData::AbstractInt, TypeData::F16) => Some(7),
            (
                TypeData::Vector { elem: fe, width: fw },
                TypeData::Vector { elem: te, width: tw },
            ) if fw == tw => self.conversion_rank(fe, te),
            (
                TypeData::Matrix {
                    columns: fc,
                    rows: fr,
                    elem: fe,
                },
                TypeData::Matrix {
                    columns: tc,
                    rows: tr,
                    elem: te,
                },
            ) if fc == tc && fr == tr => self.conversion_rank(fe, te),
            (
                TypeData::Array {
                    elem: fe,
                    count: fcount,
                    ..
                },
                TypeData::Array {
                    elem: te,
                    count: tcount,
                    ..
                },
            ) if fcount == tcount => self.conversion_rank(fe, te),
            _ => None,
        }
    }

    // Layout arithmetic.

    /// Natural alignment in bytes.
    pub fn align_of(&self, ty: TypeId) -> u32 {
        match self.data(ty) {
            TypeData::Bool
            | TypeData::I32
            | TypeData::U32
            | TypeData::F32
            | TypeData::AbstractInt
            | TypeData::AbstractFloat => 4,
            TypeData::F16 => 2,
            TypeData::Atomic { inner } => self.align_of(inner),
            TypeData::Vector { elem, width } => match width {
                2 => 2 * self.align_of(elem),
                _ => 4 * self.align_of(elem),
            },
            TypeData::Matrix { rows, elem, .. } => match rows {
                2 => 2 * self.align_of(elem),
                _ => 4 * self.align_of(elem),
            },
            TypeData::Array { elem, .. } => self.align_of(elem),
            TypeData::Struct(id) => self.struct_decl(id).align,
            // Not laid out in memory; only reachable through diagnostics paths.
            TypeData::Pointer { .. }
            | TypeData::Reference { .. }
            | TypeData::Sampler { .. }
            | TypeData::Texture { .. }
            | TypeData::Void => 1,
        }
    }

    /// Natural size in bytes. Runtime- and override-sized arrays report one
    /// element stride.
    pub fn size_of(&self, ty: TypeId) -> u32 {
        match self.data(ty) {
            TypeData::Bool
            | TypeData::I32
            | TypeData::U32
            | TypeData::F32
            | TypeData::AbstractInt
            | TypeData::AbstractFloat => 4,
            TypeData::F16 => 2,
            TypeData::Atomic { inner } => self.size_of(inner),
            TypeData::Vector { elem, width } => width * self.size_of(elem),
            TypeData::Matrix {
                columns,
                rows,
                elem,
            } => {
                let col_align = match rows {
                    2 => 2 * self.align_of(elem),
                    _ => 4 * self.align_of(elem),
                };
                let col_size = rows * self.size_of(elem);
                columns * round_up(col_align, col_size)
            }
            TypeData::Array { count, .. } => {
                let stride = self.array_stride(ty);
                match count {
                    ArrayCount::Constant(n) => n * stride,
                    ArrayCount::Runtime | ArrayCount::Override => stride,
                }
            }
            TypeData::Struct(id) => self.struct_decl(id).size,
            TypeData::Pointer { .. }
            | TypeData::Reference { .. }
            | TypeData::Sampler { .. }
            | TypeData::Texture { .. }
            | TypeData::Void => 0,
        }
    }

    /// Element stride of an array type: the explicit stride if the resolver
    /// applied one, otherwise the natural stride.
    pub fn array_stride(&self, ty: TypeId) -> u32 {
        match self.data(ty) {
            TypeData::Array { elem, stride, .. } => {
                stride.unwrap_or_else(|| round_up(self.align_of(elem), self.size_of(elem)))
            }
            _ => crate::ice!("array_stride queried on non-array type"),
        }
    }

    /// Human-readable type name as it would appear in source.
    pub fn friendly_name(&self, ty: TypeId) -> String {
        match self.data(ty) {
            TypeData::Bool => "bool".to_string(),
            TypeData::I32 => "i32".to_string(),
            TypeData::U32 => "u32".to_string(),
            TypeData::F32 => "f32".to_string(),
            TypeData::F16 => "f16".to_string(),
            TypeData::AbstractInt => "abstract-int".to_string(),
            TypeData::AbstractFloat => "abstract-float".to_string(),
            TypeData::Atomic { inner } => format!("atomic<{}>", self.friendly_name(inner)),
            TypeData::Vector { elem, width } => {
                format!("vec{}<{}>", width, self.friendly_name(elem))
            }
            TypeData::Matrix {
                columns,
                rows,
                elem,
            } => format!("mat{}x{}<{}>", columns, rows, self.friendly_name(elem)),
            TypeData::Array { elem, count, .. } => match count {
                ArrayCount::Constant(n) => format!("array<{}, {}>", self.friendly_name(elem), n),
                ArrayCount::Runtime => format!("array<{}>", self.friendly_name(elem)),
                ArrayCount::Override => format!("array<{}, override>", self.friendly_name(elem)),
            },
            TypeData::Struct(id) => self.struct_decl(id).name.to_string(),
            TypeData::Pointer {
                store,
                space,
                access,
            } => format!("ptr<{}, {}, {}>", space, self.friendly_name(store), access),
            TypeData::Reference {
                store,
                space,
                access,
            } => format!("ref<{}, {}, {}>", space, self.friendly_name(store), access),
            TypeData::Sampler { comparison } => if comparison {
                "sampler_comparison"
            } else {
                "sampler"
            }
            .to_string(),
            TypeData::Texture { dim } => match dim {
                TextureDimension::D1 => "texture_1d",
                TextureDimension::D2 => "texture_2d",
                TextureDimension::D2Array => "texture_2d_array",
                TextureDimension::D3 => "texture_3d",
                TextureDimension::Cube => "texture_cube",
            }
            .to_string(),
            TypeData::Void => "void".to_string(),
        }
    }

    /// Render a struct's layout the way layout diagnostics quote it.
    pub fn struct_layout_string(&self, id: StructId) -> String {
        let decl = self.struct_decl(id);
        let mut out = format!(
            "/*            align({:2}) size({:4}) */ struct {} {{\n",
            decl.align, decl.size, decl.name
        );
        for member in &decl.members {
            out.push_str(&format!(
                "/* offset({:4}) align({:2}) size({:4}) */   {} : {},\n",
                member.offset,
                member.align,
                member.size,
                member.name,
                self.friendly_name(member.ty)
            ));
        }
        out.push_str("/*                                 */ };");
        out
    }
}

/// Round `value` up to the next multiple of `alignment`.
pub const fn round_up(alignment: u32, value: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}
