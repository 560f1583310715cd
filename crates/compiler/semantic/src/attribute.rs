//! Attributes attached to declarations by the resolver.
//!
//! Attribute kinds form a closed enum; validators dispatch over them with
//! exhaustive matches rather than downcasting.

use crate::Span;
use smallvec::SmallVec;
use std::fmt;

/// A resolved attribute with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub span: Span,
}

impl Attribute {
    pub const fn new(kind: AttributeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Attribute list as stored on declarations and struct members.
pub type AttributeList = SmallVec<[Attribute; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Builtin(BuiltinValue),
    Location(u32),
    Index(u32),
    Color(u32),
    Interpolate {
        ty: InterpolationType,
        sampling: Option<InterpolationSampling>,
    },
    Invariant,
    Group(u32),
    Binding(u32),
    Id(u16),
    Align(u32),
    Size(u32),
    WorkgroupSize(u32, u32, u32),
    MustUse,
}

impl AttributeKind {
    /// The attribute name as written in source, without the leading `@`.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Builtin(_) => "builtin",
            Self::Location(_) => "location",
            Self::Index(_) => "index",
            Self::Color(_) => "color",
            Self::Interpolate { .. } => "interpolate",
            Self::Invariant => "invariant",
            Self::Group(_) => "group",
            Self::Binding(_) => "binding",
            Self::Id(_) => "id",
            Self::Align(_) => "align",
            Self::Size(_) => "size",
            Self::WorkgroupSize(..) => "workgroup_size",
            Self::MustUse => "must_use",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// Pipeline-provided values bound via `@builtin(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinValue {
    Position,
    FragDepth,
    FrontFacing,
    GlobalInvocationId,
    LocalInvocationId,
    LocalInvocationIndex,
    NumWorkgroups,
    WorkgroupId,
    VertexIndex,
    InstanceIndex,
    SampleIndex,
    SampleMask,
    SubgroupInvocationId,
    SubgroupSize,
}

impl fmt::Display for BuiltinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Position => "position",
            Self::FragDepth => "frag_depth",
            Self::FrontFacing => "front_facing",
            Self::GlobalInvocationId => "global_invocation_id",
            Self::LocalInvocationId => "local_invocation_id",
            Self::LocalInvocationIndex => "local_invocation_index",
            Self::NumWorkgroups => "num_workgroups",
            Self::WorkgroupId => "workgroup_id",
            Self::VertexIndex => "vertex_index",
            Self::InstanceIndex => "instance_index",
            Self::SampleIndex => "sample_index",
            Self::SampleMask => "sample_mask",
            Self::SubgroupInvocationId => "subgroup_invocation_id",
            Self::SubgroupSize => "subgroup_size",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationType {
    Perspective,
    Linear,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationSampling {
    Center,
    Centroid,
    Sample,
    First,
    Either,
}

/// Find the value of a `@location` attribute, if present.
pub fn location_of(attrs: &[Attribute]) -> Option<u32> {
    attrs.iter().find_map(|a| match a.kind {
        AttributeKind::Location(value) => Some(value),
        _ => None,
    })
}

/// Find the value of an `@index` attribute, if present.
pub fn index_of(attrs: &[Attribute]) -> Option<u32> {
    attrs.iter().find_map(|a| match a.kind {
        AttributeKind::Index(value) => Some(value),
        _ => None,
    })
}

/// Find the value of a `@color` attribute, if present.
pub fn color_of(attrs: &[Attribute]) -> Option<u32> {
    attrs.iter().find_map(|a| match a.kind {
        AttributeKind::Color(value) => Some(value),
        _ => None,
    })
}

/// Find the `@builtin` attribute, if present.
pub fn builtin_of(attrs: &[Attribute]) -> Option<(BuiltinValue, Span)> {
    attrs.iter().find_map(|a| match a.kind {
        AttributeKind::Builtin(value) => Some((value, a.span)),
        _ => None,
    })
}
