//! Built-in functions registry and helpers.
//!
//! The validator does not check builtin overload resolution (the resolver's
//! intrinsic table does); it consults this registry for the per-builtin facts
//! the remaining rules need: supported pipeline stages, result handling,
//! argument usages with const-expression constraints, and gating extensions.

use crate::extensions::Extensions;
use crate::module::PipelineStage;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFn {
    Dpdx,
    Dpdy,
    Fwidth,
    TextureSample,
    TextureSampleLevel,
    TextureGather,
    WorkgroupBarrier,
    StorageBarrier,
    WorkgroupUniformLoad,
    SubgroupBroadcast,
    SubgroupBallot,
    AtomicLoad,
    AtomicStore,
    Select,
    Min,
}

/// Role a builtin argument plays, driving const-expression constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUsage {
    Value,
    /// Texel offset; each component must be a const-expression in [-8, 7].
    Offset,
    /// Gather component; must be a const-expression in [0, 3].
    Component,
    /// Subgroup lane index; must be a const-expression.
    SourceLaneIndex,
    /// Pointer into a memory view.
    Pointer,
}

const ALL_STAGES: &[PipelineStage] = &[
    PipelineStage::Vertex,
    PipelineStage::Fragment,
    PipelineStage::Compute,
];
const FRAGMENT_ONLY: &[PipelineStage] = &[PipelineStage::Fragment];
const COMPUTE_ONLY: &[PipelineStage] = &[PipelineStage::Compute];

impl BuiltinFn {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dpdx => "dpdx",
            Self::Dpdy => "dpdy",
            Self::Fwidth => "fwidth",
            Self::TextureSample => "textureSample",
            Self::TextureSampleLevel => "textureSampleLevel",
            Self::TextureGather => "textureGather",
            Self::WorkgroupBarrier => "workgroupBarrier",
            Self::StorageBarrier => "storageBarrier",
            Self::WorkgroupUniformLoad => "workgroupUniformLoad",
            Self::SubgroupBroadcast => "subgroupBroadcast",
            Self::SubgroupBallot => "subgroupBallot",
            Self::AtomicLoad => "atomicLoad",
            Self::AtomicStore => "atomicStore",
            Self::Select => "select",
            Self::Min => "min",
        }
    }

    /// Pipeline stages this builtin may be called from, directly or
    /// transitively.
    pub const fn supported_stages(self) -> &'static [PipelineStage] {
        match self {
            Self::Dpdx | Self::Dpdy | Self::Fwidth | Self::TextureSample => FRAGMENT_ONLY,
            Self::WorkgroupBarrier
            | Self::StorageBarrier
            | Self::WorkgroupUniformLoad
            | Self::SubgroupBroadcast
            | Self::SubgroupBallot => COMPUTE_ONLY,
            _ => ALL_STAGES,
        }
    }

    pub fn supports_stage(self, stage: PipelineStage) -> bool {
        self.supported_stages().contains(&stage)
    }

    /// Whether the builtin produces a value.
    pub const fn returns_value(self) -> bool {
        !matches!(
            self,
            Self::WorkgroupBarrier | Self::StorageBarrier | Self::AtomicStore
        )
    }

    /// Whether discarding the builtin's result in a call statement is an
    /// error.
    pub const fn must_use(self) -> bool {
        self.returns_value()
    }

    /// Per-argument usages, aligned with the call's argument list. Trailing
    /// optional arguments (texel offsets) may be absent from a call.
    pub const fn param_usages(self) -> &'static [ParamUsage] {
        use ParamUsage::*;
        match self {
            Self::TextureSample => &[Value, Value, Value, Offset],
            Self::TextureSampleLevel => &[Value, Value, Value, Value, Offset],
            Self::TextureGather => &[Component, Value, Value, Value, Offset],
            Self::WorkgroupUniformLoad => &[Pointer],
            Self::SubgroupBroadcast => &[Value, SourceLaneIndex],
            Self::AtomicLoad => &[Pointer],
            Self::AtomicStore => &[Pointer, Value],
            _ => &[],
        }
    }

    /// Extension that must be enabled before this builtin can be called.
    pub const fn required_extension(self) -> Option<Extensions> {
        match self {
            Self::SubgroupBroadcast | Self::SubgroupBallot => Some(Extensions::SUBGROUPS),
            _ => None,
        }
    }

    /// Derivative builtins are subject to the uniformity analysis.
    pub const fn is_derivative(self) -> bool {
        matches!(self, Self::Dpdx | Self::Dpdy | Self::Fwidth)
    }
}

impl fmt::Display for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
