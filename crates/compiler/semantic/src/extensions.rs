//! Enabled extensions and allowed language features.
//!
//! Negotiation happens upstream; the validator only consults the resulting
//! sets when a rule is gated on an extension or feature.

use bitflags::bitflags;

bitflags! {
    /// Extensions enabled for the module being validated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Extensions: u32 {
        const F16 = 1 << 0;
        const PUSH_CONSTANT = 1 << 1;
        const FRAMEBUFFER_FETCH = 1 << 2;
        const DUAL_SOURCE_BLENDING = 1 << 3;
        const SUBGROUPS = 1 << 4;
        const RELAXED_UNIFORM_LAYOUT = 1 << 5;
        const PIXEL_LOCAL = 1 << 6;
    }
}

impl Extensions {
    /// The extension name as written in an `enable` directive. Only valid for
    /// single-flag values.
    pub fn name(self) -> &'static str {
        if self == Self::F16 {
            "f16"
        } else if self == Self::PUSH_CONSTANT {
            "push_constant"
        } else if self == Self::FRAMEBUFFER_FETCH {
            "framebuffer_fetch"
        } else if self == Self::DUAL_SOURCE_BLENDING {
            "dual_source_blending"
        } else if self == Self::SUBGROUPS {
            "subgroups"
        } else if self == Self::RELAXED_UNIFORM_LAYOUT {
            "relaxed_uniform_layout"
        } else if self == Self::PIXEL_LOCAL {
            "pixel_local"
        } else {
            "<extension set>"
        }
    }
}

bitflags! {
    /// Language features the environment allows without an `enable`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LanguageFeatures: u32 {
        const UNRESTRICTED_POINTER_PARAMETERS = 1 << 0;
    }
}

impl LanguageFeatures {
    pub fn name(self) -> &'static str {
        if self == Self::UNRESTRICTED_POINTER_PARAMETERS {
            "unrestricted_pointer_parameters"
        } else {
            "<feature set>"
        }
    }
}
