//! # Diagnostic Severity Filters
//!
//! A small set of validation rules is *filterable*: module-level pragmas can
//! raise, lower, or silence their severity. The filter table maps each
//! filterable rule to its effective severity for the current module; the
//! validator seeds it with the language defaults at construction and the
//! (external) pragma machinery updates it per lexical scope.

use crate::{DiagnosticCode, DiagnosticSeverity};
use rustc_hash::FxHashMap;
use std::fmt;

/// Rules whose severity can be reconfigured per module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterableRule {
    DerivativeUniformity,
    UnreachableCode,
}

impl FilterableRule {
    pub const fn code(self) -> DiagnosticCode {
        match self {
            Self::DerivativeUniformity => DiagnosticCode::DerivativeUniformity,
            Self::UnreachableCode => DiagnosticCode::UnreachableCode,
        }
    }

    /// The rule name as it appears in module pragmas.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DerivativeUniformity => "derivative_uniformity",
            Self::UnreachableCode => "unreachable_code",
        }
    }
}

impl fmt::Display for FilterableRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Effective severity for a filterable rule. `Off` suppresses the rule
/// entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterSeverity {
    Off,
    Note,
    Warning,
    Error,
}

impl FilterSeverity {
    /// Map to a diagnostic severity; `None` means the rule is silenced.
    pub const fn as_severity(self) -> Option<DiagnosticSeverity> {
        match self {
            Self::Off => None,
            Self::Note => Some(DiagnosticSeverity::Note),
            Self::Warning => Some(DiagnosticSeverity::Warning),
            Self::Error => Some(DiagnosticSeverity::Error),
        }
    }
}

/// Per-module mapping from filterable rule to effective severity.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticFilterMap {
    severities: FxHashMap<FilterableRule, FilterSeverity>,
}

impl DiagnosticFilterMap {
    /// An empty table. Rules without an entry fall back to [`Self::get`]'s
    /// per-rule default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Language-default severities: derivative uniformity violations reject
    /// the module, unreachable code only warns.
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        map.set(FilterableRule::DerivativeUniformity, FilterSeverity::Error);
        map.set(FilterableRule::UnreachableCode, FilterSeverity::Warning);
        map
    }

    /// Override the severity of a rule, replacing any earlier entry.
    pub fn set(&mut self, rule: FilterableRule, severity: FilterSeverity) {
        self.severities.insert(rule, severity);
    }

    pub fn get(&self, rule: FilterableRule) -> FilterSeverity {
        self.severities
            .get(&rule)
            .copied()
            .unwrap_or(match rule {
                FilterableRule::DerivativeUniformity => FilterSeverity::Error,
                FilterableRule::UnreachableCode => FilterSeverity::Warning,
            })
    }
}
