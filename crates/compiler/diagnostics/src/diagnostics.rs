//! # Diagnostic Data Model
//!
//! Diagnostics produced by semantic validation: a severity, a stable rule
//! code, a primary source span, and an ordered list of related notes
//! (secondary spans with their own messages, e.g. "first resource binding
//! usage declared here").

use ariadne::ReportKind;
use chumsky::span::SimpleSpan;
use std::fmt;

/// A diagnostic message from semantic validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: DiagnosticCode,
    pub message: String,
    /// Source span where this diagnostic applies.
    pub span: SimpleSpan<usize>,
    /// Related spans with context messages, in emission order.
    pub notes: Vec<(SimpleSpan<usize>, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Note,
}

impl From<DiagnosticSeverity> for ReportKind<'static> {
    fn from(severity: DiagnosticSeverity) -> Self {
        match severity {
            DiagnosticSeverity::Error => ReportKind::Error,
            DiagnosticSeverity::Warning => ReportKind::Warning,
            DiagnosticSeverity::Note => ReportKind::Advice,
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Note => write!(f, "note"),
        }
    }
}

/// Stable rule tags for every diagnostic the validator can emit.
///
/// Codes are grouped by category in the thousands; the groups mirror the
/// validator's error taxonomy: structural (1000s), type (2000s), layout
/// (3000s), stage (4000s), control flow (5000s), call (6000s). Filterable
/// rules (7000s) have configurable severity, see [`crate::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Structural errors (1000-1999)
    MissingAddressSpace,
    MissingResourceBinding,
    UnexpectedResourceBinding,
    DuplicateOverrideId,
    EmptyStruct,
    MisplacedRuntimeArray,
    OverrideSizedArrayUsage,
    ConflictingPipelineIo,
    MissingPipelineIo,
    DuplicateBuiltin,
    DuplicateLocation,
    DuplicateColor,
    NestedEntryPointIo,
    MissingVertexPosition,
    MissingWorkgroupSize,
    BindingCollision,
    InvalidIndexPairing,
    MisplacedAttribute,
    TooManyParameters,
    InvalidAddressSpace,

    // Type errors (2000-2999)
    TypeMismatch,
    NonConstructibleType,
    InvalidStoreType,
    InvalidBuiltinType,
    InvalidAttributeTarget,
    NonBooleanCondition,
    InvalidSwitchSelector,
    ConstructorArity,
    InvalidConstructor,
    InvalidAtomicUsage,
    NotAssignable,
    ReadOnlyAccess,
    InvalidIncrementTarget,
    InvalidInitializer,
    InvalidAccessMode,

    // Layout errors (3000-3999)
    InvalidMemberOffset,
    InvalidUniformSpacing,
    InvalidArrayStride,
    InvalidAlignmentAttribute,
    UnsupportedLayout,

    // Stage errors (4000-4999)
    StageMismatch,
    AddressSpaceStageMismatch,
    BuiltinStageMismatch,
    MisplacedDiscard,
    RequiresExtension,
    RequiresLanguageFeature,
    DuplicatePipelineResource,

    // Control-flow errors (5000-5999)
    InvalidBreak,
    InvalidContinue,
    InvalidBreakIf,
    MisplacedReturn,
    MissingReturn,
    MissingSwitchDefault,
    DuplicateSwitchDefault,
    DuplicateSwitchCase,
    TooManySwitchCases,

    // Call errors (6000-6999)
    ArgumentCountMismatch,
    ArgumentTypeMismatch,
    PointerAliasing,
    CallToEntryPoint,
    ModuleScopeCall,
    UnusedResult,
    VoidValueUsed,
    NonConstArgument,
    ArgumentOutOfRange,
    AtomicInWorkgroupLoad,

    // Filterable rules (7000-7999)
    DerivativeUniformity,
    UnreachableCode,
}

impl From<DiagnosticCode> for u32 {
    fn from(code: DiagnosticCode) -> Self {
        match code {
            DiagnosticCode::MissingAddressSpace => 1001,
            DiagnosticCode::MissingResourceBinding => 1002,
            DiagnosticCode::UnexpectedResourceBinding => 1003,
            DiagnosticCode::DuplicateOverrideId => 1004,
            DiagnosticCode::EmptyStruct => 1005,
            DiagnosticCode::MisplacedRuntimeArray => 1006,
            DiagnosticCode::OverrideSizedArrayUsage => 1007,
            DiagnosticCode::ConflictingPipelineIo => 1008,
            DiagnosticCode::MissingPipelineIo => 1009,
            DiagnosticCode::DuplicateBuiltin => 1010,
            DiagnosticCode::DuplicateLocation => 1011,
            DiagnosticCode::DuplicateColor => 1012,
            DiagnosticCode::NestedEntryPointIo => 1013,
            DiagnosticCode::MissingVertexPosition => 1014,
            DiagnosticCode::MissingWorkgroupSize => 1015,
            DiagnosticCode::BindingCollision => 1016,
            DiagnosticCode::InvalidIndexPairing => 1017,
            DiagnosticCode::MisplacedAttribute => 1018,
            DiagnosticCode::TooManyParameters => 1019,
            DiagnosticCode::InvalidAddressSpace => 1020,
            DiagnosticCode::TypeMismatch => 2001,
            DiagnosticCode::NonConstructibleType => 2002,
            DiagnosticCode::InvalidStoreType => 2003,
            DiagnosticCode::InvalidBuiltinType => 2004,
            DiagnosticCode::InvalidAttributeTarget => 2005,
            DiagnosticCode::NonBooleanCondition => 2006,
            DiagnosticCode::InvalidSwitchSelector => 2007,
            DiagnosticCode::ConstructorArity => 2008,
            DiagnosticCode::InvalidConstructor => 2009,
            DiagnosticCode::InvalidAtomicUsage => 2010,
            DiagnosticCode::NotAssignable => 2011,
            DiagnosticCode::ReadOnlyAccess => 2012,
            DiagnosticCode::InvalidIncrementTarget => 2013,
            DiagnosticCode::InvalidInitializer => 2014,
            DiagnosticCode::InvalidAccessMode => 2015,
            DiagnosticCode::InvalidMemberOffset => 3001,
            DiagnosticCode::InvalidUniformSpacing => 3002,
            DiagnosticCode::InvalidArrayStride => 3003,
            DiagnosticCode::InvalidAlignmentAttribute => 3004,
            DiagnosticCode::UnsupportedLayout => 3005,
            DiagnosticCode::StageMismatch => 4001,
            DiagnosticCode::AddressSpaceStageMismatch => 4002,
            DiagnosticCode::BuiltinStageMismatch => 4003,
            DiagnosticCode::MisplacedDiscard => 4004,
            DiagnosticCode::RequiresExtension => 4005,
            DiagnosticCode::RequiresLanguageFeature => 4006,
            DiagnosticCode::DuplicatePipelineResource => 4007,
            DiagnosticCode::InvalidBreak => 5001,
            DiagnosticCode::InvalidContinue => 5002,
            DiagnosticCode::InvalidBreakIf => 5003,
            DiagnosticCode::MisplacedReturn => 5004,
            DiagnosticCode::MissingReturn => 5005,
            DiagnosticCode::MissingSwitchDefault => 5006,
            DiagnosticCode::DuplicateSwitchDefault => 5007,
            DiagnosticCode::DuplicateSwitchCase => 5008,
            DiagnosticCode::TooManySwitchCases => 5009,
            DiagnosticCode::ArgumentCountMismatch => 6001,
            DiagnosticCode::ArgumentTypeMismatch => 6002,
            DiagnosticCode::PointerAliasing => 6003,
            DiagnosticCode::CallToEntryPoint => 6004,
            DiagnosticCode::ModuleScopeCall => 6005,
            DiagnosticCode::UnusedResult => 6006,
            DiagnosticCode::VoidValueUsed => 6007,
            DiagnosticCode::NonConstArgument => 6008,
            DiagnosticCode::ArgumentOutOfRange => 6009,
            DiagnosticCode::AtomicInWorkgroupLoad => 6010,
            DiagnosticCode::DerivativeUniformity => 7001,
            DiagnosticCode::UnreachableCode => 7002,
        }
    }
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, code, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, code, message)
    }

    /// Create a standalone note diagnostic.
    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Note, code, message)
    }

    pub fn new(
        severity: DiagnosticSeverity,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span: SimpleSpan::from(0..0),
            notes: Vec::new(),
        }
    }

    /// Attach the primary source span.
    pub const fn with_location(mut self, span: SimpleSpan<usize>) -> Self {
        self.span = span;
        self
    }

    /// Attach a related note with its own span, preserving emission order.
    pub fn with_note(mut self, span: SimpleSpan<usize>, message: impl Into<String>) -> Self {
        self.notes.push((span, message.into()));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        write!(f, " (at {}:{})", self.span.start, self.span.end)?;
        for (span, message) in &self.notes {
            write!(f, "\n  note: {} (at {}:{})", message, span.start, span.end)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics from one validation pass.
///
/// Diagnostics are appended, never removed; emission order is preserved so a
/// pass over an unchanged module reproduces an identical sequence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// All diagnostics in emission order.
    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The most recently emitted diagnostic, for attaching follow-up notes.
    pub fn last_mut(&mut self) -> Option<&mut Diagnostic> {
        self.diagnostics.last_mut()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// True iff the validated module is acceptable for code generation.
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub const fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn summary(&self) -> String {
        let errors = self.errors().count();
        let warnings = self.warnings().count();
        if self.diagnostics.is_empty() {
            "no issues found".to_string()
        } else {
            format!("{errors} errors, {warnings} warnings")
        }
    }
}

impl From<Vec<Diagnostic>> for DiagnosticCollection {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl IntoIterator for DiagnosticCollection {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
