//! # Lumen Semantic Validation
//!
//! This crate validates a resolved Lumen shading-language module: the upstream
//! resolver has already parsed the source, inferred expression types, computed
//! memory layouts, and attached attributes; the validator enforces every
//! remaining well-formedness rule before the module is handed to code
//! generation.
//!
//! ## Architecture
//!
//! The crate splits into two halves:
//!
//! 1. **The resolved-module IR** ([`module`], [`types`], [`statement`],
//!    [`expression`], [`attribute`], [`builtins`], [`extensions`]): the
//!    read-only data model the resolver produces and the validator consumes.
//!    Statements carry explicit parent links so placement rules are iterative
//!    ancestor walks; expressions carry their resolved type, evaluation stage,
//!    and constant value.
//! 2. **The validator** ([`validation`]): one pass over the module,
//!    accumulating diagnostics into a
//!    [`lumen_compiler_diagnostics::DiagnosticCollection`]. Individual rule
//!    checks short-circuit on failure, but independent declarations and entry
//!    points are each validated so one pass surfaces unrelated errors
//!    together.

pub mod attribute;
pub mod builtins;
pub mod expression;
pub mod extensions;
pub mod module;
pub mod predicates;
pub mod statement;
pub mod types;
pub mod validation;

/// Source span type shared with the diagnostics crate.
pub type Span = chumsky::span::SimpleSpan<usize>;

pub use attribute::{Attribute, AttributeKind, BuiltinValue, InterpolationSampling, InterpolationType};
pub use builtins::BuiltinFn;
pub use expression::{ConstValue, EvaluationStage, Expression, ExpressionId, ExpressionKind};
pub use extensions::{Extensions, LanguageFeatures};
pub use module::{
    BindingPoint, DeclRef, Function, FunctionId, GlobalId, GlobalKind, GlobalVariable, IoDirection,
    LocalId, LocalKind, LocalVariable, Parameter, PipelineStage, SemanticModule, TypeAlias,
};
pub use statement::{CaseSelector, Statement, StatementId, StatementKind};
pub use types::{
    Access, AddressSpace, ArrayCount, StructId, StructMember, StructType, TextureDimension, TypeData,
    TypeId, TypeRegistry,
};
pub use validation::Validator;

/// Abort on an upstream-resolver contract violation.
///
/// These are not user-facing diagnostics: reaching one of these sites means
/// the resolver handed the validator a module that breaks its own invariants,
/// so the process aborts rather than producing misleading errors.
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {
        panic!("internal compiler error: {}", format_args!($($arg)*))
    };
}
