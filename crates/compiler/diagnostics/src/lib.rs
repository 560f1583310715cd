//! # Diagnostics for the Lumen compiler
//!
//! Shared diagnostic infrastructure used by the semantic validator: the
//! [`Diagnostic`] data model with source spans and related notes, the stable
//! [`DiagnosticCode`] rule tags, the per-module severity [`filter`] table for
//! filterable rules, and `ariadne`-based terminal rendering.

pub mod diagnostics;
pub mod filter;
pub mod reporting;

pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection, DiagnosticSeverity};
pub use filter::{DiagnosticFilterMap, FilterSeverity, FilterableRule};
pub use reporting::build_diagnostic_message;
