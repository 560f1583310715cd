//! # Semantic Validation
//!
//! One validator instance processes exactly one resolved module in one pass.
//! The validator owns its layout memo set, diagnostic filter table, and
//! diagnostic collection for the duration of the pass and discards them
//! afterwards; nothing persists across compilations and the module itself is
//! never mutated.
//!
//! Rule functions return `bool` and short-circuit on failure, but the
//! module-level driver keeps going: every struct, global, function, and entry
//! point is visited even when an earlier one failed, so a single run surfaces
//! unrelated diagnostics together.

pub mod attributes;
pub mod calls;
pub mod declarations;
pub mod entry_point;
pub mod functions;
pub mod layout;
pub mod pipeline;
pub mod statements;

use crate::module::{GlobalId, GlobalKind, SemanticModule};
use crate::types::{AddressSpace, TypeId, TypeRegistry};
use crate::Span;
use indexmap::IndexMap;
use lumen_compiler_diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticCollection, DiagnosticFilterMap, DiagnosticSeverity,
    FilterSeverity, FilterableRule,
};
use rustc_hash::FxHashSet;

/// Semantic validator for one resolved module.
pub struct Validator<'m> {
    module: &'m SemanticModule,
    diagnostics: DiagnosticCollection,
    filters: DiagnosticFilterMap,
    /// (type, address space) pairs whose layout has already been checked;
    /// each pair is validated at most once per pass.
    validated_layouts: FxHashSet<(TypeId, AddressSpace)>,
    /// Module-wide registry of override ids, first declaration wins.
    override_ids: IndexMap<u16, GlobalId>,
}

impl<'m> Validator<'m> {
    pub fn new(module: &'m SemanticModule) -> Self {
        Self {
            module,
            diagnostics: DiagnosticCollection::new(),
            filters: DiagnosticFilterMap::with_defaults(),
            validated_layouts: FxHashSet::default(),
            override_ids: IndexMap::new(),
        }
    }

    /// Apply a module-pragma severity override for a filterable rule.
    pub fn set_filter(&mut self, rule: FilterableRule, severity: FilterSeverity) {
        self.filters.set(rule, severity);
    }

    /// Validate the whole module and return the accumulated diagnostics.
    pub fn validate_module(mut self) -> DiagnosticCollection {
        let _span = tracing::trace_span!("validate_module").entered();
        let module = self.module;

        self.collect_override_ids();

        for struct_id in module.types.struct_ids() {
            self.validate_struct(struct_id, None);
        }
        for alias in &module.aliases {
            self.validate_alias(alias);
        }
        for (id, _) in module.globals.iter_enumerated() {
            self.validate_global(id);
        }
        for (id, _) in module.functions.iter_enumerated() {
            self.validate_function(id);
        }

        tracing::debug!(
            diagnostics = self.diagnostics.len(),
            "declaration validation finished"
        );

        self.validate_pipeline_stages();
        self.validate_module_scope_var_usages();

        self.diagnostics
    }

    fn collect_override_ids(&mut self) {
        for (id, global) in self.module.globals.iter_enumerated() {
            if let GlobalKind::Override {
                id: Some(override_id),
            } = global.kind
            {
                self.override_ids.entry(override_id).or_insert(id);
            }
        }
    }

    pub(crate) fn module(&self) -> &'m SemanticModule {
        self.module
    }

    pub(crate) fn types(&self) -> &'m TypeRegistry {
        &self.module.types
    }

    pub(crate) fn first_override_with_id(&self, id: u16) -> Option<GlobalId> {
        self.override_ids.get(&id).copied()
    }

    pub(crate) fn layout_already_checked(&mut self, ty: TypeId, space: AddressSpace) -> bool {
        !self.validated_layouts.insert((ty, space))
    }

    /// Store-type name with the implicit reference load applied.
    pub(crate) fn type_name(&self, ty: TypeId) -> String {
        let types = self.types();
        types.friendly_name(types.unwrap_ref(ty))
    }

    /// Type name without unwrapping references.
    pub(crate) fn raw_type_name(&self, ty: TypeId) -> String {
        self.types().friendly_name(ty)
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn error(&mut self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::error(code, message).with_location(span));
    }

    /// Attach a follow-up note to the diagnostic emitted last.
    pub(crate) fn note_last(&mut self, span: Span, message: impl Into<String>) {
        if let Some(last) = self.diagnostics.last_mut() {
            last.notes.push((span, message.into()));
        }
    }

    /// Emit a diagnostic through the severity filter table. Returns `false`
    /// iff the effective severity is `Error`.
    pub(crate) fn add_filterable(
        &mut self,
        rule: FilterableRule,
        message: impl Into<String>,
        span: Span,
    ) -> bool {
        match self.filters.get(rule).as_severity() {
            None => true,
            Some(severity) => {
                self.push(Diagnostic::new(severity, rule.code(), message).with_location(span));
                severity != DiagnosticSeverity::Error
            }
        }
    }
}

/// Validate a module with default severity filters.
pub fn validate_module(module: &SemanticModule) -> DiagnosticCollection {
    Validator::new(module).validate_module()
}
