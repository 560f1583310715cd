//! Statement validation: control-flow placement, conditions, switches,
//! assignments, and increment/decrement.
//!
//! Placement rules walk the statement parent chain iteratively; the chain is
//! finite and acyclic by construction, so the walks are bounded.

use crate::expression::ExpressionId;
use crate::module::{DeclRef, FunctionId};
use crate::statement::{CaseSelector, StatementId, StatementKind};
use crate::types::{Access, TypeData};
use crate::validation::Validator;
use lumen_compiler_diagnostics::{DiagnosticCode, FilterableRule};
use rustc_hash::FxHashMap;

pub(crate) const MAX_SWITCH_CASE_SELECTORS: usize = 16383;

impl Validator<'_> {
    /// Validate a statement and everything nested beneath it.
    pub(crate) fn validate_statement(&mut self, id: StatementId, function: FunctionId) -> bool {
        let module = self.module();
        let stmt = module.statement(id);
        match &stmt.kind {
            StatementKind::Block(stmts) | StatementKind::Continuing(stmts) => {
                self.check_reachability(stmts);
                let mut ok = true;
                for &s in stmts {
                    ok &= self.validate_statement(s, function);
                }
                ok
            }
            StatementKind::VarDecl { local, initializer } => {
                let mut ok = true;
                if let Some(init) = *initializer {
                    ok &= self.validate_value_expression(init);
                }
                ok && self.validate_local_decl(*local, *initializer)
            }
            StatementKind::Loop { body, continuing } => {
                let mut ok = self.validate_statement(*body, function);
                if let Some(continuing) = *continuing {
                    ok &= self.validate_statement(continuing, function);
                }
                ok
            }
            StatementKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let mut ok = true;
                if let Some(init) = *init {
                    ok &= self.validate_statement(init, function);
                }
                if let Some(condition) = *condition {
                    ok &= self.check_condition(condition, "for-loop condition must be bool");
                }
                ok &= self.validate_statement(*body, function);
                if let Some(step) = *step {
                    ok &= self.validate_statement(step, function);
                }
                ok
            }
            StatementKind::While { condition, body } => {
                let ok = self.check_condition(*condition, "while condition must be bool");
                ok & self.validate_statement(*body, function)
            }
            StatementKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let mut ok = self.check_condition(*condition, "if statement condition must be bool");
                ok &= self.validate_statement(*then_block, function);
                if let Some(else_block) = *else_block {
                    ok &= self.validate_statement(else_block, function);
                }
                ok
            }
            StatementKind::Switch { .. } => self.validate_switch(id, function),
            StatementKind::Case { body, .. } => self.validate_statement(*body, function),
            StatementKind::Break => self.validate_break(id),
            StatementKind::BreakIf { condition } => self.validate_break_if(id, *condition),
            StatementKind::Continue => self.validate_continue(id),
            StatementKind::Return { value } => self.validate_return(id, *value, function),
            StatementKind::Assign { lhs, rhs, .. } => self.validate_assignment(id, *lhs, *rhs),
            StatementKind::IncrementDecrement { lhs, increment } => {
                self.validate_increment_decrement(id, *lhs, *increment)
            }
            StatementKind::Call(expr) => self.validate_call_statement(*expr),
            StatementKind::Discard => true,
        }
    }

    /// Report the first unreachable statement of a block through the
    /// `unreachable_code` severity filter.
    fn check_reachability(&mut self, stmts: &[StatementId]) {
        let module = self.module();
        for &s in stmts {
            let stmt = module.statement(s);
            if !stmt.reachable {
                self.add_filterable(
                    FilterableRule::UnreachableCode,
                    "code is unreachable",
                    stmt.span,
                );
                break;
            }
        }
    }

    fn check_condition(&mut self, condition: ExpressionId, message_prefix: &str) -> bool {
        let module = self.module();
        let types = self.types();
        let cond_ty = types.unwrap_ref(module.expression(condition).ty);
        if types.data(cond_ty) != TypeData::Bool {
            self.error(
                DiagnosticCode::NonBooleanCondition,
                format!("{message_prefix}, got {}", types.friendly_name(cond_ty)),
                module.expression(condition).span,
            );
            return false;
        }
        self.validate_value_expression(condition)
    }

    /// Nearest enclosing continuing block, walking the parent chain from
    /// `from` inclusive. With `stop_at_loop` the walk stops at the nearest
    /// loop boundary.
    fn closest_continuing(&self, stop_at_loop: bool, from: StatementId) -> Option<StatementId> {
        let module = self.module();
        let mut current = Some(from);
        while let Some(id) = current {
            let stmt = module.statement(id);
            if stop_at_loop && stmt.kind.is_loop() {
                break;
            }
            if matches!(stmt.kind, StatementKind::Continuing(_)) {
                return Some(id);
            }
            current = stmt.parent;
        }
        None
    }

    fn validate_break(&mut self, id: StatementId) -> bool {
        let module = self.module();

        let mut in_breakable = false;
        let mut current = module.statement(id).parent;
        while let Some(ancestor) = current {
            let stmt = module.statement(ancestor);
            if matches!(stmt.kind, StatementKind::Case { .. }) || stmt.kind.is_loop() {
                in_breakable = true;
                break;
            }
            current = stmt.parent;
        }
        if !in_breakable {
            self.error(
                DiagnosticCode::InvalidBreak,
                "break statement must be in a loop or switch case",
                module.statement(id).span,
            );
            return false;
        }

        if self.closest_continuing(true, id).is_some() {
            self.error(
                DiagnosticCode::InvalidBreak,
                "`break` must not be used to exit from a continuing block. Use `break-if` \
                 instead.",
                module.statement(id).span,
            );
            return false;
        }

        true
    }

    fn validate_continue(&mut self, id: StatementId) -> bool {
        let module = self.module();
        let stmt = module.statement(id);

        if let Some(continuing) = self.closest_continuing(true, id) {
            self.error(
                DiagnosticCode::InvalidContinue,
                "continuing blocks must not contain a continue statement",
                stmt.span,
            );
            if continuing != id && Some(continuing) != stmt.parent {
                self.note_last(
                    module.statement(continuing).span,
                    "see continuing block here",
                );
            }
            return false;
        }

        let mut current = stmt.parent;
        while let Some(ancestor) = current {
            let ancestor_stmt = module.statement(ancestor);
            if ancestor_stmt.kind.is_loop() {
                return true;
            }
            current = ancestor_stmt.parent;
        }

        self.error(
            DiagnosticCode::InvalidContinue,
            "continue statement must be in a loop",
            stmt.span,
        );
        false
    }

    fn validate_break_if(&mut self, id: StatementId, condition: ExpressionId) -> bool {
        let module = self.module();
        let types = self.types();

        let cond_ty = types.unwrap_ref(module.expression(condition).ty);
        if types.data(cond_ty) != TypeData::Bool {
            self.error(
                DiagnosticCode::NonBooleanCondition,
                format!(
                    "break-if statement condition must be bool, got {}",
                    types.friendly_name(cond_ty)
                ),
                module.expression(condition).span,
            );
            return false;
        }

        let mut current = Some(id);
        while let Some(ancestor) = current {
            let stmt = module.statement(ancestor);
            if stmt.kind.is_loop() {
                break;
            }
            if let StatementKind::Continuing(stmts) = &stmt.kind {
                if stmts.last() != Some(&id) {
                    self.error(
                        DiagnosticCode::InvalidBreakIf,
                        "break-if must be the last statement in a continuing block",
                        module.statement(id).span,
                    );
                    self.note_last(stmt.span, "see continuing block here");
                    return false;
                }
                return true;
            }
            current = stmt.parent;
        }

        self.error(
            DiagnosticCode::InvalidBreakIf,
            "break-if must be in a continuing block",
            module.statement(id).span,
        );
        false
    }

    fn validate_return(
        &mut self,
        id: StatementId,
        value: Option<ExpressionId>,
        function: FunctionId,
    ) -> bool {
        let module = self.module();
        let types = self.types();
        let stmt = module.statement(id);
        let func = module.function(function);

        let matches_signature = match value {
            Some(value) => types.unwrap_ref(module.expression(value).ty) == func.return_type,
            None => types.is_void(func.return_type),
        };
        if !matches_signature {
            let returned = value
                .map(|v| self.type_name(module.expression(v).ty))
                .unwrap_or_else(|| "void".to_string());
            self.error(
                DiagnosticCode::TypeMismatch,
                format!(
                    "return statement type must match its function return type, returned \
                     '{}', expected '{}'",
                    returned,
                    types.friendly_name(func.return_type)
                ),
                stmt.span,
            );
            return false;
        }

        if let Some(continuing) = self.closest_continuing(false, id) {
            self.error(
                DiagnosticCode::MisplacedReturn,
                "continuing blocks must not contain a return statement",
                stmt.span,
            );
            if continuing != id && Some(continuing) != stmt.parent {
                self.note_last(
                    module.statement(continuing).span,
                    "see continuing block here",
                );
            }
            return false;
        }

        if let Some(value) = value {
            return self.validate_value_expression(value);
        }
        true
    }

    fn validate_switch(&mut self, id: StatementId, function: FunctionId) -> bool {
        let module = self.module();
        let types = self.types();
        let stmt = module.statement(id);
        let StatementKind::Switch { selector, cases } = &stmt.kind else {
            crate::ice!("validate_switch called on a non-switch statement");
        };

        let selector_count: usize = cases
            .iter()
            .map(|&case| match &module.statement(case).kind {
                StatementKind::Case { selectors, .. } => selectors.len(),
                _ => crate::ice!("switch contains a non-case statement"),
            })
            .sum();
        if selector_count > MAX_SWITCH_CASE_SELECTORS {
            self.error(
                DiagnosticCode::TooManySwitchCases,
                format!(
                    "switch statement has {selector_count} case selectors, max is \
                     {MAX_SWITCH_CASE_SELECTORS}"
                ),
                stmt.span,
            );
            return false;
        }

        let cond_ty = types.unwrap_ref(module.expression(*selector).ty);
        if !types.is_integer_scalar(cond_ty) {
            self.error(
                DiagnosticCode::InvalidSwitchSelector,
                "switch statement selector expression must be of a scalar integer type",
                module.expression(*selector).span,
            );
            return false;
        }

        let mut default_span = None;
        let mut seen: FxHashMap<u32, crate::Span> = FxHashMap::default();
        for &case in cases {
            let StatementKind::Case { selectors, .. } = &module.statement(case).kind else {
                crate::ice!("switch contains a non-case statement");
            };
            for sel in selectors {
                match sel {
                    CaseSelector::Default(span) => {
                        if let Some(previous) = default_span {
                            self.error(
                                DiagnosticCode::DuplicateSwitchDefault,
                                "switch statement must have exactly one default clause",
                                *span,
                            );
                            self.note_last(previous, "previous default case");
                            return false;
                        }
                        default_span = Some(*span);
                    }
                    CaseSelector::Value { value, ty, span } => {
                        if *ty != cond_ty {
                            self.error(
                                DiagnosticCode::TypeMismatch,
                                "the case selector values must have the same type as the \
                                 selector expression.",
                                *span,
                            );
                            return false;
                        }
                        let Some(bits) = value.as_u32_bits() else {
                            crate::ice!("switch case selector has no integer constant value");
                        };
                        if let Some(&previous) = seen.get(&bits) {
                            let shown = if types.is_signed_integer_scalar(cond_ty) {
                                (bits as i32).to_string()
                            } else {
                                bits.to_string()
                            };
                            self.error(
                                DiagnosticCode::DuplicateSwitchCase,
                                format!("duplicate switch case '{shown}'"),
                                *span,
                            );
                            self.note_last(previous, "previous case declared here");
                            return false;
                        }
                        seen.insert(bits, *span);
                    }
                }
            }
        }

        if default_span.is_none() {
            self.error(
                DiagnosticCode::MissingSwitchDefault,
                "switch statement must have a default clause",
                stmt.span,
            );
            return false;
        }

        let mut ok = true;
        for &case in cases {
            ok &= self.validate_statement(case, function);
        }
        ok
    }

    fn validate_assignment(
        &mut self,
        id: StatementId,
        lhs: ExpressionId,
        rhs: ExpressionId,
    ) -> bool {
        let module = self.module();
        let types = self.types();
        let stmt = module.statement(id);
        let lhs_expr = module.expression(lhs);
        let rhs_expr = module.expression(rhs);

        if !self.validate_value_expression(rhs) {
            return false;
        }

        if matches!(lhs_expr.kind, crate::expression::ExpressionKind::Phony) {
            // Phony assignment: the right side only has to produce a usable
            // value.
            let ty = types.unwrap_ref(rhs_expr.ty);
            let acceptable = types.is_constructible(ty)
                || types.is_abstract(ty)
                || matches!(
                    types.data(ty),
                    TypeData::Pointer { .. } | TypeData::Texture { .. } | TypeData::Sampler { .. }
                );
            if !acceptable {
                self.error(
                    DiagnosticCode::NotAssignable,
                    format!(
                        "cannot assign '{}' to '_'. '_' can only be assigned a constructible, \
                         pointer, texture or sampler type",
                        self.type_name(rhs_expr.ty)
                    ),
                    rhs_expr.span,
                );
                return false;
            }
            return true;
        }

        let TypeData::Reference { store, access, .. } = types.data(lhs_expr.ty) else {
            // LHS has no storage.
            self.error(
                DiagnosticCode::NotAssignable,
                format!(
                    "cannot assign to value of type '{}'",
                    self.raw_type_name(lhs_expr.ty)
                ),
                lhs_expr.span,
            );
            if let Some(root) = lhs_expr.root {
                let immutable = match self.module().decl_kind_name(root) {
                    "let" => Some("'let' variables are immutable"),
                    "const" => Some("'const' variables are immutable"),
                    "override" => Some("'override' variables are immutable"),
                    "parameter" => Some("parameters are immutable"),
                    _ => None,
                };
                if let Some(note) = immutable {
                    self.note_last(lhs_expr.span, note);
                    self.note_last(
                        self.module().decl_span(root),
                        format!("'{}' is declared here", self.module().decl_name(root)),
                    );
                }
            }
            return false;
        };

        let value_ty = types.unwrap_ref(rhs_expr.ty);
        if store != value_ty {
            self.error(
                DiagnosticCode::TypeMismatch,
                format!(
                    "cannot assign '{}' to '{}'",
                    self.type_name(rhs_expr.ty),
                    self.type_name(lhs_expr.ty)
                ),
                stmt.span,
            );
            return false;
        }

        if !types.is_constructible(store) {
            self.error(
                DiagnosticCode::NonConstructibleType,
                "storage type of assignment must be constructible",
                stmt.span,
            );
            return false;
        }

        if access == Access::Read {
            self.error(
                DiagnosticCode::ReadOnlyAccess,
                format!(
                    "cannot store into a read-only type '{}'",
                    self.raw_type_name(lhs_expr.ty)
                ),
                stmt.span,
            );
            return false;
        }

        true
    }

    fn validate_increment_decrement(
        &mut self,
        id: StatementId,
        lhs: ExpressionId,
        increment: bool,
    ) -> bool {
        let module = self.module();
        let types = self.types();
        let stmt = module.statement(id);
        let lhs_expr = module.expression(lhs);

        if let Some(root) = lhs_expr.root {
            let message = match root {
                DeclRef::Param { .. } => Some("cannot modify function parameter"),
                _ => match module.decl_kind_name(root) {
                    "let" => Some("cannot modify 'let'"),
                    "override" => Some("cannot modify 'override'"),
                    _ => None,
                },
            };
            if let Some(message) = message {
                self.error(DiagnosticCode::InvalidIncrementTarget, message, lhs_expr.span);
                self.note_last(
                    module.decl_span(root),
                    format!("'{}' is declared here:", module.decl_name(root)),
                );
                return false;
            }
        }

        let TypeData::Reference { store, access, .. } = types.data(lhs_expr.ty) else {
            self.error(
                DiagnosticCode::InvalidIncrementTarget,
                format!(
                    "cannot modify value of type '{}'",
                    self.type_name(lhs_expr.ty)
                ),
                lhs_expr.span,
            );
            return false;
        };

        if !types.is_integer_scalar(store) {
            let kind = if increment { "increment" } else { "decrement" };
            self.error(
                DiagnosticCode::InvalidIncrementTarget,
                format!("{kind} statement can only be applied to an integer scalar"),
                lhs_expr.span,
            );
            return false;
        }

        if access == Access::Read {
            self.error(
                DiagnosticCode::ReadOnlyAccess,
                format!(
                    "cannot modify read-only type '{}'",
                    self.raw_type_name(lhs_expr.ty)
                ),
                stmt.span,
            );
            return false;
        }

        true
    }
}
