//! Cross-function propagation checks.
//!
//! For each entry point and every function it transitively calls: address
//! spaces of referenced globals must be usable by the entry point's stage,
//! directly called builtins must support the stage, and `discard` may only be
//! reached from fragment entry points. A separate walk rejects more than one
//! reachable `push_constant` or `pixel_local` variable per entry point.
//!
//! Failing checks backtrace the call chain with "called by" notes; the chain
//! search is an explicit breadth-first walk over the resolver's direct-call
//! edges, so deep call graphs cannot overflow the stack.

use crate::module::{FunctionId, GlobalId};
use crate::types::AddressSpace;
use crate::validation::Validator;
use lumen_compiler_diagnostics::DiagnosticCode;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

impl Validator<'_> {
    /// Per-entry-point stage compatibility over the transitive call graph.
    /// Entry points are independent: a failure in one does not stop the next.
    pub(crate) fn validate_pipeline_stages(&mut self) -> bool {
        let module = self.module();
        let mut ok = true;
        for entry_point in module.entry_points() {
            ok &= self.check_entry_point_stage_rules(entry_point);
        }
        ok
    }

    fn check_entry_point_stage_rules(&mut self, entry_point: FunctionId) -> bool {
        let module = self.module();
        if !self.check_stage_rules(entry_point, entry_point) {
            return false;
        }
        for &callee in &module.function(entry_point).transitively_called_functions {
            if !self.check_stage_rules(callee, entry_point) {
                return false;
            }
        }
        true
    }

    fn check_stage_rules(&mut self, function: FunctionId, entry_point: FunctionId) -> bool {
        let module = self.module();
        let func = module.function(function);
        let stage = module
            .function(entry_point)
            .stage
            .unwrap_or_else(|| crate::ice!("stage rules checked for a non-entry-point"));

        for &(global_id, use_span) in &func.directly_referenced_globals {
            let var = module.global(global_id);
            let incompatible = (var.address_space == AddressSpace::Workgroup
                && stage != crate::module::PipelineStage::Compute)
                || (var.address_space == AddressSpace::PixelLocal
                    && stage != crate::module::PipelineStage::Fragment);
            if incompatible {
                self.error(
                    DiagnosticCode::AddressSpaceStageMismatch,
                    format!(
                        "var with '{}' address space cannot be used by {} pipeline stage",
                        var.address_space, stage
                    ),
                    use_span,
                );
                self.note_last(var.span, "variable is declared here");
                self.backtrace(function, entry_point);
                return false;
            }
        }

        for &(builtin, call_span) in &func.directly_called_builtins {
            if !builtin.supports_stage(stage) {
                self.error(
                    DiagnosticCode::BuiltinStageMismatch,
                    format!("built-in cannot be used by {stage} pipeline stage"),
                    call_span,
                );
                self.backtrace(function, entry_point);
                return false;
            }
        }

        if stage != crate::module::PipelineStage::Fragment {
            if let Some(discard_span) = func.discard {
                self.error(
                    DiagnosticCode::MisplacedDiscard,
                    format!("discard statement cannot be used in {stage} pipeline stage"),
                    discard_span,
                );
                self.backtrace(function, entry_point);
                return false;
            }
        }

        true
    }

    /// At most one `push_constant` and one `pixel_local` module-scope
    /// variable may be reachable from any one entry point.
    pub(crate) fn validate_module_scope_var_usages(&mut self) -> bool {
        let module = self.module();
        let mut ok = true;
        for entry_point in module.entry_points() {
            ok &= self.check_single_var_of_space(entry_point, AddressSpace::PushConstant);
            ok &= self.check_single_var_of_space(entry_point, AddressSpace::PixelLocal);
        }
        ok
    }

    fn check_single_var_of_space(
        &mut self,
        entry_point: FunctionId,
        space: AddressSpace,
    ) -> bool {
        let module = self.module();
        let ep = module.function(entry_point);

        let mut functions = vec![entry_point];
        functions.extend(ep.transitively_called_functions.iter().copied());

        let mut seen: Option<(GlobalId, FunctionId)> = None;
        for function in functions {
            for &(global_id, _) in &module.function(function).directly_referenced_globals {
                let var = module.global(global_id);
                if var.address_space != space || seen.map(|(g, _)| g) == Some(global_id) {
                    continue;
                }
                let Some((seen_var, seen_func)) = seen else {
                    seen = Some((global_id, function));
                    continue;
                };

                self.error(
                    DiagnosticCode::DuplicatePipelineResource,
                    format!(
                        "entry point '{}' uses two different '{}' variables.",
                        ep.name, space
                    ),
                    ep.span,
                );
                self.note_last(
                    var.span,
                    format!("first '{space}' variable declaration is here"),
                );
                if function != entry_point {
                    self.call_chain_notes(function, entry_point);
                }
                self.note_last(
                    module.global(seen_var).span,
                    format!("second '{space}' variable declaration is here"),
                );
                if seen_func != entry_point {
                    self.call_chain_notes(seen_func, entry_point);
                }
                return false;
            }
        }

        true
    }

    /// Append "called by" notes from `function` up to `entry_point`.
    fn backtrace(&mut self, function: FunctionId, entry_point: FunctionId) {
        if function != entry_point {
            self.call_chain_notes(function, entry_point);
        }
    }

    fn call_chain_notes(&mut self, function: FunctionId, entry_point: FunctionId) {
        let module = self.module();
        let path = self.find_call_path(entry_point, function);
        // path runs entry point -> ... -> function; note the callers from the
        // offending function upwards.
        for &caller in path[..path.len() - 1].iter().skip(1).rev() {
            let f = module.function(caller);
            self.note_last(f.span, format!("called by function '{}'", f.name));
        }
        let ep = module.function(entry_point);
        self.note_last(ep.span, format!("called by entry point '{}'", ep.name));
    }

    /// Breadth-first search over direct-call edges for the path from `from`
    /// to `to`.
    fn find_call_path(&self, from: FunctionId, to: FunctionId) -> Vec<FunctionId> {
        let module = self.module();
        let mut visited = FxHashSet::default();
        let mut predecessor: FxHashMap<FunctionId, FunctionId> = FxHashMap::default();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![to];
                let mut node = to;
                while let Some(&prev) = predecessor.get(&node) {
                    path.push(prev);
                    node = prev;
                }
                path.reverse();
                return path;
            }
            for &callee in &module.function(current).directly_called_functions {
                if visited.insert(callee) {
                    predecessor.insert(callee, current);
                    queue.push_back(callee);
                }
            }
        }

        crate::ice!("call-graph backtrace target is not reachable from the entry point")
    }
}
