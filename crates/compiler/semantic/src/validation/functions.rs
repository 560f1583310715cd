//! Function declaration validation.

use crate::attribute::AttributeKind;
use crate::module::{FunctionId, PipelineStage};
use crate::validation::Validator;
use lumen_compiler_diagnostics::DiagnosticCode;

pub(crate) const MAX_FUNCTION_PARAMETERS: usize = 255;

impl Validator<'_> {
    pub(crate) fn validate_function(&mut self, function_id: FunctionId) -> bool {
        let module = self.module();
        let types = self.types();
        let func = module.function(function_id);

        for attr in &func.attributes {
            match attr.kind {
                AttributeKind::WorkgroupSize(..) => {
                    if func.stage != Some(PipelineStage::Compute) {
                        self.error(
                            DiagnosticCode::MisplacedAttribute,
                            "@workgroup_size is only valid for compute stages",
                            attr.span,
                        );
                        return false;
                    }
                }
                AttributeKind::MustUse => {
                    if types.is_void(func.return_type) {
                        self.error(
                            DiagnosticCode::MisplacedAttribute,
                            "@must_use can only be applied to functions that return a value",
                            attr.span,
                        );
                        return false;
                    }
                }
                _ => {}
            }
        }

        if func.params.len() > MAX_FUNCTION_PARAMETERS {
            self.error(
                DiagnosticCode::TooManyParameters,
                format!(
                    "function declares {} parameters, maximum is {}",
                    func.params.len(),
                    MAX_FUNCTION_PARAMETERS
                ),
                func.span,
            );
            return false;
        }

        for index in 0..func.params.len() {
            if !self.validate_parameter(function_id, index) {
                return false;
            }
        }

        if !types.is_void(func.return_type) {
            if !types.is_constructible(func.return_type) {
                self.error(
                    DiagnosticCode::NonConstructibleType,
                    "function return type must be a constructible type",
                    func.span,
                );
                return false;
            }

            if func.body.is_some() && func.falls_through {
                self.error(
                    DiagnosticCode::MissingReturn,
                    "missing return at end of function",
                    func.span,
                );
                return false;
            }
        }

        let mut ok = true;
        if let Some(body) = func.body {
            ok &= self.validate_statement(body, function_id);
        }

        if func.is_entry_point() {
            ok &= self.validate_entry_point(function_id);
        }

        ok
    }
}
