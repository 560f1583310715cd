//! Function-call, builtin-call, and constructor validation.

use crate::builtins::{BuiltinFn, ParamUsage};
use crate::expression::{ExpressionId, ExpressionKind};
use crate::extensions::LanguageFeatures;
use crate::types::{ArrayCount, TypeData};
use crate::validation::Validator;
use lumen_compiler_diagnostics::{DiagnosticCode, FilterableRule};

impl Validator<'_> {
    /// Validate a call used as its own statement, where any result value is
    /// dropped.
    pub(crate) fn validate_call_statement(&mut self, expr: ExpressionId) -> bool {
        let module = self.module();
        let e = module.expression(expr);
        match &e.kind {
            ExpressionKind::FunctionCall { target, .. } => {
                if !self.validate_function_call(expr, true, false) {
                    return false;
                }
                let callee = module.function(*target);
                if callee.must_use() {
                    self.error(
                        DiagnosticCode::UnusedResult,
                        format!(
                            "ignoring return value of function '{}' annotated with @must_use",
                            callee.name
                        ),
                        e.span,
                    );
                    self.note_last(callee.span, format!("'{}' declared here", callee.name));
                    return false;
                }
                true
            }
            ExpressionKind::BuiltinCall { builtin, .. } => {
                if !self.validate_builtin_call(expr, true) {
                    return false;
                }
                if builtin.must_use() {
                    self.error(
                        DiagnosticCode::UnusedResult,
                        format!("ignoring return value of builtin '{builtin}'"),
                        e.span,
                    );
                    return false;
                }
                true
            }
            ExpressionKind::Constructor { .. } => {
                if !self.validate_constructor(expr) {
                    return false;
                }
                self.error(
                    DiagnosticCode::UnusedResult,
                    "value constructor evaluated but not used",
                    e.span,
                );
                false
            }
            ExpressionKind::Conversion { .. } => {
                self.error(
                    DiagnosticCode::UnusedResult,
                    "value conversion evaluated but not used",
                    e.span,
                );
                false
            }
            _ => crate::ice!("call statement does not wrap a call expression"),
        }
    }

    /// Validate an expression used for its value, recursing into call and
    /// constructor arguments.
    pub(crate) fn validate_value_expression(&mut self, expr: ExpressionId) -> bool {
        match &self.module().expression(expr).kind {
            ExpressionKind::FunctionCall { .. } => self.validate_function_call(expr, false, false),
            ExpressionKind::BuiltinCall { .. } => self.validate_builtin_call(expr, false),
            ExpressionKind::Constructor { .. } => self.validate_constructor(expr),
            ExpressionKind::Conversion { arg } => self.validate_value_expression(*arg),
            _ => true,
        }
    }

    /// Validate an expression appearing in a module-scope initializer, where
    /// user-defined functions must not be called.
    pub(crate) fn validate_module_scope_expression(&mut self, expr: ExpressionId) -> bool {
        match &self.module().expression(expr).kind {
            ExpressionKind::FunctionCall { .. } => self.validate_function_call(expr, false, true),
            ExpressionKind::BuiltinCall { .. } => self.validate_builtin_call(expr, false),
            ExpressionKind::Constructor { .. } => self.validate_constructor(expr),
            ExpressionKind::Conversion { arg } => self.validate_module_scope_expression(*arg),
            _ => true,
        }
    }

    fn validate_function_call(
        &mut self,
        expr: ExpressionId,
        as_statement: bool,
        at_module_scope: bool,
    ) -> bool {
        let module = self.module();
        let types = self.types();
        let e = module.expression(expr);
        let ExpressionKind::FunctionCall { target, args } = &e.kind else {
            crate::ice!("validate_function_call called on a non-call expression");
        };
        let callee = module.function(*target);

        if at_module_scope {
            self.error(
                DiagnosticCode::ModuleScopeCall,
                "functions cannot be called at module-scope",
                e.span,
            );
            return false;
        }

        if callee.is_entry_point() {
            // An entry point must never be the target of a function call.
            self.error(
                DiagnosticCode::CallToEntryPoint,
                "entry point functions cannot be the target of a function call",
                e.span,
            );
            return false;
        }

        if args.len() != callee.params.len() {
            let more = args.len() > callee.params.len();
            self.error(
                DiagnosticCode::ArgumentCountMismatch,
                format!(
                    "too {} arguments in call to '{}', expected {}, got {}",
                    if more { "many" } else { "few" },
                    callee.name,
                    callee.params.len(),
                    args.len()
                ),
                e.span,
            );
            return false;
        }

        let unrestricted = module
            .allowed_features
            .contains(LanguageFeatures::UNRESTRICTED_POINTER_PARAMETERS);

        for (i, (&arg, param)) in args.iter().zip(&callee.params).enumerate() {
            let arg_expr = module.expression(arg);
            let arg_ty = types.unwrap_ref(arg_expr.ty);

            if arg_ty != param.ty {
                self.error(
                    DiagnosticCode::ArgumentTypeMismatch,
                    format!(
                        "type mismatch for argument {} in call to '{}', expected '{}', got '{}'",
                        i + 1,
                        callee.name,
                        types.friendly_name(param.ty),
                        types.friendly_name(arg_ty)
                    ),
                    arg_expr.span,
                );
                return false;
            }

            if matches!(types.data(param.ty), TypeData::Pointer { .. }) {
                if !unrestricted {
                    // Each pointer argument must have the same memory view as
                    // its root identifier; comparing store types is enough
                    // since the views match iff the store types do.
                    let arg_store = match types.data(arg_ty) {
                        TypeData::Pointer { store, .. } => store,
                        _ => arg_ty,
                    };
                    if let Some(root) = arg_expr.root {
                        if module.decl_store_type(root) != arg_store {
                            self.error(
                                DiagnosticCode::PointerAliasing,
                                "arguments of pointer type must not point to a subset of the \
                                 originating variable",
                                arg_expr.span,
                            );
                            return false;
                        }
                    }
                }
            }
        }

        if types.is_void(callee.return_type) && !as_statement {
            // A call to a void function must be a call statement.
            self.error(
                DiagnosticCode::VoidValueUsed,
                format!("function '{}' does not return a value", callee.name),
                e.span,
            );
            return false;
        }

        let mut ok = true;
        for &arg in args {
            ok &= self.validate_value_expression(arg);
        }
        ok
    }

    fn validate_builtin_call(&mut self, expr: ExpressionId, as_statement: bool) -> bool {
        let module = self.module();
        let types = self.types();
        let e = module.expression(expr);
        let ExpressionKind::BuiltinCall {
            builtin,
            args,
            non_uniform,
        } = &e.kind
        else {
            crate::ice!("validate_builtin_call called on a non-builtin expression");
        };
        let builtin = *builtin;

        if let Some(extension) = builtin.required_extension() {
            if !module.enabled_extensions.contains(extension) {
                self.error(
                    DiagnosticCode::RequiresExtension,
                    format!(
                        "cannot call built-in function '{builtin}' without extension {}",
                        extension.name()
                    ),
                    e.span,
                );
                return false;
            }
        }

        if !builtin.returns_value() && !as_statement {
            self.error(
                DiagnosticCode::VoidValueUsed,
                format!("builtin function '{builtin}' does not return a value"),
                e.span,
            );
            return false;
        }

        for (i, usage) in builtin.param_usages().iter().enumerate() {
            let Some(&arg) = args.get(i) else {
                break;
            };
            let ok = match usage {
                ParamUsage::Offset => self.check_const_range(arg, "offset", -8, 7),
                ParamUsage::Component => self.check_const_range(arg, "component", 0, 3),
                ParamUsage::SourceLaneIndex => {
                    if module.expression(arg).constant.is_none() {
                        self.error(
                            DiagnosticCode::NonConstArgument,
                            "the sourceLaneIndex argument of subgroupBroadcast must be a \
                             const-expression",
                            module.expression(arg).span,
                        );
                        false
                    } else {
                        true
                    }
                }
                ParamUsage::Pointer if builtin == BuiltinFn::WorkgroupUniformLoad => {
                    let arg_expr = module.expression(arg);
                    let store = match types.data(types.unwrap_ref(arg_expr.ty)) {
                        TypeData::Pointer { store, .. } => store,
                        _ => crate::ice!("workgroupUniformLoad argument is not a pointer"),
                    };
                    let contains_atomic = matches!(types.data(store), TypeData::Atomic { .. })
                        || module.atomic_composites.contains_key(&store);
                    if contains_atomic {
                        self.error(
                            DiagnosticCode::AtomicInWorkgroupLoad,
                            "workgroupUniformLoad must not be called with an argument that \
                             contains an atomic type",
                            arg_expr.span,
                        );
                        false
                    } else {
                        true
                    }
                }
                _ => true,
            };
            if !ok {
                return false;
            }
        }

        if builtin.is_derivative() && *non_uniform {
            if !self.add_filterable(
                FilterableRule::DerivativeUniformity,
                format!("'{builtin}' must only be called from uniform control flow"),
                e.span,
            ) {
                return false;
            }
        }

        let mut ok = true;
        for &arg in args {
            ok &= self.validate_value_expression(arg);
        }
        ok
    }

    /// Const-expression range check for offset/component-style arguments,
    /// applied per component for vector arguments.
    fn check_const_range(&mut self, arg: ExpressionId, name: &str, min: i64, max: i64) -> bool {
        let module = self.module();
        let arg_expr = module.expression(arg);
        let Some(constant) = &arg_expr.constant else {
            self.error(
                DiagnosticCode::NonConstArgument,
                format!("the {name} argument must be a const-expression"),
                arg_expr.span,
            );
            return false;
        };
        let Some(components) = constant.int_components() else {
            crate::ice!("{name} argument constant is not an integer value");
        };
        let is_vector = matches!(constant, crate::expression::ConstValue::IntVec(_));
        for (i, &value) in components.iter().enumerate() {
            if value < min || value > max {
                let message = if is_vector {
                    format!(
                        "each component of the {name} argument must be at least {min} and at \
                         most {max}. {name} component {i} is {value}"
                    )
                } else {
                    format!(
                        "the {name} argument must be at least {min} and at most {max}. {name} \
                         is {value}"
                    )
                };
                self.error(DiagnosticCode::ArgumentOutOfRange, message, arg_expr.span);
                return false;
            }
        }
        true
    }

    /// Validate an array or structure value constructor.
    pub(crate) fn validate_constructor(&mut self, expr: ExpressionId) -> bool {
        let module = self.module();
        let types = self.types();
        let e = module.expression(expr);
        let ExpressionKind::Constructor { args } = &e.kind else {
            crate::ice!("validate_constructor called on a non-constructor expression");
        };
        let ty = types.unwrap_ref(e.ty);

        let ok = match types.data(ty) {
            TypeData::Struct(struct_id) => {
                let decl = types.struct_decl(struct_id);

                if !types.is_constructible(ty) {
                    self.error(
                        DiagnosticCode::NonConstructibleType,
                        "structure constructor has non-constructible type",
                        e.span,
                    );
                    return false;
                }

                if !args.is_empty() {
                    if args.len() != decl.members.len() {
                        let fm = if args.len() < decl.members.len() {
                            "few"
                        } else {
                            "many"
                        };
                        self.error(
                            DiagnosticCode::ConstructorArity,
                            format!(
                                "structure constructor has too {} inputs: expected {}, found {}",
                                fm,
                                decl.members.len(),
                                args.len()
                            ),
                            e.span,
                        );
                        return false;
                    }
                    for (member, &arg) in decl.members.iter().zip(args) {
                        let value_ty = types.unwrap_ref(module.expression(arg).ty);
                        if member.ty != value_ty
                            && types.conversion_rank(value_ty, member.ty).is_none()
                        {
                            self.error(
                                DiagnosticCode::TypeMismatch,
                                format!(
                                    "type in structure constructor does not match struct member \
                                     type: expected '{}', found '{}'",
                                    types.friendly_name(member.ty),
                                    types.friendly_name(value_ty)
                                ),
                                module.expression(arg).span,
                            );
                            return false;
                        }
                    }
                }
                true
            }
            TypeData::Array { elem, count, .. } => {
                for &arg in args {
                    let value_ty = types.unwrap_ref(module.expression(arg).ty);
                    if types.conversion_rank(value_ty, elem).is_none() {
                        self.error(
                            DiagnosticCode::InvalidConstructor,
                            format!(
                                "'{}' cannot be used to construct an array of '{}'",
                                types.friendly_name(value_ty),
                                types.friendly_name(elem)
                            ),
                            module.expression(arg).span,
                        );
                        return false;
                    }
                }

                match count {
                    ArrayCount::Runtime => {
                        self.error(
                            DiagnosticCode::InvalidConstructor,
                            "cannot construct a runtime-sized array",
                            e.span,
                        );
                        return false;
                    }
                    ArrayCount::Override => {
                        self.error(
                            DiagnosticCode::InvalidConstructor,
                            "cannot construct an array that has an override-expression count",
                            e.span,
                        );
                        return false;
                    }
                    ArrayCount::Constant(count) => {
                        if !types.is_constructible(elem) {
                            self.error(
                                DiagnosticCode::InvalidConstructor,
                                "array constructor has non-constructible element type",
                                e.span,
                            );
                            return false;
                        }
                        if !args.is_empty() && args.len() != count as usize {
                            let fm = if args.len() < count as usize {
                                "few"
                            } else {
                                "many"
                            };
                            self.error(
                                DiagnosticCode::ConstructorArity,
                                format!(
                                    "array constructor has too {} elements: expected {}, found {}",
                                    fm,
                                    count,
                                    args.len()
                                ),
                                e.span,
                            );
                            return false;
                        }
                    }
                }
                true
            }
            // Vector and matrix constructors are checked by the resolver's
            // intrinsic tables.
            _ => true,
        };

        if !ok {
            return false;
        }

        let mut args_ok = true;
        for &arg in args {
            args_ok &= self.validate_value_expression(arg);
        }
        args_ok
    }
}
