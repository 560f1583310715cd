//! Resolved value expressions.
//!
//! The resolver reduces every expression to the facts validation needs: its
//! type (a reference type when the expression denotes a place), the earliest
//! pipeline phase at which it can be evaluated, its constant value when one
//! exists, and the root identifier it drills into for place and pointer
//! expressions.

use crate::builtins::BuiltinFn;
use crate::module::{DeclRef, FunctionId};
use crate::types::TypeId;
use crate::Span;
use index_vec::define_index_type;

define_index_type! {
    pub struct ExpressionId = u32;
}

/// Earliest phase at which an expression's value is known. The order is
/// significant: a constraint of "override-expression or earlier" is
/// `stage <= EvaluationStage::Override`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EvaluationStage {
    Constant,
    Override,
    Runtime,
    NotEvaluated,
}

/// A constant value attached to a const-expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i64),
    Uint(u32),
    Float(f64),
    /// Integer vector, one entry per component.
    IntVec(Vec<i64>),
}

impl ConstValue {
    /// Scalar integer components, splatting scalars to a single entry.
    pub fn int_components(&self) -> Option<Vec<i64>> {
        match self {
            Self::Int(v) => Some(vec![*v]),
            Self::Uint(v) => Some(vec![i64::from(*v)]),
            Self::IntVec(vs) => Some(vs.clone()),
            _ => None,
        }
    }

    /// The value reinterpreted as an unsigned 32-bit word, the way switch
    /// case selectors are compared.
    pub fn as_u32_bits(&self) -> Option<u32> {
        match self {
            Self::Int(v) => Some(*v as u32),
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// The `_` placeholder on the left of a phony assignment.
    Phony,
    /// A direct use of a declared variable or parameter.
    Use(DeclRef),
    FunctionCall {
        target: FunctionId,
        args: Vec<ExpressionId>,
    },
    BuiltinCall {
        builtin: BuiltinFn,
        args: Vec<ExpressionId>,
        /// Set by the uniformity analysis when this call sits in
        /// non-uniform control flow.
        non_uniform: bool,
    },
    /// Array, struct, vector, or matrix value constructor; the constructed
    /// type is the expression's type.
    Constructor { args: Vec<ExpressionId> },
    /// Value conversion, e.g. `f32(x)`.
    Conversion { arg: ExpressionId },
    /// Any other resolved value expression.
    Value,
}

#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Resolved type; a [`crate::types::TypeData::Reference`] when the
    /// expression denotes a memory view.
    pub ty: TypeId,
    pub stage: EvaluationStage,
    pub constant: Option<ConstValue>,
    /// Root identifier for place and pointer expressions.
    pub root: Option<DeclRef>,
    pub span: Span,
}

impl Expression {
    /// A plain runtime value expression.
    pub fn value(ty: TypeId, span: Span) -> Self {
        Self {
            kind: ExpressionKind::Value,
            ty,
            stage: EvaluationStage::Runtime,
            constant: None,
            root: None,
            span,
        }
    }

    /// A const-expression with a known value.
    pub fn constant(ty: TypeId, value: ConstValue, span: Span) -> Self {
        Self {
            kind: ExpressionKind::Value,
            ty,
            stage: EvaluationStage::Constant,
            constant: Some(value),
            root: None,
            span,
        }
    }

    pub fn with_stage(mut self, stage: EvaluationStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_root(mut self, root: DeclRef) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_kind(mut self, kind: ExpressionKind) -> Self {
        self.kind = kind;
        self
    }
}
