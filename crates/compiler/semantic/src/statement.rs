//! Statement tree with explicit parent links.
//!
//! Statements live in an arena; every node records its parent, populated once
//! when the resolver builds the tree. Placement rules (`break`, `continue`,
//! `break-if`, `return`-in-continuing) are iterative walks up the parent
//! chain, which is finite and acyclic, so no recursion is needed and stack
//! depth stays bounded.

use crate::expression::{ConstValue, ExpressionId};
use crate::module::LocalId;
use crate::types::TypeId;
use crate::Span;
use index_vec::define_index_type;

define_index_type! {
    pub struct StatementId = u32;
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    /// Enclosing statement; `None` for a function's root block.
    pub parent: Option<StatementId>,
    /// Resolver-computed reachability; unreachable statements feed the
    /// `unreachable_code` filterable rule.
    pub reachable: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Block(Vec<StatementId>),
    VarDecl {
        local: LocalId,
        initializer: Option<ExpressionId>,
    },
    Loop {
        body: StatementId,
        continuing: Option<StatementId>,
    },
    /// The tail block of a loop, executed before the condition re-check.
    Continuing(Vec<StatementId>),
    For {
        init: Option<StatementId>,
        condition: Option<ExpressionId>,
        step: Option<StatementId>,
        body: StatementId,
    },
    While {
        condition: ExpressionId,
        body: StatementId,
    },
    If {
        condition: ExpressionId,
        then_block: StatementId,
        else_block: Option<StatementId>,
    },
    Switch {
        selector: ExpressionId,
        cases: Vec<StatementId>,
    },
    /// One switch case; always a direct child of a `Switch`.
    Case {
        selectors: Vec<CaseSelector>,
        body: StatementId,
    },
    Break,
    BreakIf {
        condition: ExpressionId,
    },
    Continue,
    Return {
        value: Option<ExpressionId>,
    },
    Assign {
        lhs: ExpressionId,
        rhs: ExpressionId,
        compound: bool,
    },
    IncrementDecrement {
        lhs: ExpressionId,
        increment: bool,
    },
    Call(ExpressionId),
    Discard,
}

impl StatementKind {
    /// Direct child statements, used to populate parent links.
    pub fn children(&self) -> Vec<StatementId> {
        match self {
            Self::Block(stmts) | Self::Continuing(stmts) => stmts.clone(),
            Self::Loop { body, continuing } => {
                let mut out = vec![*body];
                out.extend(*continuing);
                out
            }
            Self::For {
                init, step, body, ..
            } => {
                let mut out = Vec::new();
                out.extend(*init);
                out.extend(*step);
                out.push(*body);
                out
            }
            Self::While { body, .. } => vec![*body],
            Self::If {
                then_block,
                else_block,
                ..
            } => {
                let mut out = vec![*then_block];
                out.extend(*else_block);
                out
            }
            Self::Switch { cases, .. } => cases.clone(),
            Self::Case { body, .. } => vec![*body],
            _ => Vec::new(),
        }
    }

    /// Whether this statement is a loop construct; ancestor walks for
    /// `break`/`continue` placement stop here.
    pub const fn is_loop(&self) -> bool {
        matches!(self, Self::Loop { .. } | Self::For { .. } | Self::While { .. })
    }
}

/// A single case label in a switch statement.
#[derive(Debug, Clone)]
pub enum CaseSelector {
    Default(Span),
    Value {
        value: ConstValue,
        ty: TypeId,
        span: Span,
    },
}

impl CaseSelector {
    pub const fn span(&self) -> Span {
        match self {
            Self::Default(span) => *span,
            Self::Value { span, .. } => *span,
        }
    }

    pub const fn is_default(&self) -> bool {
        matches!(self, Self::Default(_))
    }
}
