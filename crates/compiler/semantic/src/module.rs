//! The resolved module: declarations, functions, and their call-graph facts.
//!
//! This is the read-only interface between the upstream resolver and the
//! validator. The resolver builds one [`SemanticModule`] per compilation; the
//! validator only reads it.

use crate::attribute::{self, Attribute, AttributeKind, AttributeList};
use crate::builtins::BuiltinFn;
use crate::expression::{Expression, ExpressionId};
use crate::extensions::{Extensions, LanguageFeatures};
use crate::statement::{Statement, StatementId, StatementKind};
use crate::types::{Access, AddressSpace, TypeData, TypeId, TypeRegistry};
use crate::Span;
use index_vec::{define_index_type, IndexVec};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::fmt;

define_index_type! {
    pub struct GlobalId = u32;
}

define_index_type! {
    pub struct FunctionId = u32;
}

define_index_type! {
    pub struct LocalId = u32;
}

/// Shader pipeline stage of an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Vertex,
    Fragment,
    Compute,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// Direction of a pipeline IO declaration relative to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Input,
    Output,
}

/// A resource binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingPoint {
    pub group: u32,
    pub binding: u32,
}

/// Kind of a module-scope variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    Var {
        /// Whether the source wrote an address space template argument.
        explicit_address_space: bool,
        /// Whether the source wrote an access mode template argument.
        explicit_access: bool,
    },
    Override {
        id: Option<u16>,
    },
    Const,
}

#[derive(Debug, Clone)]
pub struct GlobalVariable {
    pub name: SmolStr,
    pub kind: GlobalKind,
    /// Store type.
    pub ty: TypeId,
    pub address_space: AddressSpace,
    pub access: Access,
    pub initializer: Option<ExpressionId>,
    pub binding_point: Option<BindingPoint>,
    pub attributes: AttributeList,
    pub span: Span,
}

impl GlobalVariable {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.kind.name() == name)
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: SmolStr,
    pub ty: TypeId,
    pub attributes: AttributeList,
    pub span: Span,
    pub type_span: Span,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: SmolStr,
    /// `Some` marks an entry point.
    pub stage: Option<PipelineStage>,
    pub params: Vec<Parameter>,
    /// `TypeData::Void` when the function returns nothing.
    pub return_type: TypeId,
    pub return_attributes: AttributeList,
    pub attributes: AttributeList,
    /// Root block of the body; `None` for declarations without bodies.
    pub body: Option<StatementId>,
    /// Resolver behavior analysis: whether execution can fall off the end of
    /// the body.
    pub falls_through: bool,
    pub span: Span,

    // Call-graph facts computed by the resolver.
    pub directly_called_functions: Vec<FunctionId>,
    pub transitively_called_functions: Vec<FunctionId>,
    /// Builtins called directly from this function, with a call site each.
    pub directly_called_builtins: Vec<(BuiltinFn, Span)>,
    /// Module-scope variables referenced directly, with a use site each.
    pub directly_referenced_globals: Vec<(GlobalId, Span)>,
    pub transitively_referenced_globals: Vec<GlobalId>,
    /// Span of a `discard` statement contained in this function, if any.
    pub discard: Option<Span>,
}

impl Function {
    pub const fn is_entry_point(&self) -> bool {
        self.stage.is_some()
    }

    pub fn workgroup_size(&self) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| matches!(a.kind, AttributeKind::WorkgroupSize(..)))
    }

    pub fn must_use(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a.kind, AttributeKind::MustUse))
    }

    pub fn return_location(&self) -> Option<u32> {
        attribute::location_of(&self.return_attributes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    Var,
    Let,
    Const,
}

/// A function-scope variable declaration.
#[derive(Debug, Clone)]
pub struct LocalVariable {
    pub kind: LocalKind,
    pub name: SmolStr,
    /// Store type.
    pub ty: TypeId,
    pub span: Span,
    pub type_span: Span,
}

/// A `alias Name = T;` declaration.
#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub name: SmolStr,
    pub ty: TypeId,
    pub span: Span,
    pub type_span: Span,
}

/// Reference to a declared name, used for notes and root-identifier checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclRef {
    Global(GlobalId),
    Local(LocalId),
    Param { function: FunctionId, index: usize },
}

/// The resolved module consumed by the validator.
#[derive(Debug, Default)]
pub struct SemanticModule {
    pub types: TypeRegistry,
    pub globals: IndexVec<GlobalId, GlobalVariable>,
    pub functions: IndexVec<FunctionId, Function>,
    pub locals: IndexVec<LocalId, LocalVariable>,
    pub statements: IndexVec<StatementId, Statement>,
    pub expressions: IndexVec<ExpressionId, Expression>,
    pub aliases: Vec<TypeAlias>,
    pub enabled_extensions: Extensions,
    pub allowed_features: LanguageFeatures,
    /// For composite types containing an atomic anywhere inside, the span of
    /// the innermost atomic declaration.
    pub atomic_composites: FxHashMap<TypeId, Span>,
}

impl SemanticModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self, id: GlobalId) -> &GlobalVariable {
        &self.globals[id]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id]
    }

    pub fn local(&self, id: LocalId) -> &LocalVariable {
        &self.locals[id]
    }

    pub fn statement(&self, id: StatementId) -> &Statement {
        &self.statements[id]
    }

    pub fn expression(&self, id: ExpressionId) -> &Expression {
        &self.expressions[id]
    }

    pub fn entry_points(&self) -> impl Iterator<Item = FunctionId> + '_ {
        self.functions
            .iter_enumerated()
            .filter(|(_, f)| f.is_entry_point())
            .map(|(id, _)| id)
    }

    pub fn add_global(&mut self, global: GlobalVariable) -> GlobalId {
        self.globals.push(global)
    }

    pub fn add_function(&mut self, function: Function) -> FunctionId {
        self.functions.push(function)
    }

    pub fn add_local(&mut self, local: LocalVariable) -> LocalId {
        self.locals.push(local)
    }

    pub fn add_expression(&mut self, expression: Expression) -> ExpressionId {
        self.expressions.push(expression)
    }

    /// Append a statement and adopt its children: each direct child's parent
    /// link is pointed at the new node. Children must therefore be created
    /// before their parent, which the resolver's bottom-up construction
    /// guarantees.
    pub fn add_statement(&mut self, kind: StatementKind, span: Span) -> StatementId {
        let children = kind.children();
        let id = self.statements.push(Statement {
            kind,
            parent: None,
            reachable: true,
            span,
        });
        for child in children {
            self.statements[child].parent = Some(id);
        }
        id
    }

    /// Mark a statement unreachable (resolver behavior analysis).
    pub fn set_unreachable(&mut self, id: StatementId) {
        self.statements[id].reachable = false;
    }

    // DeclRef resolution helpers.

    pub fn decl_name(&self, decl: DeclRef) -> &str {
        match decl {
            DeclRef::Global(id) => &self.globals[id].name,
            DeclRef::Local(id) => &self.locals[id].name,
            DeclRef::Param { function, index } => &self.functions[function].params[index].name,
        }
    }

    pub fn decl_span(&self, decl: DeclRef) -> Span {
        match decl {
            DeclRef::Global(id) => self.globals[id].span,
            DeclRef::Local(id) => self.locals[id].span,
            DeclRef::Param { function, index } => self.functions[function].params[index].span,
        }
    }

    /// Declaration keyword for diagnostics.
    pub fn decl_kind_name(&self, decl: DeclRef) -> &'static str {
        match decl {
            DeclRef::Global(id) => match self.globals[id].kind {
                GlobalKind::Var { .. } => "var",
                GlobalKind::Override { .. } => "override",
                GlobalKind::Const => "const",
            },
            DeclRef::Local(id) => match self.locals[id].kind {
                LocalKind::Var => "var",
                LocalKind::Let => "let",
                LocalKind::Const => "const",
            },
            DeclRef::Param { .. } => "parameter",
        }
    }

    /// Store type of the declaration's memory view; pointers unwrap to their
    /// store type so pointer arguments can be compared against their root.
    pub fn decl_store_type(&self, decl: DeclRef) -> TypeId {
        let ty = match decl {
            DeclRef::Global(id) => self.globals[id].ty,
            DeclRef::Local(id) => self.locals[id].ty,
            DeclRef::Param { function, index } => self.functions[function].params[index].ty,
        };
        match self.types.data(ty) {
            TypeData::Pointer { store, .. } | TypeData::Reference { store, .. } => store,
            _ => ty,
        }
    }
}
