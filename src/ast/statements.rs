use std::{
    cell::{OnceCell, RefCell},
    fmt::Display,
    rc::{Rc, Weak},
};

use crate::semantics::{
    scope::{FunctionScope, LocalScope},
    symbol::VarSymbol,
};

use super::{
    ast::{Node, NodeMeta},
    expressions::{BinaryOp, ExprRef, IfKind},
    types::TypeNode,
};

// DECLARATIONS

/// A function parameter, or an iteration variable of a `for` loop.
#[derive(Debug)]
pub struct Parameter {
    pub meta: NodeMeta,
    pub is_var: bool,
    pub name: String,
    pub param_type: Option<TypeNode>,
    pub symbol: OnceCell<Weak<VarSymbol>>,
}

impl Node for Parameter {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        match &self.param_type {
            Some(ty) => format!("Parameter({}: {})", self.name, ty),
            None => format!("Parameter({})", self.name),
        }
    }
}

#[derive(Debug)]
pub struct VariableDecl {
    pub meta: NodeMeta,
    pub is_var: bool,
    pub name: String,
    pub explicit_type: Option<TypeNode>,
    pub symbol: OnceCell<Weak<VarSymbol>>,
}

impl VariableDecl {
    pub fn is_ignored(&self) -> bool {
        self.name == "_"
    }
}

impl Node for VariableDecl {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        let keyword = if self.is_var { "var" } else { "val" };
        match &self.explicit_type {
            Some(ty) => format!("VariableDecl({} {}: {})", keyword, self.name, ty),
            None => format!("VariableDecl({} {})", keyword, self.name),
        }
    }
}

#[derive(Debug)]
pub struct ConstantDecl {
    pub meta: NodeMeta,
    pub name: String,
    pub explicit_type: Option<TypeNode>,
    pub symbol: OnceCell<Weak<VarSymbol>>,
}

impl Node for ConstantDecl {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        format!("ConstantDecl({})", self.name)
    }
}

// STATEMENTS

#[derive(Debug, Clone)]
pub enum Stmt {
    Initialize(Rc<InitializeStmt>),
    Assign(Rc<AssignStmt>),
    If(Rc<IfStmt>),
    Return(Rc<ReturnStmt>),
    Case(Rc<CaseStmt>),
    Switch(Rc<SwitchStmt>),
    For(Rc<ForStmt>),
    While(Rc<WhileStmt>),
    PostfixIf(Rc<PostfixIfStmt>),
    Let(Rc<LetStmt>),
    Expression(ExprRef),
}

impl Stmt {
    pub fn as_node(&self) -> &dyn Node {
        match self {
            Stmt::Initialize(stmt) => stmt.as_ref(),
            Stmt::Assign(stmt) => stmt.as_ref(),
            Stmt::If(stmt) => stmt.as_ref(),
            Stmt::Return(stmt) => stmt.as_ref(),
            Stmt::Case(stmt) => stmt.as_ref(),
            Stmt::Switch(stmt) => stmt.as_ref(),
            Stmt::For(stmt) => stmt.as_ref(),
            Stmt::While(stmt) => stmt.as_ref(),
            Stmt::PostfixIf(stmt) => stmt.as_ref(),
            Stmt::Let(stmt) => stmt.as_ref(),
            Stmt::Expression(expr) => expr.as_ref(),
        }
    }
}

/// `var a, b = x, y;` or `val (a, b) = pair;`. An empty `values` list is
/// only valid when every declaration carries an explicit type.
#[derive(Debug)]
pub struct InitializeStmt {
    pub meta: NodeMeta,
    pub decls: Vec<Rc<VariableDecl>>,
    pub values: Vec<ExprRef>,
}

/// `operator` is `None` for plain `=` and the arithmetic operator for
/// compound assignments such as `+=`.
#[derive(Debug)]
pub struct AssignStmt {
    pub meta: NodeMeta,
    pub assignees: Vec<ExprRef>,
    pub operator: Option<BinaryOp>,
    pub values: Vec<ExprRef>,
}

#[derive(Debug)]
pub struct IfStmt {
    pub meta: NodeMeta,
    pub kind: IfKind,
    pub condition: ExprRef,
    pub then_block: Rc<StatementBlock>,
    pub elseifs: Vec<(ExprRef, Rc<StatementBlock>)>,
    pub else_block: Option<Rc<StatementBlock>>,
}

#[derive(Debug)]
pub struct ReturnStmt {
    pub meta: NodeMeta,
    pub values: Vec<ExprRef>,
}

/// `case { when cond { } ... else { } }`
#[derive(Debug)]
pub struct CaseStmt {
    pub meta: NodeMeta,
    pub whens: Vec<(ExprRef, Rc<StatementBlock>)>,
    pub else_block: Option<Rc<StatementBlock>>,
}

/// `case target { when a, b { } ... else { } }`
#[derive(Debug)]
pub struct SwitchStmt {
    pub meta: NodeMeta,
    pub target: ExprRef,
    pub whens: Vec<(Vec<ExprRef>, Rc<StatementBlock>)>,
    pub else_block: Option<Rc<StatementBlock>>,
}

#[derive(Debug)]
pub struct ForStmt {
    pub meta: NodeMeta,
    pub iter_vars: Vec<Rc<Parameter>>,
    pub range: ExprRef,
    pub body: Rc<StatementBlock>,
}

#[derive(Debug)]
pub struct WhileStmt {
    pub meta: NodeMeta,
    pub condition: ExprRef,
    pub body: Rc<StatementBlock>,
}

/// `stmt if cond;` / `stmt unless cond;`
#[derive(Debug)]
pub struct PostfixIfStmt {
    pub meta: NodeMeta,
    pub body: Stmt,
    pub kind: IfKind,
    pub condition: ExprRef,
}

/// `let inits in child`. The bindings live in a local scope that has no
/// statement block of its own.
#[derive(Debug)]
pub struct LetStmt {
    pub meta: NodeMeta,
    pub inits: Vec<Rc<InitializeStmt>>,
    pub child: Stmt,
    pub scope: OnceCell<Weak<LocalScope>>,
}

macro_rules! impl_stmt_node {
    ($($stmt:ty => $name:literal),* $(,)?) => {
        $(
            impl Node for $stmt {
                fn meta(&self) -> &NodeMeta {
                    &self.meta
                }

                fn describe(&self) -> String {
                    let (line, col, length) = self.location();
                    format!("{} @ {}:{} (length {})", $name, line, col, length)
                }
            }
        )*
    };
}

impl_stmt_node! {
    InitializeStmt => "InitializeStmt",
    AssignStmt => "AssignStmt",
    IfStmt => "IfStmt",
    ReturnStmt => "ReturnStmt",
    CaseStmt => "CaseStmt",
    SwitchStmt => "SwitchStmt",
    ForStmt => "ForStmt",
    WhileStmt => "WhileStmt",
    PostfixIfStmt => "PostfixIfStmt",
    LetStmt => "LetStmt",
}

#[derive(Debug)]
pub struct StatementBlock {
    pub meta: NodeMeta,
    pub stmts: Vec<Stmt>,
    pub scope: OnceCell<Weak<LocalScope>>,
}

impl StatementBlock {
    pub fn get_scope(&self) -> Option<Rc<LocalScope>> {
        self.scope.get().and_then(Weak::upgrade)
    }
}

impl Node for StatementBlock {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        format!("StatementBlock ({} statements)", self.stmts.len())
    }
}

// DEFINITIONS

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncKind {
    Func,
    Proc,
    /// Body of a `->` expression. Returns a value like `func`.
    Lambda,
}

impl FuncKind {
    /// Whether calls produce the body's return value.
    pub fn returns_value(&self) -> bool {
        !matches!(self, FuncKind::Proc)
    }
}

impl Display for FuncKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuncKind::Func => write!(f, "func"),
            FuncKind::Proc => write!(f, "proc"),
            FuncKind::Lambda => write!(f, "lambda"),
        }
    }
}

#[derive(Debug)]
pub struct FunctionDefinition {
    pub meta: NodeMeta,
    pub kind: FuncKind,
    pub name: String,
    pub params: Vec<Rc<Parameter>>,
    pub return_type: Option<TypeNode>,
    pub body: Rc<StatementBlock>,
    pub ensure_body: Option<Rc<StatementBlock>>,
    pub scope: OnceCell<Weak<FunctionScope>>,
    /// One copy per distinct argument-type list this template was called
    /// with. Not part of the syntactic tree.
    pub instantiated: RefCell<Vec<Rc<FunctionDefinition>>>,
}

impl FunctionDefinition {
    pub fn is_template(&self) -> bool {
        self.params.iter().any(|param| param.param_type.is_none())
    }

    pub fn get_scope(&self) -> Option<Rc<FunctionScope>> {
        self.scope.get().and_then(Weak::upgrade)
    }
}

impl Node for FunctionDefinition {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|param| match &param.param_type {
                Some(ty) => format!("{}: {}", param.name, ty),
                None => param.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        match &self.return_type {
            Some(ret) => format!("{} {}({}) : {}", self.kind, self.name, params, ret),
            None => format!("{} {}({})", self.kind, self.name, params),
        }
    }
}

#[derive(Debug)]
pub struct ConstantDefinition {
    pub meta: NodeMeta,
    pub decls: Vec<Rc<ConstantDecl>>,
    pub values: Vec<ExprRef>,
}

impl Node for ConstantDefinition {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        let names = self
            .decls
            .iter()
            .map(|decl| decl.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("ConstantDefinition({})", names)
    }
}
