use std::{
    cell::{Cell, OnceCell},
    fmt::Display,
    rc::{Rc, Weak},
};

use crate::{
    semantics::{
        symbol::{FuncSymbol, SymbolRef},
        types::Type,
    },
    Span,
};

use super::{
    ast::{Node, NodeMeta},
    statements::FunctionDefinition,
    types::TypeNode,
};

pub type ExprRef = Rc<Expr>;

/// An expression node. The type slot stays empty until the resolver
/// visits the node and is written exactly once.
#[derive(Debug)]
pub struct Expr {
    pub meta: NodeMeta,
    pub ty: OnceCell<Type>,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> ExprRef {
        Rc::new(Expr {
            meta: NodeMeta::new(span),
            ty: OnceCell::new(),
            kind,
        })
    }

    pub fn get_type(&self) -> Option<&Type> {
        self.ty.get()
    }

    pub fn set_type(&self, ty: Type) {
        let written = self.ty.set(ty).is_ok();
        debug_assert!(written, "type of node {} written twice", self.meta.id);
    }

    pub fn as_var_ref(&self) -> Option<&VarRef> {
        match &self.kind {
            ExprKind::VarRef(var_ref) => Some(var_ref),
            _ => None,
        }
    }
}

impl Node for Expr {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        let (line, col, length) = self.location();
        let ty = match self.get_type() {
            Some(ty) => ty.to_string(),
            None => String::from("<untyped>"),
        };

        format!(
            "{} @ {}:{} (length {}) : {}",
            self.kind.describe(),
            line,
            col,
            length,
            ty
        )
    }
}

#[derive(Debug)]
pub enum ExprKind {
    Literal(Literal),
    Array(Vec<ExprRef>),
    Tuple(Vec<ExprRef>),
    Dict(Vec<(ExprRef, ExprRef)>),
    VarRef(VarRef),
    MemberAccess(MemberAccess),
    IndexAccess {
        receiver: ExprRef,
        index: ExprRef,
    },
    Call(Call),
    Unary {
        op: UnaryOp,
        operand: ExprRef,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },
    Cast {
        expr: ExprRef,
        target: TypeNode,
    },
    Typed {
        expr: ExprRef,
        ty: TypeNode,
    },
    If(IfExpr),
    Range {
        from: ExprRef,
        to: ExprRef,
        inclusive: bool,
    },
    /// `-> x, y in expr` or `-> (x: int) { ... }`
    Lambda(Rc<FunctionDefinition>),
}

impl ExprKind {
    pub fn describe(&self) -> String {
        match self {
            ExprKind::Literal(literal) => format!("Literal({})", literal),
            ExprKind::Array(elems) => format!("Array({} elements)", elems.len()),
            ExprKind::Tuple(elems) => format!("Tuple({} elements)", elems.len()),
            ExprKind::Dict(pairs) => format!("Dict({} pairs)", pairs.len()),
            ExprKind::VarRef(var_ref) => format!("VarRef({})", var_ref.name),
            ExprKind::MemberAccess(access) => format!("MemberAccess(.{})", access.member),
            ExprKind::IndexAccess { .. } => String::from("IndexAccess"),
            ExprKind::Call(call) => format!("Call({} args)", call.args.len()),
            ExprKind::Unary { op, .. } => format!("Unary({})", op),
            ExprKind::Binary { op, .. } => format!("Binary({})", op),
            ExprKind::Cast { .. } => String::from("Cast"),
            ExprKind::Typed { .. } => String::from("Typed"),
            ExprKind::If(if_expr) => format!("IfExpr({})", if_expr.kind),
            ExprKind::Range { inclusive, .. } => {
                format!("Range({})", if *inclusive { "..." } else { ".." })
            }
            ExprKind::Lambda(def) => format!("Lambda({} params)", def.params.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Char(char),
    Float(f64),
    Bool(bool),
    String(String),
    Int(i64),
    Uint(u64),
    /// `:name`
    Symbol(String),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Char(c) => write!(f, "{:?}", c),
            Literal::Float(value) => write!(f, "{}", value),
            Literal::Bool(value) => write!(f, "{}", value),
            Literal::String(value) => write!(f, "{:?}", value),
            Literal::Int(value) => write!(f, "{}", value),
            Literal::Uint(value) => write!(f, "{}u", value),
            Literal::Symbol(name) => write!(f, ":{}", name),
        }
    }
}

/// A reference to a name. `symbol` is attached by the resolver; a `_`
/// reference that never gets one is an intentionally ignored binding.
#[derive(Debug)]
pub struct VarRef {
    pub name: String,
    pub symbol: OnceCell<SymbolRef>,
    pub is_lhs_of_assignment: Cell<bool>,
}

impl VarRef {
    pub fn new(name: String) -> Self {
        VarRef {
            name,
            symbol: OnceCell::new(),
            is_lhs_of_assignment: Cell::new(false),
        }
    }

    pub fn is_ignored_var(&self) -> bool {
        self.name == "_" && self.symbol.get().is_none()
    }
}

/// `receiver.member`. When the member is not built in it is a UFCS call
/// and `callee` names the chosen function.
#[derive(Debug)]
pub struct MemberAccess {
    pub receiver: ExprRef,
    pub member: String,
    pub callee: OnceCell<Weak<FuncSymbol>>,
}

#[derive(Debug)]
pub struct Call {
    pub callee: ExprRef,
    pub args: Vec<ExprRef>,
    pub function: OnceCell<Weak<FuncSymbol>>,
}

impl Call {
    pub fn get_function(&self) -> Option<Rc<FuncSymbol>> {
        self.function.get().and_then(Weak::upgrade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfKind {
    If,
    Unless,
}

impl Display for IfKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IfKind::If => write!(f, "if"),
            IfKind::Unless => write!(f, "unless"),
        }
    }
}

#[derive(Debug)]
pub struct IfExpr {
    pub kind: IfKind,
    pub condition: ExprRef,
    pub then_expr: ExprRef,
    pub else_expr: ExprRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        };
        write!(f, "{}", op)
    }
}
