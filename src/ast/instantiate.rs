//! Deep copies of function definitions for generic instantiation.
//!
//! A copy gets fresh node ids everywhere, empty type slots and empty
//! symbol/scope back-references, so the resolver can analyze it as if it
//! had been parsed on its own.

use std::{
    cell::{OnceCell, RefCell},
    rc::Rc,
};

use super::{
    ast::NodeMeta,
    expressions::{Call, Expr, ExprKind, ExprRef, IfExpr, MemberAccess, VarRef},
    statements::{
        AssignStmt, CaseStmt, ForStmt, FunctionDefinition, IfStmt, InitializeStmt, LetStmt,
        Parameter, PostfixIfStmt, ReturnStmt, StatementBlock, Stmt, SwitchStmt, VariableDecl,
        WhileStmt,
    },
    types::{TypeNode, TypeNodeKind},
};

impl FunctionDefinition {
    pub fn instantiate(&self) -> Rc<FunctionDefinition> {
        Rc::new(FunctionDefinition {
            meta: fresh(&self.meta),
            kind: self.kind,
            name: self.name.clone(),
            params: self.params.iter().map(|param| copy_param(param)).collect(),
            return_type: self.return_type.as_ref().map(copy_type),
            body: copy_block(&self.body),
            ensure_body: self.ensure_body.as_ref().map(|block| copy_block(block)),
            scope: OnceCell::new(),
            instantiated: RefCell::new(vec![]),
        })
    }
}

fn fresh(meta: &NodeMeta) -> NodeMeta {
    NodeMeta::new(meta.span.clone())
}

fn copy_param(param: &Parameter) -> Rc<Parameter> {
    Rc::new(Parameter {
        meta: fresh(&param.meta),
        is_var: param.is_var,
        name: param.name.clone(),
        param_type: param.param_type.as_ref().map(copy_type),
        symbol: OnceCell::new(),
    })
}

fn copy_type(ty: &TypeNode) -> TypeNode {
    let kind = match &ty.kind {
        TypeNodeKind::Primary { name, args } => TypeNodeKind::Primary {
            name: name.clone(),
            args: args.iter().map(copy_type).collect(),
        },
        TypeNodeKind::Array(elem) => TypeNodeKind::Array(Box::new(copy_type(elem))),
        TypeNodeKind::Dict(key, value) => {
            TypeNodeKind::Dict(Box::new(copy_type(key)), Box::new(copy_type(value)))
        }
        TypeNodeKind::Tuple(elems) => TypeNodeKind::Tuple(elems.iter().map(copy_type).collect()),
        TypeNodeKind::Func { kind, params, ret } => TypeNodeKind::Func {
            kind: *kind,
            params: params.iter().map(copy_type).collect(),
            ret: ret.as_ref().map(|ret| Box::new(copy_type(ret))),
        },
        TypeNodeKind::Qualified { qualifier, inner } => TypeNodeKind::Qualified {
            qualifier: *qualifier,
            inner: Box::new(copy_type(inner)),
        },
    };

    TypeNode {
        meta: fresh(&ty.meta),
        kind,
    }
}

fn copy_exprs(exprs: &[ExprRef]) -> Vec<ExprRef> {
    exprs.iter().map(|expr| copy_expr(expr)).collect()
}

fn copy_expr(expr: &Expr) -> ExprRef {
    let kind = match &expr.kind {
        ExprKind::Literal(literal) => ExprKind::Literal(literal.clone()),
        ExprKind::Array(elems) => ExprKind::Array(copy_exprs(elems)),
        ExprKind::Tuple(elems) => ExprKind::Tuple(copy_exprs(elems)),
        ExprKind::Dict(pairs) => ExprKind::Dict(
            pairs
                .iter()
                .map(|(key, value)| (copy_expr(key), copy_expr(value)))
                .collect(),
        ),
        ExprKind::VarRef(var_ref) => {
            let copy = VarRef::new(var_ref.name.clone());
            copy.is_lhs_of_assignment
                .set(var_ref.is_lhs_of_assignment.get());
            ExprKind::VarRef(copy)
        }
        ExprKind::MemberAccess(access) => ExprKind::MemberAccess(MemberAccess {
            receiver: copy_expr(&access.receiver),
            member: access.member.clone(),
            callee: OnceCell::new(),
        }),
        ExprKind::IndexAccess { receiver, index } => ExprKind::IndexAccess {
            receiver: copy_expr(receiver),
            index: copy_expr(index),
        },
        ExprKind::Call(call) => ExprKind::Call(Call {
            callee: copy_expr(&call.callee),
            args: copy_exprs(&call.args),
            function: OnceCell::new(),
        }),
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op: *op,
            operand: copy_expr(operand),
        },
        ExprKind::Binary { op, lhs, rhs } => ExprKind::Binary {
            op: *op,
            lhs: copy_expr(lhs),
            rhs: copy_expr(rhs),
        },
        ExprKind::Cast { expr, target } => ExprKind::Cast {
            expr: copy_expr(expr),
            target: copy_type(target),
        },
        ExprKind::Typed { expr, ty } => ExprKind::Typed {
            expr: copy_expr(expr),
            ty: copy_type(ty),
        },
        ExprKind::If(if_expr) => ExprKind::If(IfExpr {
            kind: if_expr.kind,
            condition: copy_expr(&if_expr.condition),
            then_expr: copy_expr(&if_expr.then_expr),
            else_expr: copy_expr(&if_expr.else_expr),
        }),
        ExprKind::Range {
            from,
            to,
            inclusive,
        } => ExprKind::Range {
            from: copy_expr(from),
            to: copy_expr(to),
            inclusive: *inclusive,
        },
        ExprKind::Lambda(def) => ExprKind::Lambda(def.instantiate()),
    };

    Expr::new(kind, expr.meta.span.clone())
}

fn copy_block(block: &StatementBlock) -> Rc<StatementBlock> {
    Rc::new(StatementBlock {
        meta: fresh(&block.meta),
        stmts: block.stmts.iter().map(copy_stmt).collect(),
        scope: OnceCell::new(),
    })
}

fn copy_blocks(arms: &[(ExprRef, Rc<StatementBlock>)]) -> Vec<(ExprRef, Rc<StatementBlock>)> {
    arms.iter()
        .map(|(cond, block)| (copy_expr(cond), copy_block(block)))
        .collect()
}

fn copy_initialize(stmt: &InitializeStmt) -> Rc<InitializeStmt> {
    Rc::new(InitializeStmt {
        meta: fresh(&stmt.meta),
        decls: stmt
            .decls
            .iter()
            .map(|decl| {
                Rc::new(VariableDecl {
                    meta: fresh(&decl.meta),
                    is_var: decl.is_var,
                    name: decl.name.clone(),
                    explicit_type: decl.explicit_type.as_ref().map(copy_type),
                    symbol: OnceCell::new(),
                })
            })
            .collect(),
        values: copy_exprs(&stmt.values),
    })
}

fn copy_stmt(stmt: &Stmt) -> Stmt {
    match stmt {
        Stmt::Initialize(init) => Stmt::Initialize(copy_initialize(init)),
        Stmt::Assign(assign) => Stmt::Assign(Rc::new(AssignStmt {
            meta: fresh(&assign.meta),
            assignees: copy_exprs(&assign.assignees),
            operator: assign.operator,
            values: copy_exprs(&assign.values),
        })),
        Stmt::If(if_stmt) => Stmt::If(Rc::new(IfStmt {
            meta: fresh(&if_stmt.meta),
            kind: if_stmt.kind,
            condition: copy_expr(&if_stmt.condition),
            then_block: copy_block(&if_stmt.then_block),
            elseifs: copy_blocks(&if_stmt.elseifs),
            else_block: if_stmt.else_block.as_ref().map(|block| copy_block(block)),
        })),
        Stmt::Return(ret) => Stmt::Return(Rc::new(ReturnStmt {
            meta: fresh(&ret.meta),
            values: copy_exprs(&ret.values),
        })),
        Stmt::Case(case) => Stmt::Case(Rc::new(CaseStmt {
            meta: fresh(&case.meta),
            whens: copy_blocks(&case.whens),
            else_block: case.else_block.as_ref().map(|block| copy_block(block)),
        })),
        Stmt::Switch(switch) => Stmt::Switch(Rc::new(SwitchStmt {
            meta: fresh(&switch.meta),
            target: copy_expr(&switch.target),
            whens: switch
                .whens
                .iter()
                .map(|(values, block)| (copy_exprs(values), copy_block(block)))
                .collect(),
            else_block: switch.else_block.as_ref().map(|block| copy_block(block)),
        })),
        Stmt::For(for_stmt) => Stmt::For(Rc::new(ForStmt {
            meta: fresh(&for_stmt.meta),
            iter_vars: for_stmt.iter_vars.iter().map(|var| copy_param(var)).collect(),
            range: copy_expr(&for_stmt.range),
            body: copy_block(&for_stmt.body),
        })),
        Stmt::While(while_stmt) => Stmt::While(Rc::new(WhileStmt {
            meta: fresh(&while_stmt.meta),
            condition: copy_expr(&while_stmt.condition),
            body: copy_block(&while_stmt.body),
        })),
        Stmt::PostfixIf(postfix) => Stmt::PostfixIf(Rc::new(PostfixIfStmt {
            meta: fresh(&postfix.meta),
            body: copy_stmt(&postfix.body),
            kind: postfix.kind,
            condition: copy_expr(&postfix.condition),
        })),
        Stmt::Let(let_stmt) => Stmt::Let(Rc::new(LetStmt {
            meta: fresh(&let_stmt.meta),
            inits: let_stmt.inits.iter().map(|init| copy_initialize(init)).collect(),
            child: copy_stmt(&let_stmt.child),
            scope: OnceCell::new(),
        })),
        Stmt::Expression(expr) => Stmt::Expression(copy_expr(expr)),
    }
}
