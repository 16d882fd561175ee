use std::{
    cell::{OnceCell, RefCell},
    rc::Rc,
};

use log::trace;

use crate::{
    ast::{
        expressions::IfKind,
        statements::{
            AssignStmt, CaseStmt, ConstantDecl, ConstantDefinition, ForStmt, FuncKind,
            FunctionDefinition, IfStmt, InitializeStmt, LetStmt, Parameter, PostfixIfStmt,
            ReturnStmt, StatementBlock, Stmt, SwitchStmt, VariableDecl, WhileStmt,
        },
        types::TypeNode,
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{
        expr::{compound_assign_op, parse_expr, parse_expr_list},
        lookups::BindingPower,
    },
    Position,
};

use super::{parser::Parser, types::parse_type};

/// Statements that end with a `;` and may carry a postfix `if`/`unless`.
fn is_simple_stmt(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Var | TokenKind::Val | TokenKind::Return)
}

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let kind = parser.current_token_kind();
    let start = parser.get_position();

    let handler = parser.get_stmt_lookup().get(&kind).copied();
    let stmt = match handler {
        Some(handler) if !is_simple_stmt(kind) => return handler(parser),
        Some(handler) => handler(parser)?,
        None => parse_expr_or_assign_stmt(parser)?,
    };

    let stmt = parse_postfix_if(parser, stmt, start)?;
    parser.expect(TokenKind::Semicolon)?;
    Ok(stmt)
}

fn parse_postfix_if(parser: &mut Parser, body: Stmt, start: Position) -> Result<Stmt, Error> {
    let kind = match parser.current_token_kind() {
        TokenKind::If => IfKind::If,
        TokenKind::Unless => IfKind::Unless,
        _ => return Ok(body),
    };
    parser.advance();

    let condition = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::PostfixIf(Rc::new(PostfixIfStmt {
        meta: parser.meta_from(start),
        body,
        kind,
        condition,
    })))
}

/// An expression statement, or an assignment when the expression list is
/// followed by `=` or a compound assignment operator.
pub fn parse_expr_or_assign_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let mut exprs = parse_expr_list(parser)?;

    let kind = parser.current_token_kind();
    let operator = compound_assign_op(kind);

    if kind == TokenKind::Assignment || operator.is_some() {
        parser.advance();
        let values = parse_expr_list(parser)?;

        if operator.is_some() && (exprs.len() != 1 || values.len() != 1) {
            return Err(
                parser.unexpected_detailed("compound assignment takes exactly one target and value")
            );
        }

        for assignee in &exprs {
            if let Some(var_ref) = assignee.as_var_ref() {
                var_ref.is_lhs_of_assignment.set(true);
            }
        }

        return Ok(Stmt::Assign(Rc::new(AssignStmt {
            meta: parser.meta_from(start),
            assignees: exprs,
            operator,
            values,
        })));
    }

    match exprs.pop() {
        Some(expr) if exprs.is_empty() => Ok(Stmt::Expression(expr)),
        _ => Err(parser.unexpected_detailed("expected `=` after assignment targets")),
    }
}

pub fn parse_block(parser: &mut Parser) -> Result<Rc<StatementBlock>, Error> {
    let start = parser.get_position();
    parser.expect(TokenKind::OpenCurly)?;

    let mut stmts = vec![];
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(parser.unexpected_detailed("expected `}`"));
        }
        stmts.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Rc::new(StatementBlock {
        meta: parser.meta_from(start),
        stmts,
        scope: OnceCell::new(),
    }))
}

fn parse_optional_type(parser: &mut Parser) -> Result<Option<TypeNode>, Error> {
    if parser.eat(TokenKind::Colon) {
        Ok(Some(parse_type(parser, BindingPower::Default)?))
    } else {
        Ok(None)
    }
}

fn expect_name(parser: &mut Parser, message: &str) -> Result<String, Error> {
    let error = parser.unexpected_detailed(message);
    Ok(parser.expect_error(TokenKind::Identifier, Some(error))?.value)
}

fn parse_initialize(parser: &mut Parser) -> Result<Rc<InitializeStmt>, Error> {
    let start_token = parser.advance();
    let is_var = start_token.kind == TokenKind::Var;

    let mut decls = vec![];
    loop {
        let decl_start = parser.get_position();
        let name = expect_name(parser, "expected identifier during variable declaration")?;
        let explicit_type = parse_optional_type(parser)?;

        decls.push(Rc::new(VariableDecl {
            meta: parser.meta_from(decl_start),
            is_var,
            name,
            explicit_type,
            symbol: OnceCell::new(),
        }));

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    let values = if parser.eat(TokenKind::Assignment) {
        parse_expr_list(parser)?
    } else if decls.iter().any(|decl| decl.explicit_type.is_none()) {
        return Err(parser.unexpected_detailed("expected rhs or explicit type"));
    } else {
        vec![]
    };

    Ok(Rc::new(InitializeStmt {
        meta: parser.meta_from(start_token.span.start),
        decls,
        values,
    }))
}

pub fn parse_initialize_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Initialize(parse_initialize(parser)?))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();
    let kind = if keyword.kind == TokenKind::Unless {
        IfKind::Unless
    } else {
        IfKind::If
    };

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_block = parse_block(parser)?;

    let mut elseifs = vec![];
    while parser.eat(TokenKind::Elseif) {
        let condition = parse_expr(parser, BindingPower::Default)?;
        elseifs.push((condition, parse_block(parser)?));
    }

    let else_block = if parser.eat(TokenKind::Else) {
        Some(parse_block(parser)?)
    } else {
        None
    };

    Ok(Stmt::If(Rc::new(IfStmt {
        meta: parser.meta_from(keyword.span.start),
        kind,
        condition,
        then_block,
        elseifs,
        else_block,
    })))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let values = match parser.current_token_kind() {
        TokenKind::Semicolon | TokenKind::If | TokenKind::Unless => vec![],
        _ => parse_expr_list(parser)?,
    };

    Ok(Stmt::Return(Rc::new(ReturnStmt {
        meta: parser.meta_from(start),
        values,
    })))
}

fn parse_else_arm(parser: &mut Parser) -> Result<Option<Rc<StatementBlock>>, Error> {
    if parser.eat(TokenKind::Else) {
        Ok(Some(parse_block(parser)?))
    } else {
        Ok(None)
    }
}

/// `case { when cond {..} }` is a case statement; `case target { when
/// a, b {..} }` is a switch.
pub fn parse_case_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    if parser.eat(TokenKind::OpenCurly) {
        let mut whens = vec![];
        while parser.eat(TokenKind::When) {
            let condition = parse_expr(parser, BindingPower::Default)?;
            whens.push((condition, parse_block(parser)?));
        }
        let else_block = parse_else_arm(parser)?;
        parser.expect(TokenKind::CloseCurly)?;

        return Ok(Stmt::Case(Rc::new(CaseStmt {
            meta: parser.meta_from(start),
            whens,
            else_block,
        })));
    }

    let target = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::OpenCurly)?;

    let mut whens = vec![];
    while parser.eat(TokenKind::When) {
        let values = parse_expr_list(parser)?;
        whens.push((values, parse_block(parser)?));
    }
    let else_block = parse_else_arm(parser)?;
    parser.expect(TokenKind::CloseCurly)?;

    Ok(Stmt::Switch(Rc::new(SwitchStmt {
        meta: parser.meta_from(start),
        target,
        whens,
        else_block,
    })))
}

/// `[var] name [: type]`, shared by function parameters and `for`
/// iteration variables.
pub fn parse_parameter(parser: &mut Parser) -> Result<Rc<Parameter>, Error> {
    let start = parser.get_position();
    let is_var = parser.eat(TokenKind::Var);
    let name = expect_name(parser, "expected parameter name")?;
    let param_type = parse_optional_type(parser)?;

    Ok(Rc::new(Parameter {
        meta: parser.meta_from(start),
        is_var,
        name,
        param_type,
        symbol: OnceCell::new(),
    }))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let mut iter_vars = vec![parse_parameter(parser)?];
    while parser.eat(TokenKind::Comma) {
        iter_vars.push(parse_parameter(parser)?);
    }

    parser.expect(TokenKind::In)?;
    let range = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;

    Ok(Stmt::For(Rc::new(ForStmt {
        meta: parser.meta_from(start),
        iter_vars,
        range,
        body,
    })))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;
    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;

    Ok(Stmt::While(Rc::new(WhileStmt {
        meta: parser.meta_from(start),
        condition,
        body,
    })))
}

/// `let var a = 1; val b = 2 in stmt`
pub fn parse_let_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let mut inits = vec![];
    loop {
        match parser.current_token_kind() {
            TokenKind::Var | TokenKind::Val => inits.push(parse_initialize(parser)?),
            _ => return Err(parser.unexpected_detailed("expected `var` or `val` after `let`")),
        }

        if !parser.eat(TokenKind::Semicolon) {
            break;
        }
    }

    parser.expect(TokenKind::In)?;
    let child = parse_stmt(parser)?;

    Ok(Stmt::Let(Rc::new(LetStmt {
        meta: parser.meta_from(start),
        inits,
        child,
        scope: OnceCell::new(),
    })))
}

pub fn parse_function_definition(parser: &mut Parser) -> Result<Rc<FunctionDefinition>, Error> {
    let keyword = parser.advance();
    let kind = if keyword.kind == TokenKind::Proc {
        FuncKind::Proc
    } else {
        FuncKind::Func
    };

    let name = expect_name(parser, "expected function name")?;
    parser.expect(TokenKind::OpenParen)?;

    let mut params = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        params.push(parse_parameter(parser)?);
        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    let return_type = if parser.current_token_kind() == TokenKind::Colon {
        if kind == FuncKind::Proc {
            return Err(parser.unexpected_detailed("a procedure cannot declare a return type"));
        }
        parse_optional_type(parser)?
    } else {
        None
    };

    let body = parse_block(parser)?;
    let ensure_body = if parser.eat(TokenKind::Ensure) {
        Some(parse_block(parser)?)
    } else {
        None
    };

    trace!("parsed {} {}", kind, name);

    Ok(Rc::new(FunctionDefinition {
        meta: parser.meta_from(keyword.span.start),
        kind,
        name,
        params,
        return_type,
        body,
        ensure_body,
        scope: OnceCell::new(),
        instantiated: RefCell::new(vec![]),
    }))
}

/// `const A, B: float = 1, 2.0;`
pub fn parse_constant_definition(parser: &mut Parser) -> Result<Rc<ConstantDefinition>, Error> {
    let start = parser.advance().span.start;

    let mut decls = vec![];
    loop {
        let decl_start = parser.get_position();
        let name = expect_name(parser, "expected identifier in constant definition")?;
        let explicit_type = parse_optional_type(parser)?;

        decls.push(Rc::new(ConstantDecl {
            meta: parser.meta_from(decl_start),
            name,
            explicit_type,
            symbol: OnceCell::new(),
        }));

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    let error = parser.unexpected_detailed("expected rhs in constant definition");
    parser.expect_error(TokenKind::Assignment, Some(error))?;
    let values = parse_expr_list(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Rc::new(ConstantDefinition {
        meta: parser.meta_from(start),
        decls,
        values,
    }))
}
