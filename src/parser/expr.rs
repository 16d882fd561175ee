use std::{
    cell::{OnceCell, RefCell},
    rc::Rc,
};

use log::trace;

use crate::{
    ast::{
        expressions::{
            BinaryOp, Call, Expr, ExprKind, ExprRef, IfExpr, IfKind, Literal, MemberAccess,
            UnaryOp, VarRef,
        },
        statements::{FuncKind, FunctionDefinition, ReturnStmt, StatementBlock, Stmt},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{
    lookups::BindingPower,
    parser::Parser,
    stmt::{parse_block, parse_parameter},
    types::parse_type,
};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<ExprRef, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected()),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if next_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected()),
        };

        left = led(parser, left, next_bp)?;
    }

    trace!("parsed expression {:?}", left.kind.describe());
    Ok(left)
}

/// Parses `expr {, expr}` until no comma follows.
pub fn parse_expr_list(parser: &mut Parser) -> Result<Vec<ExprRef>, Error> {
    let mut exprs = vec![parse_expr(parser, BindingPower::Default)?];
    while parser.eat(TokenKind::Comma) {
        exprs.push(parse_expr(parser, BindingPower::Default)?);
    }
    Ok(exprs)
}

fn number_error(parser: &Parser) -> Error {
    Error::new(
        ErrorImpl::NumberParseError {
            token: parser.current_token().value.clone(),
        },
        parser.get_position(),
    )
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<ExprRef, Error> {
    let token = parser.current_token().clone();

    let kind = match token.kind {
        TokenKind::Int => {
            let value = token.value.parse().map_err(|_| number_error(parser))?;
            ExprKind::Literal(Literal::Int(value))
        }
        TokenKind::Uint => {
            let value = token.value.parse().map_err(|_| number_error(parser))?;
            ExprKind::Literal(Literal::Uint(value))
        }
        TokenKind::Float => {
            let value = token.value.parse().map_err(|_| number_error(parser))?;
            ExprKind::Literal(Literal::Float(value))
        }
        TokenKind::Char => match token.value.chars().next() {
            Some(c) => ExprKind::Literal(Literal::Char(c)),
            None => return Err(parser.unexpected_detailed("empty character literal")),
        },
        TokenKind::String => ExprKind::Literal(Literal::String(token.value.clone())),
        TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
        TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
        TokenKind::Identifier => ExprKind::VarRef(VarRef::new(token.value.clone())),
        _ => return Err(parser.unexpected()),
    };

    parser.advance();
    Ok(Expr::new(kind, token.span))
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Equals => BinaryOp::Eq,
        TokenKind::NotEquals => BinaryOp::NotEq,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::LessEquals => BinaryOp::LessEq,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::GreaterEquals => BinaryOp::GreaterEq,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::ShiftLeft => BinaryOp::Shl,
        TokenKind::ShiftRight => BinaryOp::Shr,
        _ => return None,
    };
    Some(op)
}

/// Maps a compound assignment token such as `+=` to its operator.
pub fn compound_assign_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::PlusEquals => Some(BinaryOp::Add),
        TokenKind::MinusEquals => Some(BinaryOp::Sub),
        TokenKind::StarEquals => Some(BinaryOp::Mul),
        TokenKind::SlashEquals => Some(BinaryOp::Div),
        TokenKind::PercentEquals => Some(BinaryOp::Mod),
        _ => None,
    }
}

fn joined(left: &ExprRef, parser: &Parser) -> Span {
    parser.span_from(left.meta.span.start.clone())
}

pub fn parse_binary_expr(
    parser: &mut Parser,
    left: ExprRef,
    bp: BindingPower,
) -> Result<ExprRef, Error> {
    let op = match binary_op(parser.current_token_kind()) {
        Some(op) => op,
        None => return Err(parser.unexpected()),
    };
    parser.advance();

    let right = parse_expr(parser, bp)?;
    let span = joined(&left, parser);

    Ok(Expr::new(
        ExprKind::Binary {
            op,
            lhs: left,
            rhs: right,
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<ExprRef, Error> {
    let operator_token = parser.advance();
    let op = match operator_token.kind {
        TokenKind::Dash => UnaryOp::Neg,
        TokenKind::Plus => UnaryOp::Plus,
        _ => UnaryOp::Not,
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::new(
        ExprKind::Unary { op, operand },
        parser.span_from(operator_token.span.start),
    ))
}

/// `()` is the unit tuple, `(e)` is a parenthesized expression and
/// `(a, b)` is a tuple.
pub fn parse_grouping_expr(parser: &mut Parser) -> Result<ExprRef, Error> {
    let start = parser.advance().span.start;

    if parser.eat(TokenKind::CloseParen) {
        return Ok(Expr::new(ExprKind::Tuple(vec![]), parser.span_from(start)));
    }

    let mut elems = parse_expr_list(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    if elems.len() == 1 {
        if let Some(expr) = elems.pop() {
            return Ok(expr);
        }
    }

    Ok(Expr::new(ExprKind::Tuple(elems), parser.span_from(start)))
}

pub fn parse_array_literal(parser: &mut Parser) -> Result<ExprRef, Error> {
    let start = parser.advance().span.start;

    let elems = if parser.current_token_kind() == TokenKind::CloseBracket {
        vec![]
    } else {
        parse_expr_list(parser)?
    };
    parser.expect(TokenKind::CloseBracket)?;

    Ok(Expr::new(ExprKind::Array(elems), parser.span_from(start)))
}

pub fn parse_dict_literal(parser: &mut Parser) -> Result<ExprRef, Error> {
    let start = parser.advance().span.start;
    let mut pairs = vec![];

    while parser.current_token_kind() != TokenKind::CloseCurly {
        let key = parse_expr(parser, BindingPower::Default)?;
        parser.expect(TokenKind::FatArrow)?;
        let value = parse_expr(parser, BindingPower::Default)?;
        pairs.push((key, value));

        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Expr::new(ExprKind::Dict(pairs), parser.span_from(start)))
}

/// `:name`
pub fn parse_symbol_literal(parser: &mut Parser) -> Result<ExprRef, Error> {
    let start = parser.advance().span.start;
    let error = parser.unexpected_detailed("expected symbol name after `:`");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    Ok(Expr::new(
        ExprKind::Literal(Literal::Symbol(name)),
        parser.span_from(start),
    ))
}

/// `-> x, y in expr` or `-> (x: int, y) { stmts }`. Parentheses around the
/// parameters are optional. An expression body becomes a block holding a
/// single `return`.
pub fn parse_lambda_expr(parser: &mut Parser) -> Result<ExprRef, Error> {
    let start = parser.advance().span.start;

    let parenthesized = parser.eat(TokenKind::OpenParen);
    let mut params = vec![];
    while !matches!(
        parser.current_token_kind(),
        TokenKind::In | TokenKind::OpenCurly | TokenKind::CloseParen
    ) {
        params.push(parse_parameter(parser)?);
        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }
    if parenthesized {
        parser.expect(TokenKind::CloseParen)?;
    }

    let body = if parser.eat(TokenKind::In) {
        let body_start = parser.get_position();
        let value = parse_expr(parser, BindingPower::Default)?;
        let ret = Stmt::Return(Rc::new(ReturnStmt {
            meta: parser.meta_from(body_start.clone()),
            values: vec![value],
        }));

        Rc::new(StatementBlock {
            meta: parser.meta_from(body_start),
            stmts: vec![ret],
            scope: OnceCell::new(),
        })
    } else {
        parse_block(parser)?
    };

    let meta = parser.meta_from(start.clone());
    let name = format!("lambda.{}", meta.id);
    trace!("parsed {} with {} params", name, params.len());

    let def = Rc::new(FunctionDefinition {
        meta,
        kind: FuncKind::Lambda,
        name,
        params,
        return_type: None,
        body,
        ensure_body: None,
        scope: OnceCell::new(),
        instantiated: RefCell::new(vec![]),
    });

    Ok(Expr::new(ExprKind::Lambda(def), parser.span_from(start)))
}

/// `if cond then a else b` / `unless cond then a else b`
pub fn parse_if_expr(parser: &mut Parser) -> Result<ExprRef, Error> {
    let keyword = parser.advance();
    let kind = if keyword.kind == TokenKind::Unless {
        IfKind::Unless
    } else {
        IfKind::If
    };

    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Then)?;
    let then_expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Else)?;
    let else_expr = parse_expr(parser, BindingPower::Default)?;

    Ok(Expr::new(
        ExprKind::If(IfExpr {
            kind,
            condition,
            then_expr,
            else_expr,
        }),
        parser.span_from(keyword.span.start),
    ))
}

pub fn parse_call_expr(
    parser: &mut Parser,
    left: ExprRef,
    _bp: BindingPower,
) -> Result<ExprRef, Error> {
    parser.advance();

    let args = if parser.current_token_kind() == TokenKind::CloseParen {
        vec![]
    } else {
        parse_expr_list(parser)?
    };

    parser.expect(TokenKind::CloseParen)?;
    let span = joined(&left, parser);

    Ok(Expr::new(
        ExprKind::Call(Call {
            callee: left,
            args,
            function: OnceCell::new(),
        }),
        span,
    ))
}

pub fn parse_index_expr(
    parser: &mut Parser,
    left: ExprRef,
    _bp: BindingPower,
) -> Result<ExprRef, Error> {
    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;
    let span = joined(&left, parser);

    Ok(Expr::new(
        ExprKind::IndexAccess {
            receiver: left,
            index,
        },
        span,
    ))
}

pub fn parse_member_expr(
    parser: &mut Parser,
    left: ExprRef,
    _bp: BindingPower,
) -> Result<ExprRef, Error> {
    parser.advance();
    let error = parser.unexpected_detailed("expected member name after `.`");
    let member = parser.expect_error(TokenKind::Identifier, Some(error))?.value;
    let span = joined(&left, parser);

    Ok(Expr::new(
        ExprKind::MemberAccess(MemberAccess {
            receiver: left,
            member,
            callee: OnceCell::new(),
        }),
        span,
    ))
}

pub fn parse_cast_expr(
    parser: &mut Parser,
    left: ExprRef,
    _bp: BindingPower,
) -> Result<ExprRef, Error> {
    parser.advance();
    let target = parse_type(parser, BindingPower::Default)?;
    let span = joined(&left, parser);

    Ok(Expr::new(ExprKind::Cast { expr: left, target }, span))
}

pub fn parse_typed_expr(
    parser: &mut Parser,
    left: ExprRef,
    _bp: BindingPower,
) -> Result<ExprRef, Error> {
    parser.advance();
    let ty = parse_type(parser, BindingPower::Default)?;
    let span = joined(&left, parser);

    Ok(Expr::new(ExprKind::Typed { expr: left, ty }, span))
}

pub fn parse_range_expr(
    parser: &mut Parser,
    left: ExprRef,
    bp: BindingPower,
) -> Result<ExprRef, Error> {
    let inclusive = parser.advance().kind == TokenKind::Ellipsis;
    let to = parse_expr(parser, bp)?;
    let span = joined(&left, parser);

    Ok(Expr::new(
        ExprKind::Range {
            from: left,
            to,
            inclusive,
        },
        span,
    ))
}
