//! Type parsing implementation.
//!
//! This module handles parsing of type annotations. It supports:
//!
//! - Primary types (`int`, `string`, `range(int)`)
//! - Array, dict and tuple types
//! - Function and procedure types
//! - Reference (`&T`) and maybe (`T?`) qualifiers
//!
//! Similar to expression parsing, it uses NUD/LED handlers with
//! binding powers for parsing complex type expressions.

use std::collections::HashMap;

use crate::{
    ast::{
        ast::NodeMeta,
        statements::FuncKind,
        types::{TypeNode, TypeNodeKind},
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    semantics::types::Qualifier,
    Position,
};

use super::{lookups::BindingPower, parser::Parser};

pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeNode, Error>;

pub type TypeLEDHandler = fn(&mut Parser, TypeNode, BindingPower) -> Result<TypeNode, Error>;

pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

pub type TypeBPLookup = HashMap<TokenKind, BindingPower>;

/// Initializes the type parsing lookup tables.
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_primary_type);
    parser.type_nud(TokenKind::OpenBracket, parse_array_type);
    parser.type_nud(TokenKind::OpenCurly, parse_dict_type);
    parser.type_nud(TokenKind::OpenParen, parse_tuple_type);
    parser.type_nud(TokenKind::Func, parse_func_type);
    parser.type_nud(TokenKind::Proc, parse_func_type);
    parser.type_nud(TokenKind::Ampersand, parse_ref_type);
    parser.type_led(TokenKind::Question, BindingPower::Member, parse_maybe_type);
}

fn make(parser: &Parser, start: Position, kind: TypeNodeKind) -> TypeNode {
    TypeNode {
        meta: NodeMeta::new(parser.span_from(start)),
        kind,
    }
}

/// Parses `T {, T}` up to (not including) `close`.
fn parse_type_list(parser: &mut Parser, close: TokenKind) -> Result<Vec<TypeNode>, Error> {
    let mut types = vec![];

    while parser.current_token_kind() != close {
        types.push(parse_type(parser, BindingPower::Default)?);
        if !parser.eat(TokenKind::Comma) {
            break;
        }
    }

    Ok(types)
}

pub fn parse_primary_type(parser: &mut Parser) -> Result<TypeNode, Error> {
    let token = parser.expect(TokenKind::Identifier)?;

    let args = if parser.eat(TokenKind::OpenParen) {
        let args = parse_type_list(parser, TokenKind::CloseParen)?;
        parser.expect(TokenKind::CloseParen)?;
        args
    } else {
        vec![]
    };

    Ok(make(
        parser,
        token.span.start,
        TypeNodeKind::Primary {
            name: token.value,
            args,
        },
    ))
}

pub fn parse_array_type(parser: &mut Parser) -> Result<TypeNode, Error> {
    let start = parser.advance().span.start;
    let elem = parse_type(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    Ok(make(parser, start, TypeNodeKind::Array(Box::new(elem))))
}

pub fn parse_dict_type(parser: &mut Parser) -> Result<TypeNode, Error> {
    let start = parser.advance().span.start;
    let key = parse_type(parser, BindingPower::Default)?;
    parser.expect(TokenKind::FatArrow)?;
    let value = parse_type(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseCurly)?;

    Ok(make(
        parser,
        start,
        TypeNodeKind::Dict(Box::new(key), Box::new(value)),
    ))
}

/// `()` is the unit type and `(T)` is just `T`.
pub fn parse_tuple_type(parser: &mut Parser) -> Result<TypeNode, Error> {
    let start = parser.advance().span.start;
    let mut elems = parse_type_list(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::CloseParen)?;

    if elems.len() == 1 {
        if let Some(inner) = elems.pop() {
            return Ok(inner);
        }
    }

    Ok(make(parser, start, TypeNodeKind::Tuple(elems)))
}

/// `func(T, U) : R`, `func(T)` (returns unit) and `proc(T)`.
pub fn parse_func_type(parser: &mut Parser) -> Result<TypeNode, Error> {
    let keyword = parser.advance();
    let kind = if keyword.kind == TokenKind::Proc {
        FuncKind::Proc
    } else {
        FuncKind::Func
    };

    parser.expect(TokenKind::OpenParen)?;
    let params = parse_type_list(parser, TokenKind::CloseParen)?;
    parser.expect(TokenKind::CloseParen)?;

    let ret = if kind == FuncKind::Func && parser.eat(TokenKind::Colon) {
        Some(Box::new(parse_type(parser, BindingPower::Default)?))
    } else {
        None
    };

    Ok(make(
        parser,
        keyword.span.start,
        TypeNodeKind::Func { kind, params, ret },
    ))
}

pub fn parse_ref_type(parser: &mut Parser) -> Result<TypeNode, Error> {
    let start = parser.advance().span.start;
    let inner = parse_type(parser, BindingPower::Member)?;

    Ok(make(
        parser,
        start,
        TypeNodeKind::Qualified {
            qualifier: Qualifier::Ref,
            inner: Box::new(inner),
        },
    ))
}

pub fn parse_maybe_type(
    parser: &mut Parser,
    left: TypeNode,
    _bp: BindingPower,
) -> Result<TypeNode, Error> {
    parser.expect(TokenKind::Question)?;
    let start = left.meta.span.start.clone();

    Ok(make(
        parser,
        start,
        TypeNodeKind::Qualified {
            qualifier: Qualifier::Maybe,
            inner: Box::new(left),
        },
    ))
}

pub fn parse_type(parser: &mut Parser, bp: BindingPower) -> Result<TypeNode, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_type_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected_detailed("expected a type")),
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let next_bp = *parser
            .get_type_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if next_bp <= bp {
            break;
        }

        let led = match parser.get_type_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected()),
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}
