use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("func", TokenKind::Func);
        map.insert("proc", TokenKind::Proc);
        map.insert("var", TokenKind::Var);
        map.insert("val", TokenKind::Val);
        map.insert("const", TokenKind::Const);
        map.insert("let", TokenKind::Let);
        map.insert("in", TokenKind::In);
        map.insert("if", TokenKind::If);
        map.insert("elseif", TokenKind::Elseif);
        map.insert("else", TokenKind::Else);
        map.insert("unless", TokenKind::Unless);
        map.insert("then", TokenKind::Then);
        map.insert("case", TokenKind::Case);
        map.insert("when", TokenKind::When);
        map.insert("for", TokenKind::For);
        map.insert("while", TokenKind::While);
        map.insert("return", TokenKind::Return);
        map.insert("as", TokenKind::As);
        map.insert("true", TokenKind::True);
        map.insert("false", TokenKind::False);
        map.insert("ensure", TokenKind::Ensure);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Int,
    Uint,
    Float,
    Char,
    String,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // !
    NotEquals,  // !=
    FatArrow,   // =>
    Arrow,      // ->

    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    ShiftLeft,
    ShiftRight,

    Or,
    And,
    Pipe,
    Ampersand,
    Caret,

    Dot,
    DotDot,
    Ellipsis,
    Semicolon,
    Colon,
    Question,
    Comma,

    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Func,
    Proc,
    Var,
    Val,
    Const,
    Let,
    In,
    If,
    Elseif,
    Else,
    Unless,
    Then,
    Case,
    When,
    For,
    While,
    Return,
    As,
    True,
    False,
    Ensure,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_one_of_many(&[
            TokenKind::String,
            TokenKind::Char,
            TokenKind::Identifier,
            TokenKind::Int,
            TokenKind::Uint,
            TokenKind::Float,
        ]) {
            write!(f, "{} ({})", self.kind, self.value)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl Token {
    pub fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }
}
