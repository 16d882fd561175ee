//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an Abstract Syntax Tree. It uses a Pratt parser for expressions
//! with operator precedence and handles:
//!
//! - Global function, procedure and constant definitions
//! - Statements (initialization, assignment, control flow, `let`)
//! - Expressions (binary ops, calls, member/index chains, literals)
//! - Type annotations
//!
//! The parser uses NUD (null denotation) and LED (left denotation) functions
//! for expression parsing with binding power for precedence handling.
//! Every node gets a fresh id and an empty type slot; resolution happens
//! later in [`crate::semantics`].

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
