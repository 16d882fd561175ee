use std::fmt::Display;

use thiserror::Error;

use crate::Position;

/// An error raised anywhere in the front end, paired with the position
/// of the offending token or AST node.
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_kind(&self) -> ErrorKind {
        self.internal_error.kind()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::UnresolvedName { .. } => "UnresolvedName",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::NoMatchingOverload { .. } => "NoMatchingOverload",
            ErrorImpl::AmbiguousFunctionReference { .. } => "AmbiguousFunctionReference",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ImmutableAssignment { .. } => "ImmutableAssignment",
            ErrorImpl::ArityMismatch { .. } => "ArityMismatch",
            ErrorImpl::TypeNotInferred { .. } => "TypeNotInferred",
            ErrorImpl::InvalidReturn { .. } => "InvalidReturn",
            ErrorImpl::InstantiationLimit { .. } => "InstantiationLimit",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => {
                ErrorTip::Suggestion(format!("`{}` is already declared in this scope", variable))
            }
            ErrorImpl::FunctionAlreadyDeclared { function } => ErrorTip::Suggestion(format!(
                "`{}` is already declared with the same parameter types",
                function
            )),
            ErrorImpl::UnresolvedName { name } => {
                ErrorTip::Suggestion(format!("`{}` is not declared in any enclosing scope", name))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::NoMatchingOverload { function, arguments } => {
                ErrorTip::Suggestion(format!(
                    "No overload of `{}` accepts ({})",
                    function, arguments
                ))
            }
            ErrorImpl::AmbiguousFunctionReference { function } => ErrorTip::Suggestion(format!(
                "`{}` is overloaded or generic, call it instead of using it as a value",
                function
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ImmutableAssignment { variable } => ErrorTip::Suggestion(format!(
                "`{}` is immutable, declare it with `var`",
                variable
            )),
            ErrorImpl::ArityMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} values, received {}",
                expected, received
            )),
            ErrorImpl::TypeNotInferred { name } => ErrorTip::Suggestion(format!(
                "The type of `{}` is needed before it is known, add an explicit type",
                name
            )),
            ErrorImpl::InvalidReturn { message } => ErrorTip::Suggestion(message.clone()),
            ErrorImpl::InstantiationLimit { function, .. } => ErrorTip::Suggestion(format!(
                "`{}` keeps calling itself with new argument types, annotate its parameters",
                function
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.position.file, self.position.line, self.position.col, self.internal_error
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

/// Coarse classification of every [`ErrorImpl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    DuplicateDeclaration,
    UnresolvedName,
    NoMatchingOverload,
    TypeMismatch,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("{variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("function {function} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("unresolved name {name:?}")]
    UnresolvedName { name: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("no matching overload for {function}({arguments})")]
    NoMatchingOverload { function: String, arguments: String },
    #[error("function {function:?} cannot be used as a value")]
    AmbiguousFunctionReference { function: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("cannot assign to immutable variable {variable:?}")]
    ImmutableAssignment { variable: String },
    #[error("arity mismatch: expected {expected}, received {received}")]
    ArityMismatch { expected: usize, received: usize },
    #[error("type of {name:?} could not be inferred")]
    TypeNotInferred { name: String },
    #[error("invalid return: {message}")]
    InvalidReturn { message: String },
    #[error("instantiating {function:?} nested more than {limit} times")]
    InstantiationLimit { function: String, limit: usize },
}

impl ErrorImpl {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::NumberParseError { .. } => ErrorKind::Syntax,
            ErrorImpl::VariableAlreadyDeclared { .. } | ErrorImpl::FunctionAlreadyDeclared { .. } => {
                ErrorKind::DuplicateDeclaration
            }
            ErrorImpl::UnresolvedName { .. } | ErrorImpl::UnknownType { .. } => {
                ErrorKind::UnresolvedName
            }
            ErrorImpl::NoMatchingOverload { .. } | ErrorImpl::AmbiguousFunctionReference { .. } => {
                ErrorKind::NoMatchingOverload
            }
            ErrorImpl::TypeMatchError { .. }
            | ErrorImpl::ImmutableAssignment { .. }
            | ErrorImpl::ArityMismatch { .. }
            | ErrorImpl::TypeNotInferred { .. }
            | ErrorImpl::InvalidReturn { .. }
            | ErrorImpl::InstantiationLimit { .. } => ErrorKind::TypeMismatch,
        }
    }
}
