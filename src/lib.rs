#![allow(clippy::module_inception)]

use std::rc::Rc;

use crate::{
    errors::errors::Error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    semantics::{analyze, Analysis, AnalysisOptions},
};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod semantics;

extern crate regex;

/// A location in a source file.
///
/// `offset` is a byte offset into the source; `line` and `col` are
/// 1-based and count characters, the same way [`position_of`] does.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub col: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(offset: u32, line: u32, col: u32, file: Rc<String>) -> Self {
        Position {
            offset,
            line,
            col,
            file,
        }
    }

    pub fn null() -> Self {
        Position::new(0, 0, 0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    pub fn length(&self) -> u32 {
        self.end.offset.saturating_sub(self.start.offset)
    }
}

/// Computes the 1-based (line, column) of `offset` by counting newlines
/// and characters from the beginning of `source`.
pub fn position_of(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1;
    let mut col = 1;

    for (index, c) in source.char_indices() {
        if index >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Returns the 1-based line number, the text of that line and the
/// character offset of `position` inside the line.
pub fn get_line_at_position(source: &str, position: u32) -> Option<(usize, String, usize)> {
    let pos = position as usize;
    let mut start = 0;

    for (index, line) in source.split_inclusive('\n').enumerate() {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            let line_pos = source[start..pos].chars().count();
            return Some((index + 1, line.to_string(), line_pos));
        }

        start = end;
    }

    // Errors reported at EOF point just past the last character
    let last = source.split_inclusive('\n').last()?;
    let line_count = source.split_inclusive('\n').count();
    Some((line_count, last.to_string(), last.trim_end_matches('\n').chars().count()))
}

/// Runs the whole front end over one compilation unit: tokenize, parse,
/// register and resolve.
pub fn analyze_source(
    source: &str,
    file: &str,
    options: &AnalysisOptions,
) -> Result<Analysis, Error> {
    let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
    let program = parse(tokens, Rc::new(file.to_string()))?;
    analyze(program, options)
}
