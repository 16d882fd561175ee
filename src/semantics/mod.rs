//! Semantic analysis.
//!
//! Runs in two passes over a parsed [`Inu`]: [`registrar`] declares every
//! global function and constant, then [`resolver`] walks the bodies,
//! attaching a symbol to every name and a type to every expression.
//! Analysis stops at the first error.

use std::{fmt::Write, rc::Rc};

use log::debug;

use crate::{ast::ast::Inu, errors::errors::Error};

use self::scope::{FunctionScope, GlobalScope, LocalScope};

pub mod builtins;
pub mod overload;
pub mod registrar;
pub mod resolver;
pub mod scope;
pub mod symbol;
pub mod types;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Register the intrinsic functions (`println`, `to_string`, ...)
    /// before the program's own definitions.
    pub builtins: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions { builtins: true }
    }
}

/// A resolved program. The AST's symbol and scope back-references stay
/// valid for as long as this value is alive.
#[derive(Debug)]
pub struct Analysis {
    pub program: Rc<Inu>,
    pub global_scope: Rc<GlobalScope>,
}

pub fn analyze(program: Rc<Inu>, options: &AnalysisOptions) -> Result<Analysis, Error> {
    let global_scope = registrar::register(&program, options)?;
    resolver::resolve(&program, &global_scope)?;

    debug!(
        "Analysis finished with {} template instances",
        global_scope.instances.borrow().len()
    );

    Ok(Analysis {
        program,
        global_scope,
    })
}

impl Analysis {
    /// Renders the scope tree, one symbol per line.
    pub fn dump_scopes(&self) -> String {
        let mut out = String::new();
        let global = &self.global_scope;

        for constant in global.constants.borrow().iter() {
            let _ = writeln!(out, "const {}", constant);
        }
        for scope in global.function_scopes.borrow().iter() {
            dump_function(&mut out, scope);
        }
        for scope in global.instance_scopes.borrow().iter() {
            let _ = write!(out, "instance ");
            dump_function(&mut out, scope);
        }
        for scope in global.lambda_scopes.borrow().iter() {
            dump_function(&mut out, scope);
        }

        out
    }
}

fn dump_function(out: &mut String, scope: &FunctionScope) {
    match scope.get_func() {
        Some(func) => {
            let _ = writeln!(out, "{}", func);
            for param in &func.params {
                let _ = writeln!(out, "  param {}", param);
            }
        }
        None => {
            let _ = writeln!(out, "<unlinked function>");
        }
    }

    for local in scope.locals.borrow().iter() {
        dump_local(out, local, 1);
    }
}

fn dump_local(out: &mut String, scope: &LocalScope, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{{", indent);
    for var in scope.vars.borrow().iter() {
        let _ = writeln!(out, "{}  {}", indent, var);
    }
    for child in scope.children.borrow().iter() {
        dump_local(out, child, depth + 1);
    }
    let _ = writeln!(out, "{}}}", indent);
}
