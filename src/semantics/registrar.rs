//! First pass: every global function and constant gets a symbol before any
//! body is looked at, so bodies may refer to definitions further down.

use std::{cell::OnceCell, rc::Rc};

use log::debug;

use crate::{
    ast::{
        ast::{GlobalDefinition, Inu, Node},
        statements::{ConstantDefinition, FunctionDefinition},
    },
    errors::errors::{Error, ErrorImpl},
};

use super::{
    builtins::register_builtins,
    scope::{FunctionScope, GlobalScope, Scope, WeakScope},
    symbol::{FuncSymbol, VarSymbol},
    types::Type,
    AnalysisOptions,
};

pub fn register(program: &Inu, options: &AnalysisOptions) -> Result<Rc<GlobalScope>, Error> {
    let global = GlobalScope::new();

    if options.builtins {
        register_builtins(&global);
    }

    for definition in &program.definitions {
        match definition {
            GlobalDefinition::Function(def) => register_function(def, &global)?,
            GlobalDefinition::Constant(def) => register_constants(def, &global)?,
        }
    }

    debug!(
        "Registered {} functions and {} constants",
        global.functions.borrow().len(),
        global.constants.borrow().len()
    );

    Ok(global)
}

fn register_function(def: &Rc<FunctionDefinition>, global: &Rc<GlobalScope>) -> Result<(), Error> {
    let enclosing = Scope::Global(Rc::clone(global));
    let (scope, func) = declare_function(def, &enclosing, None)?;
    debug!("Registering {}", func);

    if let Err(existing) = global.define_function(Rc::clone(&func)) {
        return Err(Error::new(
            ErrorImpl::FunctionAlreadyDeclared {
                function: existing.to_string(),
            },
            def.get_span().start.clone(),
        ));
    }

    global.function_scopes.borrow_mut().push(scope);
    Ok(())
}

/// Builds the function scope and symbol for `def` and links them to the
/// definition and its parameters. Neither is added to any scope's lists.
///
/// `concrete` supplies the parameter types of a template instance or a
/// lambda; without it, untyped parameters become placeholders named after
/// their node id.
pub fn declare_function(
    def: &Rc<FunctionDefinition>,
    enclosing: &Scope,
    concrete: Option<&[Type]>,
) -> Result<(Rc<FunctionScope>, Rc<FuncSymbol>), Error> {
    let scope = FunctionScope::new(def, enclosing);
    let owner = WeakScope::Function(Rc::downgrade(&scope));

    let mut params: Vec<Rc<VarSymbol>> = Vec::with_capacity(def.params.len());
    for (index, param) in def.params.iter().enumerate() {
        if params.iter().any(|existing| existing.name == param.name) {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: param.name.clone(),
                },
                param.get_span().start.clone(),
            ));
        }

        let ty = match (concrete, &param.param_type) {
            (Some(types), _) => types[index].clone(),
            (None, Some(node)) => Type::from_node(node)?,
            (None, None) => Type::Template(param.get_id()),
        };

        let symbol = VarSymbol::new(&param.name, Some(ty), param.is_var, owner.clone());
        let _ = param.symbol.set(Rc::downgrade(&symbol));
        params.push(symbol);
    }

    let ret_type = OnceCell::new();
    if let (true, Some(node)) = (def.kind.returns_value(), &def.return_type) {
        let _ = ret_type.set(Type::from_node(node)?);
    }

    let func = Rc::new(FuncSymbol {
        name: def.name.clone(),
        params,
        ret_type,
        kind: def.kind,
        is_builtin: false,
        decl: Rc::downgrade(def),
    });

    let _ = scope.func.set(Rc::downgrade(&func));
    let _ = def.scope.set(Rc::downgrade(&scope));

    Ok((scope, func))
}

fn register_constants(def: &ConstantDefinition, global: &Rc<GlobalScope>) -> Result<(), Error> {
    for decl in &def.decls {
        let ty = match &decl.explicit_type {
            Some(node) => Some(Type::from_node(node)?),
            None => None,
        };

        let symbol = VarSymbol::new(&decl.name, ty, false, WeakScope::Global(Rc::downgrade(global)));
        debug!("Registering constant {}", symbol);

        if global.define_constant(Rc::clone(&symbol)).is_err() {
            return Err(Error::new(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: decl.name.clone(),
                },
                decl.get_span().start.clone(),
            ));
        }
        let _ = decl.symbol.set(Rc::downgrade(&symbol));
    }

    Ok(())
}
