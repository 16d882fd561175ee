//! The scope tree.
//!
//! Scopes own their symbols through `Rc`; everything pointing upwards or
//! back into the AST is `Weak`. The global scope owns the function scopes,
//! which own their block scopes, which own nested block scopes. A lambda's
//! function scope is owned by the global scope too but encloses through
//! the block it was written in.

use std::{
    cell::{OnceCell, RefCell},
    rc::{Rc, Weak},
};

use crate::ast::statements::{FunctionDefinition, StatementBlock};

use super::{
    overload::select_overload,
    symbol::{FuncSymbol, VarSymbol},
    types::Type,
};

#[derive(Debug, Default)]
pub struct GlobalScope {
    /// Declaration order, which is also overload resolution order.
    pub functions: RefCell<Vec<Rc<FuncSymbol>>>,
    pub function_scopes: RefCell<Vec<Rc<FunctionScope>>>,
    pub constants: RefCell<Vec<Rc<VarSymbol>>>,
    /// Concrete symbols created by instantiating template functions.
    pub instances: RefCell<Vec<Rc<FuncSymbol>>>,
    pub instance_scopes: RefCell<Vec<Rc<FunctionScope>>>,
    pub lambdas: RefCell<Vec<Rc<FuncSymbol>>>,
    pub lambda_scopes: RefCell<Vec<Rc<FunctionScope>>>,
}

impl GlobalScope {
    pub fn new() -> Rc<GlobalScope> {
        Rc::new(GlobalScope::default())
    }

    /// Adds `func` unless a declaration-equal function already exists, in
    /// which case that function is returned.
    pub fn define_function(&self, func: Rc<FuncSymbol>) -> Result<(), Rc<FuncSymbol>> {
        let mut functions = self.functions.borrow_mut();
        if let Some(existing) = functions.iter().find(|existing| ***existing == *func) {
            return Err(Rc::clone(existing));
        }
        functions.push(func);
        Ok(())
    }

    pub fn define_constant(&self, constant: Rc<VarSymbol>) -> Result<(), Rc<VarSymbol>> {
        let mut constants = self.constants.borrow_mut();
        if let Some(existing) = constants.iter().find(|c| c.name == constant.name) {
            return Err(Rc::clone(existing));
        }
        constants.push(constant);
        Ok(())
    }

    pub fn lookup_constant(&self, name: &str) -> Option<Rc<VarSymbol>> {
        self.constants
            .borrow()
            .iter()
            .find(|constant| constant.name == name)
            .cloned()
    }

    /// Every global function named `name`, in declaration order.
    pub fn lookup_functions(&self, name: &str) -> Vec<Rc<FuncSymbol>> {
        self.functions
            .borrow()
            .iter()
            .filter(|func| func.name == name)
            .cloned()
            .collect()
    }

    /// Picks the best overload of `name` for `args`.
    pub fn resolve_func(&self, name: &str, args: &[Type]) -> Option<Rc<FuncSymbol>> {
        let functions = self.functions.borrow();
        select_overload(functions.iter(), name, args).map(|(func, _)| func)
    }
}

#[derive(Debug)]
pub struct FunctionScope {
    /// Set right after the symbol is built; the symbol's parameters are
    /// this scope's parameter symbols.
    pub func: OnceCell<Weak<FuncSymbol>>,
    pub def: Weak<FunctionDefinition>,
    /// The global scope for named functions, the defining scope for lambdas.
    pub enclosing: WeakScope,
    pub locals: RefCell<Vec<Rc<LocalScope>>>,
}

impl FunctionScope {
    pub fn new(def: &Rc<FunctionDefinition>, enclosing: &Scope) -> Rc<FunctionScope> {
        Rc::new(FunctionScope {
            func: OnceCell::new(),
            def: Rc::downgrade(def),
            enclosing: enclosing.downgrade(),
            locals: RefCell::new(vec![]),
        })
    }

    pub fn get_func(&self) -> Option<Rc<FuncSymbol>> {
        self.func.get().and_then(Weak::upgrade)
    }

    pub fn lookup_param(&self, name: &str) -> Option<Rc<VarSymbol>> {
        let func = self.get_func()?;
        func.params.iter().find(|param| param.name == name).cloned()
    }
}

#[derive(Debug)]
pub struct LocalScope {
    pub vars: RefCell<Vec<Rc<VarSymbol>>>,
    pub parent: WeakScope,
    /// Empty for the scope opened by a `let` statement.
    pub block: Weak<StatementBlock>,
    pub children: RefCell<Vec<Rc<LocalScope>>>,
}

impl LocalScope {
    /// Adds `var` unless a variable with the same name was already declared
    /// directly in this scope.
    pub fn define_var(&self, var: Rc<VarSymbol>) -> Result<(), Rc<VarSymbol>> {
        let mut vars = self.vars.borrow_mut();
        if let Some(existing) = vars.iter().find(|v| v.name == var.name) {
            return Err(Rc::clone(existing));
        }
        vars.push(var);
        Ok(())
    }

    pub fn lookup_own(&self, name: &str) -> Option<Rc<VarSymbol>> {
        self.vars.borrow().iter().find(|v| v.name == name).cloned()
    }
}

/// A strong handle on any scope; the resolver threads one of these through
/// the traversal as the current scope.
#[derive(Debug, Clone)]
pub enum Scope {
    Global(Rc<GlobalScope>),
    Function(Rc<FunctionScope>),
    Local(Rc<LocalScope>),
}

#[derive(Debug, Clone)]
pub enum WeakScope {
    Global(Weak<GlobalScope>),
    Function(Weak<FunctionScope>),
    Local(Weak<LocalScope>),
}

impl WeakScope {
    pub fn upgrade(&self) -> Option<Scope> {
        match self {
            WeakScope::Global(scope) => scope.upgrade().map(Scope::Global),
            WeakScope::Function(scope) => scope.upgrade().map(Scope::Function),
            WeakScope::Local(scope) => scope.upgrade().map(Scope::Local),
        }
    }
}

impl Scope {
    pub fn downgrade(&self) -> WeakScope {
        match self {
            Scope::Global(scope) => WeakScope::Global(Rc::downgrade(scope)),
            Scope::Function(scope) => WeakScope::Function(Rc::downgrade(scope)),
            Scope::Local(scope) => WeakScope::Local(Rc::downgrade(scope)),
        }
    }

    /// Innermost-first lookup: block scopes, then the function's
    /// parameters, then whatever encloses the function (the scopes around a
    /// lambda, or the global constants). Functions are looked up separately
    /// through [`GlobalScope::lookup_functions`].
    pub fn lookup_var(&self, name: &str) -> Option<Rc<VarSymbol>> {
        match self {
            Scope::Local(scope) => scope
                .lookup_own(name)
                .or_else(|| scope.parent.upgrade()?.lookup_var(name)),
            Scope::Function(scope) => scope
                .lookup_param(name)
                .or_else(|| scope.enclosing.upgrade()?.lookup_var(name)),
            Scope::Global(scope) => scope.lookup_constant(name),
        }
    }

    pub fn enclosing_function(&self) -> Option<Rc<FunctionScope>> {
        match self {
            Scope::Local(scope) => scope.parent.upgrade()?.enclosing_function(),
            Scope::Function(scope) => Some(Rc::clone(scope)),
            Scope::Global(_) => None,
        }
    }

    /// Opens a nested block scope owned by this scope.
    ///
    /// # Panics
    ///
    /// Blocks only exist inside functions, so opening one directly in the
    /// global scope is an internal error.
    pub fn open_local(&self, block: Weak<StatementBlock>) -> Rc<LocalScope> {
        let local = Rc::new(LocalScope {
            vars: RefCell::new(vec![]),
            parent: self.downgrade(),
            block,
            children: RefCell::new(vec![]),
        });

        match self {
            Scope::Local(scope) => scope.children.borrow_mut().push(Rc::clone(&local)),
            Scope::Function(scope) => scope.locals.borrow_mut().push(Rc::clone(&local)),
            Scope::Global(_) => unreachable!("block scope opened directly in the global scope"),
        }

        local
    }
}
