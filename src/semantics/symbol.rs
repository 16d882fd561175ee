use std::{
    cell::OnceCell,
    fmt::Display,
    rc::{Rc, Weak},
};

use crate::ast::statements::{FuncKind, FunctionDefinition};

use super::{scope::WeakScope, types::Type};

/// A variable, parameter or constant. Owned by exactly one scope;
/// parameters are owned through their [`FuncSymbol`].
#[derive(Debug)]
pub struct VarSymbol {
    pub name: String,
    /// Empty only for constants whose initializer has not been resolved yet.
    pub ty: OnceCell<Type>,
    pub is_var: bool,
    pub owner: WeakScope,
}

impl VarSymbol {
    pub fn new(name: &str, ty: Option<Type>, is_var: bool, owner: WeakScope) -> Rc<VarSymbol> {
        let cell = OnceCell::new();
        if let Some(ty) = ty {
            let _ = cell.set(ty);
        }

        Rc::new(VarSymbol {
            name: String::from(name),
            ty: cell,
            is_var,
            owner,
        })
    }

    pub fn get_type(&self) -> Option<&Type> {
        self.ty.get()
    }
}

impl Display for VarSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keyword = if self.is_var { "var" } else { "val" };
        match self.get_type() {
            Some(ty) => write!(f, "{} {} : {}", keyword, self.name, ty),
            None => write!(f, "{} {}", keyword, self.name),
        }
    }
}

#[derive(Debug)]
pub struct FuncSymbol {
    pub name: String,
    pub params: Vec<Rc<VarSymbol>>,
    /// Never set for procedures. Set at registration when declared,
    /// otherwise once the body's first `return` is resolved.
    pub ret_type: OnceCell<Type>,
    pub kind: FuncKind,
    pub is_builtin: bool,
    pub decl: Weak<FunctionDefinition>,
}

impl FuncSymbol {
    pub fn param_types(&self) -> Vec<Type> {
        self.params
            .iter()
            .map(|param| param.get_type().cloned().unwrap_or_else(Type::unit))
            .collect()
    }

    pub fn get_return_type(&self) -> Option<&Type> {
        self.ret_type.get()
    }

    pub fn is_template(&self) -> bool {
        self.params
            .iter()
            .any(|param| param.get_type().is_some_and(Type::is_template))
    }

    /// The function's value type, once its return type is known.
    pub fn func_type(&self) -> Option<Type> {
        let ret = match self.kind {
            FuncKind::Proc => None,
            FuncKind::Func | FuncKind::Lambda => Some(Box::new(self.get_return_type()?.clone())),
        };

        Some(Type::Func {
            params: self.param_types(),
            ret,
        })
    }

    /// The declaring definition.
    ///
    /// # Panics
    ///
    /// Builtin symbols have no declaration; check `is_builtin` first.
    pub fn get_declaration(&self) -> Rc<FunctionDefinition> {
        assert!(
            !self.is_builtin,
            "builtin function `{}` has no declaration",
            self.name
        );

        self.decl
            .upgrade()
            .expect("function declaration dropped while its symbol is alive")
    }
}

/// Declaration-level equality: same name and arity, and at every position
/// either both parameters are placeholders or neither is and the types are
/// equal. A placeholder never equals a concrete type, so `f(x)` and
/// `f(x: int)` are distinct overloads.
impl PartialEq for FuncSymbol {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.params.len() != other.params.len() {
            return false;
        }

        self.params.iter().zip(other.params.iter()).all(|(lhs, rhs)| {
            match (lhs.get_type(), rhs.get_type()) {
                (Some(lhs), Some(rhs)) if lhs.is_template() || rhs.is_template() => {
                    lhs.is_template() && rhs.is_template()
                }
                (lhs, rhs) => lhs == rhs,
            }
        })
    }
}

impl Display for FuncSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_builtin {
            let names = self
                .params
                .iter()
                .map(|param| param.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return write!(f, "func {}({})", self.name, names);
        }

        let types = self
            .params
            .iter()
            .map(|param| match param.get_type() {
                Some(ty) => ty.to_string(),
                None => String::from("?"),
            })
            .collect::<Vec<_>>()
            .join(", ");

        write!(f, "{} {}({})", self.kind, self.name, types)?;
        if let Some(ret) = self.get_return_type() {
            write!(f, ": {}", ret)?;
        }
        Ok(())
    }
}

/// What a name reference resolved to.
#[derive(Debug, Clone)]
pub enum SymbolRef {
    Var(Weak<VarSymbol>),
    Func(Weak<FuncSymbol>),
}

impl SymbolRef {
    pub fn as_var(&self) -> Option<Rc<VarSymbol>> {
        match self {
            SymbolRef::Var(var) => var.upgrade(),
            SymbolRef::Func(_) => None,
        }
    }

    pub fn as_func(&self) -> Option<Rc<FuncSymbol>> {
        match self {
            SymbolRef::Func(func) => func.upgrade(),
            SymbolRef::Var(_) => None,
        }
    }
}
