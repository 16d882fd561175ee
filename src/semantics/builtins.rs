//! Intrinsic functions available to every program.

use std::{cell::OnceCell, rc::{Rc, Weak}};

use lazy_static::lazy_static;
use log::debug;

use crate::ast::statements::FuncKind;

use super::{
    scope::{GlobalScope, WeakScope},
    symbol::{FuncSymbol, VarSymbol},
    types::Type,
};

pub struct BuiltinSignature {
    pub name: &'static str,
    pub kind: FuncKind,
    pub params: Vec<(&'static str, Type)>,
    pub ret: Option<Type>,
}

lazy_static! {
    // Placeholder ids sit below the first node id so they never collide
    // with a parameter from the source.
    pub static ref BUILTINS: Vec<BuiltinSignature> = vec![
        BuiltinSignature {
            name: "print",
            kind: FuncKind::Proc,
            params: vec![("value", Type::Template(1))],
            ret: None,
        },
        BuiltinSignature {
            name: "println",
            kind: FuncKind::Proc,
            params: vec![("value", Type::Template(2))],
            ret: None,
        },
        BuiltinSignature {
            name: "to_string",
            kind: FuncKind::Func,
            params: vec![("value", Type::Template(3))],
            ret: Some(Type::string()),
        },
        BuiltinSignature {
            name: "abs",
            kind: FuncKind::Func,
            params: vec![("value", Type::int())],
            ret: Some(Type::int()),
        },
        BuiltinSignature {
            name: "abs",
            kind: FuncKind::Func,
            params: vec![("value", Type::float())],
            ret: Some(Type::float()),
        },
        BuiltinSignature {
            name: "sqrt",
            kind: FuncKind::Func,
            params: vec![("value", Type::float())],
            ret: Some(Type::float()),
        },
        BuiltinSignature {
            name: "read_line",
            kind: FuncKind::Func,
            params: vec![],
            ret: Some(Type::string()),
        },
    ];
}

impl BuiltinSignature {
    fn to_symbol(&self, global: &Rc<GlobalScope>) -> Rc<FuncSymbol> {
        let params = self
            .params
            .iter()
            .map(|(name, ty)| {
                VarSymbol::new(
                    name,
                    Some(ty.clone()),
                    false,
                    WeakScope::Global(Rc::downgrade(global)),
                )
            })
            .collect();

        let ret_type = OnceCell::new();
        if let Some(ret) = &self.ret {
            let _ = ret_type.set(ret.clone());
        }

        Rc::new(FuncSymbol {
            name: String::from(self.name),
            params,
            ret_type,
            kind: self.kind,
            is_builtin: true,
            decl: Weak::new(),
        })
    }
}

pub fn register_builtins(global: &Rc<GlobalScope>) {
    for signature in BUILTINS.iter() {
        let symbol = signature.to_symbol(global);
        debug!("Registering builtin {}", symbol);
        // The table holds no duplicates.
        let _ = global.define_function(symbol);
    }
}
