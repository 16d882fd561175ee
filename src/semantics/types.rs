//! The semantic type model.
//!
//! Equality is structural and deep. A template placeholder equals only a
//! placeholder with the same id; matching a placeholder against a
//! concrete type is the overload engine's business, not equality's.

use std::fmt::Display;

use crate::{
    ast::{
        ast::Node,
        statements::FuncKind,
        types::{TypeNode, TypeNodeKind},
    },
    errors::errors::{Error, ErrorImpl},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Int,
    Uint,
    Float,
    Char,
    Bool,
    String,
    Symbol,
}

impl BuiltinType {
    pub fn from_name(name: &str) -> Option<BuiltinType> {
        let builtin = match name {
            "int" => BuiltinType::Int,
            "uint" => BuiltinType::Uint,
            "float" => BuiltinType::Float,
            "char" => BuiltinType::Char,
            "bool" => BuiltinType::Bool,
            "string" => BuiltinType::String,
            "symbol" => BuiltinType::Symbol,
            _ => return None,
        };
        Some(builtin)
    }
}

impl Display for BuiltinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuiltinType::Int => "int",
            BuiltinType::Uint => "uint",
            BuiltinType::Float => "float",
            BuiltinType::Char => "char",
            BuiltinType::Bool => "bool",
            BuiltinType::String => "string",
            BuiltinType::Symbol => "symbol",
        };
        write!(f, "{}", name)
    }
}

/// Id of the parameter node that introduced a template placeholder.
pub type TemplateId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Ref,
    Maybe,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Builtin(BuiltinType),
    Template(TemplateId),
    Array(Box<Type>),
    /// Never has exactly one element. The empty tuple is the unit type.
    Tuple(Vec<Type>),
    Dict(Box<Type>, Box<Type>),
    /// `ret` is `None` for procedures.
    Func {
        params: Vec<Type>,
        ret: Option<Box<Type>>,
    },
    Class {
        name: String,
        args: Vec<Type>,
    },
    Qualified {
        qualifier: Option<Qualifier>,
        inner: Box<Type>,
    },
}

impl Type {
    pub fn int() -> Type {
        Type::Builtin(BuiltinType::Int)
    }

    pub fn uint() -> Type {
        Type::Builtin(BuiltinType::Uint)
    }

    pub fn float() -> Type {
        Type::Builtin(BuiltinType::Float)
    }

    pub fn char() -> Type {
        Type::Builtin(BuiltinType::Char)
    }

    pub fn bool() -> Type {
        Type::Builtin(BuiltinType::Bool)
    }

    pub fn string() -> Type {
        Type::Builtin(BuiltinType::String)
    }

    pub fn symbol() -> Type {
        Type::Builtin(BuiltinType::Symbol)
    }

    pub fn unit() -> Type {
        Type::Tuple(vec![])
    }

    pub fn array(elem: Type) -> Type {
        Type::Array(Box::new(elem))
    }

    pub fn dict(key: Type, value: Type) -> Type {
        Type::Dict(Box::new(key), Box::new(value))
    }

    pub fn range(elem: Type) -> Type {
        Type::Class {
            name: String::from("range"),
            args: vec![elem],
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Type::Template(_))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Type::Tuple(elems) if elems.is_empty())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Builtin(BuiltinType::Int | BuiltinType::Uint | BuiltinType::Float)
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Type::Builtin(BuiltinType::Int | BuiltinType::Uint))
    }

    /// Resolves a type annotation. Unknown names are reported at the
    /// annotation.
    pub fn from_node(node: &TypeNode) -> Result<Type, Error> {
        let ty = match &node.kind {
            TypeNodeKind::Primary { name, args } => match (BuiltinType::from_name(name), args.len()) {
                (Some(builtin), 0) => Type::Builtin(builtin),
                (None, 1) if name == "range" => Type::range(Type::from_node(&args[0])?),
                _ => {
                    return Err(Error::new(
                        ErrorImpl::UnknownType {
                            type_: node.to_string(),
                        },
                        node.get_span().start.clone(),
                    ))
                }
            },
            TypeNodeKind::Array(elem) => Type::array(Type::from_node(elem)?),
            TypeNodeKind::Dict(key, value) => {
                Type::dict(Type::from_node(key)?, Type::from_node(value)?)
            }
            TypeNodeKind::Tuple(elems) => Type::Tuple(
                elems
                    .iter()
                    .map(Type::from_node)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            TypeNodeKind::Func { kind, params, ret } => {
                let params = params
                    .iter()
                    .map(Type::from_node)
                    .collect::<Result<Vec<_>, _>>()?;
                let ret = match (kind, ret) {
                    (FuncKind::Proc, _) => None,
                    (_, Some(ret)) => Some(Box::new(Type::from_node(ret)?)),
                    (_, None) => Some(Box::new(Type::unit())),
                };
                Type::Func { params, ret }
            }
            TypeNodeKind::Qualified { qualifier, inner } => Type::Qualified {
                qualifier: Some(*qualifier),
                inner: Box::new(Type::from_node(inner)?),
            },
        };

        Ok(ty)
    }
}

fn join(types: &[Type]) -> String {
    types
        .iter()
        .map(|ty| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Builtin(builtin) => write!(f, "{}", builtin),
            Type::Template(id) => write!(f, "template#{}", id),
            Type::Array(elem) => write!(f, "[{}]", elem),
            Type::Tuple(elems) => write!(f, "({})", join(elems)),
            Type::Dict(key, value) => write!(f, "{{{} => {}}}", key, value),
            Type::Func { params, ret } => match ret {
                Some(ret) => write!(f, "func({}) : {}", join(params), ret),
                None => write!(f, "proc({})", join(params)),
            },
            Type::Class { name, args } if args.is_empty() => write!(f, "{}", name),
            Type::Class { name, args } => write!(f, "{}({})", name, join(args)),
            Type::Qualified { qualifier, inner } => match qualifier {
                Some(Qualifier::Ref) => write!(f, "&{}", inner),
                Some(Qualifier::Maybe) => write!(f, "{}?", inner),
                None => write!(f, "{}", inner),
            },
        }
    }
}
