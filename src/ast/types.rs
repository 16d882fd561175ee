use std::fmt::Display;

use crate::semantics::types::Qualifier;

use super::{
    ast::{Node, NodeMeta},
    statements::FuncKind,
};

/// A type as written in the source. The resolver turns it into a
/// [`crate::semantics::types::Type`].
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub meta: NodeMeta,
    pub kind: TypeNodeKind,
}

#[derive(Debug, Clone)]
pub enum TypeNodeKind {
    /// `int`, `string`, `range(int)`
    Primary { name: String, args: Vec<TypeNode> },
    Array(Box<TypeNode>),
    Dict(Box<TypeNode>, Box<TypeNode>),
    Tuple(Vec<TypeNode>),
    Func {
        kind: FuncKind,
        params: Vec<TypeNode>,
        ret: Option<Box<TypeNode>>,
    },
    Qualified {
        qualifier: Qualifier,
        inner: Box<TypeNode>,
    },
}

impl Node for TypeNode {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        format!("TypeNode({})", self)
    }
}

fn join(types: &[TypeNode]) -> String {
    types
        .iter()
        .map(|ty| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TypeNodeKind::Primary { name, args } if args.is_empty() => write!(f, "{}", name),
            TypeNodeKind::Primary { name, args } => write!(f, "{}({})", name, join(args)),
            TypeNodeKind::Array(elem) => write!(f, "[{}]", elem),
            TypeNodeKind::Dict(key, value) => write!(f, "{{{} => {}}}", key, value),
            TypeNodeKind::Tuple(elems) => write!(f, "({})", join(elems)),
            TypeNodeKind::Func { kind, params, ret } => match ret {
                Some(ret) => write!(f, "{}({}) : {}", kind, join(params), ret),
                None => write!(f, "{}({})", kind, join(params)),
            },
            TypeNodeKind::Qualified { qualifier, inner } => match qualifier {
                Qualifier::Ref => write!(f, "&{}", inner),
                Qualifier::Maybe => write!(f, "{}?", inner),
            },
        }
    }
}
