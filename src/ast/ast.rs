use std::{
    fmt::Debug,
    rc::Rc,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::Span;

use super::statements::{ConstantDefinition, FunctionDefinition};

/// Ids below this value are reserved for nodes that do not exist in the
/// source, such as the template parameters of builtin functions.
pub const FIRST_NODE_ID: usize = 1024;

static NEXT_ID: AtomicUsize = AtomicUsize::new(FIRST_NODE_ID);

/// Mints a fresh node id. Ids increase monotonically for the lifetime of
/// the process, so they are unique within any single compilation unit.
pub fn generate_id() -> usize {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity and location shared by every node.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    pub id: usize,
    pub span: Span,
}

impl NodeMeta {
    pub fn new(span: Span) -> Self {
        NodeMeta {
            id: generate_id(),
            span,
        }
    }
}

/// Node Trait
///
/// Implemented by every AST node. `describe` is for diagnostics and
/// debugging only and never influences analysis.
pub trait Node: Debug {
    fn meta(&self) -> &NodeMeta;

    fn describe(&self) -> String;

    fn get_id(&self) -> usize {
        self.meta().id
    }

    fn get_span(&self) -> &Span {
        &self.meta().span
    }

    /// 1-based (line, column, length) of the node.
    fn location(&self) -> (u32, u32, u32) {
        let span = self.get_span();
        (span.start.line, span.start.col, span.length())
    }
}

#[derive(Debug, Clone)]
pub enum GlobalDefinition {
    Function(Rc<FunctionDefinition>),
    Constant(Rc<ConstantDefinition>),
}

impl GlobalDefinition {
    pub fn as_node(&self) -> &dyn Node {
        match self {
            GlobalDefinition::Function(def) => def.as_ref(),
            GlobalDefinition::Constant(def) => def.as_ref(),
        }
    }
}

/// Root of a compilation unit: every global definition in source order.
#[derive(Debug)]
pub struct Inu {
    pub meta: NodeMeta,
    pub definitions: Vec<GlobalDefinition>,
}

impl Inu {
    pub fn functions(&self) -> impl Iterator<Item = &Rc<FunctionDefinition>> {
        self.definitions.iter().filter_map(|def| match def {
            GlobalDefinition::Function(func) => Some(func),
            GlobalDefinition::Constant(_) => None,
        })
    }

    pub fn constants(&self) -> impl Iterator<Item = &Rc<ConstantDefinition>> {
        self.definitions.iter().filter_map(|def| match def {
            GlobalDefinition::Constant(constant) => Some(constant),
            GlobalDefinition::Function(_) => None,
        })
    }
}

impl Node for Inu {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn describe(&self) -> String {
        format!("Inu ({} definitions)", self.definitions.len())
    }
}
