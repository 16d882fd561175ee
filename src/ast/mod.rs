/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Node identity, the `Node` trait and the program root
/// - expressions: Expression nodes, each with a write-once type slot
/// - statements: Statements, blocks, declarations and definitions
/// - types: Type annotations as written in the source
/// - instantiate: Deep copies of function definitions for generics
pub mod ast;
pub mod expressions;
pub mod instantiate;
pub mod statements;
pub mod types;
