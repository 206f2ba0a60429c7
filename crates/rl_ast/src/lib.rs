// rl_ast - Syntax tree interface for the rule-expression language
//! This crate defines the narrow syntax-tree contract the binder consumes.
//!
//! Parsing is performed elsewhere; whatever produces the tree only has to
//! hand over [`SyntaxNode`] values: a node kind, an optional text payload
//! (identifier, literal text, operator-specific name) and indexed children.

pub mod build;
pub mod node;
pub mod types;

pub use node::*;
pub use types::*;

#[cfg(test)]
mod tests;
