//! Core data structures for the Tanto kernel frontend.
//!
//! This crate holds the language-neutral pieces shared across passes:
//! - `span` - source positions and the `StmtKey` lookup key
//! - `graph` - the statement graph built from a parsed kernel
//! - `log` - session-local error collection

pub mod graph;
pub mod log;
pub mod span;

#[cfg(test)]
mod graph_tests;

pub use graph::{
    FuncId, FuncNode, GraphVisitor, StmtClass, StmtGraph, StmtId, StmtNode, VarId, VarNode,
};
pub use log::ErrorLog;
pub use span::{Span, StmtKey};
