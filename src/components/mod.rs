//! UI components.

pub mod code_graph;
pub mod upload;
