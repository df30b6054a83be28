//! Force-directed code graph visualization.
//!
//! Renders an analyzed code-structure graph on an HTML canvas with:
//! - Physics-based layout tuned per node and edge type
//! - Pan, zoom, and drag-to-pin node interaction
//! - Hover highlighting of a node's direct neighborhood with a metrics tooltip
//! - A single owned visualization session, fully torn down between uploads
//!
//! # Example
//!
//! ```ignore
//! use code_graph_viz::{CodeGraphViewport, GraphHandle, VizConfig};
//!
//! let handle = GraphHandle::default();
//! view! { <CodeGraphViewport handle=handle.clone() config=VizConfig::default() /> };
//! // later, once a graph arrives:
//! handle.show(&graph_data)?;
//! ```

mod component;
pub mod config;
pub mod error;
pub mod interaction;
mod render;
pub mod scene;
pub mod session;
pub mod simulation;
pub mod state;
pub mod style;
mod surface;
pub mod types;

pub use component::{CodeGraphViewport, GraphHandle};
pub use config::VizConfig;
pub use error::{DataContractError, LifecycleError, StyleError, VizError};
pub use session::{Host, SessionManager, SharedView, Surface, VisualizationSession};
pub use types::{EdgeKind, GraphData, GraphEdge, GraphNode, NodeKind};
