//! Error taxonomy for uploads, graph validation and session lifecycle.

use thiserror::Error;

/// The analyzer returned a graph the layout engine cannot bind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataContractError {
	#[error("graph data is malformed: {0}")]
	MalformedGraph(String),
	#[error("node #{index} is malformed: {reason}")]
	MalformedNode { index: usize, reason: String },
	#[error("edge #{index} is malformed: {reason}")]
	MalformedEdge { index: usize, reason: String },
	#[error("node #{index} has an empty id")]
	EmptyNodeId { index: usize },
	#[error("duplicate node id: {0}")]
	DuplicateNodeId(String),
	#[error("edge #{index} {endpoint} references unknown node: {id}")]
	DanglingEdge {
		index: usize,
		endpoint: &'static str,
		id: String,
	},
}

/// Raised by the strict style resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
	#[error("no style defined for node type: {0}")]
	UnknownNodeKind(String),
}

/// Session ordering violations. Unreachable through `SessionManager::replace`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
	#[error("a visualization session is still live; tear it down before building")]
	SessionLive,
}

/// Top-level error for everything between a file upload and a live session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VizError {
	#[error("{0}")]
	InvalidUpload(String),
	#[error("upload failed: {0}")]
	Transport(String),
	#[error("{0}")]
	Analysis(String),
	#[error("invalid graph data: {0}")]
	DataContract(#[from] DataContractError),
	#[error("invalid graph styling: {0}")]
	Style(#[from] StyleError),
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	#[error("failed to mount visualization: {0}")]
	Mount(String),
}

impl VizError {
	/// Message shown in the error banner.
	///
	/// Transport failures get a generic message; the detail only goes to the log.
	pub fn user_message(&self) -> String {
		match self {
			VizError::Transport(_) => "An error occurred while processing the file".to_string(),
			other => other.to_string(),
		}
	}
}

/// Formats a `JsValue` error thrown by a browser API.
pub(crate) fn js_error(value: &wasm_bindgen::JsValue) -> String {
	value
		.as_string()
		.unwrap_or_else(|| format!("{:?}", value))
}
