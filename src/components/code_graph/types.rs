//! Graph data structures returned by the code analyzer.
//!
//! Node and edge kinds are kept open: strings outside the known sets are
//! preserved verbatim so the styling layer can decide how to treat them.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::DataContractError;

/// Structural role of a node in the analyzed code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum NodeKind {
	File,
	Class,
	Function,
	Method,
	Import,
	Error,
	/// Any type string the analyzer sent that is not one of the above.
	Other(String),
}

impl NodeKind {
	pub fn as_str(&self) -> &str {
		match self {
			NodeKind::File => "file",
			NodeKind::Class => "class",
			NodeKind::Function => "function",
			NodeKind::Method => "method",
			NodeKind::Import => "import",
			NodeKind::Error => "error",
			NodeKind::Other(s) => s,
		}
	}

	pub fn is_known(&self) -> bool {
		!matches!(self, NodeKind::Other(_))
	}
}

impl From<String> for NodeKind {
	fn from(s: String) -> Self {
		match s.as_str() {
			"file" => NodeKind::File,
			"class" => NodeKind::Class,
			"function" => NodeKind::Function,
			"method" => NodeKind::Method,
			"import" => NodeKind::Import,
			"error" => NodeKind::Error,
			_ => NodeKind::Other(s),
		}
	}
}

impl From<&str> for NodeKind {
	fn from(s: &str) -> Self {
		s.to_string().into()
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Relationship carried by an edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum EdgeKind {
	Defines,
	Calls,
	Imports,
	Contains,
	Other(String),
}

impl EdgeKind {
	/// The four relationships the analyzer documents, in marker order.
	pub const KNOWN: [EdgeKind; 4] = [
		EdgeKind::Defines,
		EdgeKind::Calls,
		EdgeKind::Imports,
		EdgeKind::Contains,
	];

	pub fn as_str(&self) -> &str {
		match self {
			EdgeKind::Defines => "defines",
			EdgeKind::Calls => "calls",
			EdgeKind::Imports => "imports",
			EdgeKind::Contains => "contains",
			EdgeKind::Other(s) => s,
		}
	}
}

impl From<String> for EdgeKind {
	fn from(s: String) -> Self {
		match s.as_str() {
			"defines" => EdgeKind::Defines,
			"calls" => EdgeKind::Calls,
			"imports" => EdgeKind::Imports,
			"contains" => EdgeKind::Contains,
			_ => EdgeKind::Other(s),
		}
	}
}

impl From<&str> for EdgeKind {
	fn from(s: &str) -> Self {
		s.to_string().into()
	}
}

impl fmt::Display for EdgeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A node in the code graph.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GraphNode {
	/// Unique identifier. Edges reference nodes by this value.
	pub id: String,
	/// Display name, used as the node label.
	pub name: String,
	#[serde(rename = "type")]
	pub kind: NodeKind,
	#[serde(default)]
	pub complexity: Option<i64>,
	#[serde(default)]
	pub maintainability: Option<f64>,
	#[serde(default)]
	pub documentation: Option<String>,
	#[serde(default)]
	pub code_snippet: Option<String>,
}

impl GraphNode {
	/// Creates a node with no metrics attached.
	pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<NodeKind>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			kind: kind.into(),
			complexity: None,
			maintainability: None,
			documentation: None,
			code_snippet: None,
		}
	}
}

/// A directed, typed edge between two nodes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	#[serde(rename = "type")]
	pub kind: EdgeKind,
}

impl GraphEdge {
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		kind: impl Into<EdgeKind>,
	) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			kind: kind.into(),
		}
	}
}

/// Complete graph payload: nodes in display order plus typed edges.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	#[serde(alias = "edges", default)]
	pub links: Vec<GraphEdge>,
}

impl GraphData {
	/// Decodes the analyzer's `graph_data` object item by item, so a node or
	/// edge missing a required field is reported with its index.
	pub fn from_value(value: Value) -> Result<Self, DataContractError> {
		let Value::Object(mut fields) = value else {
			return Err(DataContractError::MalformedGraph("expected an object".into()));
		};
		let nodes = match take_array(&mut fields, &["nodes"])? {
			Some(items) => decode_items(items, |index, reason| DataContractError::MalformedNode {
				index,
				reason,
			})?,
			None => return Err(DataContractError::MalformedGraph("missing field `nodes`".into())),
		};
		let links = match take_array(&mut fields, &["links", "edges"])? {
			Some(items) => decode_items(items, |index, reason| DataContractError::MalformedEdge {
				index,
				reason,
			})?,
			None => Vec::new(),
		};
		Ok(Self { nodes, links })
	}

	/// Checks the contract the layout engine relies on: non-empty unique node
	/// ids and edges whose endpoints all exist.
	pub fn validate(&self) -> Result<(), DataContractError> {
		let mut seen: HashSet<&str> = HashSet::with_capacity(self.nodes.len());
		for (index, node) in self.nodes.iter().enumerate() {
			if node.id.is_empty() {
				return Err(DataContractError::EmptyNodeId { index });
			}
			if !seen.insert(node.id.as_str()) {
				return Err(DataContractError::DuplicateNodeId(node.id.clone()));
			}
		}

		for (index, edge) in self.links.iter().enumerate() {
			for (endpoint, id) in [("source", &edge.source), ("target", &edge.target)] {
				if !seen.contains(id.as_str()) {
					return Err(DataContractError::DanglingEdge {
						index,
						endpoint,
						id: id.clone(),
					});
				}
			}
		}
		Ok(())
	}
}

fn take_array(
	fields: &mut Map<String, Value>,
	keys: &[&str],
) -> Result<Option<Vec<Value>>, DataContractError> {
	let Some((key, value)) = keys.iter().find_map(|k| fields.remove(*k).map(|v| (*k, v))) else {
		return Ok(None);
	};
	match value {
		Value::Array(items) => Ok(Some(items)),
		Value::Null => Ok(None),
		_ => Err(DataContractError::MalformedGraph(format!("`{}` is not an array", key))),
	}
}

fn decode_items<T: DeserializeOwned>(
	items: Vec<Value>,
	malformed: impl Fn(usize, String) -> DataContractError,
) -> Result<Vec<T>, DataContractError> {
	items
		.into_iter()
		.enumerate()
		.map(|(index, item)| serde_json::from_value(item).map_err(|e| malformed(index, e.to_string())))
		.collect()
}

/// Body of a `POST /upload` response.
///
/// `graph_data` stays raw JSON until [`GraphData::from_value`] checks it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UploadResponse {
	#[serde(default)]
	pub error: Option<String>,
	#[serde(default)]
	pub graph_data: Option<Value>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_analyzer_payload() {
		let json = r#"{
			"success": true,
			"graph_data": {
				"nodes": [
					{"id": "a.py", "type": "file", "name": "a.py", "complexity": 0,
					 "maintainability": 71.5, "documentation": "", "code_snippet": ""},
					{"id": "a.py:f", "type": "function", "name": "f"},
					{"id": "a.py_error", "type": "weird", "name": "oops"}
				],
				"links": [
					{"source": "a.py", "target": "a.py:f", "type": "defines", "weight": 1},
					{"source": "a.py", "target": "a.py_error", "type": "contains_error"}
				]
			},
			"metrics": {"loc": 10}
		}"#;
		let resp: UploadResponse = serde_json::from_str(json).unwrap();
		let data = GraphData::from_value(resp.graph_data.unwrap()).unwrap();
		assert_eq!(data.nodes.len(), 3);
		assert_eq!(data.nodes[0].kind, NodeKind::File);
		assert_eq!(data.nodes[0].maintainability, Some(71.5));
		assert_eq!(data.nodes[2].kind, NodeKind::Other("weird".into()));
		assert_eq!(data.links[0].kind, EdgeKind::Defines);
		assert_eq!(data.links[1].kind.as_str(), "contains_error");
		assert!(data.validate().is_ok());
	}

	#[test]
	fn accepts_edges_alias() {
		let json = r#"{"nodes": [{"id": "x", "type": "file", "name": "x"}], "edges": []}"#;
		let data: GraphData = serde_json::from_str(json).unwrap();
		assert!(data.links.is_empty());
	}

	#[test]
	fn dangling_edge_is_a_contract_error() {
		let data = GraphData {
			nodes: vec![GraphNode::new("a", "a", "file")],
			links: vec![GraphEdge::new("a", "missing", "calls")],
		};
		assert_eq!(
			data.validate(),
			Err(DataContractError::DanglingEdge {
				index: 0,
				endpoint: "target",
				id: "missing".into(),
			})
		);
	}

	#[test]
	fn empty_and_duplicate_ids_are_rejected() {
		let empty = GraphData {
			nodes: vec![GraphNode::new("", "anon", "class")],
			links: vec![],
		};
		assert_eq!(
			empty.validate(),
			Err(DataContractError::EmptyNodeId { index: 0 })
		);

		let dup = GraphData {
			nodes: vec![GraphNode::new("a", "a", "file"), GraphNode::new("a", "b", "file")],
			links: vec![],
		};
		assert_eq!(
			dup.validate(),
			Err(DataContractError::DuplicateNodeId("a".into()))
		);
	}

	#[test]
	fn missing_node_field_is_a_contract_error() {
		let value = serde_json::json!({
			"nodes": [
				{"id": "x", "type": "file", "name": "x"},
				{"id": "y", "type": "file"}
			],
			"links": []
		});
		let err = GraphData::from_value(value).unwrap_err();
		assert!(matches!(
			&err,
			DataContractError::MalformedNode { index: 1, reason } if reason.contains("`name`")
		));
	}

	#[test]
	fn malformed_edges_and_shapes_are_contract_errors() {
		let edge = serde_json::json!({
			"nodes": [{"id": "x", "type": "file", "name": "x"}],
			"edges": [{"source": "x", "type": "calls"}]
		});
		assert!(matches!(
			GraphData::from_value(edge),
			Err(DataContractError::MalformedEdge { index: 0, .. })
		));

		assert!(matches!(
			GraphData::from_value(serde_json::json!({"links": []})),
			Err(DataContractError::MalformedGraph(_))
		));
		assert!(matches!(
			GraphData::from_value(serde_json::json!({"nodes": {}})),
			Err(DataContractError::MalformedGraph(_))
		));
		assert!(matches!(
			GraphData::from_value(serde_json::json!([])),
			Err(DataContractError::MalformedGraph(_))
		));
	}

	#[test]
	fn links_default_to_empty() {
		let data = GraphData::from_value(serde_json::json!({
			"nodes": [{"id": "x", "type": "file", "name": "x"}]
		}))
		.unwrap();
		assert_eq!(data.nodes.len(), 1);
		assert!(data.links.is_empty());
	}
}
