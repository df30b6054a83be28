//! Pan/zoom transform, drag bookkeeping, hover neighborhoods and tooltip
//! content.

use std::collections::HashSet;

use super::scene::EdgeElement;
use super::types::GraphNode;

/// Pan and zoom transform applied to the entire graph group.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor, kept within the configured extent.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Scales by `factor` about the screen point `(sx, sy)`, clamping the
	/// resulting zoom to `[min_k, max_k]`.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64, (min_k, max_k): (f64, f64)) {
		let new_k = (self.k * factor).clamp(min_k, max_k);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Indices of every node sharing an edge with `node`, plus `node` itself.
///
/// Linear in the number of edges; only called on hover changes.
pub fn neighborhood(node: usize, edges: &[EdgeElement]) -> HashSet<usize> {
	let mut set = HashSet::from([node]);
	for edge in edges {
		if edge.source == node {
			set.insert(edge.target);
		}
		if edge.target == node {
			set.insert(edge.source);
		}
	}
	set
}

/// Text shown when hovering a node. Metrics that are absent, zero or empty
/// are left out.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipContent {
	pub title: String,
	pub lines: Vec<String>,
}

impl TooltipContent {
	pub fn for_node(node: &GraphNode) -> Self {
		let mut lines = vec![format!("Type: {}", node.kind)];
		if let Some(c) = node.complexity.filter(|c| *c != 0) {
			lines.push(format!("Complexity: {}", c));
		}
		if let Some(m) = node.maintainability.filter(|m| *m != 0.0) {
			lines.push(format!("Maintainability: {:.2}", m));
		}
		if let Some(doc) = node.documentation.as_deref().filter(|d| !d.is_empty()) {
			lines.push(format!("Documentation: {}", doc));
		}
		Self {
			title: node.name.clone(),
			lines,
		}
	}
}

/// Tooltip placement and content; the host mirrors this into its element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TooltipState {
	pub visible: bool,
	pub page_x: f64,
	pub page_y: f64,
	pub content: Option<TooltipContent>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::code_graph::style::Color;
	use crate::components::code_graph::types::EdgeKind;

	fn edge(source: usize, target: usize) -> EdgeElement {
		EdgeElement {
			source,
			target,
			kind: EdgeKind::Calls,
			color: Color::rgb(0, 0, 0),
			width: 1.0,
			marker: 0,
			x1: 0.0,
			y1: 0.0,
			x2: 0.0,
			y2: 0.0,
			opacity: 0.6,
		}
	}

	#[test]
	fn neighborhoods_follow_both_directions() {
		// A=0, B=1, C=2; A->B, C->A
		let edges = vec![edge(0, 1), edge(2, 0)];
		assert_eq!(neighborhood(0, &edges), HashSet::from([0, 1, 2]));
		assert_eq!(neighborhood(1, &edges), HashSet::from([0, 1]));
		assert_eq!(neighborhood(2, &edges), HashSet::from([0, 2]));
	}

	#[test]
	fn zoom_is_clamped_and_anchored() {
		let mut t = ViewTransform::default();
		for _ in 0..100 {
			t.zoom_at(100.0, 50.0, 1.1, (0.1, 4.0));
		}
		assert_eq!(t.k, 4.0);
		let (wx, wy) = t.screen_to_world(100.0, 50.0);
		assert!((wx - 100.0).abs() < 1e-9 && (wy - 50.0).abs() < 1e-9);

		for _ in 0..100 {
			t.zoom_at(0.0, 0.0, 1.0 / 1.1, (0.1, 4.0));
		}
		assert_eq!(t.k, 0.1);
	}

	#[test]
	fn tooltip_omits_missing_metrics() {
		let mut node = GraphNode::new("m", "parse", "function");
		node.complexity = Some(0);
		node.documentation = Some(String::new());
		let bare = TooltipContent::for_node(&node);
		assert_eq!(bare.title, "parse");
		assert_eq!(bare.lines, vec!["Type: function".to_string()]);

		node.complexity = Some(7);
		node.maintainability = Some(64.123);
		node.documentation = Some("Parses input.".into());
		let full = TooltipContent::for_node(&node);
		assert_eq!(
			full.lines,
			vec![
				"Type: function".to_string(),
				"Complexity: 7".to_string(),
				"Maintainability: 64.12".to_string(),
				"Documentation: Parses input.".to_string(),
			]
		);
	}
}
