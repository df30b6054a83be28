//! Retained visual elements built from graph data.
//!
//! The scene is the host-independent half of the render surface: one element
//! per node and edge, the arrow markers and glow filter they reference, and
//! the opacities the interaction layer writes. `sync` copies simulation
//! positions into the elements after every tick.

use std::collections::HashMap;

use super::error::StyleError;
use super::simulation::{SimLink, SimNode};
use super::style::{self, Color, StyleResolver};
use super::types::{EdgeKind, GraphData, NodeKind};

pub const NODE_STROKE_WIDTH: f64 = 2.0;
pub const HOVERED_STROKE_WIDTH: f64 = 3.0;
/// Gap between a node's rim and its label.
pub const LABEL_GAP: f64 = 5.0;

/// Directional arrowhead for one edge kind.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrowMarker {
	/// `None` for the fallback marker used by unrecognized edge kinds.
	pub kind: Option<EdgeKind>,
	pub color: Color,
	/// Arrowhead length in world units.
	pub size: f64,
}

/// Soft glow applied behind node markers.
#[derive(Clone, Debug, PartialEq)]
pub struct GlowFilter {
	pub blur: f64,
}

impl Default for GlowFilter {
	fn default() -> Self {
		Self { blur: 4.0 }
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeElement {
	pub label: String,
	pub kind: NodeKind,
	pub color: Color,
	pub radius: f64,
	pub font_size: f64,
	pub font_weight: u16,
	pub x: f64,
	pub y: f64,
	pub opacity: f64,
	pub stroke_width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeElement {
	pub source: usize,
	pub target: usize,
	pub kind: EdgeKind,
	pub color: Color,
	pub width: f64,
	/// Index into [`Scene::markers`].
	pub marker: usize,
	pub x1: f64,
	pub y1: f64,
	pub x2: f64,
	pub y2: f64,
	pub opacity: f64,
}

/// Everything needed to draw one frame, in world coordinates.
#[derive(Clone, Debug)]
pub struct Scene {
	pub width: f64,
	pub height: f64,
	pub background: Color,
	pub markers: Vec<ArrowMarker>,
	pub glow: GlowFilter,
	pub nodes: Vec<NodeElement>,
	pub edges: Vec<EdgeElement>,
}

/// Output of [`Scene::build`]: the scene plus the physics inputs that
/// mirror it index for index.
pub struct SceneParts {
	pub scene: Scene,
	pub sim_nodes: Vec<SimNode>,
	pub sim_links: Vec<SimLink>,
}

impl Scene {
	/// Builds elements and physics bodies for already validated data.
	///
	/// Edge endpoints are resolved to node indices here, so every edge id
	/// must exist (see [`GraphData::validate`]).
	pub fn build(
		data: &GraphData,
		(width, height): (f64, f64),
		resolver: &StyleResolver,
		base_edge_opacity: f64,
	) -> Result<SceneParts, StyleError> {
		let mut nodes = Vec::with_capacity(data.nodes.len());
		let mut sim_nodes = Vec::with_capacity(data.nodes.len());
		let mut id_to_idx = HashMap::with_capacity(data.nodes.len());

		for (i, node) in data.nodes.iter().enumerate() {
			let node_style = resolver.node_style(&node.kind)?;
			sim_nodes.push(SimNode::new(
				node_style.radius * 2.0,
				style::repulsion_strength(&node.kind),
			));
			nodes.push(NodeElement {
				label: node.name.clone(),
				kind: node.kind.clone(),
				color: node_style.color,
				radius: node_style.radius,
				font_size: node_style.font_size,
				font_weight: node_style.font_weight,
				x: 0.0,
				y: 0.0,
				opacity: 1.0,
				stroke_width: NODE_STROKE_WIDTH,
			});
			id_to_idx.insert(node.id.as_str(), i);
		}

		let mut markers: Vec<ArrowMarker> = EdgeKind::KNOWN
			.iter()
			.map(|kind| ArrowMarker {
				kind: Some(kind.clone()),
				color: style::edge_style_of(kind).color,
				size: 10.0,
			})
			.collect();
		let fallback_marker = markers.len();
		markers.push(ArrowMarker {
			kind: None,
			color: style::DEFAULT_EDGE_STYLE.color,
			size: 10.0,
		});

		let mut edges = Vec::with_capacity(data.links.len());
		let mut sim_links = Vec::with_capacity(data.links.len());
		for link in &data.links {
			let (Some(&source), Some(&target)) = (
				id_to_idx.get(link.source.as_str()),
				id_to_idx.get(link.target.as_str()),
			) else {
				continue;
			};
			let edge_style = style::edge_style_of(&link.kind);
			let distance = style::link_distance(
				&data.nodes[source].kind,
				&data.nodes[target].kind,
				&link.kind,
			);
			sim_links.push(SimLink::new(source, target, distance));
			edges.push(EdgeElement {
				source,
				target,
				kind: link.kind.clone(),
				color: edge_style.color,
				width: edge_style.width,
				marker: markers
					.iter()
					.position(|m| m.kind.as_ref() == Some(&link.kind))
					.unwrap_or(fallback_marker),
				x1: 0.0,
				y1: 0.0,
				x2: 0.0,
				y2: 0.0,
				opacity: base_edge_opacity,
			});
		}

		Ok(SceneParts {
			scene: Scene {
				width,
				height,
				background: Color::rgb(30, 35, 42),
				markers,
				glow: GlowFilter::default(),
				nodes,
				edges,
			},
			sim_nodes,
			sim_links,
		})
	}

	/// Writes simulation positions into node elements and recomputes edge
	/// endpoints from their resolved nodes.
	pub fn sync(&mut self, positions: &[SimNode]) {
		for (element, body) in self.nodes.iter_mut().zip(positions) {
			element.x = body.x;
			element.y = body.y;
		}
		for edge in &mut self.edges {
			let (s, t) = (&positions[edge.source], &positions[edge.target]);
			(edge.x1, edge.y1, edge.x2, edge.y2) = (s.x, s.y, t.x, t.y);
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
