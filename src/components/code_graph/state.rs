//! Graph view state and interaction tracking.
//!
//! Combines the force simulation with the retained scene, the pan/zoom
//! transform, drag bookkeeping and hover highlighting. The host feeds it
//! pointer events in canvas coordinates and drives `on_tick` once per frame.

use log::debug;

use super::config::{InteractionConfig, VizConfig};
use super::error::VizError;
use super::interaction::{
	DragState, PanState, TooltipContent, TooltipState, ViewTransform, neighborhood,
};
use super::scene::{HOVERED_STROKE_WIDTH, NODE_STROKE_WIDTH, Scene, SceneParts};
use super::simulation::Simulation;
use super::style::StyleResolver;
use super::types::{GraphData, GraphNode};

/// Core per-session state, mutated by frame and pointer callbacks.
pub struct GraphViewState {
	pub simulation: Simulation,
	pub scene: Scene,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub tooltip: TooltipState,
	hovered: Option<usize>,
	nodes: Vec<GraphNode>,
	config: InteractionConfig,
	dirty: bool,
}

impl GraphViewState {
	/// Validates `data` and builds the scene and idle simulation for a
	/// viewport of `width` x `height`.
	pub fn new(data: &GraphData, (width, height): (f64, f64), config: &VizConfig) -> Result<Self, VizError> {
		data.validate()?;
		let resolver = StyleResolver::new(config.strictness);
		let SceneParts {
			mut scene,
			sim_nodes,
			sim_links,
		} = Scene::build(
			data,
			(width, height),
			&resolver,
			config.interaction.base_edge_opacity,
		)?;
		let simulation = Simulation::new(
			sim_nodes,
			sim_links,
			(width / 2.0, height / 2.0),
			config.simulation.clone(),
		);
		scene.sync(simulation.nodes());

		Ok(Self {
			simulation,
			scene,
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			tooltip: TooltipState::default(),
			hovered: None,
			nodes: data.nodes.clone(),
			config: config.interaction.clone(),
			dirty: true,
		})
	}

	pub fn start(&mut self) {
		self.simulation.start();
	}

	pub fn stop(&mut self) {
		self.simulation.stop();
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.tooltip = TooltipState::default();
	}

	/// Advances the simulation one step and copies positions into the scene.
	pub fn on_tick(&mut self) -> bool {
		if !self.simulation.tick() {
			return false;
		}
		self.scene.sync(self.simulation.nodes());
		self.dirty = true;
		true
	}

	/// Returns whether anything changed since the last call.
	pub fn take_dirty(&mut self) -> bool {
		std::mem::take(&mut self.dirty)
	}

	/// Whether another frame is worth scheduling: the layout is still moving
	/// or something changed that has not been drawn.
	pub fn needs_frame(&self) -> bool {
		self.dirty || self.simulation.is_active()
	}

	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	/// A node drag or pan is in progress; pointer moves outside the canvas
	/// still belong to it.
	pub fn is_capturing(&self) -> bool {
		self.drag.active || self.pan.active
	}

	/// Topmost node whose marker contains the canvas point.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.transform.screen_to_world(sx, sy);
		self.scene
			.nodes
			.iter()
			.enumerate()
			.rev()
			.find(|(_, node)| {
				let (dx, dy) = (node.x - gx, node.y - gy);
				(dx * dx + dy * dy).sqrt() <= node.radius
			})
			.map(|(idx, _)| idx)
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if let Some(idx) = self.node_at(sx, sy) {
			let body = &self.simulation.nodes()[idx];
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: sx,
				start_y: sy,
				node_start_x: body.x,
				node_start_y: body.y,
			};
			let (x, y) = (body.x, body.y);
			self.simulation.reheat();
			self.simulation.pin(idx, x, y);
			debug!("code-graph: drag start on node {}", idx);
		} else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64, page_x: f64, page_y: f64) {
		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				let (x, y) = (
					self.drag.node_start_x + (sx - self.drag.start_x) / self.transform.k,
					self.drag.node_start_y + (sy - self.drag.start_y) / self.transform.k,
				);
				self.simulation.pin(idx, x, y);
				self.scene.sync(self.simulation.nodes());
				self.dirty = true;
			}
			return;
		}

		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			self.dirty = true;
		}

		let hovered = self.node_at(sx, sy);
		self.set_hover(hovered, page_x, page_y);
	}

	pub fn pointer_up(&mut self) {
		self.end_drag();
		self.pan.active = false;
	}

	/// Leaving the canvas clears hover, unless a drag or pan is tracking the
	/// pointer; those end on `pointer_up`.
	pub fn pointer_leave(&mut self) {
		if self.is_capturing() {
			return;
		}
		self.set_hover(None, 0.0, 0.0);
	}

	/// Zooms about the pointer. Positive `delta_y` zooms out.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 {
			1.0 / self.config.zoom_step
		} else {
			self.config.zoom_step
		};
		self.transform
			.zoom_at(sx, sy, factor, (self.config.min_zoom, self.config.max_zoom));
		self.dirty = true;
	}

	/// Highlights `node` and its neighbors, or resets every opacity when
	/// `node` is `None`. Moving within the same node only moves the tooltip.
	pub fn set_hover(&mut self, node: Option<usize>, page_x: f64, page_y: f64) {
		let (ox, oy) = self.config.tooltip_offset;
		if self.hovered == node {
			if node.is_some() {
				self.tooltip.page_x = page_x + ox;
				self.tooltip.page_y = page_y + oy;
			}
			return;
		}
		self.hovered = node;
		self.dirty = true;

		let Some(idx) = node else {
			for element in &mut self.scene.nodes {
				element.opacity = 1.0;
				element.stroke_width = NODE_STROKE_WIDTH;
			}
			for edge in &mut self.scene.edges {
				edge.opacity = self.config.base_edge_opacity;
			}
			self.tooltip.visible = false;
			return;
		};

		let lit = neighborhood(idx, &self.scene.edges);
		for (i, element) in self.scene.nodes.iter_mut().enumerate() {
			element.opacity = if lit.contains(&i) {
				1.0
			} else {
				self.config.dimmed_node_opacity
			};
			element.stroke_width = if i == idx {
				HOVERED_STROKE_WIDTH
			} else {
				NODE_STROKE_WIDTH
			};
		}
		for edge in &mut self.scene.edges {
			edge.opacity = if edge.source == idx || edge.target == idx {
				1.0
			} else {
				self.config.dimmed_edge_opacity
			};
		}

		self.tooltip = TooltipState {
			visible: true,
			page_x: page_x + ox,
			page_y: page_y + oy,
			content: Some(TooltipContent::for_node(&self.nodes[idx])),
		};
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.scene.resize(width, height);
		self.simulation.set_center(width / 2.0, height / 2.0);
		self.dirty = true;
	}

	fn end_drag(&mut self) {
		if let (true, Some(idx)) = (self.drag.active, self.drag.node_idx) {
			self.simulation.unpin(idx);
			self.simulation.release();
			debug!("code-graph: drag end on node {}", idx);
		}
		self.drag = DragState::default();
	}
}
