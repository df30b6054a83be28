//! Canvas rendering for the code graph.
//!
//! Draws in passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edge lines with arrowheads (world space)
//! 3. Node markers with glow, then labels

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::scene::{ArrowMarker, EdgeElement, LABEL_GAP, NodeElement, Scene};
use super::state::GraphViewState;
use super::style::Color;

const LABEL_COLOR: Color = Color::rgb(230, 237, 243);
const LABEL_SHADOW: Color = Color {
	r: 0,
	g: 0,
	b: 0,
	a: 0.8,
};

/// Renders the complete scene to the canvas.
pub fn render(view: &GraphViewState, ctx: &CanvasRenderingContext2d) {
	let scene = &view.scene;
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(&scene.background.to_css());
	ctx.fill_rect(0.0, 0.0, scene.width, scene.height);

	ctx.save();
	let _ = ctx.translate(view.transform.x, view.transform.y);
	let _ = ctx.scale(view.transform.k, view.transform.k);

	for edge in &scene.edges {
		draw_edge(ctx, scene, edge);
	}
	for node in &scene.nodes {
		draw_node(ctx, scene, node);
	}

	ctx.restore();
}

fn draw_edge(ctx: &CanvasRenderingContext2d, scene: &Scene, edge: &EdgeElement) {
	let (dx, dy) = (edge.x2 - edge.x1, edge.y2 - edge.y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let source_r = scene.nodes[edge.source].radius;
	let target_r = scene.nodes[edge.target].radius;
	let marker = &scene.markers[edge.marker];

	ctx.set_global_alpha(edge.opacity);
	ctx.set_stroke_style_str(&edge.color.to_css());
	ctx.set_line_width(edge.width);
	ctx.begin_path();
	ctx.move_to(edge.x1 + ux * source_r, edge.y1 + uy * source_r);
	ctx.line_to(
		edge.x2 - ux * (target_r + marker.size),
		edge.y2 - uy * (target_r + marker.size),
	);
	ctx.stroke();

	draw_arrow(ctx, marker, edge.x2 - ux * target_r, edge.y2 - uy * target_r, ux, uy);
	ctx.set_global_alpha(1.0);
}

fn draw_arrow(
	ctx: &CanvasRenderingContext2d,
	marker: &ArrowMarker,
	tip_x: f64,
	tip_y: f64,
	ux: f64,
	uy: f64,
) {
	let (back_x, back_y) = (tip_x - ux * marker.size, tip_y - uy * marker.size);
	let (px, py) = (-uy * marker.size * 0.5, ux * marker.size * 0.5);
	ctx.set_fill_style_str(&marker.color.to_css());
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_node(ctx: &CanvasRenderingContext2d, scene: &Scene, node: &NodeElement) {
	ctx.set_global_alpha(node.opacity);

	ctx.set_shadow_blur(scene.glow.blur);
	ctx.set_shadow_color(&node.color.to_css());
	ctx.begin_path();
	let _ = ctx.arc(node.x, node.y, node.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node.color.to_css());
	ctx.fill();
	ctx.set_shadow_blur(0.0);
	ctx.set_shadow_color("rgba(0, 0, 0, 0)");

	ctx.set_stroke_style_str("#ffffff");
	ctx.set_line_width(node.stroke_width);
	ctx.stroke();

	ctx.set_shadow_blur(2.0);
	ctx.set_shadow_color(&LABEL_SHADOW.to_css());
	ctx.set_fill_style_str(&LABEL_COLOR.to_css());
	ctx.set_font(&format!(
		"{} {}px sans-serif",
		node.font_weight, node.font_size
	));
	let _ = ctx.fill_text(&node.label, node.x + node.radius + LABEL_GAP, node.y + 4.0);
	ctx.set_shadow_blur(0.0);
	ctx.set_shadow_color("rgba(0, 0, 0, 0)");

	ctx.set_global_alpha(1.0);
}
