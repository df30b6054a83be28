//! Type-driven visual and physical parameters for nodes and edges.
//!
//! Every function here is pure. Unknown node kinds resolve to
//! [`FALLBACK_NODE_COLOR`] and [`FALLBACK_NODE_RADIUS`] unless the resolver is
//! strict, in which case they are reported as [`StyleError::UnknownNodeKind`].

use serde::Deserialize;

use super::error::StyleError;
use super::types::{EdgeKind, NodeKind};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Color used for node kinds without a defined style.
pub const FALLBACK_NODE_COLOR: Color = Color::rgb(0x75, 0x75, 0x75);
/// Radius used for node kinds without a defined style.
pub const FALLBACK_NODE_RADIUS: f64 = 12.0;
/// Style for edges whose kind is not one of [`EdgeKind::KNOWN`].
pub const DEFAULT_EDGE_STYLE: EdgeStyle = EdgeStyle {
	color: Color::rgb(0x66, 0x66, 0x66),
	width: 1.0,
};

/// Stroke color and width for an edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub color: Color,
	pub width: f64,
}

pub fn color_of(kind: &NodeKind) -> Color {
	match kind {
		NodeKind::File => Color::rgb(0x21, 0x96, 0xf3),
		NodeKind::Class => Color::rgb(0x4c, 0xaf, 0x50),
		NodeKind::Function => Color::rgb(0xff, 0xc1, 0x07),
		NodeKind::Method => Color::rgb(0xff, 0x98, 0x00),
		NodeKind::Import => Color::rgb(0x9e, 0x9e, 0x9e),
		NodeKind::Error => Color::rgb(0xf4, 0x43, 0x36),
		NodeKind::Other(_) => FALLBACK_NODE_COLOR,
	}
}

/// Visual radius. The collision margin is twice this value.
pub fn radius_of(kind: &NodeKind) -> f64 {
	match kind {
		NodeKind::File => 25.0,
		NodeKind::Class => 20.0,
		NodeKind::Function | NodeKind::Method | NodeKind::Error => 15.0,
		NodeKind::Import => 10.0,
		NodeKind::Other(_) => FALLBACK_NODE_RADIUS,
	}
}

pub fn edge_style_of(kind: &EdgeKind) -> EdgeStyle {
	match kind {
		EdgeKind::Defines => EdgeStyle {
			color: Color::rgb(0x4c, 0xaf, 0x50),
			width: 2.0,
		},
		EdgeKind::Calls => EdgeStyle {
			color: Color::rgb(0xff, 0xc1, 0x07),
			width: 1.5,
		},
		EdgeKind::Imports => EdgeStyle {
			color: Color::rgb(0x9e, 0x9e, 0x9e),
			width: 1.0,
		},
		EdgeKind::Contains => EdgeStyle {
			color: Color::rgb(0x21, 0x96, 0xf3),
			width: 2.0,
		},
		EdgeKind::Other(_) => DEFAULT_EDGE_STYLE,
	}
}

/// Rest length of the spring between two nodes.
///
/// Checked in order: a file on either end, a class on either end, a call edge,
/// then the generic distance.
pub fn link_distance(source: &NodeKind, target: &NodeKind, edge: &EdgeKind) -> f64 {
	if *source == NodeKind::File || *target == NodeKind::File {
		200.0
	} else if *source == NodeKind::Class || *target == NodeKind::Class {
		150.0
	} else if *edge == EdgeKind::Calls {
		100.0
	} else {
		80.0
	}
}

/// Many-body strength; more negative pushes neighbours further away.
pub fn repulsion_strength(kind: &NodeKind) -> f64 {
	match kind {
		NodeKind::File => -2000.0,
		NodeKind::Class => -1000.0,
		NodeKind::Function | NodeKind::Method => -500.0,
		_ => -300.0,
	}
}

pub fn label_font_size(kind: &NodeKind) -> f64 {
	match kind {
		NodeKind::File => 14.0,
		NodeKind::Class => 13.0,
		_ => 12.0,
	}
}

pub fn label_font_weight(kind: &NodeKind) -> u16 {
	match kind {
		NodeKind::File => 600,
		_ => 500,
	}
}

/// How unknown node kinds are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
	/// Unknown kinds get the fallback color and radius.
	#[default]
	Lenient,
	/// Unknown kinds are an error.
	Strict,
}

/// Resolved appearance of a single node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub color: Color,
	pub radius: f64,
	pub font_size: f64,
	pub font_weight: u16,
}

/// Applies the style rules with a chosen [`Strictness`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StyleResolver {
	pub strictness: Strictness,
}

impl StyleResolver {
	pub fn new(strictness: Strictness) -> Self {
		Self { strictness }
	}

	pub fn node_style(&self, kind: &NodeKind) -> Result<NodeStyle, StyleError> {
		if self.strictness == Strictness::Strict && !kind.is_known() {
			return Err(StyleError::UnknownNodeKind(kind.to_string()));
		}
		Ok(NodeStyle {
			color: color_of(kind),
			radius: radius_of(kind),
			font_size: label_font_size(kind),
			font_weight: label_font_weight(kind),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_rule_beats_calls_rule() {
		let d = link_distance(&NodeKind::File, &NodeKind::Function, &EdgeKind::Calls);
		assert_eq!(d, 200.0);
	}

	#[test]
	fn link_distance_tie_break_order() {
		assert_eq!(
			link_distance(&NodeKind::Method, &NodeKind::Class, &EdgeKind::Calls),
			150.0
		);
		assert_eq!(
			link_distance(&NodeKind::Function, &NodeKind::Method, &EdgeKind::Calls),
			100.0
		);
		assert_eq!(
			link_distance(&NodeKind::Function, &NodeKind::Import, &EdgeKind::Imports),
			80.0
		);
	}

	#[test]
	fn unknown_edge_kind_uses_default_style() {
		let style = edge_style_of(&EdgeKind::from("unknown_type"));
		assert_eq!(style.color.to_css(), "#666666");
		assert_eq!(style.width, 1.0);
	}

	#[test]
	fn repulsion_by_kind() {
		assert_eq!(repulsion_strength(&NodeKind::File), -2000.0);
		assert_eq!(repulsion_strength(&NodeKind::Class), -1000.0);
		assert_eq!(repulsion_strength(&NodeKind::Method), -500.0);
		assert_eq!(repulsion_strength(&NodeKind::Import), -300.0);
		assert_eq!(repulsion_strength(&NodeKind::from("module")), -300.0);
	}

	#[test]
	fn strict_resolver_rejects_unknown_kinds() {
		let kind = NodeKind::from("module");
		let lenient = StyleResolver::default().node_style(&kind).unwrap();
		assert_eq!(lenient.color, FALLBACK_NODE_COLOR);
		assert_eq!(lenient.radius, FALLBACK_NODE_RADIUS);

		let strict = StyleResolver::new(Strictness::Strict);
		assert_eq!(
			strict.node_style(&kind),
			Err(StyleError::UnknownNodeKind("module".into()))
		);
		assert!(strict.node_style(&NodeKind::Import).is_ok());
	}

	#[test]
	fn css_output() {
		assert_eq!(color_of(&NodeKind::File).to_css(), "#2196f3");
		assert_eq!(
			Color { r: 1, g: 2, b: 3, a: 0.5 }.to_css(),
			"rgba(1, 2, 3, 0.5)"
		);
	}
}
