//! Tunable parameters for the simulation, interaction and upload flow.
//!
//! Defaults live in code. A page can override any subset by embedding JSON in
//! a `<script id="viz-config" type="application/json">` element.

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

use super::style::Strictness;

/// Physics parameters of the force simulation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Simulation settles once alpha drops below this value.
	pub alpha_min: f64,
	/// Per-tick fraction by which alpha approaches its target.
	pub alpha_decay: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	/// Alpha target held while a node is being dragged.
	pub drag_alpha_target: f64,
	/// Below this alpha an unheld simulation is reported as cooling.
	pub cooling_alpha: f64,
	/// Spacing of the initial phyllotaxis placement.
	pub initial_radius: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			cooling_alpha: 0.1,
			initial_radius: 10.0,
		}
	}
}

/// Opacity and zoom rules of the interaction layer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
	pub min_zoom: f64,
	pub max_zoom: f64,
	/// Multiplicative zoom step per wheel notch.
	pub zoom_step: f64,
	pub base_edge_opacity: f64,
	pub dimmed_node_opacity: f64,
	pub dimmed_edge_opacity: f64,
	/// Tooltip offset from the pointer in page pixels.
	pub tooltip_offset: (f64, f64),
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.1,
			max_zoom: 4.0,
			zoom_step: 1.1,
			base_edge_opacity: 0.6,
			dimmed_node_opacity: 0.3,
			dimmed_edge_opacity: 0.1,
			tooltip_offset: (10.0, -28.0),
		}
	}
}

/// Client-side upload checks and endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
	pub endpoint: String,
	pub max_bytes: f64,
	pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
	fn default() -> Self {
		Self {
			endpoint: "/upload".to_string(),
			max_bytes: 16.0 * 1024.0 * 1024.0,
			allowed_extensions: vec!["py".to_string(), "zip".to_string()],
		}
	}
}

/// Complete configuration for the visualization.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VizConfig {
	pub strictness: Strictness,
	pub simulation: SimulationConfig,
	pub interaction: InteractionConfig,
	pub upload: UploadConfig,
}

impl VizConfig {
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	/// Reads overrides from the `viz-config` script element, if present.
	pub fn load() -> Self {
		let Some(json_text) = config_script_text() else {
			return Self::default();
		};
		match Self::from_json(&json_text) {
			Ok(config) => {
				info!("code-graph: loaded configuration overrides");
				config
			}
			Err(e) => {
				warn!("code-graph: failed to parse viz-config, using defaults: {}", e);
				Self::default()
			}
		}
	}
}

fn config_script_text() -> Option<String> {
	let document = web_sys::window()?.document()?;
	let element = document.get_element_by_id("viz-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_defaults() {
		let config = VizConfig::from_json(
			r#"{"strictness": "strict", "interaction": {"max_zoom": 8.0}}"#,
		)
		.unwrap();
		assert_eq!(config.strictness, Strictness::Strict);
		assert_eq!(config.interaction.max_zoom, 8.0);
		assert_eq!(config.interaction.min_zoom, 0.1);
		assert_eq!(config.upload.endpoint, "/upload");
		assert_eq!(config.simulation, SimulationConfig::default());
	}

	#[test]
	fn default_decay_settles_in_about_300_ticks() {
		let sim = SimulationConfig::default();
		let mut alpha: f64 = 1.0;
		let mut ticks = 0;
		while alpha >= sim.alpha_min {
			alpha += (0.0 - alpha) * sim.alpha_decay;
			ticks += 1;
		}
		assert!((299..=301).contains(&ticks), "ticks = {ticks}");
	}
}
