//! Ownership of the single live visualization.
//!
//! A [`SessionManager`] owns at most one [`VisualizationSession`]. Building a
//! session requires the previous one to be released first; releasing stops
//! the simulation and cancels the pending frame, detaches every listener,
//! removes the canvas and tooltip, then drops the session.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use super::config::VizConfig;
use super::error::{LifecycleError, VizError};
use super::state::GraphViewState;
use super::types::GraphData;

/// View state shared between a session and the callbacks its surface installs.
pub type SharedView = Rc<RefCell<GraphViewState>>;

/// Host-side resources of a live session (elements, listeners, frame loop).
///
/// Every method must be idempotent.
pub trait Surface {
	/// Cancels any scheduled frame callback so no further tick runs.
	fn halt(&mut self);
	/// Removes every event listener the surface installed.
	fn detach_listeners(&mut self);
	/// Removes the canvas and tooltip elements from the document.
	fn remove_elements(&mut self);
}

/// Creates surfaces for new sessions.
pub trait Host {
	type Surface: Surface;

	/// Size of the container the next session will fill.
	fn viewport(&self) -> (f64, f64);

	/// Creates elements, attaches listeners and schedules frames for `view`.
	///
	/// On error nothing may remain attached to the document.
	fn mount(&mut self, view: &SharedView) -> Result<Self::Surface, VizError>;
}

/// The live simulation, scene and host surface for one graph.
pub struct VisualizationSession<S: Surface> {
	view: SharedView,
	surface: S,
}

impl<S: Surface> VisualizationSession<S> {
	pub fn view(&self) -> &SharedView {
		&self.view
	}

	fn release(mut self) {
		self.view.borrow_mut().stop();
		self.surface.halt();
		self.surface.detach_listeners();
		self.surface.remove_elements();
	}
}

/// Gatekeeper for [`VisualizationSession`] creation and destruction.
pub struct SessionManager<H: Host> {
	host: H,
	config: VizConfig,
	current: Option<VisualizationSession<H::Surface>>,
}

impl<H: Host> SessionManager<H> {
	pub fn new(host: H, config: VizConfig) -> Self {
		Self {
			host,
			config,
			current: None,
		}
	}

	pub fn is_live(&self) -> bool {
		self.current.is_some()
	}

	pub fn view(&self) -> Option<SharedView> {
		self.current.as_ref().map(|s| s.view.clone())
	}

	/// Releases the live session, if any. Safe to call repeatedly.
	pub fn teardown(&mut self) {
		if let Some(session) = self.current.take() {
			session.release();
			info!("code-graph: visualization cleared");
		}
	}

	/// Builds and starts a session for `data`.
	///
	/// Fails with [`LifecycleError::SessionLive`] if a session exists. Data
	/// is validated before the host is asked for a surface.
	pub fn build(&mut self, data: &GraphData) -> Result<(), VizError> {
		if self.current.is_some() {
			return Err(LifecycleError::SessionLive.into());
		}

		let view = match GraphViewState::new(data, self.host.viewport(), &self.config) {
			Ok(view) => Rc::new(RefCell::new(view)),
			Err(e) => {
				warn!("code-graph: rejected graph data: {}", e);
				return Err(e);
			}
		};
		let surface = self.host.mount(&view)?;
		view.borrow_mut().start();

		info!(
			"code-graph: visualization built with {} nodes, {} edges",
			data.nodes.len(),
			data.links.len()
		);
		self.current = Some(VisualizationSession { view, surface });
		Ok(())
	}

	/// Tears down the live session, then builds a new one for `data`.
	pub fn replace(&mut self, data: &GraphData) -> Result<(), VizError> {
		self.teardown();
		self.build(data)
	}
}

impl<H: Host> Drop for SessionManager<H> {
	fn drop(&mut self) {
		self.teardown();
	}
}
