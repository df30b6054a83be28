//! Leptos component providing the graph container.
//!
//! The component renders an empty container and, once it is in the DOM,
//! attaches a [`SessionManager`] to it. Everything inside the container
//! (canvas, listeners, frame loop) is created and removed imperatively by the
//! manager, so teardown does not depend on the reactive tree.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::Element;

use super::config::VizConfig;
use super::error::VizError;
use super::session::SessionManager;
use super::surface::DomHost;
use super::types::GraphData;

#[derive(Default)]
struct HandleInner {
	manager: Option<SessionManager<DomHost>>,
	pagehide: Option<Closure<dyn FnMut()>>,
}

/// Cloneable handle to the viewport's session manager.
#[derive(Clone, Default)]
pub struct GraphHandle(Rc<RefCell<HandleInner>>);

impl GraphHandle {
	pub fn is_attached(&self) -> bool {
		self.0.borrow().manager.is_some()
	}

	fn attach(&self, container: Element, config: VizConfig) {
		let mut inner = self.0.borrow_mut();
		inner.manager = Some(SessionManager::new(DomHost::new(container), config));

		let handle = self.clone();
		let on_pagehide = Closure::<dyn FnMut()>::new(move || handle.clear());
		if let Some(window) = web_sys::window() {
			let _ = window
				.add_event_listener_with_callback("pagehide", on_pagehide.as_ref().unchecked_ref());
		}
		inner.pagehide = Some(on_pagehide);
		info!("code-graph: viewport attached");
	}

	/// Tears down the live visualization, leaving the viewport empty.
	pub fn clear(&self) {
		if let Some(manager) = self.0.borrow_mut().manager.as_mut() {
			manager.teardown();
		}
	}

	/// Replaces whatever is shown with a visualization of `data`.
	pub fn show(&self, data: &GraphData) -> Result<(), VizError> {
		match self.0.borrow_mut().manager.as_mut() {
			Some(manager) => manager.replace(data),
			None => {
				warn!("code-graph: graph received before the viewport was mounted");
				Err(VizError::Mount("graph viewport is not mounted".into()))
			}
		}
	}
}

/// Sized container the visualization mounts into.
#[component]
pub fn CodeGraphViewport(handle: GraphHandle, config: VizConfig) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();

	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if handle.is_attached() {
			return;
		}
		handle.attach(container.into(), config.clone());
	});

	view! { <div node_ref=container_ref id="graph-container" class="graph-container" /> }
}
