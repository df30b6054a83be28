//! Browser host: canvas, tooltip element, listeners and the frame loop.
//!
//! Listeners and the `requestAnimationFrame` callback are stored on the
//! surface so teardown can cancel and remove them explicitly. Dropping a
//! surface performs the same cleanup, which also covers a mount that fails
//! halfway.
//!
//! Frames are only requested while the view needs one. Once the layout has
//! settled the loop goes idle and input handlers wake it again.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Document, Element, Event, EventTarget, HtmlCanvasElement,
	HtmlElement, MouseEvent, WheelEvent, Window,
};

use super::error::{VizError, js_error};
use super::interaction::TooltipState;
use super::render;
use super::session::{Host, SharedView, Surface};
use super::state::GraphViewState;

const FALLBACK_VIEWPORT: (f64, f64) = (800.0, 600.0);

type Listener = Closure<dyn FnMut(Event)>;

/// Requests at most one pending animation frame for the surface's callback.
#[derive(Clone)]
struct FrameScheduler {
	window: Window,
	id: Rc<Cell<Option<i32>>>,
	callback: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl FrameScheduler {
	fn new(window: Window) -> Self {
		Self {
			window,
			id: Rc::new(Cell::new(None)),
			callback: Rc::new(RefCell::new(None)),
		}
	}

	/// No-op when a frame is already pending or the loop has been halted.
	fn request(&self) -> Result<(), JsValue> {
		if self.id.get().is_some() {
			return Ok(());
		}
		if let Some(cb) = self.callback.borrow().as_ref() {
			let id = self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
			self.id.set(Some(id));
		}
		Ok(())
	}

	/// Wakes the loop if `view` has anything left to show.
	fn wake(&self, view: &GraphViewState) {
		if view.needs_frame() {
			let _ = self.request();
		}
	}

	fn cancel(&self) {
		if let Some(id) = self.id.take() {
			let _ = self.window.cancel_animation_frame(id);
		}
		// Drops the callback and with it the closure's reference cycle.
		self.callback.borrow_mut().take();
	}
}

fn mount_error(context: &str, value: JsValue) -> VizError {
	VizError::Mount(format!("{}: {}", context, js_error(&value)))
}

fn container_size(container: &Element) -> (f64, f64) {
	let (w, h) = (container.client_width(), container.client_height());
	if w > 0 && h > 0 {
		(w as f64, h as f64)
	} else {
		FALLBACK_VIEWPORT
	}
}

/// Mounts sessions into a container element of the page.
pub struct DomHost {
	container: Element,
}

impl DomHost {
	pub fn new(container: Element) -> Self {
		Self { container }
	}
}

impl Host for DomHost {
	type Surface = CanvasSurface;

	fn viewport(&self) -> (f64, f64) {
		container_size(&self.container)
	}

	fn mount(&mut self, view: &SharedView) -> Result<CanvasSurface, VizError> {
		CanvasSurface::mount(&self.container, view)
	}
}

/// DOM resources owned by one session.
pub struct CanvasSurface {
	window: Window,
	canvas: Option<HtmlCanvasElement>,
	tooltip: Option<HtmlElement>,
	listeners: Vec<(EventTarget, &'static str, Listener)>,
	frames: FrameScheduler,
}

impl CanvasSurface {
	fn mount(container: &Element, view: &SharedView) -> Result<Self, VizError> {
		let window = web_sys::window().ok_or_else(|| VizError::Mount("no window".into()))?;
		let document = window
			.document()
			.ok_or_else(|| VizError::Mount("no document".into()))?;
		let mut surface = Self {
			window: window.clone(),
			canvas: None,
			tooltip: None,
			listeners: Vec::new(),
			frames: FrameScheduler::new(window.clone()),
		};

		let (w, h) = container_size(container);
		let canvas: HtmlCanvasElement = document
			.create_element("canvas")
			.map_err(|e| mount_error("create canvas", e))?
			.dyn_into()
			.map_err(|_| VizError::Mount("canvas element has unexpected type".into()))?;
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		canvas.set_class_name("code-graph-canvas");
		let _ = canvas.style().set_property("display", "block");
		let _ = canvas.style().set_property("cursor", "grab");
		container
			.append_child(&canvas)
			.map_err(|e| mount_error("append canvas", e))?;
		surface.canvas = Some(canvas.clone());

		let tooltip = create_tooltip(&document)?;
		surface.tooltip = Some(tooltip.clone());

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.map_err(|e| mount_error("get 2d context", e))?
			.ok_or_else(|| VizError::Mount("2d context unavailable".into()))?
			.dyn_into()
			.map_err(|_| VizError::Mount("2d context has unexpected type".into()))?;

		surface.wire_pointer(&canvas, view, &tooltip)?;
		surface.wire_resize(container, &canvas, view)?;
		surface.start_frames(view, ctx)?;
		Ok(surface)
	}

	fn listen(
		&mut self,
		target: &EventTarget,
		event: &'static str,
		listener: Listener,
	) -> Result<(), VizError> {
		target
			.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
			.map_err(|e| mount_error(event, e))?;
		self.listeners.push((target.clone(), event, listener));
		Ok(())
	}

	fn wire_pointer(
		&mut self,
		canvas: &HtmlCanvasElement,
		view: &SharedView,
		tooltip: &HtmlElement,
	) -> Result<(), VizError> {
		let target: &EventTarget = canvas.as_ref();
		let window: EventTarget = self.window.clone().into();

		let (v, c, f) = (view.clone(), canvas.clone(), self.frames.clone());
		self.listen(
			target,
			"mousedown",
			Closure::new(move |ev: Event| {
				if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
					let (x, y) = canvas_point(&c, ev);
					let mut view = v.borrow_mut();
					view.pointer_down(x, y);
					f.wake(&view);
				}
			}),
		)?;

		// Hover is tracked over the canvas; drags and pans on the window so
		// they keep following the pointer outside the canvas.
		for (listen_on, capturing) in [(target, false), (&window, true)] {
			let (v, c, t, f) = (
				view.clone(),
				canvas.clone(),
				tooltip.clone(),
				self.frames.clone(),
			);
			self.listen(
				listen_on,
				"mousemove",
				Closure::new(move |ev: Event| {
					let Some(ev) = ev.dyn_ref::<MouseEvent>() else {
						return;
					};
					let mut view = v.borrow_mut();
					if view.is_capturing() != capturing {
						return;
					}
					let (x, y) = canvas_point(&c, ev);
					view.pointer_move(x, y, ev.page_x() as f64, ev.page_y() as f64);
					sync_tooltip(&t, &view.tooltip);
					f.wake(&view);
				}),
			)?;
		}

		let (v, f) = (view.clone(), self.frames.clone());
		self.listen(
			&window,
			"mouseup",
			Closure::new(move |_: Event| {
				let mut view = v.borrow_mut();
				view.pointer_up();
				f.wake(&view);
			}),
		)?;

		let (v, t, f) = (view.clone(), tooltip.clone(), self.frames.clone());
		self.listen(
			target,
			"mouseleave",
			Closure::new(move |_: Event| {
				let mut view = v.borrow_mut();
				view.pointer_leave();
				sync_tooltip(&t, &view.tooltip);
				f.wake(&view);
			}),
		)?;

		let (v, c, f) = (view.clone(), canvas.clone(), self.frames.clone());
		self.listen(
			target,
			"wheel",
			Closure::new(move |ev: Event| {
				if let Some(ev) = ev.dyn_ref::<WheelEvent>() {
					ev.prevent_default();
					let (x, y) = canvas_point(&c, ev);
					let mut view = v.borrow_mut();
					view.wheel(x, y, ev.delta_y());
					f.wake(&view);
				}
			}),
		)
	}

	fn wire_resize(
		&mut self,
		container: &Element,
		canvas: &HtmlCanvasElement,
		view: &SharedView,
	) -> Result<(), VizError> {
		let (v, c, f, parent) = (
			view.clone(),
			canvas.clone(),
			self.frames.clone(),
			container.clone(),
		);
		let window: EventTarget = self.window.clone().into();
		self.listen(
			&window,
			"resize",
			Closure::new(move |_: Event| {
				let (w, h) = container_size(&parent);
				c.set_width(w as u32);
				c.set_height(h as u32);
				let mut view = v.borrow_mut();
				view.resize(w, h);
				f.wake(&view);
			}),
		)
	}

	/// Ticks and draws once per frame, rescheduling only while the view
	/// still needs frames.
	fn start_frames(&mut self, view: &SharedView, ctx: CanvasRenderingContext2d) -> Result<(), VizError> {
		let (v, frames) = (view.clone(), self.frames.clone());
		*self.frames.callback.borrow_mut() = Some(Closure::new(move || {
			frames.id.set(None);
			let mut view = v.borrow_mut();
			view.on_tick();
			if view.take_dirty() {
				render::render(&view, &ctx);
			}
			frames.wake(&view);
		}));

		self.frames
			.request()
			.map_err(|e| mount_error("requestAnimationFrame", e))
	}
}

impl Surface for CanvasSurface {
	fn halt(&mut self) {
		self.frames.cancel();
	}

	fn detach_listeners(&mut self) {
		for (target, event, listener) in self.listeners.drain(..) {
			let _ = target
				.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
		}
	}

	fn remove_elements(&mut self) {
		if let Some(canvas) = self.canvas.take() {
			canvas.remove();
		}
		if let Some(tooltip) = self.tooltip.take() {
			tooltip.remove();
		}
	}
}

impl Drop for CanvasSurface {
	fn drop(&mut self) {
		self.halt();
		self.detach_listeners();
		self.remove_elements();
	}
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn create_tooltip(document: &Document) -> Result<HtmlElement, VizError> {
	let tooltip: HtmlElement = document
		.create_element("div")
		.map_err(|e| mount_error("create tooltip", e))?
		.dyn_into()
		.map_err(|_| VizError::Mount("tooltip element has unexpected type".into()))?;
	tooltip.set_class_name("tooltip");
	let style = tooltip.style();
	let _ = style.set_property("position", "absolute");
	let _ = style.set_property("pointer-events", "none");
	let _ = style.set_property("opacity", "0");
	let body = document
		.body()
		.ok_or_else(|| VizError::Mount("no document body".into()))?;
	body.append_child(&tooltip)
		.map_err(|e| mount_error("append tooltip", e))?;
	Ok(tooltip)
}

/// Mirrors tooltip state into the tooltip element.
fn sync_tooltip(element: &HtmlElement, state: &TooltipState) {
	let style = element.style();
	if !state.visible {
		let _ = style.set_property("opacity", "0");
		return;
	}
	let _ = style.set_property("opacity", "0.9");
	let _ = style.set_property("left", &format!("{}px", state.page_x));
	let _ = style.set_property("top", &format!("{}px", state.page_y));

	let Some(content) = &state.content else {
		return;
	};
	let Some(document) = element.owner_document() else {
		return;
	};
	element.set_text_content(None);
	if let Ok(title) = document.create_element("strong") {
		title.set_text_content(Some(&content.title));
		let _ = element.append_child(&title);
	}
	for line in &content.lines {
		if let Ok(row) = document.create_element("div") {
			row.set_text_content(Some(line));
			let _ = element.append_child(&row);
		}
	}
}
