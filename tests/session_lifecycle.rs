//! Drives build/teardown cycles through a headless host.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use code_graph_viz::components::code_graph::simulation::SimPhase;
use code_graph_viz::components::code_graph::{
	DataContractError, GraphData, Host, SessionManager, SharedView, Surface, VizConfig, VizError,
};
use pretty_assertions::assert_eq;

/// Live resource counts across every surface a host has created.
#[derive(Default)]
struct Live {
	surfaces: Cell<usize>,
	elements: Cell<usize>,
	listeners: Cell<usize>,
	mounts: Cell<usize>,
	/// Views of every session mounted so far, including released ones.
	views: RefCell<Vec<SharedView>>,
}

struct HeadlessSurface {
	live: Rc<Live>,
	elements: usize,
	listeners: usize,
	scheduled: bool,
}

impl Surface for HeadlessSurface {
	fn halt(&mut self) {
		if std::mem::take(&mut self.scheduled) {
			self.live.surfaces.set(self.live.surfaces.get() - 1);
		}
	}

	fn detach_listeners(&mut self) {
		let n = std::mem::take(&mut self.listeners);
		self.live.listeners.set(self.live.listeners.get() - n);
	}

	fn remove_elements(&mut self) {
		let n = std::mem::take(&mut self.elements);
		self.live.elements.set(self.live.elements.get() - n);
	}
}

struct HeadlessHost(Rc<Live>);

impl Host for HeadlessHost {
	type Surface = HeadlessSurface;

	fn viewport(&self) -> (f64, f64) {
		(1024.0, 768.0)
	}

	fn mount(&mut self, view: &SharedView) -> Result<HeadlessSurface, VizError> {
		let live = &self.0;
		assert_eq!(live.elements.get(), 0, "previous session left elements behind");
		assert_eq!(live.surfaces.get(), 0, "previous frame loop still scheduled");

		let scene = &view.borrow().scene;
		let elements = scene.nodes.len() + scene.edges.len() + 2;
		live.elements.set(elements);
		live.listeners.set(6);
		live.surfaces.set(1);
		live.mounts.set(live.mounts.get() + 1);
		live.views.borrow_mut().push(view.clone());
		Ok(HeadlessSurface {
			live: live.clone(),
			elements,
			listeners: 6,
			scheduled: true,
		})
	}
}

fn manager() -> (SessionManager<HeadlessHost>, Rc<Live>) {
	let live = Rc::new(Live::default());
	(
		SessionManager::new(HeadlessHost(live.clone()), VizConfig::default()),
		live,
	)
}

fn graph(json: &str) -> GraphData {
	serde_json::from_str(json).unwrap()
}

fn two_files() -> GraphData {
	graph(
		r#"{
			"nodes": [
				{"id": "pkg/a.py", "type": "file", "name": "a.py"},
				{"id": "pkg/b.py", "type": "file", "name": "b.py"}
			],
			"links": [{"source": "pkg/a.py", "target": "pkg/b.py", "type": "contains"}]
		}"#,
	)
}

fn positions(view: &SharedView) -> Vec<(f64, f64)> {
	view.borrow().scene.nodes.iter().map(|n| (n.x, n.y)).collect()
}

#[test]
fn two_files_settle_and_stay_put() {
	let (mut m, _live) = manager();
	m.replace(&two_files()).unwrap();
	let view = m.view().unwrap();
	assert_eq!(view.borrow().scene.nodes.len(), 2);
	assert_eq!(view.borrow().scene.edges.len(), 1);

	let mut ticks = 0;
	while view.borrow_mut().on_tick() {
		ticks += 1;
		assert!(ticks < 10_000);
	}
	assert_eq!(view.borrow().simulation.phase(), SimPhase::Settled);

	let settled = positions(&view);
	for _ in 0..100 {
		assert!(!view.borrow_mut().on_tick());
	}
	assert_eq!(positions(&view), settled);

	let edge = view.borrow().scene.edges[0].clone();
	assert_eq!((edge.x1, edge.y1), settled[0]);
	assert_eq!((edge.x2, edge.y2), settled[1]);
}

#[test]
fn repeated_uploads_keep_a_single_session() {
	let (mut m, live) = manager();
	for _ in 0..10 {
		m.replace(&two_files()).unwrap();
		assert_eq!(live.surfaces.get(), 1);
		assert_eq!(live.listeners.get(), 6);
		assert_eq!(live.elements.get(), 5);
		m.view().unwrap().borrow_mut().on_tick();
	}
	assert_eq!(live.mounts.get(), 10);

	let views = live.views.borrow();
	let running: Vec<bool> = views
		.iter()
		.map(|v| !v.borrow().simulation.is_stopped())
		.collect();
	assert_eq!(running.iter().filter(|r| **r).count(), 1);
	assert!(running[9]);

	for old in &views[..9] {
		assert!(!old.borrow_mut().on_tick());
	}
}

#[test]
fn teardown_leaves_nothing_behind() {
	let (mut m, live) = manager();
	m.teardown();
	m.replace(&two_files()).unwrap();
	m.teardown();
	m.teardown();
	assert!(!m.is_live());
	assert_eq!(
		(live.surfaces.get(), live.elements.get(), live.listeners.get()),
		(0, 0, 0)
	);
}

#[test]
fn malformed_graph_is_rejected_before_mounting() {
	let (mut m, live) = manager();
	m.replace(&two_files()).unwrap();

	let broken = graph(
		r#"{
			"nodes": [{"id": "a.py", "type": "file", "name": "a.py"}],
			"links": [{"source": "a.py", "target": "a.py:missing", "type": "defines"}]
		}"#,
	);
	let err = m.replace(&broken).unwrap_err();
	assert_eq!(
		err,
		VizError::DataContract(DataContractError::DanglingEdge {
			index: 0,
			endpoint: "target",
			id: "a.py:missing".into(),
		})
	);
	assert_eq!(live.mounts.get(), 1);
	assert_eq!(live.elements.get(), 0);
	assert!(!m.is_live());

	m.replace(&two_files()).unwrap();
	assert!(m.is_live());
}

#[test]
fn strict_styling_rejects_unknown_node_types() {
	let live = Rc::new(Live::default());
	let config = VizConfig::from_json(r#"{"strictness": "strict"}"#).unwrap();
	let mut m = SessionManager::new(HeadlessHost(live.clone()), config);
	let data = graph(
		r#"{"nodes": [{"id": "m", "type": "module", "name": "m"}], "links": []}"#,
	);
	assert!(matches!(m.replace(&data), Err(VizError::Style(_))));
	assert_eq!(live.mounts.get(), 0);

	let (mut lenient, _) = manager();
	lenient.replace(&data).unwrap();
}
