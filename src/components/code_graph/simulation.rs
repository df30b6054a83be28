//! Force-directed layout simulation.
//!
//! A discrete-time simulation in the style of d3-force: each tick decays a
//! "temperature" (`alpha`) toward its target, applies link, many-body, center
//! and collision forces scaled by alpha, then integrates velocities. Once
//! alpha falls below `alpha_min` the simulation is settled and further ticks
//! leave positions untouched until it is reheated.

use std::f64::consts::PI;

use log::debug;

use super::config::SimulationConfig;

/// Lifecycle of a simulation instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimPhase {
	/// Built but not started.
	Idle,
	/// Hot, either freshly started or held warm by a drag.
	Running,
	/// Energy decaying with nothing holding it up.
	Cooling,
	/// Below `alpha_min`; ticks are no-ops until reheated.
	Settled,
	/// Terminal. No tick ever mutates positions again.
	Stopped,
}

/// Physical state of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned position. While set, forces do not move the node.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	/// Collision radius.
	pub collide_radius: f64,
	/// Many-body strength (negative repels).
	pub charge: f64,
}

impl SimNode {
	pub fn new(collide_radius: f64, charge: f64) -> Self {
		Self {
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			fx: None,
			fy: None,
			collide_radius,
			charge,
		}
	}

	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// A spring between two node indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SimLink {
	pub source: usize,
	pub target: usize,
	pub distance: f64,
	strength: f64,
	bias: f64,
}

impl SimLink {
	pub fn new(source: usize, target: usize, distance: f64) -> Self {
		Self {
			source,
			target,
			distance,
			strength: 1.0,
			bias: 0.5,
		}
	}
}

/// Linear congruential generator used for jiggling coincident points.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	fn next(&mut self) -> f64 {
		const A: u64 = 1_664_525;
		const C: u64 = 1_013_904_223;
		const M: u64 = 4_294_967_296;
		self.0 = (A.wrapping_mul(self.0).wrapping_add(C)) % M;
		self.0 as f64 / M as f64
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	phase: SimPhase,
	config: SimulationConfig,
	rng: Lcg,
}

impl Simulation {
	/// Creates an idle simulation, placing unpositioned nodes on a
	/// phyllotaxis spiral around `center` and deriving link strengths from
	/// node degrees.
	///
	/// Link endpoints must be valid indices into `nodes`.
	pub fn new(
		mut nodes: Vec<SimNode>,
		mut links: Vec<SimLink>,
		center: (f64, f64),
		config: SimulationConfig,
	) -> Self {
		let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
		for (i, node) in nodes.iter_mut().enumerate() {
			if node.x.is_nan() || node.y.is_nan() {
				let radius = config.initial_radius * (0.5 + i as f64).sqrt();
				let angle = i as f64 * golden_angle;
				node.x = center.0 + radius * angle.cos();
				node.y = center.1 + radius * angle.sin();
			}
		}

		let mut degree = vec![0usize; nodes.len()];
		for link in &links {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		for link in &mut links {
			let (ds, dt) = (degree[link.source] as f64, degree[link.target] as f64);
			link.strength = 1.0 / ds.min(dt);
			link.bias = ds / (ds + dt);
		}

		Self {
			nodes,
			links,
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			phase: SimPhase::Idle,
			config,
			rng: Lcg(1),
		}
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn phase(&self) -> SimPhase {
		self.phase
	}

	pub fn is_stopped(&self) -> bool {
		self.phase == SimPhase::Stopped
	}

	/// Whether ticks currently move anything.
	pub fn is_active(&self) -> bool {
		matches!(self.phase, SimPhase::Running | SimPhase::Cooling)
	}

	pub fn start(&mut self) {
		if self.phase == SimPhase::Idle {
			self.set_phase(SimPhase::Running);
		}
	}

	/// Terminal transition. Idempotent.
	pub fn stop(&mut self) {
		self.set_phase(SimPhase::Stopped);
	}

	/// Holds the simulation warm at the drag alpha target.
	pub fn reheat(&mut self) {
		if matches!(self.phase, SimPhase::Idle | SimPhase::Stopped) {
			return;
		}
		self.alpha_target = self.config.drag_alpha_target;
		self.set_phase(SimPhase::Running);
	}

	/// Drops the alpha target so the simulation can cool again.
	pub fn release(&mut self) {
		self.alpha_target = 0.0;
	}

	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	/// Pins node `index` at `(x, y)`, moving it there immediately.
	pub fn pin(&mut self, index: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = Some(x);
			node.fy = Some(y);
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	pub fn unpin(&mut self, index: usize) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = None;
			node.fy = None;
		}
	}

	/// Advances one step. Returns `true` when positions were updated.
	pub fn tick(&mut self) -> bool {
		if !self.is_active() {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_many_body(alpha);
		self.apply_center();
		self.apply_collide();

		let retain = 1.0 - self.config.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= retain;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= retain;
					node.y += node.vy;
				}
			}
		}

		let next = if self.alpha < self.config.alpha_min {
			SimPhase::Settled
		} else if self.alpha_target > 0.0 || self.alpha >= self.config.cooling_alpha {
			SimPhase::Running
		} else {
			SimPhase::Cooling
		};
		self.set_phase(next);
		true
	}

	fn set_phase(&mut self, phase: SimPhase) {
		if self.phase != phase && self.phase != SimPhase::Stopped {
			debug!("code-graph: simulation {:?} -> {:?}", self.phase, phase);
			self.phase = phase;
		}
	}

	fn apply_links(&mut self, alpha: f64) {
		for i in 0..self.links.len() {
			let link = &self.links[i];
			let (s, t) = (link.source, link.target);
			let (distance, strength, bias) = (link.distance, link.strength, link.bias);

			let (source, target) = (&self.nodes[s], &self.nodes[t]);
			let mut x = target.x + target.vx - source.x - source.vx;
			let mut y = target.y + target.vy - source.y - source.vy;
			if x == 0.0 {
				x = self.rng.jiggle();
			}
			if y == 0.0 {
				y = self.rng.jiggle();
			}
			let len = (x * x + y * y).sqrt();
			let l = (len - distance) / len * alpha * strength;
			x *= l;
			y *= l;

			self.nodes[t].vx -= x * bias;
			self.nodes[t].vy -= y * bias;
			self.nodes[s].vx += x * (1.0 - bias);
			self.nodes[s].vy += y * (1.0 - bias);
		}
	}

	fn apply_many_body(&mut self, alpha: f64) {
		const DISTANCE_MIN2: f64 = 1.0;
		let n = self.nodes.len();
		for i in 0..n {
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let (node, other) = (&self.nodes[i], &self.nodes[j]);
				let mut x = other.x - node.x;
				let mut y = other.y - node.y;
				let charge = other.charge;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = self.rng.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.rng.jiggle();
					l += y * y;
				}
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				dvx += x * charge * alpha / l;
				dvy += y * charge * alpha / l;
			}
			self.nodes[i].vx += dvx;
			self.nodes[i].vy += dvy;
		}
	}

	fn apply_center(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (dx, dy) = (sx / n - self.center.0, sy / n - self.center.1);
		for node in &mut self.nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}

	fn apply_collide(&mut self) {
		let n = self.nodes.len();
		for i in 0..n {
			let ri = self.nodes[i].collide_radius;
			let ri2 = ri * ri;
			let xi = self.nodes[i].x + self.nodes[i].vx;
			let yi = self.nodes[i].y + self.nodes[i].vy;
			for j in (i + 1)..n {
				let rj = self.nodes[j].collide_radius;
				let r = ri + rj;
				let mut x = xi - self.nodes[j].x - self.nodes[j].vx;
				let mut y = yi - self.nodes[j].y - self.nodes[j].vy;
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 {
					x = self.rng.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.rng.jiggle();
					l += y * y;
				}
				let len = l.sqrt();
				let push = (r - len) / len;
				x *= push;
				y *= push;
				let share = rj * rj / (ri2 + rj * rj);
				self.nodes[i].vx += x * share;
				self.nodes[i].vy += y * share;
				self.nodes[j].vx -= x * (1.0 - share);
				self.nodes[j].vy -= y * (1.0 - share);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pair(distance: f64) -> Simulation {
		Simulation::new(
			vec![SimNode::new(50.0, -2000.0), SimNode::new(50.0, -2000.0)],
			vec![SimLink::new(0, 1, distance)],
			(400.0, 300.0),
			SimulationConfig::default(),
		)
	}

	fn run_until_settled(sim: &mut Simulation) -> usize {
		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			assert!(ticks < 10_000, "simulation never settled");
		}
		ticks
	}

	#[test]
	fn idle_until_started() {
		let mut sim = pair(200.0);
		assert_eq!(sim.phase(), SimPhase::Idle);
		let before = sim.nodes().to_vec();
		assert!(!sim.tick());
		assert_eq!(sim.nodes(), before.as_slice());
		sim.start();
		assert_eq!(sim.phase(), SimPhase::Running);
	}

	#[test]
	fn cools_then_settles() {
		let mut sim = pair(200.0);
		sim.start();
		let mut saw_cooling = false;
		while sim.tick() {
			saw_cooling |= sim.phase() == SimPhase::Cooling;
		}
		assert!(saw_cooling);
		assert_eq!(sim.phase(), SimPhase::Settled);

		let settled = sim.nodes().to_vec();
		for _ in 0..50 {
			assert!(!sim.tick());
		}
		assert_eq!(sim.nodes(), settled.as_slice());
	}

	#[test]
	fn layout_stays_centered_and_separated() {
		let mut sim = pair(200.0);
		sim.start();
		run_until_settled(&mut sim);
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		let (mx, my) = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
		assert!((mx - 400.0).abs() < 1e-6 && (my - 300.0).abs() < 1e-6);
		let dist = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
		assert!(dist > 100.0, "nodes collapsed: {dist}");
	}

	#[test]
	fn pinned_node_follows_pin() {
		let mut sim = pair(200.0);
		sim.start();
		sim.reheat();
		sim.pin(0, 10.0, 20.0);
		for _ in 0..30 {
			sim.tick();
			assert_eq!((sim.nodes()[0].x, sim.nodes()[0].y), (10.0, 20.0));
		}
		sim.pin(0, 55.0, -5.0);
		sim.tick();
		assert_eq!((sim.nodes()[0].x, sim.nodes()[0].y), (55.0, -5.0));
	}

	#[test]
	fn release_lets_a_reheated_simulation_settle() {
		let mut sim = pair(120.0);
		sim.start();
		run_until_settled(&mut sim);

		sim.reheat();
		assert_eq!(sim.phase(), SimPhase::Running);
		sim.pin(1, 0.0, 0.0);
		for _ in 0..500 {
			sim.tick();
		}
		assert_eq!(sim.phase(), SimPhase::Running);

		sim.unpin(1);
		sim.release();
		assert!(!sim.nodes()[1].is_pinned());
		assert!(sim.tick());
		run_until_settled(&mut sim);
		assert_eq!(sim.phase(), SimPhase::Settled);
	}

	#[test]
	fn stop_is_terminal() {
		let mut sim = pair(200.0);
		sim.start();
		sim.tick();
		sim.stop();
		let frozen = sim.nodes().to_vec();
		sim.reheat();
		sim.start();
		assert!(!sim.tick());
		assert_eq!(sim.phase(), SimPhase::Stopped);
		assert_eq!(sim.nodes(), frozen.as_slice());
	}

	#[test]
	fn coincident_nodes_are_pushed_apart() {
		let mut a = SimNode::new(10.0, -300.0);
		let mut b = SimNode::new(10.0, -300.0);
		(a.x, a.y, b.x, b.y) = (0.0, 0.0, 0.0, 0.0);
		let mut sim = Simulation::new(vec![a, b], vec![], (0.0, 0.0), SimulationConfig::default());
		sim.start();
		run_until_settled(&mut sim);
		let (a, b) = (&sim.nodes()[0], &sim.nodes()[1]);
		assert!(a.x.is_finite() && b.y.is_finite());
		assert!(((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt() > 1.0);
	}
}
