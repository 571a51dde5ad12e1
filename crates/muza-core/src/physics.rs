//! Force-Directed Layout
//!
//! Every tick, each concept feels two forces from every other concept:
//!
//! ```text
//! d = B.position - A.position,  r = max(|d|, r_min)
//!
//! attraction = d · S(A,B) · k_a          only when S(A,B) > threshold
//! repulsion  = -(d / r) · k_r / r²       always
//! ```
//!
//! then integrates `v = (v + F) · friction`, `p = p + v`, adds a small
//! deterministic jitter on X (`sin(t · ω + e₀) · jitter`) and drains energy.
//!
//! Forces are computed for all nodes from one snapshot of positions before
//! any node moves, so the result does not depend on iteration order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::activation::{cosine_similarity, decay, EnergyConfig};
use crate::node::{ConceptNode, Vec3};

/// Configuration for the layout simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
	/// `k_a` - pull between similar concepts
	pub attraction: f64,
	/// `k_r` - push between every pair
	pub repulsion: f64,
	/// Velocity retained per tick (0-1)
	pub friction: f64,
	/// `r_min` - distance floor
	pub min_distance: f64,
	/// Similarity above which concepts attract
	pub similarity_threshold: f64,
	/// Amplitude of the X jitter
	pub jitter: f64,
	/// `ω` - angular step of the jitter per tick
	pub jitter_frequency: f64,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			attraction: 0.002,
			repulsion: 0.015,
			friction: 0.92,
			min_distance: 0.01,
			similarity_threshold: 0.75,
			jitter: 0.005,
			jitter_frequency: 0.1,
		}
	}
}

/// Net force on node `index` given a snapshot of all positions.
fn net_force(
	index: usize,
	nodes: &[ConceptNode],
	positions: &[Vec3],
	config: &PhysicsConfig,
) -> Vec3 {
	let origin = positions[index];
	let embedding = &nodes[index].embedding;
	let mut force = Vec3::ZERO;

	for (other, (node, &position)) in nodes.iter().zip(positions).enumerate() {
		if other == index {
			continue;
		}

		let displacement = position - origin;
		let distance = displacement.length().max(config.min_distance);

		let similarity = cosine_similarity(embedding, &node.embedding);
		if similarity > config.similarity_threshold {
			force += displacement * (similarity * config.attraction);
		}

		let repulsion = config.repulsion / (distance * distance);
		force += displacement * (-repulsion / distance);
	}

	force
}

/// Advance the simulation by one tick.
///
/// `tick` is the 1-based counter of the tick being applied; it only feeds
/// the jitter phase.
#[allow(clippy::cast_precision_loss)]
pub fn step(
	nodes: &mut [ConceptNode],
	tick: u64,
	physics: &PhysicsConfig,
	energy: &EnergyConfig,
) {
	if nodes.is_empty() {
		return;
	}

	let forces: Vec<Vec3> = {
		let snapshot: &[ConceptNode] = nodes;
		let positions: Vec<Vec3> = snapshot.iter().map(|n| n.position).collect();
		(0..snapshot.len())
			.into_par_iter()
			.map(|i| net_force(i, snapshot, &positions, physics))
			.collect()
	};

	let phase = tick as f64 * physics.jitter_frequency;

	for (node, force) in nodes.iter_mut().zip(forces) {
		node.velocity += force;
		node.velocity *= physics.friction;
		node.position += node.velocity;

		node.position.x += (phase + node.embedding[0]).sin() * physics.jitter;
		node.energy = decay(node.energy, energy);
	}
}
