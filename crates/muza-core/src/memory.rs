//! The associative memory graph.
//!
//! [`AssociativeMemory`] exclusively owns the concept nodes. Nodes are
//! created lazily by [`AssociativeMemory::learn`], moved by
//! [`AssociativeMemory::tick`], and only ever removed all at once by
//! [`AssociativeMemory::clear`]. Callers read snapshots; nothing hands out
//! mutable access to a node.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activation::{clamp_energy, cosine_similarity, resonate, EnergyConfig};
use crate::embedding::embed;
use crate::error::MemoryError;
use crate::node::{ConceptNode, Vec3};
use crate::physics::{step, PhysicsConfig};
use crate::retrieval::{semantic_search, SearchHit};
use crate::tokenize::tokenize;
use crate::walk::random_walk;

/// Progression module that enables adaptive resonance during learning.
pub const ADAPTIVE_MEMORY_MODULE: &str = "adaptive_memory";

/// Configuration for the memory graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
	/// Layout simulation
	pub physics: PhysicsConfig,
	/// Concept energy
	pub energy: EnergyConfig,
}

/// Optional context supplied with learned text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnContext {
	/// Boost every concept that resonates with the whole input
	pub adaptive_memory: bool,
}

impl LearnContext {
	/// Context with adaptive memory enabled.
	#[must_use]
	pub const fn adaptive() -> Self {
		Self {
			adaptive_memory: true,
		}
	}

	/// Build a context from the ids of unlocked progression modules.
	pub fn from_unlocked_modules<'a, I>(modules: I) -> Self
	where
		I: IntoIterator<Item = &'a str>,
	{
		Self {
			adaptive_memory: modules.into_iter().any(|m| m == ADAPTIVE_MEMORY_MODULE),
		}
	}
}

/// Read-only summary of the graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
	/// Number of concepts
	pub node_count: usize,
	/// Number of distinct directed associations
	pub association_count: usize,
	/// Sum of all association weights
	pub total_weight: u64,
	/// Sum of all concept energies
	pub total_energy: f64,
	/// Mean concept energy (0 for an empty graph)
	pub mean_energy: f64,
	/// Physics ticks applied since construction
	pub ticks: u64,
}

/// A self-organizing graph of learned concepts.
pub struct AssociativeMemory {
	/// Concepts in first-seen order
	nodes: Vec<ConceptNode>,
	/// Concept id → position in `nodes`
	index: HashMap<String, usize>,
	ticks: u64,
	config: MemoryConfig,
	rng: StdRng,
}

impl Default for AssociativeMemory {
	fn default() -> Self {
		Self::new(MemoryConfig::default())
	}
}

impl AssociativeMemory {
	/// Create an empty memory with an entropy-seeded random source.
	#[must_use]
	pub fn new(config: MemoryConfig) -> Self {
		Self::with_rng(config, StdRng::from_entropy())
	}

	/// Create an empty memory whose positions and walks are reproducible.
	#[must_use]
	pub fn with_seed(config: MemoryConfig, seed: u64) -> Self {
		Self::with_rng(config, StdRng::seed_from_u64(seed))
	}

	fn with_rng(config: MemoryConfig, rng: StdRng) -> Self {
		Self {
			nodes: Vec::new(),
			index: HashMap::new(),
			ticks: 0,
			config,
			rng,
		}
	}

	/// Replace the graph with previously persisted concepts.
	///
	/// A duplicate id replaces the earlier entry in place (last one wins),
	/// energies are clamped into range and non-finite motion state is reset.
	pub fn restore(&mut self, nodes: Vec<ConceptNode>) {
		self.clear();
		for mut node in nodes {
			node.energy = clamp_energy(node.energy, &self.config.energy);
			if !node.position.is_finite() {
				node.position = Vec3::random_unit_cube(&mut self.rng);
			}
			if !node.velocity.is_finite() {
				node.velocity = Vec3::ZERO;
			}

			if let Some(&i) = self.index.get(&node.id) {
				warn!(id = %node.id, "Replacing duplicate concept from snapshot");
				self.nodes[i] = node;
				continue;
			}
			let _ = self.index.insert(node.id.clone(), self.nodes.len());
			self.nodes.push(node);
		}
	}

	/// Absorb a unit of text into the graph.
	///
	/// Each token resonates (gaining energy, created on first sight) and
	/// each adjacent pair strengthens the edge from the earlier token to the
	/// later one, strictly left to right.
	pub fn learn(&mut self, text: &str, context: Option<&LearnContext>) {
		if context.is_some_and(|c| c.adaptive_memory) {
			self.adaptive_resonance(text);
		}

		let tokens = tokenize(text);
		let before = self.nodes.len();
		let mut previous: Option<usize> = None;

		for token in &tokens {
			let current = self.intern(token);
			let node = &mut self.nodes[current];
			node.energy = resonate(node.energy, self.config.energy.resonance, &self.config.energy);

			if let Some(prev) = previous {
				self.nodes[prev].reinforce(token);
			}
			previous = Some(current);
		}

		debug!(
			tokens = tokens.len(),
			created = self.nodes.len() - before,
			total = self.nodes.len(),
			"Learned text"
		);
	}

	/// Boost concepts whose embedding resonates with the whole input text.
	///
	/// The text is embedded as a single string and compared against token
	/// embeddings in the same space.
	fn adaptive_resonance(&mut self, text: &str) {
		let probe = embed(text);
		let energy = &self.config.energy;
		for node in &mut self.nodes {
			if cosine_similarity(&probe, &node.embedding) > energy.adaptive_threshold {
				node.energy = resonate(node.energy, energy.adaptive_boost, energy);
			}
		}
	}

	/// Index of the concept for `token`, creating it if needed.
	fn intern(&mut self, token: &str) -> usize {
		if let Some(&i) = self.index.get(token) {
			return i;
		}
		let i = self.nodes.len();
		self.nodes
			.push(ConceptNode::new(token, self.config.energy.initial, &mut self.rng));
		let _ = self.index.insert(token.to_owned(), i);
		i
	}

	/// Advance the layout simulation by one tick.
	pub fn tick(&mut self) {
		self.ticks = self.ticks.wrapping_add(1);
		step(
			&mut self.nodes,
			self.ticks,
			&self.config.physics,
			&self.config.energy,
		);
	}

	/// The `top_k` concepts most similar to `query`, best first.
	#[must_use]
	pub fn semantic_search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
		semantic_search(&self.nodes, query, top_k)
	}

	/// Generate a pseudo-sentence by walking associations from `seed`.
	///
	/// The output starts with `seed` as given and holds at most `length`
	/// further tokens.
	///
	/// # Errors
	///
	/// Returns [`MemoryError::SeedNotFound`] if the lowercased seed is not a
	/// known concept.
	pub fn generate(&mut self, seed: &str, length: usize) -> Result<String, MemoryError> {
		let start = self
			.index
			.get(&seed.to_lowercase())
			.copied()
			.ok_or_else(|| MemoryError::SeedNotFound {
				seed: seed.to_owned(),
			})?;

		let path = random_walk(&self.nodes, &self.index, start, length, &mut self.rng);

		let mut sentence = String::from(seed);
		for token in path {
			sentence.push(' ');
			sentence.push_str(token);
		}
		Ok(sentence)
	}

	/// All concepts in first-seen order.
	#[must_use]
	pub fn nodes(&self) -> &[ConceptNode] {
		&self.nodes
	}

	/// Look up a single concept by id.
	#[must_use]
	pub fn node(&self, id: &str) -> Option<&ConceptNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	/// Number of concepts.
	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// True when nothing has been learned.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Physics ticks applied so far.
	#[must_use]
	pub const fn ticks(&self) -> u64 {
		self.ticks
	}

	/// The active configuration.
	#[must_use]
	pub const fn config(&self) -> &MemoryConfig {
		&self.config
	}

	/// Summary counts for status displays.
	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	pub fn stats(&self) -> MemoryStats {
		let total_energy: f64 = self.nodes.iter().map(|n| n.energy).sum();
		MemoryStats {
			node_count: self.nodes.len(),
			association_count: self.nodes.iter().map(|n| n.associations.len()).sum(),
			total_weight: self.nodes.iter().map(ConceptNode::total_weight).sum(),
			total_energy,
			mean_energy: if self.nodes.is_empty() {
				0.0
			} else {
				total_energy / self.nodes.len() as f64
			},
			ticks: self.ticks,
		}
	}

	/// Forget everything.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.index.clear();
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
	use super::*;
	use crate::activation::cosine_similarity;

	fn memory() -> AssociativeMemory {
		AssociativeMemory::with_seed(MemoryConfig::default(), 17)
	}

	#[test]
	fn test_learn_creates_one_node_per_token() {
		let mut m = memory();
		m.learn("Система онлайн ядро сознания", None);

		assert_eq!(m.len(), 4);
		for id in ["система", "онлайн", "ядро", "сознания"] {
			let node = m.node(id).expect("token learned");
			assert!((node.energy - 1.5).abs() < 1e-12, "{id} energy {}", node.energy);
		}
		assert_eq!(m.node("система").unwrap().association("онлайн"), 1);
		assert_eq!(m.node("онлайн").unwrap().association("ядро"), 1);
		assert_eq!(m.node("ядро").unwrap().association("сознания"), 1);
		assert!(m.node("сознания").unwrap().associations.is_empty());
	}

	#[test]
	fn test_learn_normalizes_case_and_punctuation() {
		let mut a = memory();
		let mut b = memory();
		a.learn("System, Online!", None);
		b.learn("system online", None);

		let ids = |m: &AssociativeMemory| m.nodes().iter().map(|n| n.id.clone()).collect::<Vec<_>>();
		assert_eq!(ids(&a), vec!["system", "online"]);
		assert_eq!(ids(&a), ids(&b));
	}

	#[test]
	fn test_learn_empty_is_noop() {
		let mut m = memory();
		m.learn("", None);
		m.learn("a b c", None);
		assert!(m.is_empty());
	}

	#[test]
	fn test_association_counts() {
		let mut m = memory();
		m.learn("cat dog cat dog cat dog", None);
		assert_eq!(m.node("cat").unwrap().association("dog"), 3);
		assert_eq!(m.node("dog").unwrap().association("cat"), 2);
	}

	#[test]
	fn test_associations_do_not_cross_calls() {
		let mut m = memory();
		m.learn("first", None);
		m.learn("second", None);
		assert!(m.node("first").unwrap().associations.is_empty());
	}

	#[test]
	fn test_energy_never_exceeds_ceiling() {
		let mut m = memory();
		for _ in 0..50 {
			m.learn("resonance", None);
		}
		assert_eq!(m.node("resonance").unwrap().energy, 4.0);
	}

	#[test]
	fn test_energy_never_below_zero() {
		let mut m = memory();
		m.learn("fading", None);
		for _ in 0..5_000 {
			m.tick();
		}
		assert_eq!(m.node("fading").unwrap().energy, 0.0);
		assert_eq!(m.ticks(), 5_000);
	}

	#[test]
	fn test_adaptive_memory_boosts_resonant_nodes() {
		let mut plain = memory();
		let mut adaptive = memory();
		// A single-token text embeds exactly like its token.
		plain.learn("pulse", None);
		adaptive.learn("pulse", None);

		plain.learn("Pulse", None);
		adaptive.learn("pulse", Some(&LearnContext::adaptive()));

		let base = plain.node("pulse").unwrap().energy;
		let boosted = adaptive.node("pulse").unwrap().energy;
		assert!((boosted - base - 0.2).abs() < 1e-12);
	}

	#[test]
	fn test_adaptive_memory_skips_dissimilar_nodes() {
		let mut m = memory();
		m.learn("alpha", None);
		let before = m.node("alpha").unwrap().energy;
		let text = "completely unrelated sentence";
		let sim = cosine_similarity(&embed(text), &embed("alpha"));

		m.learn(text, Some(&LearnContext::adaptive()));
		let after = m.node("alpha").unwrap().energy;
		if sim > 0.8 {
			assert!((after - before - 0.2).abs() < 1e-12);
		} else {
			assert_eq!(after, before);
		}
	}

	#[test]
	fn test_context_from_modules() {
		assert!(LearnContext::from_unlocked_modules(["logos", "adaptive_memory"]).adaptive_memory);
		assert!(!LearnContext::from_unlocked_modules(["logos"]).adaptive_memory);
	}

	#[test]
	fn test_search_returns_exact_token_first() {
		let mut m = memory();
		m.learn("Система онлайн ядро сознания", None);

		let hits = m.semantic_search("ядро", 2);
		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].node.id, "ядро");

		let probe = embed("ядро");
		let runner_up = ["система", "онлайн", "сознания"]
			.into_iter()
			.max_by(|a, b| {
				cosine_similarity(&probe, &embed(a)).total_cmp(&cosine_similarity(&probe, &embed(b)))
			})
			.unwrap();
		assert_eq!(hits[1].node.id, runner_up);
	}

	#[test]
	fn test_generate_unknown_seed() {
		let mut m = memory();
		m.learn("known words only", None);
		assert_eq!(
			m.generate("missing", 5),
			Err(MemoryError::SeedNotFound {
				seed: "missing".into()
			})
		);
	}

	#[test]
	fn test_generate_follows_chain_case_insensitively() {
		let mut m = memory();
		m.learn("system online core", None);
		assert_eq!(m.generate("System", 15).unwrap(), "System online core");
	}

	#[test]
	fn test_generate_terminates_on_cycle() {
		let mut m = memory();
		m.learn("cat dog cat dog", None);
		let sentence = m.generate("cat", 10).unwrap();
		assert_eq!(sentence.split(' ').count(), 11);
	}

	#[test]
	fn test_generate_is_reproducible_with_seed() {
		let text = "the river runs the mountain sleeps the river sings the night";
		let mut a = memory();
		let mut b = memory();
		a.learn(text, None);
		b.learn(text, None);
		assert_eq!(a.generate("the", 12).unwrap(), b.generate("the", 12).unwrap());
	}

	#[test]
	fn test_tick_moves_nodes() {
		let mut m = memory();
		m.learn("north south east west", None);
		let before: Vec<Vec3> = m.nodes().iter().map(|n| n.position).collect();
		m.tick();
		let moved = m
			.nodes()
			.iter()
			.zip(&before)
			.any(|(n, p)| n.position != *p);
		assert!(moved);
	}

	#[test]
	fn test_restore_deduplicates_and_clamps() {
		let mut source = memory();
		source.learn("alpha beta", None);
		let mut nodes = source.nodes().to_vec();
		nodes[0].energy = 99.0;
		let mut later_beta = nodes[1].clone();
		later_beta.energy = 2.5;
		nodes.push(later_beta);

		let mut m = memory();
		m.restore(nodes);
		assert_eq!(m.len(), 2);
		assert_eq!(m.nodes()[1].id, "beta");
		assert_eq!(m.node("beta").unwrap().energy, 2.5);
		assert_eq!(m.node("alpha").unwrap().energy, 4.0);
		assert_eq!(m.node("alpha").unwrap().association("beta"), 1);
	}

	#[test]
	fn test_stats_and_clear() {
		let mut m = memory();
		m.learn("cat dog cat", None);
		let stats = m.stats();
		assert_eq!(stats.node_count, 2);
		assert_eq!(stats.association_count, 2);
		assert_eq!(stats.total_weight, 2);
		assert!((stats.total_energy - 3.5).abs() < 1e-12);

		m.clear();
		assert!(m.is_empty());
		assert!(m.node("cat").is_none());
		assert_eq!(m.stats().mean_energy, 0.0);
	}
}
