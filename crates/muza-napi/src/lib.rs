//! Node.js bindings for the muza-core associative memory engine.
//!
//! Exposes a `MemoryEngine` class backed by an on-disk store. The host's
//! own timers drive `tick()` (~50 ms) and `save()` (~5 s).

// napi-rs requires owned types at the FFI boundary - can't use references
#![allow(clippy::needless_pass_by_value)]
// Graph sizes and walk lengths never approach u32::MAX in practice
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use napi::bindgen_prelude::*;
use napi_derive::napi;

use muza_core::{
	default_data_dir, embed, tokenize, ConceptNode, EngineConfig, FileStore, LearnContext,
	MemoryEngine, MemoryStats, SearchHit, Vec3, DEFAULT_TOP_K, DEFAULT_WALK_LENGTH,
};

// ============================================================================
// JS Types
// ============================================================================

/// A point or direction in simulation space.
#[napi(object)]
#[derive(Clone)]
pub struct JsVec3 {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

/// Outgoing association of a concept.
#[napi(object)]
#[derive(Clone)]
pub struct JsAssociation {
	/// Token that followed this concept
	pub neighbor: String,
	/// Number of times it followed
	pub weight: u32,
}

/// Snapshot of one concept.
#[napi(object)]
#[derive(Clone)]
pub struct JsConceptNode {
	/// The token
	pub id: String,
	/// 32-dimensional unit embedding
	pub embedding: Vec<f64>,
	/// Position in simulation space
	pub position: JsVec3,
	/// Velocity in simulation space
	pub velocity: JsVec3,
	/// Energy (0-4 by default)
	pub energy: f64,
	/// Outgoing associations
	pub associations: Vec<JsAssociation>,
}

/// A concept matched by a query.
#[napi(object)]
pub struct JsSearchHit {
	/// The matched concept
	pub node: JsConceptNode,
	/// Cosine similarity to the query
	pub similarity: f64,
}

/// Summary of the graph.
#[napi(object)]
pub struct JsMemoryStats {
	/// Number of concepts
	pub node_count: u32,
	/// Number of distinct associations
	pub association_count: u32,
	/// Sum of association weights
	pub total_weight: f64,
	/// Sum of energies
	pub total_energy: f64,
	/// Mean energy
	pub mean_energy: f64,
	/// Physics ticks applied
	pub ticks: f64,
}

/// Configuration overrides; omitted fields keep their defaults.
#[napi(object)]
#[derive(Clone, Default)]
pub struct JsEngineConfig {
	/// Pull between similar concepts (default: 0.002)
	pub attraction: Option<f64>,
	/// Push between every pair (default: 0.015)
	pub repulsion: Option<f64>,
	/// Velocity retained per tick (default: 0.92)
	pub friction: Option<f64>,
	/// Distance floor (default: 0.01)
	pub min_distance: Option<f64>,
	/// Similarity above which concepts attract (default: 0.75)
	pub similarity_threshold: Option<f64>,
	/// X jitter amplitude (default: 0.005)
	pub jitter: Option<f64>,
	/// Energy of a new concept (default: 1.0)
	pub initial_energy: Option<f64>,
	/// Energy gained per encounter (default: 0.5)
	pub resonance: Option<f64>,
	/// Energy ceiling (default: 4.0)
	pub max_energy: Option<f64>,
	/// Energy drained per tick (default: 0.0005)
	pub energy_decay: Option<f64>,
	/// Adaptive memory boost (default: 0.2)
	pub adaptive_boost: Option<f64>,
	/// Adaptive memory similarity threshold (default: 0.8)
	pub adaptive_threshold: Option<f64>,
	/// Storage key (default: "muza_logos_brain")
	pub storage_key: Option<String>,
	/// Legacy storage key migrated on open (default: "muza_logos_v35_final_brain")
	pub legacy_key: Option<String>,
}

// ============================================================================
// Engine
// ============================================================================

/// Associative memory engine persisted to a data directory.
#[napi(js_name = "MemoryEngine")]
pub struct JsMemoryEngine {
	inner: MemoryEngine<FileStore>,
}

#[napi]
impl JsMemoryEngine {
	/// Open the engine, restoring any graph saved in `dataDir`
	/// (default: `~/.muza`).
	#[napi(constructor)]
	pub fn new(data_dir: Option<String>, config: Option<JsEngineConfig>) -> Result<Self> {
		let store = match data_dir {
			Some(dir) => FileStore::open(dir),
			None => FileStore::open_default(),
		}
		.map_err(to_napi_error)?;

		Ok(Self {
			inner: MemoryEngine::open(store, js_config_to_core(config)),
		})
	}

	/// Absorb text into the graph.
	#[napi]
	pub fn learn(&self, text: String, adaptive_memory: Option<bool>) {
		let context = LearnContext {
			adaptive_memory: adaptive_memory.unwrap_or(false),
		};
		self.inner.learn(&text, Some(&context));
	}

	/// The `topK` (default 5) concepts most similar to `query`.
	#[napi]
	pub fn semantic_search(&self, query: String, top_k: Option<i32>) -> Vec<JsSearchHit> {
		let top_k = top_k.map_or(DEFAULT_TOP_K, clamp_count);
		self.inner
			.semantic_search(&query, top_k)
			.into_iter()
			.map(search_hit_to_js)
			.collect()
	}

	/// Walk associations from `seed` for at most `length` (default 15) steps.
	///
	/// An unknown seed yields "Seed not found in memory." instead of throwing.
	#[napi]
	pub fn generate(&self, seed: String, length: Option<i32>) -> String {
		let length = length.map_or(DEFAULT_WALK_LENGTH, clamp_count);
		self.inner
			.generate(&seed, length)
			.unwrap_or_else(|e| e.summary().to_owned())
	}

	/// Snapshot of every concept.
	#[napi]
	pub fn nodes(&self) -> Vec<JsConceptNode> {
		self.inner.nodes().into_iter().map(node_to_js).collect()
	}

	/// Snapshot of one concept, or null.
	#[napi]
	pub fn node(&self, id: String) -> Option<JsConceptNode> {
		self.inner.node(&id).map(node_to_js)
	}

	/// Apply one physics tick.
	#[napi]
	pub fn tick(&self) {
		self.inner.tick();
	}

	/// Write a snapshot; returns the number of concepts saved.
	#[napi]
	pub fn save(&self) -> Result<u32> {
		self.inner
			.save()
			.map(|n| n as u32)
			.map_err(to_napi_error)
	}

	/// Forget the whole graph, in memory and on disk.
	#[napi]
	pub fn wipe(&self) -> Result<()> {
		self.inner.wipe().map_err(to_napi_error)
	}

	/// Summary counts.
	#[napi]
	pub fn stats(&self) -> JsMemoryStats {
		stats_to_js(self.inner.stats())
	}
}

// ============================================================================
// Functions
// ============================================================================

/// Embedding of a token (32 floats, unit length).
#[napi]
pub fn embed_text(text: String) -> Vec<f64> {
	embed(&text).to_vec()
}

/// Tokens `learn` would extract from `text`.
#[napi]
pub fn tokenize_text(text: String) -> Vec<String> {
	tokenize(&text)
}

/// Default data directory for the on-disk store.
#[napi]
pub fn get_default_data_dir() -> String {
	default_data_dir().display().to_string()
}

// ============================================================================
// Type Conversions
// ============================================================================

fn to_napi_error(e: impl std::fmt::Display) -> Error {
	Error::new(Status::GenericFailure, e.to_string())
}

/// Negative counts from JS mean "none".
fn clamp_count(n: i32) -> usize {
	usize::try_from(n).unwrap_or(0)
}

const fn vec3_to_js(v: Vec3) -> JsVec3 {
	JsVec3 {
		x: v.x,
		y: v.y,
		z: v.z,
	}
}

fn node_to_js(node: ConceptNode) -> JsConceptNode {
	JsConceptNode {
		embedding: node.embedding.to_vec(),
		position: vec3_to_js(node.position),
		velocity: vec3_to_js(node.velocity),
		energy: node.energy,
		associations: node
			.associations
			.into_iter()
			.map(|(neighbor, weight)| JsAssociation { neighbor, weight })
			.collect(),
		id: node.id,
	}
}

fn search_hit_to_js(hit: SearchHit) -> JsSearchHit {
	JsSearchHit {
		similarity: hit.similarity,
		node: node_to_js(hit.node),
	}
}

fn stats_to_js(stats: MemoryStats) -> JsMemoryStats {
	JsMemoryStats {
		node_count: stats.node_count as u32,
		association_count: stats.association_count as u32,
		total_weight: stats.total_weight as f64,
		total_energy: stats.total_energy,
		mean_energy: stats.mean_energy,
		ticks: stats.ticks as f64,
	}
}

fn js_config_to_core(config: Option<JsEngineConfig>) -> EngineConfig {
	let config = config.unwrap_or_default();
	let mut core = EngineConfig::default();

	let physics = &mut core.memory.physics;
	physics.attraction = config.attraction.unwrap_or(physics.attraction);
	physics.repulsion = config.repulsion.unwrap_or(physics.repulsion);
	physics.friction = config.friction.unwrap_or(physics.friction);
	physics.min_distance = config.min_distance.unwrap_or(physics.min_distance);
	physics.similarity_threshold = config
		.similarity_threshold
		.unwrap_or(physics.similarity_threshold);
	physics.jitter = config.jitter.unwrap_or(physics.jitter);

	let energy = &mut core.memory.energy;
	energy.initial = config.initial_energy.unwrap_or(energy.initial);
	energy.resonance = config.resonance.unwrap_or(energy.resonance);
	energy.max = config.max_energy.unwrap_or(energy.max);
	energy.decay_per_tick = config.energy_decay.unwrap_or(energy.decay_per_tick);
	energy.adaptive_boost = config.adaptive_boost.unwrap_or(energy.adaptive_boost);
	energy.adaptive_threshold = config
		.adaptive_threshold
		.unwrap_or(energy.adaptive_threshold);

	if let Some(key) = config.storage_key {
		core.persistence.storage_key = key;
	}
	if let Some(key) = config.legacy_key {
		core.persistence.legacy_key = key;
	}

	core
}
