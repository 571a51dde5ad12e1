//! Host-owned memory engine.
//!
//! [`MemoryEngine`] couples an [`AssociativeMemory`] with a key-value store
//! and two periodic timers:
//!
//! - **physics** (~50 ms): one layout tick over the whole graph
//! - **snapshot** (~5 s): serialize the graph and write it to the store
//!
//! All access to the graph goes through one mutex, so a tick never observes
//! a half-applied `learn` and searches never observe a half-applied tick.
//! Store writes go through a second mutex, so a snapshot encoded before a
//! `wipe` can never land after it. Save failures are logged and retried on
//! the next interval.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{EngineError, MemoryError, PersistenceError};
use crate::memory::{AssociativeMemory, LearnContext, MemoryConfig, MemoryStats};
use crate::node::ConceptNode;
use crate::persistence::{self, encode_snapshot, PersistenceConfig};
use crate::retrieval::SearchHit;
use crate::store::KeyValueStore;

/// Timer periods.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
	/// Physics tick period (ms)
	pub tick_interval_ms: u64,
	/// Snapshot period (ms)
	pub save_interval_ms: u64,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			tick_interval_ms: 50,
			save_interval_ms: 5_000,
		}
	}
}

/// Complete engine configuration.
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Graph behavior
	pub memory: MemoryConfig,
	/// Storage keys
	pub persistence: PersistenceConfig,
	/// Timer periods
	pub scheduler: SchedulerConfig,
}

impl EngineConfig {
	/// Parse a configuration from JSON.
	///
	/// # Errors
	///
	/// Returns [`EngineError::Config`] if the document is malformed.
	pub fn from_json(raw: &str) -> Result<Self, EngineError> {
		serde_json::from_str(raw).map_err(EngineError::Config)
	}
}

/// State shared between the engine handle and its timer tasks.
///
/// Lock order: `writes` before `memory`.
struct Shared<S> {
	memory: Mutex<AssociativeMemory>,
	/// Held across encode + store write, and across clear + store removal.
	writes: Mutex<()>,
	store: S,
	persistence: PersistenceConfig,
}

impl<S: KeyValueStore> Shared<S> {
	fn save(&self) -> Result<usize, PersistenceError> {
		let _gate = self.writes.lock();
		// Graph lock is released before the store write.
		let (raw, count) = {
			let memory = self.memory.lock();
			(encode_snapshot(memory.nodes())?, memory.len())
		};
		self.store.set(&self.persistence.storage_key, &raw)?;
		Ok(count)
	}

	fn wipe(&self) -> Result<(), PersistenceError> {
		let _gate = self.writes.lock();
		self.memory.lock().clear();
		persistence::wipe(&self.store, &self.persistence)
	}
}

struct Timers {
	physics: JoinHandle<()>,
	snapshot: JoinHandle<()>,
}

impl Timers {
	fn abort(self) {
		self.physics.abort();
		self.snapshot.abort();
	}
}

/// An associative memory with persistence and background timers.
pub struct MemoryEngine<S: KeyValueStore + 'static> {
	shared: Arc<Shared<S>>,
	scheduler: SchedulerConfig,
	timers: Mutex<Option<Timers>>,
}

impl<S: KeyValueStore + 'static> MemoryEngine<S> {
	/// Open an engine over `store`, migrating and loading any saved graph.
	///
	/// Corrupt saved data is discarded; the engine then starts empty.
	pub fn open(store: S, config: EngineConfig) -> Self {
		let memory = AssociativeMemory::new(config.memory.clone());
		Self::with_memory(store, config, memory)
	}

	/// Like [`MemoryEngine::open`] with reproducible randomness.
	pub fn open_seeded(store: S, config: EngineConfig, seed: u64) -> Self {
		let memory = AssociativeMemory::with_seed(config.memory.clone(), seed);
		Self::with_memory(store, config, memory)
	}

	fn with_memory(store: S, config: EngineConfig, mut memory: AssociativeMemory) -> Self {
		memory.restore(persistence::load(&store, &config.persistence));
		Self {
			shared: Arc::new(Shared {
				memory: Mutex::new(memory),
				writes: Mutex::new(()),
				store,
				persistence: config.persistence,
			}),
			scheduler: config.scheduler,
			timers: Mutex::new(None),
		}
	}

	/// Start the physics and snapshot timers on the current tokio runtime.
	///
	/// # Errors
	///
	/// Returns [`EngineError::NoRuntime`] outside a runtime and
	/// [`EngineError::AlreadyStarted`] if the timers are running.
	pub fn start(&self) -> Result<(), EngineError> {
		let handle = Handle::try_current()?;
		let mut timers = self.timers.lock();
		if timers.is_some() {
			return Err(EngineError::AlreadyStarted);
		}

		let tick_period = Duration::from_millis(self.scheduler.tick_interval_ms.max(1));
		let save_period = Duration::from_millis(self.scheduler.save_interval_ms.max(1));

		*timers = Some(Timers {
			physics: handle.spawn(physics_loop(Arc::clone(&self.shared), tick_period)),
			snapshot: handle.spawn(snapshot_loop(Arc::clone(&self.shared), save_period)),
		});

		info!(
			tick_ms = self.scheduler.tick_interval_ms,
			save_ms = self.scheduler.save_interval_ms,
			"Memory engine started"
		);
		Ok(())
	}

	/// Stop both timers and write a final snapshot.
	///
	/// A periodic snapshot already mid-write finishes first, so the final
	/// snapshot is the last one stored. Returns `false` if the engine was not
	/// running.
	pub fn stop(&self) -> bool {
		let Some(timers) = self.timers.lock().take() else {
			return false;
		};
		timers.abort();

		match self.shared.save() {
			Ok(nodes) => info!(nodes, "Memory engine stopped"),
			Err(e) => warn!(error = %e, "Final snapshot failed"),
		}
		true
	}

	/// True while the timers are running.
	#[must_use]
	pub fn is_running(&self) -> bool {
		self.timers.lock().is_some()
	}

	/// Absorb text into the graph.
	pub fn learn(&self, text: &str, context: Option<&LearnContext>) {
		self.shared.memory.lock().learn(text, context);
	}

	/// The `top_k` concepts most similar to `query`, best first.
	#[must_use]
	pub fn semantic_search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
		self.shared.memory.lock().semantic_search(query, top_k)
	}

	/// Walk associations from `seed` for at most `length` steps.
	///
	/// # Errors
	///
	/// Returns [`MemoryError::SeedNotFound`] for an unknown seed.
	pub fn generate(&self, seed: &str, length: usize) -> Result<String, MemoryError> {
		self.shared.memory.lock().generate(seed, length)
	}

	/// Snapshot of every concept, in first-seen order.
	#[must_use]
	pub fn nodes(&self) -> Vec<ConceptNode> {
		self.shared.memory.lock().nodes().to_vec()
	}

	/// Snapshot of a single concept.
	#[must_use]
	pub fn node(&self, id: &str) -> Option<ConceptNode> {
		self.shared.memory.lock().node(id).cloned()
	}

	/// Summary counts for status displays.
	#[must_use]
	pub fn stats(&self) -> MemoryStats {
		self.shared.memory.lock().stats()
	}

	/// Apply one physics tick now, independent of the timers.
	pub fn tick(&self) {
		self.shared.memory.lock().tick();
	}

	/// Write a snapshot now.
	///
	/// # Errors
	///
	/// Returns an error if encoding or the store write fails.
	pub fn save(&self) -> Result<usize, PersistenceError> {
		self.shared.save()
	}

	/// Forget the whole graph, in memory and in the store.
	///
	/// # Errors
	///
	/// Returns an error if the store rejects a removal; the in-memory graph
	/// is cleared regardless.
	pub fn wipe(&self) -> Result<(), PersistenceError> {
		self.shared.wipe()?;
		info!("Memory graph wiped");
		Ok(())
	}
}

impl<S: KeyValueStore + 'static> Drop for MemoryEngine<S> {
	fn drop(&mut self) {
		if let Some(timers) = self.timers.get_mut().take() {
			timers.abort();
		}
	}
}

async fn physics_loop<S: KeyValueStore + 'static>(shared: Arc<Shared<S>>, period: Duration) {
	let mut interval = interval_at(Instant::now() + period, period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
	loop {
		let _ = interval.tick().await;
		// All-pairs forces; keep them off the runtime's worker threads.
		let shared = Arc::clone(&shared);
		if let Err(e) = tokio::task::spawn_blocking(move || shared.memory.lock().tick()).await {
			warn!(error = %e, "Physics tick failed");
		}
	}
}

async fn snapshot_loop<S: KeyValueStore + 'static>(shared: Arc<Shared<S>>, period: Duration) {
	let mut interval = interval_at(Instant::now() + period, period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
	loop {
		let _ = interval.tick().await;
		match shared.save() {
			Ok(nodes) => debug!(nodes, "Periodic snapshot written"),
			Err(e) => warn!(error = %e, transient = e.is_transient(), "Periodic snapshot failed"),
		}
	}
}
