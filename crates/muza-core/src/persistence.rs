//! Persistence of the memory graph.
//!
//! The whole graph is written as one JSON document under a fixed key:
//!
//! ```text
//! [ { "id": "...", "embedding": [32 floats],
//!     "position": {x,y,z}, "velocity": {x,y,z},
//!     "energy": f, "associations": [["neighbor", weight], ...] }, ... ]
//! ```
//!
//! Loading fails open: absent data yields an empty graph, corrupt data is
//! logged, discarded from the store and also yields an empty graph.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{PersistenceError, Result};
use crate::memory::AssociativeMemory;
use crate::node::ConceptNode;
use crate::store::KeyValueStore;

/// Storage keys for the graph snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
	/// Key holding the current snapshot
	pub storage_key: String,
	/// Key used by earlier versions, migrated on first load
	pub legacy_key: String,
}

impl Default for PersistenceConfig {
	fn default() -> Self {
		Self {
			storage_key: "muza_logos_brain".to_owned(),
			legacy_key: "muza_logos_v35_final_brain".to_owned(),
		}
	}
}

/// Serialize concepts to the snapshot format.
///
/// # Errors
///
/// Returns [`PersistenceError::Encode`] if serialization fails.
pub fn encode_snapshot(nodes: &[ConceptNode]) -> Result<String> {
	serde_json::to_string(nodes).map_err(PersistenceError::Encode)
}

/// Parse a snapshot back into concepts.
///
/// # Errors
///
/// Returns [`PersistenceError::Corrupt`] if `raw` is not a valid snapshot.
pub fn decode_snapshot(raw: &str, key: &str) -> Result<Vec<ConceptNode>> {
	serde_json::from_str(raw).map_err(|source| PersistenceError::Corrupt {
		key: key.to_owned(),
		source,
	})
}

/// Move a snapshot from the legacy key to the current one.
///
/// Copies only when the current key is empty, then always removes the
/// legacy entry. Idempotent.
///
/// # Returns
///
/// `true` if data was copied.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
#[instrument(skip_all, fields(from = %config.legacy_key, to = %config.storage_key))]
pub fn migrate_legacy<S: KeyValueStore + ?Sized>(
	store: &S,
	config: &PersistenceConfig,
) -> Result<bool> {
	let Some(legacy) = store.get(&config.legacy_key)? else {
		return Ok(false);
	};

	let copied = if store.get(&config.storage_key)?.is_none() {
		info!("Migrating memory graph to current storage key");
		store.set(&config.storage_key, &legacy)?;
		true
	} else {
		false
	};

	store.remove(&config.legacy_key)?;
	Ok(copied)
}

/// Write the current graph under the storage key.
///
/// # Returns
///
/// Number of concepts written.
///
/// # Errors
///
/// Returns an error if encoding or the store write fails.
#[instrument(skip_all, fields(key = %config.storage_key))]
pub fn save<S: KeyValueStore + ?Sized>(
	memory: &AssociativeMemory,
	store: &S,
	config: &PersistenceConfig,
) -> Result<usize> {
	let raw = encode_snapshot(memory.nodes())?;
	store.set(&config.storage_key, &raw)?;
	debug!(nodes = memory.len(), bytes = raw.len(), "Saved memory graph");
	Ok(memory.len())
}

/// Read the persisted concepts, failing open.
///
/// Runs the legacy migration first. Absent data gives an empty list; corrupt
/// data is removed from the store and gives an empty list.
#[instrument(skip_all, fields(key = %config.storage_key))]
pub fn load<S: KeyValueStore + ?Sized>(store: &S, config: &PersistenceConfig) -> Vec<ConceptNode> {
	if let Err(e) = migrate_legacy(store, config) {
		warn!(error = %e, "Failed to migrate memory graph");
	}

	let raw = match store.get(&config.storage_key) {
		Ok(Some(raw)) => raw,
		Ok(None) => {
			debug!("No persisted memory graph");
			return Vec::new();
		}
		Err(e) => {
			warn!(error = %e, "Failed to read memory graph");
			return Vec::new();
		}
	};

	match decode_snapshot(&raw, &config.storage_key) {
		Ok(nodes) => {
			info!(nodes = nodes.len(), "Loaded memory graph");
			nodes
		}
		Err(e) => {
			warn!(error = %e, "Discarding corrupt memory graph");
			if let Err(e) = store.remove(&config.storage_key) {
				warn!(error = %e, "Failed to remove corrupt memory graph");
			}
			Vec::new()
		}
	}
}

/// Remove every persisted trace of the graph, current and legacy.
///
/// # Errors
///
/// Returns an error if the store rejects a removal.
pub fn wipe<S: KeyValueStore + ?Sized>(store: &S, config: &PersistenceConfig) -> Result<()> {
	store.remove(&config.storage_key)?;
	store.remove(&config.legacy_key)?;
	Ok(())
}
