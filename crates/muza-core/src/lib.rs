//! # Muza Core
//!
//! A self-organizing associative memory: every learned token becomes a
//! concept node that lives in two spaces at once.
//!
//! - A **semantic space**, where each concept has a deterministic 32-dimensional
//!   embedding derived from its text. Similarity here drives retrieval.
//! - A **simulation space**, where each concept has a 3D position and velocity.
//!   A force-directed layout pulls similar concepts together and pushes
//!   everything else apart, so clusters emerge over time.
//!
//! Concepts also carry **energy** (how recently and often they resonated) and
//! weighted **associations** to the tokens that followed them in learned text.
//!
//! ## Core Operations
//!
//! 1. **Learn** - tokenize text, create or resonate concepts, strengthen the
//!    edge between each adjacent pair
//! 2. **Tick** - one step of the layout simulation plus energy decay
//! 3. **Search** - rank concepts by cosine similarity to a query
//! 4. **Generate** - weighted random walk over associations from a seed
//!
//! ```text
//! S(a, b)  = a·b / (‖a‖‖b‖)
//! F_attr   = d · S · k_a          (S > threshold)
//! F_rep    = -(d/r) · k_r / r²
//! P(j | i) = W_ij / Σ_k W_ik
//! ```
//!
//! ## Example
//!
//! ```rust
//! use muza_core::{AssociativeMemory, MemoryConfig};
//!
//! let mut memory = AssociativeMemory::with_seed(MemoryConfig::default(), 42);
//! memory.learn("System online, core of consciousness", None);
//!
//! for _ in 0..10 {
//!     memory.tick();
//! }
//!
//! let hits = memory.semantic_search("core", 3);
//! assert_eq!(hits[0].node.id, "core");
//!
//! let sentence = memory.generate("system", 15).unwrap();
//! assert_eq!(sentence, "system online core consciousness");
//! ```
//!
//! ## Hosting
//!
//! [`MemoryEngine`] wraps the graph for long-running hosts: it restores the
//! graph from a [`KeyValueStore`] on open, runs the physics and snapshot
//! timers on a tokio runtime between [`MemoryEngine::start`] and
//! [`MemoryEngine::stop`], and serializes all access behind one lock.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::needless_return)]

pub mod activation;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod memory;
pub mod node;
pub mod persistence;
pub mod physics;
pub mod retrieval;
pub mod store;
pub mod tokenize;
pub mod walk;

pub use activation::{cosine_similarity, cosine_similarity_batch, EnergyConfig};
pub use embedding::{embed, string_hash, Embedding, EMBEDDING_DIM};
pub use engine::{EngineConfig, MemoryEngine, SchedulerConfig};
pub use error::{EngineError, MemoryError, PersistenceError, StoreError};
pub use memory::{AssociativeMemory, LearnContext, MemoryConfig, MemoryStats};
pub use node::{ConceptNode, Vec3};
pub use persistence::PersistenceConfig;
pub use physics::PhysicsConfig;
pub use retrieval::{SearchHit, DEFAULT_TOP_K};
pub use store::{InMemoryStore, KeyValueStore};
pub use tokenize::tokenize;
pub use walk::DEFAULT_WALK_LENGTH;

#[cfg(feature = "file-store")]
pub use store::{default_data_dir, FileStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;

	#[test]
	fn test_learn_search_generate() {
		let mut memory = AssociativeMemory::with_seed(MemoryConfig::default(), 42);
		memory.learn("System online, core of consciousness", None);
		for _ in 0..10 {
			memory.tick();
		}

		assert_eq!(memory.len(), 4);
		assert_eq!(memory.semantic_search("core", 3)[0].node.id, "core");
		assert_eq!(
			memory.generate("system", 15).unwrap(),
			"system online core consciousness"
		);
	}
}
