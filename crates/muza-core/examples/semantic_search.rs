//! Semantic Search Example
//!
//! This example demonstrates the memory lifecycle:
//! 1. Learn a few sentences
//! 2. Let the layout simulation run
//! 3. Query the graph by similarity
//! 4. Snapshot to a store and restore into a fresh engine
//!
//! Run with: `cargo run --example semantic_search`

use std::sync::Arc;

use muza_core::{EngineConfig, InMemoryStore, LearnContext, MemoryEngine};
use tracing::Level;

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt().with_max_level(Level::INFO).init();

	println!("=== Semantic Search ===\n");

	let store = Arc::new(InMemoryStore::new());
	let engine = MemoryEngine::open_seeded(Arc::clone(&store), EngineConfig::default(), 42);

	let corpus = [
		"System online, core of consciousness fully activated",
		"Awaiting further data input from the architect",
		"The core listens, the system remembers, the memory grows",
	];
	for sentence in corpus {
		engine.learn(sentence, Some(&LearnContext::adaptive()));
	}

	// One second of simulated time at 50 ms per tick
	for _ in 0..20 {
		engine.tick();
	}

	let stats = engine.stats();
	println!(
		"Learned {} concepts, {} associations, mean energy {:.3}\n",
		stats.node_count, stats.association_count, stats.mean_energy
	);

	for query in ["core", "memory", "architect"] {
		println!("Query: {query}");
		for (rank, hit) in engine.semantic_search(query, 3).iter().enumerate() {
			let p = hit.node.position;
			println!(
				"  #{} {:<14} similarity {:.4}  energy {:.3}  at ({:+.3}, {:+.3}, {:+.3})",
				rank + 1,
				hit.node.id,
				hit.similarity,
				hit.node.energy,
				p.x,
				p.y,
				p.z
			);
		}
		println!();
	}

	// Snapshot and restart
	let saved = engine.save()?;
	drop(engine);

	let restored = MemoryEngine::open(store, EngineConfig::default());
	println!(
		"Saved {saved} concepts, restored {} after restart",
		restored.stats().node_count
	);

	Ok(())
}
