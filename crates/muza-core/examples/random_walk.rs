//! Random Walk Example
//!
//! Demonstrates generation from learned associations:
//! 1. Learn text with repeated phrases so some edges outweigh others
//! 2. Inspect the outgoing weights of a concept
//! 3. Walk from several seeds
//! 4. Handle an unknown seed
//!
//! Run with: `cargo run --example random_walk`

#![allow(clippy::cast_precision_loss)]

use muza_core::{AssociativeMemory, MemoryConfig, MemoryError, DEFAULT_WALK_LENGTH};

fn main() {
	println!("=== Random Walk Generation ===\n");

	let mut memory = AssociativeMemory::with_seed(MemoryConfig::default(), 7);

	memory.learn("the river runs to the sea", None);
	memory.learn("the river sings at night", None);
	memory.learn("the river runs through the stone valley", None);
	memory.learn("the sea remembers the river", None);

	// Outgoing edges of "river"
	if let Some(river) = memory.node("river") {
		println!("Associations of '{}':", river.id);
		let total = river.total_weight();
		for (neighbor, weight) in &river.associations {
			println!(
				"  -> {neighbor:<10} weight {weight}  (p = {:.2})",
				f64::from(*weight) / total as f64
			);
		}
		println!();
	}

	for seed in ["The", "river", "sea"] {
		match memory.generate(seed, DEFAULT_WALK_LENGTH) {
			Ok(sentence) => println!("{seed:>6}: {sentence}"),
			Err(e) => println!("{seed:>6}: {e}"),
		}
	}

	println!();
	match memory.generate("mountain", 5) {
		Ok(sentence) => println!("unexpected: {sentence}"),
		Err(MemoryError::SeedNotFound { seed }) => {
			println!("'{seed}' was never learned; nothing to walk from");
		}
	}
}
