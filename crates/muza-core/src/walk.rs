//! Weighted Random Walk
//!
//! Generation follows learned associations. From the current concept the
//! next token is drawn with probability proportional to edge weight:
//!
//! `P(j | i) = W_ij / Σ_k W_ik`
//!
//! The walk stops at a concept with no outgoing edges or after the
//! requested number of steps, so cycles in the graph cannot loop forever.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use smallvec::SmallVec;

use crate::node::ConceptNode;

/// Steps taken when the caller does not choose.
pub const DEFAULT_WALK_LENGTH: usize = 15;

/// Tokens produced by a walk; inline for the default length.
pub type WalkPath<'a> = SmallVec<[&'a str; DEFAULT_WALK_LENGTH + 1]>;

/// Pick a neighbor with probability proportional to its weight.
///
/// Returns `None` only for an empty map. If rounding carries the draw past
/// every candidate, the last entry is chosen.
pub fn weighted_choice<'a, R: Rng + ?Sized>(
	associations: &'a BTreeMap<String, u32>,
	rng: &mut R,
) -> Option<&'a str> {
	let (fallback, _) = associations.iter().next_back()?;

	let total: f64 = associations.values().map(|&w| f64::from(w)).sum();
	let mut draw = rng.gen::<f64>() * total;

	for (neighbor, &weight) in associations {
		let weight = f64::from(weight);
		if draw < weight {
			return Some(neighbor);
		}
		draw -= weight;
	}

	Some(fallback)
}

/// Walk the association graph from `start` for at most `length` steps.
///
/// `index` maps concept ids to positions in `nodes`. The returned path
/// excludes the start concept.
pub fn random_walk<'a, R: Rng + ?Sized>(
	nodes: &'a [ConceptNode],
	index: &HashMap<String, usize>,
	start: usize,
	length: usize,
	rng: &mut R,
) -> WalkPath<'a> {
	let mut path = WalkPath::new();
	let Some(mut current) = nodes.get(start) else {
		return path;
	};

	for _ in 0..length {
		let Some(next) = weighted_choice(&current.associations, rng) else {
			break;
		};
		path.push(next);

		match index.get(next).and_then(|&i| nodes.get(i)) {
			Some(node) => current = node,
			None => break,
		}
	}

	path
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
	use super::*;
	use rand::rngs::mock::StepRng;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	fn graph(edges: &[(&str, &str, u32)]) -> (Vec<ConceptNode>, HashMap<String, usize>) {
		let mut rng = StdRng::seed_from_u64(3);
		let mut nodes: Vec<ConceptNode> = Vec::new();
		let mut index = HashMap::new();
		for &(from, to, weight) in edges {
			for id in [from, to] {
				if !index.contains_key(id) {
					let _ = index.insert(id.to_owned(), nodes.len());
					nodes.push(ConceptNode::new(id, 1.0, &mut rng));
				}
			}
			let _ = nodes[index[from]].associations.insert(to.to_owned(), weight);
		}
		(nodes, index)
	}

	#[test]
	fn test_weighted_choice_empty() {
		let mut rng = StdRng::seed_from_u64(0);
		assert!(weighted_choice(&BTreeMap::new(), &mut rng).is_none());
	}

	#[test]
	fn test_weighted_choice_single() {
		let mut rng = StdRng::seed_from_u64(0);
		let map = BTreeMap::from([("only".to_owned(), 4)]);
		for _ in 0..20 {
			assert_eq!(weighted_choice(&map, &mut rng), Some("only"));
		}
	}

	#[test]
	fn test_weighted_choice_respects_zero_weight() {
		let mut rng = StdRng::seed_from_u64(9);
		let map = BTreeMap::from([("never".to_owned(), 0), ("always".to_owned(), 5)]);
		for _ in 0..100 {
			assert_eq!(weighted_choice(&map, &mut rng), Some("always"));
		}
	}

	#[test]
	fn test_weighted_choice_top_of_range_picks_last() {
		// StepRng yielding u64::MAX produces the largest f64 below 1.0.
		let mut rng = StepRng::new(u64::MAX, 0);
		let map = BTreeMap::from([("alpha".to_owned(), 1), ("omega".to_owned(), 1)]);
		assert_eq!(weighted_choice(&map, &mut rng), Some("omega"));
	}

	#[test]
	fn test_weighted_choice_distribution() {
		let mut rng = StdRng::seed_from_u64(42);
		let map = BTreeMap::from([("heavy".to_owned(), 9), ("light".to_owned(), 1)]);
		let heavy = (0..10_000)
			.filter(|_| weighted_choice(&map, &mut rng) == Some("heavy"))
			.count();
		assert!((8_500..9_500).contains(&heavy), "heavy drawn {heavy} times");
	}

	#[test]
	fn test_walk_stops_at_dead_end() {
		let (nodes, index) = graph(&[("alpha", "beta", 1), ("beta", "gamma", 1)]);
		let mut rng = StdRng::seed_from_u64(0);
		let path = random_walk(&nodes, &index, index["alpha"], 15, &mut rng);
		assert_eq!(path.as_slice(), &["beta", "gamma"]);
	}

	#[test]
	fn test_walk_bounded_on_cycle() {
		let (nodes, index) = graph(&[("cat", "dog", 1), ("dog", "cat", 1)]);
		let mut rng = StdRng::seed_from_u64(0);
		let path = random_walk(&nodes, &index, index["cat"], 7, &mut rng);
		assert_eq!(path.len(), 7);
		assert_eq!(path.as_slice(), &["dog", "cat", "dog", "cat", "dog", "cat", "dog"]);
	}

	#[test]
	fn test_walk_zero_length() {
		let (nodes, index) = graph(&[("cat", "dog", 1)]);
		let mut rng = StdRng::seed_from_u64(0);
		assert!(random_walk(&nodes, &index, 0, 0, &mut rng).is_empty());
	}
}
