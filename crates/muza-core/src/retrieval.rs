//! Semantic Search
//!
//! Nearest-neighbour retrieval over concept embeddings:
//!
//! 1. Embed the query
//! 2. Compute cosine similarity against every concept (batch)
//! 3. Stable sort descending, keep the top `k`

use serde::{Deserialize, Serialize};

use crate::activation::cosine_similarity_batch;
use crate::embedding::embed;
use crate::node::ConceptNode;

/// Number of results returned when the caller does not choose.
pub const DEFAULT_TOP_K: usize = 5;

/// A concept matched by a query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
	/// Snapshot of the matched concept
	pub node: ConceptNode,
	/// Cosine similarity between the query and the concept
	pub similarity: f64,
}

/// Rank indices by similarity, returning the top `k`.
///
/// Equal scores keep their original relative order.
#[must_use]
pub fn rank_by_similarity(similarities: &[f64], top_k: usize) -> Vec<usize> {
	let mut indexed: Vec<(usize, f64)> = similarities.iter().copied().enumerate().collect();

	indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

	indexed.into_iter().take(top_k).map(|(i, _)| i).collect()
}

/// Find the `top_k` concepts most similar to `query`.
///
/// Returns an empty list for an empty graph or `top_k == 0`; a `top_k`
/// larger than the graph returns every concept, ranked.
#[must_use]
pub fn semantic_search(nodes: &[ConceptNode], query: &str, top_k: usize) -> Vec<SearchHit> {
	if nodes.is_empty() || top_k == 0 {
		return Vec::new();
	}

	let probe = embed(query);
	let similarities = cosine_similarity_batch(&probe, nodes.iter().map(|n| n.embedding.as_slice()));

	rank_by_similarity(&similarities, top_k)
		.into_iter()
		.map(|i| SearchHit {
			node: nodes[i].clone(),
			similarity: similarities[i],
		})
		.collect()
}
