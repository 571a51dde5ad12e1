//! Deterministic pseudo-embeddings.
//!
//! Every token is mapped to a fixed 32-dimensional unit vector without any
//! trained model: the token is hashed to a 32-bit integer and each dimension
//! is a phase-shifted sine of that hash.
//!
//! ```text
//! h    = hash(token)                  (31·h + c, wrapping, over UTF-16 units)
//! v[i] = sin(h + 1.1·i)               for i in 0..32
//! e    = v / ‖v‖
//! ```
//!
//! The same token always yields the same vector, so a graph rebuilt from
//! persisted ids embeds identically across restarts.

/// Number of dimensions in every embedding.
pub const EMBEDDING_DIM: usize = 32;

/// Phase step between consecutive dimensions.
const PHASE_STEP: f64 = 1.1;

/// A fixed-length embedding vector.
pub type Embedding = [f64; EMBEDDING_DIM];

/// Polynomial rolling hash with 32-bit wraparound.
///
/// Iterates UTF-16 code units so that tokens hash identically to the
/// browser-side representation the graph was first persisted from.
#[must_use]
pub fn string_hash(text: &str) -> i32 {
	text.encode_utf16().fold(0i32, |hash, unit| {
		hash.wrapping_shl(5)
			.wrapping_sub(hash)
			.wrapping_add(i32::from(unit))
	})
}

/// Scale a vector to unit length in place.
///
/// A zero vector is left untouched.
pub fn normalize(vector: &mut [f64]) {
	let magnitude = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
	if magnitude == 0.0 {
		return;
	}
	for v in vector.iter_mut() {
		*v /= magnitude;
	}
}

/// Embed a token (or any text) into the semantic space.
// Two roundings (not a fused multiply-add) keep vectors bit-identical to persisted ones.
#[allow(clippy::suboptimal_flops)]
#[must_use]
pub fn embed(text: &str) -> Embedding {
	let hash = f64::from(string_hash(text));
	let mut vector = [0.0; EMBEDDING_DIM];
	for (i, slot) in (0u32..).zip(vector.iter_mut()) {
		*slot = (hash + f64::from(i) * PHASE_STEP).sin();
	}
	normalize(&mut vector);
	vector
}
