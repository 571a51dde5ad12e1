//! Similarity and Energy
//!
//! Two quantities drive the memory graph:
//! 1. **Cosine similarity** between embeddings: `S(a, b) = a·b / (‖a‖‖b‖)`
//! 2. **Energy** per concept: rises when a concept resonates (is re-learned),
//!    decays a little every physics tick, and always stays within `[0, max]`.

use serde::{Deserialize, Serialize};

/// Configuration for concept energy.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
	/// Energy of a freshly created concept
	pub initial: f64,
	/// Increment applied each time a concept is encountered
	pub resonance: f64,
	/// Upper bound on energy
	pub max: f64,
	/// Amount drained per physics tick
	pub decay_per_tick: f64,
	/// Boost applied to concepts resonating with a whole input (adaptive memory)
	pub adaptive_boost: f64,
	/// Similarity above which adaptive memory boosts a concept
	pub adaptive_threshold: f64,
}

impl Default for EnergyConfig {
	fn default() -> Self {
		Self {
			initial: 1.0,
			resonance: 0.5,
			max: 4.0,
			decay_per_tick: 0.0005,
			adaptive_boost: 0.2,
			adaptive_threshold: 0.8,
		}
	}
}

// ============================================================================
// Vector Similarity
// ============================================================================

/// Compute cosine similarity between two vectors.
///
/// # Returns
///
/// Cosine similarity in range [-1, 1], or 0 if either vector has zero norm
/// or the lengths differ.
#[inline]
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
	if a.len() != b.len() {
		return 0.0;
	}

	let (dot_product, norm_a, norm_b) = a
		.iter()
		.zip(b.iter())
		.fold((0.0, 0.0, 0.0), |(dot, na, nb), (&ai, &bi)| {
			(ai.mul_add(bi, dot), ai.mul_add(ai, na), bi.mul_add(bi, nb))
		});

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}
	dot_product / (norm_a.sqrt() * norm_b.sqrt())
}

/// Batch compute cosine similarity of a probe against many vectors.
///
/// Pre-computes the probe norm once.
#[must_use]
pub fn cosine_similarity_batch<'a, I>(probe: &[f64], traces: I) -> Vec<f64>
where
	I: IntoIterator<Item = &'a [f64]>,
{
	let probe_norm: f64 = probe.iter().map(|x| x * x).sum::<f64>().sqrt();

	traces
		.into_iter()
		.map(|trace| {
			if probe_norm == 0.0 || trace.len() != probe.len() {
				return 0.0;
			}

			let (dot_product, trace_norm_sq) = probe
				.iter()
				.zip(trace.iter())
				.fold((0.0, 0.0), |(dot, tn), (&pi, &ti)| {
					(pi.mul_add(ti, dot), ti.mul_add(ti, tn))
				});

			if trace_norm_sq == 0.0 {
				0.0
			} else {
				dot_product / (probe_norm * trace_norm_sq.sqrt())
			}
		})
		.collect()
}

// ============================================================================
// Energy
// ============================================================================

/// Clamp an energy value into `[0, max]`.
///
/// NaN input collapses to 0. A negative or NaN `max` acts as 0.
#[inline]
#[must_use]
pub fn clamp_energy(energy: f64, config: &EnergyConfig) -> f64 {
	if energy.is_nan() {
		return 0.0;
	}
	// f64::max ignores NaN
	let ceiling = config.max.max(0.0);
	energy.max(0.0).min(ceiling)
}

/// Energy after a concept resonates with new input.
#[inline]
#[must_use]
pub fn resonate(energy: f64, amount: f64, config: &EnergyConfig) -> f64 {
	clamp_energy(energy + amount, config)
}

/// Energy after one physics tick of decay.
#[inline]
#[must_use]
pub fn decay(energy: f64, config: &EnergyConfig) -> f64 {
	clamp_energy(energy - config.decay_per_tick, config)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
	use super::*;
	use crate::embedding::embed;

	#[test]
	fn test_cosine_identical() {
		let v = [0.3, 0.4, 0.5];
		assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
	}

	#[test]
	fn test_cosine_orthogonal() {
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
	}

	#[test]
	fn test_cosine_zero_norm() {
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
	}

	#[test]
	fn test_cosine_length_mismatch() {
		assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
	}

	#[test]
	fn test_cosine_symmetric_on_embeddings() {
		let tokens = ["system", "online", "ядро", "сознания", "memory"];
		for a in tokens {
			for b in tokens {
				let (ea, eb) = (embed(a), embed(b));
				assert_eq!(cosine_similarity(&ea, &eb), cosine_similarity(&eb, &ea));
			}
		}
	}

	#[test]
	fn test_batch_matches_single() {
		let probe = embed("probe");
		let traces = [embed("one"), embed("two"), embed("three")];
		let batch = cosine_similarity_batch(&probe, traces.iter().map(|t| t.as_slice()));
		for (trace, sim) in traces.iter().zip(&batch) {
			assert!((cosine_similarity(&probe, trace) - sim).abs() < 1e-12);
		}
	}

	#[test]
	fn test_batch_zero_probe() {
		let traces = [[1.0, 0.0], [0.0, 1.0]];
		let sims = cosine_similarity_batch(&[0.0, 0.0], traces.iter().map(|t| t.as_slice()));
		assert_eq!(sims, vec![0.0, 0.0]);
	}

	#[test]
	fn test_resonate_clamps_at_ceiling() {
		let config = EnergyConfig::default();
		let mut energy = config.initial;
		for _ in 0..100 {
			energy = resonate(energy, config.resonance, &config);
		}
		assert_eq!(energy, config.max);
	}

	#[test]
	fn test_decay_floors_at_zero() {
		let config = EnergyConfig::default();
		let mut energy = 0.001;
		for _ in 0..10 {
			energy = decay(energy, &config);
		}
		assert_eq!(energy, 0.0);
	}

	#[test]
	fn test_clamp_nan() {
		let config = EnergyConfig::default();
		assert_eq!(clamp_energy(f64::NAN, &config), 0.0);
	}

	#[test]
	fn test_clamp_with_invalid_ceiling() {
		for max in [-1.0, f64::NAN] {
			let config = EnergyConfig {
				max,
				..Default::default()
			};
			assert_eq!(clamp_energy(2.5, &config), 0.0);
			assert_eq!(resonate(1.0, 0.5, &config), 0.0);
			assert_eq!(decay(1.0, &config), 0.0);
		}

		let unbounded = EnergyConfig {
			max: f64::INFINITY,
			..Default::default()
		};
		assert_eq!(clamp_energy(1e9, &unbounded), 1e9);
	}
}
