//! Concept nodes of the memory graph.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::embedding::{embed, Embedding};

/// A point or direction in the 3D simulation space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
	/// X component
	pub x: f64,
	/// Y component
	pub y: f64,
	/// Z component
	pub z: f64,
}

impl Vec3 {
	/// The origin.
	pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

	/// Create a vector from components.
	#[must_use]
	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	/// Uniformly random point in the cube `[-1, 1]^3`.
	pub fn random_unit_cube<R: Rng + ?Sized>(rng: &mut R) -> Self {
		Self::new(
			rng.gen_range(-1.0..=1.0),
			rng.gen_range(-1.0..=1.0),
			rng.gen_range(-1.0..=1.0),
		)
	}

	/// Euclidean length.
	#[must_use]
	pub fn length(self) -> f64 {
		self.dot(self).sqrt()
	}

	/// Dot product.
	#[must_use]
	pub fn dot(self, other: Self) -> f64 {
		self.z.mul_add(other.z, self.x.mul_add(other.x, self.y * other.y))
	}

	/// True when every component is finite.
	#[must_use]
	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
	}
}

impl Add for Vec3 {
	type Output = Self;

	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl AddAssign for Vec3 {
	fn add_assign(&mut self, rhs: Self) {
		*self = *self + rhs;
	}
}

impl Sub for Vec3 {
	type Output = Self;

	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl Mul<f64> for Vec3 {
	type Output = Self;

	fn mul(self, rhs: f64) -> Self {
		Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

impl MulAssign<f64> for Vec3 {
	fn mul_assign(&mut self, rhs: f64) {
		*self = *self * rhs;
	}
}

/// One learned concept: a token, its embedding, its place in the simulation
/// and its outgoing associations.
///
/// Values handed out by the memory are snapshots; mutating them has no effect
/// on the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
	/// The normalized token; unique within a graph
	pub id: String,
	/// Unit-norm embedding derived from `id`, fixed at creation
	pub embedding: Embedding,
	/// Position in simulation space
	#[serde(alias = "vector")]
	pub position: Vec3,
	/// Velocity in simulation space; absent in older snapshots
	#[serde(default)]
	pub velocity: Vec3,
	/// Current energy, within `[0, max]`
	pub energy: f64,
	/// Co-occurrence counts: neighbor id → number of times it followed this token
	#[serde(with = "association_pairs")]
	pub associations: BTreeMap<String, u32>,
}

impl ConceptNode {
	/// Create a fresh concept at a random position with zero velocity.
	pub fn new<R: Rng + ?Sized>(id: impl Into<String>, energy: f64, rng: &mut R) -> Self {
		let id = id.into();
		Self {
			embedding: embed(&id),
			position: Vec3::random_unit_cube(rng),
			velocity: Vec3::ZERO,
			energy,
			associations: BTreeMap::new(),
			id,
		}
	}

	/// Strengthen the edge to `neighbor` by one co-occurrence.
	pub fn reinforce(&mut self, neighbor: &str) {
		if let Some(weight) = self.associations.get_mut(neighbor) {
			*weight = weight.saturating_add(1);
		} else {
			let _ = self.associations.insert(neighbor.to_owned(), 1);
		}
	}

	/// Weight of the edge to `neighbor`, zero if absent.
	#[must_use]
	pub fn association(&self, neighbor: &str) -> u32 {
		self.associations.get(neighbor).copied().unwrap_or(0)
	}

	/// Sum of all outgoing edge weights.
	#[must_use]
	pub fn total_weight(&self) -> u64 {
		self.associations.values().map(|&w| u64::from(w)).sum()
	}
}

/// Associations persist as an explicit list of `[neighbor, weight]` pairs.
mod association_pairs {
	use std::collections::BTreeMap;

	use serde::{Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S: Serializer>(
		map: &BTreeMap<String, u32>,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		let pairs: Vec<(&String, &u32)> = map.iter().collect();
		pairs.serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<BTreeMap<String, u32>, D::Error> {
		let pairs = Vec::<(String, u32)>::deserialize(deserializer)?;
		let mut map = BTreeMap::new();
		for (neighbor, weight) in pairs {
			let entry = map.entry(neighbor).or_insert(0u32);
			*entry = entry.saturating_add(weight);
		}
		Ok(map)
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	#[test]
	fn test_new_node_defaults() {
		let mut rng = StdRng::seed_from_u64(7);
		let node = ConceptNode::new("memory", 1.0, &mut rng);
		assert_eq!(node.id, "memory");
		assert_eq!(node.embedding, embed("memory"));
		assert_eq!(node.velocity, Vec3::ZERO);
		assert_eq!(node.energy, 1.0);
		assert!(node.associations.is_empty());
		for c in [node.position.x, node.position.y, node.position.z] {
			assert!((-1.0..=1.0).contains(&c));
		}
	}

	#[test]
	fn test_reinforce_counts() {
		let mut rng = StdRng::seed_from_u64(7);
		let mut node = ConceptNode::new("cat", 1.0, &mut rng);
		node.reinforce("dog");
		node.reinforce("dog");
		node.reinforce("fish");
		assert_eq!(node.association("dog"), 2);
		assert_eq!(node.association("fish"), 1);
		assert_eq!(node.association("bird"), 0);
		assert_eq!(node.total_weight(), 3);
	}

	#[test]
	fn test_associations_serialize_as_pairs() {
		let mut rng = StdRng::seed_from_u64(7);
		let mut node = ConceptNode::new("cat", 1.0, &mut rng);
		node.reinforce("dog");
		let json = serde_json::to_value(&node).unwrap();
		assert_eq!(json["associations"], serde_json::json!([["dog", 1]]));
		assert!(json["position"].is_object());
	}

	#[test]
	fn test_accepts_legacy_vector_field() {
		let embedding = serde_json::to_value(embed("cat")).unwrap();
		let raw = serde_json::json!({
			"id": "cat",
			"embedding": embedding,
			"vector": {"x": 0.1, "y": 0.2, "z": 0.3},
			"energy": 2.0,
			"associations": [["dog", 3]],
		});
		let node: ConceptNode = serde_json::from_value(raw).unwrap();
		assert_eq!(node.position, Vec3::new(0.1, 0.2, 0.3));
		assert_eq!(node.velocity, Vec3::ZERO);
		assert_eq!(node.association("dog"), 3);
	}

	#[test]
	fn test_vec3_ops() {
		let a = Vec3::new(1.0, 2.0, 2.0);
		assert_eq!(a.length(), 3.0);
		assert_eq!(a - a, Vec3::ZERO);
		assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 4.0));
		let mut b = a;
		b += a;
		b *= 0.5;
		assert_eq!(b, a);
	}
}
