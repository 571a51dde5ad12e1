//! Error types for memory, storage and scheduling.

/// Errors returned by memory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
	/// `generate` was seeded with a token the memory has never learned.
	#[error("Seed not found in memory: {seed}")]
	SeedNotFound {
		/// The seed as given by the caller
		seed: String,
	},
}

impl MemoryError {
	/// Short message for end users, without the offending input.
	#[must_use]
	pub const fn summary(&self) -> &'static str {
		match self {
			Self::SeedNotFound { .. } => "Seed not found in memory.",
		}
	}
}

/// Errors from a key-value store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// Reading a key failed.
	#[error("read failed for {key}: {message}")]
	Read {
		/// Key being read
		key: String,
		/// Backend message
		message: String,
	},

	/// Writing or removing a key failed (quota exceeded, unavailable).
	#[error("write failed for {key}: {message}")]
	Write {
		/// Key being written
		key: String,
		/// Backend message
		message: String,
	},

	/// Key contains characters the backend cannot store.
	#[error("invalid storage key: {0}")]
	InvalidKey(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

/// Errors while snapshotting or restoring the memory graph.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
	/// The backing store failed.
	#[error(transparent)]
	Store(#[from] StoreError),

	/// Stored data exists but could not be parsed.
	#[error("corrupt snapshot under {key}: {source}")]
	Corrupt {
		/// Key holding the corrupt data
		key: String,
		/// Parse failure
		#[source]
		source: serde_json::Error,
	},

	/// The graph could not be serialized.
	#[error("failed to encode snapshot: {0}")]
	Encode(#[source] serde_json::Error),
}

impl PersistenceError {
	/// True for failures the next scheduled save may not hit again.
	#[must_use]
	pub const fn is_transient(&self) -> bool {
		matches!(self, Self::Store(StoreError::Write { .. } | StoreError::Io(_)))
	}
}

/// Errors from the engine's scheduler.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	/// `start` was called outside a tokio runtime.
	#[error("no async runtime available: {0}")]
	NoRuntime(#[from] tokio::runtime::TryCurrentError),

	/// The timers are already running.
	#[error("engine already started")]
	AlreadyStarted,

	/// Configuration could not be parsed.
	#[error("invalid configuration: {0}")]
	Config(#[source] serde_json::Error),

	/// Persistence failed.
	#[error(transparent)]
	Persistence(#[from] PersistenceError),
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;

	#[test]
	fn test_seed_not_found_message() {
		let err = MemoryError::SeedNotFound {
			seed: "ghost".into(),
		};
		assert_eq!(err.to_string(), "Seed not found in memory: ghost");
		assert_eq!(err.summary(), "Seed not found in memory.");
	}

	#[test]
	fn test_is_transient() {
		let write = PersistenceError::Store(StoreError::Write {
			key: "k".into(),
			message: "quota exceeded".into(),
		});
		assert!(write.is_transient());

		let parse = serde_json::from_str::<u32>("nope").unwrap_err();
		let corrupt = PersistenceError::Corrupt {
			key: "k".into(),
			source: parse,
		};
		assert!(!corrupt.is_transient());
	}
}
