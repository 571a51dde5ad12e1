//! Key-value storage backends.
//!
//! The memory graph persists as a single string under a fixed key. Any
//! backend that can get, set and remove strings by key will do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::StoreError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Abstract string key-value store.
pub trait KeyValueStore: Send + Sync {
	/// Read the value under `key`, `None` if absent.
	///
	/// # Errors
	///
	/// Returns an error if the backend cannot be read.
	fn get(&self, key: &str) -> StoreResult<Option<String>>;

	/// Write `value` under `key`, replacing any previous value.
	///
	/// # Errors
	///
	/// Returns an error if the backend rejects the write.
	fn set(&self, key: &str, value: &str) -> StoreResult<()>;

	/// Delete `key`. Removing an absent key is not an error.
	///
	/// # Errors
	///
	/// Returns an error if the backend rejects the removal.
	fn remove(&self, key: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
	fn get(&self, key: &str) -> StoreResult<Option<String>> {
		(**self).get(key)
	}

	fn set(&self, key: &str, value: &str) -> StoreResult<()> {
		(**self).set(key, value)
	}

	fn remove(&self, key: &str) -> StoreResult<()> {
		(**self).remove(key)
	}
}

// ============================================================================
// In-memory store
// ============================================================================

/// Volatile store for tests and embedding hosts.
///
/// Writes can be made to fail on demand to exercise save-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryStore {
	entries: Mutex<HashMap<String, String>>,
	fail_writes: AtomicBool,
}

impl InMemoryStore {
	/// Create an empty store.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Make every subsequent `set`/`remove` fail (or succeed again).
	pub fn set_fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	/// Number of keys held.
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// True when no keys are held.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	fn check_writable(&self, key: &str) -> StoreResult<()> {
		if self.fail_writes.load(Ordering::SeqCst) {
			return Err(StoreError::Write {
				key: key.to_owned(),
				message: "quota exceeded".to_owned(),
			});
		}
		Ok(())
	}
}

impl KeyValueStore for InMemoryStore {
	fn get(&self, key: &str) -> StoreResult<Option<String>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> StoreResult<()> {
		self.check_writable(key)?;
		let _ = self.entries.lock().insert(key.to_owned(), value.to_owned());
		Ok(())
	}

	fn remove(&self, key: &str) -> StoreResult<()> {
		self.check_writable(key)?;
		let _ = self.entries.lock().remove(key);
		Ok(())
	}
}

// ============================================================================
// File store
// ============================================================================

#[cfg(feature = "file-store")]
pub use file::{default_data_dir, FileStore};

#[cfg(feature = "file-store")]
mod file {
	use std::fs;
	use std::io::ErrorKind;
	use std::path::{Path, PathBuf};

	use super::{KeyValueStore, StoreResult};
	use crate::error::StoreError;

	/// Default data directory: `~/.muza`
	#[must_use]
	pub fn default_data_dir() -> PathBuf {
		dirs::home_dir()
			.unwrap_or_else(|| PathBuf::from("."))
			.join(".muza")
	}

	/// Durable store keeping one file per key in a directory.
	///
	/// Writes go to a temporary sibling first and are renamed into place, so a
	/// crash mid-write leaves the previous value intact.
	#[derive(Debug, Clone)]
	pub struct FileStore {
		dir: PathBuf,
	}

	impl FileStore {
		/// Open (creating if needed) a store rooted at `dir`.
		///
		/// # Errors
		///
		/// Returns an error if the directory cannot be created.
		pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
			let dir = dir.into();
			fs::create_dir_all(&dir)?;
			Ok(Self { dir })
		}

		/// Open the store at [`default_data_dir`].
		///
		/// # Errors
		///
		/// Returns an error if the directory cannot be created.
		pub fn open_default() -> StoreResult<Self> {
			Self::open(default_data_dir())
		}

		/// Directory holding the key files.
		#[must_use]
		pub fn dir(&self) -> &Path {
			&self.dir
		}

		fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
			let valid = !key.is_empty()
				&& key
					.chars()
					.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
				&& !key.starts_with('.');
			if !valid {
				return Err(StoreError::InvalidKey(key.to_owned()));
			}
			Ok(self.dir.join(format!("{key}.json")))
		}
	}

	impl KeyValueStore for FileStore {
		fn get(&self, key: &str) -> StoreResult<Option<String>> {
			let path = self.path_for(key)?;
			match fs::read_to_string(&path) {
				Ok(value) => Ok(Some(value)),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
				Err(e) => Err(StoreError::Read {
					key: key.to_owned(),
					message: e.to_string(),
				}),
			}
		}

		fn set(&self, key: &str, value: &str) -> StoreResult<()> {
			let path = self.path_for(key)?;
			let tmp = path.with_extension("json.tmp");
			let write_err = |e: std::io::Error| StoreError::Write {
				key: key.to_owned(),
				message: e.to_string(),
			};
			fs::write(&tmp, value).map_err(write_err)?;
			fs::rename(&tmp, &path).map_err(write_err)
		}

		fn remove(&self, key: &str) -> StoreResult<()> {
			let path = self.path_for(key)?;
			match fs::remove_file(&path) {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
				Err(e) => Err(StoreError::Write {
					key: key.to_owned(),
					message: e.to_string(),
				}),
			}
		}
	}
}
