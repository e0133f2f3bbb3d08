// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Mapping from key to the log offset of the most recent `SET` for that key.
///
/// Authoritative only while the process is alive; it is rebuilt from the log on every startup and
/// never persists on its own.
pub trait Index {
	/// Pure lookup; does not mutate.
	fn has(&self, key: &[u8]) -> bool;

	/// Insert or overwrite the offset for `key`. Last write wins.
	fn set(&mut self, key: &[u8], offset: u64);

	/// Look up the offset for `key`, or `Error::KeyNotFound` if absent.
	fn get(&self, key: &[u8]) -> Result<u64>;

	/// Remove `key` if present. Idempotent: no error when the key is absent.
	fn delete(&mut self, key: &[u8]);
}

/// `HashMap`-backed in-memory implementation of [`Index`].
#[derive(Default)]
pub struct InMemoryIndex {
	offsets: HashMap<Vec<u8>, u64>,
}

impl InMemoryIndex {
	pub fn new() -> Self {
		InMemoryIndex { offsets: HashMap::new() }
	}
}

impl Index for InMemoryIndex {
	fn has(&self, key: &[u8]) -> bool {
		self.offsets.contains_key(key)
	}

	fn set(&mut self, key: &[u8], offset: u64) {
		self.offsets.insert(key.to_vec(), offset);
	}

	fn get(&self, key: &[u8]) -> Result<u64> {
		self.offsets
			.get(key)
			.copied()
			.ok_or_else(|| Error::KeyNotFound { key: key.to_vec() })
	}

	fn delete(&mut self, key: &[u8]) {
		self.offsets.remove(key);
	}
}
