// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Immutable descriptor for one segment file `<tablespace>_<index:010>.dblog`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	pub tablespace: String,
	pub index: u64,
	directory: PathBuf,
}

impl Segment {
	pub fn new(tablespace: impl Into<String>, index: u64, directory: impl Into<PathBuf>) -> Segment {
		Segment { tablespace: tablespace.into(), index, directory: directory.into() }
	}

	/// Deterministic path: `<directory>/<tablespace>_<index:010>.dblog`.
	pub fn path(&self) -> PathBuf {
		self.directory.join(Self::file_name(&self.tablespace, self.index))
	}

	pub fn file_name(tablespace: &str, index: u64) -> String {
		format!("{}_{:010}.dblog", tablespace, index)
	}

	/// Current on-disk size, or 0 if the backing file does not exist.
	pub fn size(&self) -> u64 {
		std::fs::metadata(self.path()).map(|m| m.len()).unwrap_or(0)
	}

	/// Parse a filename (not a full path) matching `^([A-Za-z0-9_-]+)_(\d{10})\.dblog$`.
	pub fn parse_file_name(file_name: &str, directory: impl Into<PathBuf>) -> Result<Segment> {
		let invalid = || Error::InvalidArgument(format!("invalid segment filename: {}", file_name));

		let stem = file_name.strip_suffix(".dblog").ok_or_else(invalid)?;
		let (tablespace, index_str) = stem.rsplit_once('_').ok_or_else(invalid)?;

		if tablespace.is_empty() || !tablespace.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
			return Err(invalid());
		}
		if index_str.len() != 10 || !index_str.bytes().all(|b| b.is_ascii_digit()) {
			return Err(invalid());
		}
		let index: u64 = index_str.parse().map_err(|_| invalid())?;

		Ok(Segment::new(tablespace, index, directory))
	}
}

impl PartialOrd for Segment {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Segment {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.index.cmp(&other.index)
	}
}
