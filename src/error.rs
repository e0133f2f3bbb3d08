// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

/// Error taxonomy shared by every component of the storage engine.
#[derive(Debug)]
pub enum Error {
	/// Rejected at construction time: empty tablespace, invalid mode, non-positive segment cap,
	/// missing/non-directory path, or a segment filename that doesn't match the expected grammar.
	InvalidArgument(String),
	/// I/O attempted on a byte-stream that is not open.
	NotOpen,
	/// Write attempted on a read-only stream, or read attempted on a write-only stream.
	ModeForbidden(String),
	/// `get` for a key with no live entry in the index.
	KeyNotFound { key: Vec<u8> },
	/// The index pointed at an offset whose decoded record does not carry the expected key.
	InvalidOffset { offset: u64 },
	/// The log could not be decoded at `offset`: truncated header, truncated payload, or an
	/// operation byte outside `{0, 1}`.
	Corrupted { offset: u64, cause: String },
	/// An OS-level I/O failure.
	Io(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
			Error::NotOpen => write!(f, "byte-stream is not open"),
			Error::ModeForbidden(msg) => write!(f, "operation forbidden by mode: {}", msg),
			Error::KeyNotFound { key } => write!(f, "key not found: {:?}", key),
			Error::InvalidOffset { offset } => write!(f, "no valid record found at offset {}", offset),
			Error::Corrupted { offset, cause } => write!(f, "log corrupted at offset {}: {}", offset, cause),
			Error::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		Error::Io(e)
	}
}
