// SPDX-License-Identifier: MIT OR Apache-2.0

//! Byte-stream interface (C1) shared by the monolithic and segmented backends.

pub mod monolith;
pub mod segment;
pub mod segmented;

pub use monolith::MonolithicFile;
pub use segmented::SegmentedFile;

use crate::error::{Error, Result};

/// Read up to `size` bytes (or to EOF if `None`) from `handle`, looping on short reads so a
/// single spurious short read doesn't masquerade as end-of-file.
pub(crate) fn read_bounded(handle: &mut impl std::io::Read, size: Option<usize>) -> std::io::Result<Vec<u8>> {
	let mut buf = Vec::new();
	match size {
		None => {
			handle.read_to_end(&mut buf)?;
		}
		Some(size) => {
			buf.resize(size, 0);
			let mut filled = 0;
			while filled < size {
				let n = handle.read(&mut buf[filled..])?;
				if n == 0 {
					break;
				}
				filled += n;
			}
			buf.truncate(filled);
		}
	}
	Ok(buf)
}

/// Reference point for [`ByteStream::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
	Start,
	Current,
	End,
}

/// The closed set of open modes, named after their `fopen`-style spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
	/// `"rb"` — read-only.
	Read,
	/// `"ab"` — append-only (write-only, positioned at end).
	Append,
	/// `"r+b"` — read + update (no truncate, no implicit append).
	ReadUpdate,
	/// `"a+b"` — read + append.
	ReadAppend,
	/// `"wb"` — truncate + write-only.
	Write,
	/// `"w+b"` — truncate + read/write.
	ReadWrite,
}

impl OpenMode {
	/// Parse one of the six canonical mode strings, rejecting anything else.
	pub fn parse(mode: &str) -> Result<OpenMode> {
		match mode {
			"rb" => Ok(OpenMode::Read),
			"ab" => Ok(OpenMode::Append),
			"r+b" => Ok(OpenMode::ReadUpdate),
			"a+b" => Ok(OpenMode::ReadAppend),
			"wb" => Ok(OpenMode::Write),
			"w+b" => Ok(OpenMode::ReadWrite),
			other => Err(Error::InvalidArgument(format!("invalid mode: {}", other))),
		}
	}

	/// True for modes that permit reading (`r`, `+`).
	pub fn can_read(self) -> bool {
		!matches!(self, OpenMode::Append | OpenMode::Write)
	}

	/// True for modes that permit writing (`w`, `a`, `+`).
	pub fn can_write(self) -> bool {
		!matches!(self, OpenMode::Read)
	}

	/// True for `wb`/`w+b`: truncates and may delete existing segments.
	pub fn is_write(self) -> bool {
		matches!(self, OpenMode::Write | OpenMode::ReadWrite)
	}

	/// True for `ab`/`a+b`: positions at end-of-log on open.
	pub fn is_append(self) -> bool {
		matches!(self, OpenMode::Append | OpenMode::ReadAppend)
	}

	/// True when the mode permits creating segments that don't yet exist (`w*` or `a*`).
	pub fn allows_create(self) -> bool {
		self.is_write() || self.is_append()
	}

	fn std_open_options(self) -> std::fs::OpenOptions {
		let mut options = std::fs::OpenOptions::new();
		options.create(true);
		match self {
			OpenMode::Read => {
				options.read(true);
			}
			OpenMode::Append => {
				options.append(true);
			}
			OpenMode::ReadUpdate => {
				options.read(true).write(true);
			}
			OpenMode::ReadAppend => {
				options.read(true).append(true);
			}
			OpenMode::Write => {
				options.write(true).truncate(true);
			}
			OpenMode::ReadWrite => {
				options.read(true).write(true).truncate(true);
			}
		}
		options
	}
}

/// Uniform contract implemented by both the monolithic and segmented backends.
///
/// All methods assume the stream has been opened via [`with_open`] (or a direct call to `open`);
/// calling them on a closed stream returns `Error::NotOpen`.
pub trait ByteStream {
	/// Lazily acquire the backing resource(s). A no-op if already open.
	fn open(&mut self) -> Result<()>;

	/// Flush and release the backing resource(s). Idempotent.
	fn close(&mut self) -> Result<()>;

	fn is_open(&self) -> bool;

	/// Write `data`, returning the number of bytes written.
	fn write(&mut self, data: &[u8]) -> Result<usize>;

	/// Read up to `size` bytes (all remaining bytes if `None`). Returns an empty vector at EOF.
	fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>>;

	/// Move to an absolute position derived from `offset` and `whence`. Negative resulting
	/// positions are clamped to 0. Returns the new absolute position.
	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;

	/// Current absolute position.
	fn tell(&mut self) -> Result<u64>;
}

/// Scoped acquisition: opens `stream`, runs `f`, and always attempts to close afterward —
/// mirroring the reference implementation's context-manager `with self._file: ...` blocks, but as
/// a combinator rather than an RAII guard so that a `close()` failure is never silently dropped
/// alongside a successful (or failed) body.
///
/// If `f` fails, that error is returned even if `close` also fails. If `f` succeeds but `close`
/// fails, the `close` error is returned.
pub fn with_open<S, T, F>(stream: &mut S, f: F) -> Result<T>
where
	S: ByteStream + ?Sized,
	F: FnOnce(&mut S) -> Result<T>,
{
	stream.open()?;
	let result = f(stream);
	let close_result = stream.close();
	match result {
		Ok(value) => close_result.map(|_| value),
		Err(e) => Err(e),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parses_the_closed_mode_set() {
		assert_eq!(OpenMode::parse("rb").unwrap(), OpenMode::Read);
		assert_eq!(OpenMode::parse("ab").unwrap(), OpenMode::Append);
		assert_eq!(OpenMode::parse("r+b").unwrap(), OpenMode::ReadUpdate);
		assert_eq!(OpenMode::parse("a+b").unwrap(), OpenMode::ReadAppend);
		assert_eq!(OpenMode::parse("wb").unwrap(), OpenMode::Write);
		assert_eq!(OpenMode::parse("w+b").unwrap(), OpenMode::ReadWrite);
	}

	#[test]
	fn rejects_unknown_modes() {
		for bad in ["r", "w", "rwb", "", "a", "x"] {
			assert!(matches!(OpenMode::parse(bad), Err(Error::InvalidArgument(_))), "mode {:?} should be rejected", bad);
		}
	}

	#[test]
	fn capability_queries() {
		assert!(OpenMode::Read.can_read());
		assert!(!OpenMode::Read.can_write());
		assert!(OpenMode::Append.can_write());
		assert!(!OpenMode::Append.can_read());
		assert!(OpenMode::ReadUpdate.can_read());
		assert!(OpenMode::ReadUpdate.can_write());
		assert!(OpenMode::Write.is_write());
		assert!(OpenMode::ReadAppend.is_append());
		assert!(OpenMode::Write.allows_create());
		assert!(OpenMode::Append.allows_create());
		assert!(!OpenMode::Read.allows_create());
	}
}
