// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::file::{ByteStream, OpenMode, Whence};

/// Monolithic backend (C2): a single OS file `<tablespace>.dblog` under `directory`.
///
/// I/O delegates directly to the underlying file handle; mode violations surface as whatever
/// `std::io::Error` the OS produces, wrapped in `Error::Io`.
pub struct MonolithicFile {
	path: PathBuf,
	mode: OpenMode,
	handle: Option<File>,
}

impl MonolithicFile {
	pub fn new(tablespace: &str, directory: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
		let tablespace = tablespace.trim();
		if tablespace.is_empty() {
			return Err(Error::InvalidArgument("tablespace cannot be empty".into()));
		}

		let directory = directory.as_ref();
		if !directory.exists() {
			return Err(Error::InvalidArgument(format!("directory does not exist: {}", directory.display())));
		}
		if !directory.is_dir() {
			return Err(Error::InvalidArgument(format!("path exists but is not a directory: {}", directory.display())));
		}

		Ok(MonolithicFile { path: directory.join(format!("{}.dblog", tablespace)), mode, handle: None })
	}

	fn handle_mut(&mut self) -> Result<&mut File> {
		self.handle.as_mut().ok_or(Error::NotOpen)
	}
}

impl ByteStream for MonolithicFile {
	fn open(&mut self) -> Result<()> {
		if self.is_open() {
			return Ok(());
		}

		if !self.path.exists() {
			File::create(&self.path)?;
		}

		self.handle = Some(self.mode.std_open_options().open(&self.path)?);
		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		// `File` is unbuffered, so every `write` already reaches the OS; dropping the handle here
		// is the only "flush" there is to do, matching the spec's no-fsync-between-records
		// discipline (§5).
		self.handle = None;
		Ok(())
	}

	fn is_open(&self) -> bool {
		self.handle.is_some()
	}

	fn write(&mut self, data: &[u8]) -> Result<usize> {
		let handle = self.handle_mut()?;
		handle.write_all(data)?;
		Ok(data.len())
	}

	fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>> {
		Ok(crate::file::read_bounded(self.handle_mut()?, size)?)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		let handle = self.handle_mut()?;
		let current = handle.stream_position()?;
		let target = match whence {
			Whence::Start => offset,
			Whence::Current => current as i64 + offset,
			Whence::End => {
				let len = handle.metadata()?.len();
				len as i64 + offset
			}
		};
		let target = target.max(0) as u64;
		handle.seek(SeekFrom::Start(target))?;
		Ok(target)
	}

	fn tell(&mut self) -> Result<u64> {
		Ok(self.handle_mut()?.stream_position()?)
	}
}
