// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::file::segment::Segment;
use crate::file::{read_bounded, ByteStream, OpenMode, Whence};

/// Segmented backend (C4): a single logical byte stream spanning many fixed-cap segment files,
/// concatenated in ascending `index` order, with transparent rollover on write and seamless
/// reads/seeks across segment boundaries.
pub struct SegmentedFile {
	tablespace: String,
	directory: PathBuf,
	max_size: u64,
	mode: OpenMode,
	segments: Vec<Segment>,
	active: Option<File>,
	active_index: Option<usize>,
	active_base_offset: u64,
}

impl SegmentedFile {
	pub fn new(tablespace: &str, directory: impl AsRef<Path>, max_size: u64, mode: OpenMode) -> Result<Self> {
		let tablespace = tablespace.trim();
		if tablespace.is_empty() {
			return Err(Error::InvalidArgument("tablespace cannot be empty".into()));
		}
		if max_size == 0 {
			return Err(Error::InvalidArgument("max_size must be > 0".into()));
		}

		let directory = directory.as_ref();
		if !directory.exists() {
			return Err(Error::InvalidArgument(format!("directory does not exist: {}", directory.display())));
		}
		if !directory.is_dir() {
			return Err(Error::InvalidArgument(format!("path exists but is not a directory: {}", directory.display())));
		}
		let directory = directory.to_path_buf();

		let segments = Self::scan_segments(&tablespace, &directory);

		Ok(SegmentedFile {
			tablespace: tablespace.to_string(),
			directory,
			max_size,
			mode,
			segments,
			active: None,
			active_index: None,
			active_base_offset: 0,
		})
	}

	/// Enumerate `<tablespace>_*.dblog` in `directory`, skipping (and logging) any entry that
	/// doesn't match the segment filename grammar.
	fn scan_segments(tablespace: &str, directory: &Path) -> Vec<Segment> {
		let mut segments = Vec::new();
		let prefix = format!("{}_", tablespace);

		let entries = match std::fs::read_dir(directory) {
			Ok(entries) => entries,
			Err(_) => return segments,
		};

		for entry in entries.flatten() {
			let file_name = entry.file_name();
			let file_name = match file_name.to_str() {
				Some(name) => name,
				None => continue,
			};
			if !file_name.starts_with(&prefix) || !file_name.ends_with(".dblog") {
				continue;
			}
			match Segment::parse_file_name(file_name, directory) {
				Ok(segment) if segment.tablespace == tablespace => segments.push(segment),
				Ok(_) => {}
				Err(e) => {
					log::warn!(target: "aoldb", "skipping unparsable segment file {} in {}: {}", file_name, directory.display(), e);
				}
			}
		}

		segments.sort();
		segments
	}

	fn total_size(&self) -> u64 {
		self.segments.iter().map(Segment::size).sum()
	}

	fn active_mut(&mut self) -> Result<&mut File> {
		self.active.as_mut().ok_or(Error::NotOpen)
	}

	fn activate_segment(&mut self, index: usize) -> Result<()> {
		if index >= self.segments.len() {
			return Err(Error::InvalidArgument(format!("segment index {} out of bounds", index)));
		}

		self.active = None;
		let path = self.segments[index].path();
		self.active = Some(self.mode.std_open_options().open(path)?);
		self.active_index = Some(index);
		self.active_base_offset = self.segments[..index].iter().map(Segment::size).sum();
		Ok(())
	}

	fn create_and_activate_next_segment(&mut self) -> Result<()> {
		let next_index = self.segments.last().map(|s| s.index + 1).unwrap_or(0);
		let segment = Segment::new(self.tablespace.clone(), next_index, self.directory.clone());
		File::create(segment.path())?;
		self.segments.push(segment);
		self.activate_segment(self.segments.len() - 1)
	}

	fn delete_all_segments(&mut self) -> Result<()> {
		for segment in &self.segments {
			let _ = std::fs::remove_file(segment.path());
		}
		self.segments.clear();
		self.active = None;
		self.active_index = None;
		self.active_base_offset = 0;
		Ok(())
	}

	fn rollover(&mut self) -> Result<()> {
		let next_index = self.segments.last().map(|s| s.index + 1).unwrap_or(0);
		log::info!(target: "aoldb", "{}: rolling over to segment {}", self.tablespace, next_index);
		self.create_and_activate_next_segment()
	}
}

impl ByteStream for SegmentedFile {
	fn open(&mut self) -> Result<()> {
		if self.is_open() {
			return Ok(());
		}

		if self.mode.is_write() {
			self.delete_all_segments()?;
			self.create_and_activate_next_segment()?;
			return Ok(());
		}

		if self.segments.is_empty() {
			if !self.mode.allows_create() {
				return Err(Error::InvalidArgument(format!("no segments to read for tablespace {}", self.tablespace)));
			}
			return self.create_and_activate_next_segment();
		}

		if self.mode.is_append() {
			let last = self.segments.len() - 1;
			self.activate_segment(last)?;
			let size = self.segments[last].size();
			self.active_mut()?.seek(SeekFrom::Start(size))?;
		} else {
			self.activate_segment(0)?;
			self.active_mut()?.seek(SeekFrom::Start(0))?;
		}

		Ok(())
	}

	fn close(&mut self) -> Result<()> {
		self.active = None;
		Ok(())
	}

	fn is_open(&self) -> bool {
		self.active.is_some()
	}

	fn write(&mut self, data: &[u8]) -> Result<usize> {
		if !self.mode.can_write() {
			return Err(Error::ModeForbidden("segmented stream is not open for writing".into()));
		}
		if !self.is_open() {
			return Err(Error::NotOpen);
		}

		let mut total_written = 0usize;
		while total_written < data.len() {
			let current_pos = self.active_mut()?.stream_position()?;
			let space_left = self.max_size as i64 - current_pos as i64;

			if space_left <= 0 {
				self.rollover()?;
				continue;
			}

			let chunk_size = std::cmp::min(data.len() - total_written, space_left as usize);
			let chunk = &data[total_written..total_written + chunk_size];
			self.active_mut()?.write_all(chunk)?;
			total_written += chunk_size;
		}

		Ok(total_written)
	}

	fn read(&mut self, size: Option<usize>) -> Result<Vec<u8>> {
		if !self.mode.can_read() {
			return Err(Error::ModeForbidden("segmented stream is not open for reading".into()));
		}
		if !self.is_open() {
			return Err(Error::NotOpen);
		}

		let mut result = Vec::new();
		let mut bytes_read = 0usize;

		loop {
			if let Some(limit) = size {
				if bytes_read >= limit {
					break;
				}
			}

			let request = size.map(|limit| limit - bytes_read);
			let chunk = read_bounded(self.active_mut()?, request)?;
			let short = match request {
				None => chunk.is_empty(),
				Some(requested) => chunk.len() < requested,
			};

			if !chunk.is_empty() {
				bytes_read += chunk.len();
				result.extend_from_slice(&chunk);
			}

			if short {
				let next_index = self.active_index.ok_or(Error::NotOpen)? + 1;
				if next_index < self.segments.len() {
					self.activate_segment(next_index)?;
				} else {
					break;
				}
			}
		}

		Ok(result)
	}

	fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
		if !self.is_open() {
			return Err(Error::NotOpen);
		}

		let total_size = self.total_size();
		let current = self.tell()?;
		let target = match whence {
			Whence::Start => offset,
			Whence::Current => current as i64 + offset,
			Whence::End => total_size as i64 + offset,
		};
		let target = target.max(0) as u64;

		let active_index = self.active_index.ok_or(Error::NotOpen)?;
		let active_start = self.active_base_offset;
		let active_end = active_start + self.segments[active_index].size();

		if active_start <= target && target <= active_end {
			self.active_mut()?.seek(SeekFrom::Start(target - active_start))?;
			return Ok(target);
		}

		let mut accumulated = 0u64;
		for i in 0..self.segments.len() {
			let seg_size = self.segments[i].size();
			if accumulated <= target && target < accumulated + seg_size {
				self.activate_segment(i)?;
				self.active_mut()?.seek(SeekFrom::Start(target - accumulated))?;
				return Ok(target);
			}
			accumulated += seg_size;
		}

		if !self.segments.is_empty() {
			let last = self.segments.len() - 1;
			self.activate_segment(last)?;
			let local_offset = target.saturating_sub(self.active_base_offset);
			self.active_mut()?.seek(SeekFrom::Start(local_offset))?;
		} else if self.mode.allows_create() {
			self.create_and_activate_next_segment()?;
		} else {
			return Ok(0);
		}

		Ok(target)
	}

	fn tell(&mut self) -> Result<u64> {
		let base = self.active_base_offset;
		Ok(base + self.active_mut()?.stream_position()?)
	}
}
