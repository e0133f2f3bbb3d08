// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::{Error, Result};
use crate::file::{with_open, ByteStream, Whence};
use crate::index::{Index, InMemoryIndex};
use crate::record::Record;

/// Append-only storage engine (C7): orchestrates a byte-stream backend, the record codec, and an
/// offset index into GET/SET/DELETE semantics.
///
/// Generic over the backend (`S: ByteStream`) so dispatch between [`crate::file::MonolithicFile`]
/// and [`crate::file::SegmentedFile`] is static, not dynamic.
pub struct StorageEngine<S: ByteStream> {
	stream: S,
	index: InMemoryIndex,
}

impl<S: ByteStream> StorageEngine<S> {
	/// Open `stream` and replay the whole log to rebuild the index, leaving `stream` positioned
	/// at end-of-log for subsequent appends.
	pub fn open(mut stream: S) -> Result<Self> {
		let index = with_open(&mut stream, |s| Self::replay(s))?;
		Ok(StorageEngine { stream, index })
	}

	fn replay(stream: &mut S) -> Result<InMemoryIndex> {
		let mut index = InMemoryIndex::new();
		stream.seek(0, Whence::Start)?;

		let mut replayed = 0u64;
		loop {
			let offset = stream.tell()?;
			let record = match Record::decode(stream) {
				Ok(Some(record)) => record,
				Ok(None) => break,
				Err(e) => {
					log::error!(target: "aoldb", "startup scan hit corrupted record at offset {}: {}", offset, e);
					return Err(e);
				}
			};

			match record.operation {
				crate::record::Operation::Set => index.set(&record.key, offset),
				crate::record::Operation::Delete => index.delete(&record.key),
			}
			replayed += 1;
		}

		let end = stream.tell()?;
		log::debug!(target: "aoldb", "startup scan replayed {} records", replayed);
		log::info!(target: "aoldb", "log opened at length {} bytes", end);
		Ok(index)
	}

	pub fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
		let index = &mut self.index;
		with_open(&mut self.stream, |s| {
			s.seek(0, Whence::End)?;
			let offset = s.tell()?;
			Record::set(key, value).encode(s)?;
			index.set(key, offset);
			Ok(())
		})
	}

	pub fn delete(&mut self, key: &[u8]) -> Result<()> {
		if !self.index.has(key) {
			return Ok(());
		}

		let index = &mut self.index;
		with_open(&mut self.stream, |s| {
			s.seek(0, Whence::End)?;
			Record::delete(key).encode(s)?;
			index.delete(key);
			Ok(())
		})
	}

	pub fn get(&mut self, key: &[u8]) -> Result<Vec<u8>> {
		if !self.index.has(key) {
			return Err(Error::KeyNotFound { key: key.to_vec() });
		}
		let offset = self.index.get(key)?;

		let index = &mut self.index;
		with_open(&mut self.stream, |s| {
			s.seek(offset as i64, Whence::Start)?;
			let record = Record::decode(s)?.ok_or(Error::InvalidOffset { offset })?;
			if record.key != key {
				index.delete(key);
				log::warn!(target: "aoldb", "stale index offset {} for a key; evicting and failing lookup", offset);
				return Err(Error::InvalidOffset { offset });
			}
			Ok(record.value)
		})
	}

	pub fn has(&self, key: &[u8]) -> bool {
		self.index.has(key)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::file::monolith::MonolithicFile;
	use crate::file::segmented::SegmentedFile;
	use crate::file::OpenMode;

	fn temp_dir() -> tempfile::TempDir {
		env_logger::try_init().ok();
		tempfile::tempdir().unwrap()
	}

	fn monolithic_engine(dir: &std::path::Path, tablespace: &str) -> StorageEngine<MonolithicFile> {
		let stream = MonolithicFile::new(tablespace, dir, OpenMode::ReadAppend).unwrap();
		StorageEngine::open(stream).unwrap()
	}

	#[test]
	fn standard_set_get() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.set(b"normal_key", b"normal_value").unwrap();
		assert_eq!(engine.get(b"normal_key").unwrap(), b"normal_value");
	}

	#[test]
	fn update_wins() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.set(b"hello", b"world").unwrap();
		engine.set(b"hello", b"all").unwrap();
		assert_eq!(engine.get(b"hello").unwrap(), b"all");
	}

	#[test]
	fn delete_then_get_fails() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.set(b"k", b"v").unwrap();
		engine.delete(b"k").unwrap();
		assert!(matches!(engine.get(b"k"), Err(Error::KeyNotFound { .. })));
		assert!(!engine.has(b"k"));
	}

	#[test]
	fn persists_across_instances() {
		let dir = temp_dir();
		{
			let mut engine = monolithic_engine(dir.path(), "t");
			engine.set(b"k", b"v").unwrap();
		}
		let mut engine = monolithic_engine(dir.path(), "t");
		assert_eq!(engine.get(b"k").unwrap(), b"v");
	}

	#[test]
	fn interleaved_multi_key() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.set(b"k1", b"alpha").unwrap();
		engine.set(b"k2", b"beta").unwrap();
		engine.set(b"k1", b"gamma").unwrap();
		engine.delete(b"k2").unwrap();
		engine.set(b"k3", b"delta").unwrap();
		engine.set(b"k2", b"epsilon").unwrap();

		assert_eq!(engine.get(b"k1").unwrap(), b"gamma");
		assert_eq!(engine.get(b"k2").unwrap(), b"epsilon");
		assert_eq!(engine.get(b"k3").unwrap(), b"delta");
	}

	#[test]
	fn binary_safe_edge_record() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.set(b"", b"").unwrap();
		assert_eq!(engine.get(b"").unwrap(), b"");

		let size = std::fs::metadata(dir.path().join("t.dblog")).unwrap().len();
		assert_eq!(size, 17);
	}

	#[test]
	fn resurrection_after_delete() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.set(b"k", b"v1").unwrap();
		engine.delete(b"k").unwrap();
		engine.set(b"k", b"v2").unwrap();
		assert_eq!(engine.get(b"k").unwrap(), b"v2");
	}

	#[test]
	fn idempotent_delete_does_not_write() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.delete(b"absent").unwrap();
		let size_before = std::fs::metadata(dir.path().join("t.dblog")).unwrap().len();
		engine.delete(b"absent").unwrap();
		let size_after = std::fs::metadata(dir.path().join("t.dblog")).unwrap().len();
		assert_eq!(size_before, size_after);
	}

	#[test]
	fn isolation_between_keys() {
		let dir = temp_dir();
		let mut engine = monolithic_engine(dir.path(), "t");
		engine.set(b"k1", b"v1").unwrap();
		engine.set(b"k2", b"v2").unwrap();
		engine.delete(b"k2").unwrap();
		assert_eq!(engine.get(b"k1").unwrap(), b"v1");
	}

	#[test]
	fn segmented_rollover_end_to_end() {
		let dir = temp_dir();
		let stream = SegmentedFile::new("t", dir.path(), 32, OpenMode::ReadAppend).unwrap();
		let mut engine = StorageEngine::open(stream).unwrap();

		for i in 0..5 {
			let key = format!("key{}", i);
			let value = vec![i as u8; 20];
			engine.set(key.as_bytes(), &value).unwrap();
		}
		for i in 0..5 {
			let key = format!("key{}", i);
			let value = vec![i as u8; 20];
			assert_eq!(engine.get(key.as_bytes()).unwrap(), value);
		}

		let segment_count = std::fs::read_dir(dir.path()).unwrap().count();
		assert!(segment_count >= 3, "expected rollover to create several segments, got {}", segment_count);
	}

	#[test]
	fn segmented_and_monolithic_agree() {
		let mono_dir = temp_dir();
		let seg_dir = temp_dir();

		let mono_stream = MonolithicFile::new("t", mono_dir.path(), OpenMode::ReadAppend).unwrap();
		let seg_stream = SegmentedFile::new("t", seg_dir.path(), 16, OpenMode::ReadAppend).unwrap();
		let mut mono = StorageEngine::open(mono_stream).unwrap();
		let mut seg = StorageEngine::open(seg_stream).unwrap();

		let ops: Vec<(&[u8], &[u8])> = vec![(b"a", b"1"), (b"b", b"22"), (b"a", b"333"), (b"c", b"4444")];
		for (k, v) in &ops {
			mono.set(k, v).unwrap();
			seg.set(k, v).unwrap();
		}
		mono.delete(b"b").unwrap();
		seg.delete(b"b").unwrap();

		for k in [&b"a"[..], &b"b"[..], &b"c"[..]] {
			assert_eq!(mono.get(k).is_ok(), seg.get(k).is_ok());
			if let (Ok(mv), Ok(sv)) = (mono.get(k), seg.get(k)) {
				assert_eq!(mv, sv);
			}
		}
	}
}
