// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::{Error, Result};
use crate::file::ByteStream;

/// Header width in bytes: `u8 operation || u64 key_size || u64 value_size`, tightly packed.
pub const HEADER_SIZE: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	Set = 0,
	Delete = 1,
}

impl Operation {
	fn from_byte(b: u8) -> Option<Operation> {
		match b {
			0 => Some(Operation::Set),
			1 => Some(Operation::Delete),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
	pub operation: Operation,
	pub key_size: u64,
	pub value_size: u64,
}

impl Header {
	pub fn payload_size(&self) -> u64 {
		self.key_size + self.value_size
	}

	pub fn record_size(&self) -> u64 {
		HEADER_SIZE as u64 + self.payload_size()
	}

	/// Serialize into the fixed 17-byte layout. Native endianness, no padding: this is a manual
	/// byte-offset encode rather than the in-memory layout of a `(u8, u64, u64)` struct, which
	/// would insert 7 bytes of alignment padding after the leading byte.
	fn to_bytes(self) -> [u8; HEADER_SIZE] {
		let mut buf = [0u8; HEADER_SIZE];
		buf[0] = self.operation as u8;
		buf[1..9].copy_from_slice(&self.key_size.to_ne_bytes());
		buf[9..17].copy_from_slice(&self.value_size.to_ne_bytes());
		buf
	}

	fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Header> {
		let operation = Operation::from_byte(buf[0])
			.ok_or_else(|| Error::Corrupted { offset: 0, cause: format!("invalid operation byte {}", buf[0]) })?;
		let key_size = u64::from_ne_bytes(buf[1..9].try_into().unwrap());
		let value_size = u64::from_ne_bytes(buf[9..17].try_into().unwrap());
		Ok(Header { operation, key_size, value_size })
	}
}

/// One decoded (or about-to-be-encoded) log record: a header plus its raw key/value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
	pub operation: Operation,
	pub key: Vec<u8>,
	pub value: Vec<u8>,
}

impl Record {
	pub fn set(key: &[u8], value: &[u8]) -> Record {
		Record { operation: Operation::Set, key: key.to_vec(), value: value.to_vec() }
	}

	pub fn delete(key: &[u8]) -> Record {
		Record { operation: Operation::Delete, key: key.to_vec(), value: Vec::new() }
	}

	fn header(&self) -> Header {
		Header { operation: self.operation, key_size: self.key.len() as u64, value_size: self.value.len() as u64 }
	}

	/// Append-encode this record to `stream` at its current position. Returns the number of bytes
	/// written (`17 + key.len() + value.len()`).
	pub fn encode<S: ByteStream + ?Sized>(&self, stream: &mut S) -> Result<usize> {
		let header = self.header();
		stream.write(&header.to_bytes())?;
		stream.write(&self.key)?;
		stream.write(&self.value)?;
		Ok(header.record_size() as usize)
	}

	/// Decode one record starting at `stream`'s current position. The codec never seeks; it only
	/// consumes bytes forward.
	///
	/// - `Ok(None)`: clean end of log (zero bytes available where a header was expected).
	/// - `Ok(Some(record))`: a fully decoded record.
	/// - `Err(Error::Corrupted { offset, .. })`: a truncated header, truncated payload, or invalid
	///   operation byte, tagged with the offset at which decoding began.
	pub fn decode<S: ByteStream + ?Sized>(stream: &mut S) -> Result<Option<Record>> {
		let offset = stream.tell()?;

		let header_bytes = stream.read(Some(HEADER_SIZE))?;
		if header_bytes.is_empty() {
			return Ok(None);
		}
		if header_bytes.len() < HEADER_SIZE {
			return Err(Error::Corrupted { offset, cause: "truncated header".into() });
		}

		let header = Header::from_bytes(header_bytes[..].try_into().unwrap())
			.map_err(|_| Error::Corrupted { offset, cause: "invalid operation byte".into() })?;

		let payload_size = header.payload_size() as usize;
		let payload = stream.read(Some(payload_size))?;
		if payload.len() != payload_size {
			return Err(Error::Corrupted { offset, cause: "truncated payload".into() });
		}

		let key_size = header.key_size as usize;
		let (key, value) = payload.split_at(key_size);
		Ok(Some(Record { operation: header.operation, key: key.to_vec(), value: value.to_vec() }))
	}
}
