// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded, single-process, persistent key-value store backed by an append-only log.
//!
//! A [`engine::StorageEngine`] pairs a [`file::ByteStream`] backend (either
//! [`file::MonolithicFile`] or [`file::SegmentedFile`]) with an in-memory [`index::Index`] rebuilt
//! from the log at construction time. Records are serialized by [`record::Record`] into a fixed
//! 17-byte header plus raw key/value bytes.

pub mod engine;
pub mod error;
pub mod file;
pub mod index;
pub mod record;

pub use engine::StorageEngine;
pub use error::{Error, Result};
pub use file::{ByteStream, MonolithicFile, OpenMode, SegmentedFile, Whence};
pub use index::{Index, InMemoryIndex};
pub use record::{Operation, Record};
