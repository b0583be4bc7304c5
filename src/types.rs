// Copyright (c) 2025 EmbeDB Contributors
// Licensed under the EmbeDB License. See LICENSE file for details.

//! On-disk format types for EmbeDB store files.
//!
//! This module defines the fixed binary layout shared by every store file:
//! - [`FileHeader`] - 256-byte preamble describing layout and version
//! - [`IndexEntry`] - 16-byte (hash, offset) pair in the index section
//! - Record packing helpers and layout constants
//!
//! # File Layout
//!
//! ```text
//! Offset 0      Offset 256            index_offset          EOF
//! ┌────────────┬─────────────────────┬─────────────────────┐
//! │ FileHeader │ Data section        │ Index section       │
//! │ (256 B)    │ records, appended   │ one IndexEntry per  │
//! │            │ in insertion order  │ record (v2 only)    │
//! └────────────┴─────────────────────┴─────────────────────┘
//! ```
//!
//! Everything is little-endian. Version 1 files have no index section
//! (`index_offset == 0`) and are reconstructed by scanning the data
//! section. Version 2 files carry the index section written on clean
//! close, so opening touches the index entries instead of every record.
//!
//! # Record Layout
//!
//! ```text
//! Offset  Size   Field
//! 0       8      hash (u64, FNV-1a of the key)
//! 8       4      dimension (u32, equals the store dimension)
//! 12      4      reserved (u32, must be zero)
//! 16      4·D    payload (f32 × dimension)
//! ```

use crate::error::{EmbedError, Result};

/// Magic bytes identifying an EmbeDB store file.
pub const MAGIC_BYTES: [u8; 4] = *b"EDB\0";

/// Current file format version (with trailing index section).
pub const CURRENT_VERSION: u32 = 2;

/// Legacy file format version (no index section; data section is scanned).
pub const LEGACY_VERSION: u32 = 1;

/// Size of the [`FileHeader`] in bytes. Records start at this offset.
pub const HEADER_SIZE: usize = 256;

/// Size of the fixed record prefix: hash (8) + dimension (4) + reserved (4).
pub const RECORD_META_SIZE: usize = 16;

/// Size of one [`IndexEntry`]: hash (8) + offset (8).
pub const INDEX_ENTRY_SIZE: usize = 16;

/// Total on-disk size of a record holding a vector of `dimension` floats.
#[inline]
pub fn record_size(dimension: u32) -> usize {
    RECORD_META_SIZE + dimension as usize * 4
}

/// Fixed 256-byte file preamble.
///
/// Only the first 36 bytes carry fields today; the rest is zero-filled
/// and reserved for future versions. Decoders ignore the reserved tail
/// so that older readers keep working when new fields are added.
///
/// # Binary Layout
///
/// ```text
/// Offset  Size  Field
/// 0       4     magic ("EDB\0")
/// 4       4     version (u32)
/// 8       4     dimension (u32)
/// 12      8     record_count (u64)
/// 20      8     index_offset (u64, 0 = no index section)
/// 28      8     data_offset (u64, always 256)
/// 36      220   reserved (zero)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// File format version: [`LEGACY_VERSION`] or [`CURRENT_VERSION`].
    pub version: u32,
    /// Vector dimension shared by every record in the file.
    pub dimension: u32,
    /// Number of records in the data section.
    pub record_count: u64,
    /// Byte offset of the first index entry; 0 when the index section
    /// is absent.
    pub index_offset: u64,
    /// Byte offset of the first record. Always [`HEADER_SIZE`].
    pub data_offset: u64,
}

impl FileHeader {
    /// Creates a fresh current-version header for an empty store.
    ///
    /// `index_offset` starts at 0 and is filled in on clean close.
    pub fn new(dimension: u32) -> Self {
        Self {
            version: CURRENT_VERSION,
            dimension,
            record_count: 0,
            index_offset: 0,
            data_offset: HEADER_SIZE as u64,
        }
    }

    /// Serializes the header to its fixed 256-byte form.
    ///
    /// Bytes past the declared fields are zero-filled.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC_BYTES);
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&self.dimension.to_le_bytes());
        buf[12..20].copy_from_slice(&self.record_count.to_le_bytes());
        buf[20..28].copy_from_slice(&self.index_offset.to_le_bytes());
        buf[28..36].copy_from_slice(&self.data_offset.to_le_bytes());
        buf
    }

    /// Deserializes a header from its fixed 256-byte form.
    ///
    /// Unknown content past byte 36 is ignored. Fails with
    /// [`EmbedError::InvalidFormat`] when the magic bytes do not match
    /// or the version is not 1 or 2.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        if buf[0..4] != MAGIC_BYTES {
            return Err(EmbedError::InvalidFormat(
                "missing EDB magic bytes".to_string(),
            ));
        }
        let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        if !(LEGACY_VERSION..=CURRENT_VERSION).contains(&version) {
            return Err(EmbedError::InvalidFormat(format!(
                "unsupported version {}",
                version
            )));
        }
        Ok(Self {
            version,
            dimension: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            record_count: u64::from_le_bytes(buf[12..20].try_into().unwrap()),
            index_offset: u64::from_le_bytes(buf[20..28].try_into().unwrap()),
            data_offset: u64::from_le_bytes(buf[28..36].try_into().unwrap()),
        })
    }
}

/// One entry in the trailing index section: the record's key hash and
/// the byte offset of the record in the data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// FNV-1a hash of the record's key.
    pub hash: u64,
    /// Byte offset of the first record byte.
    pub offset: i64,
}

impl IndexEntry {
    /// Serializes the entry to its 16-byte form.
    pub fn to_bytes(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        buf[0..8].copy_from_slice(&self.hash.to_le_bytes());
        buf[8..16].copy_from_slice(&self.offset.to_le_bytes());
        buf
    }

    /// Deserializes an entry from its 16-byte form. Total over all
    /// 16-byte inputs.
    pub fn from_bytes(buf: &[u8; INDEX_ENTRY_SIZE]) -> Self {
        Self {
            hash: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            offset: i64::from_le_bytes(buf[8..16].try_into().unwrap()),
        }
    }
}

/// Packs one record (meta prefix + payload) for appending to the data
/// section. The reserved word is written as zero.
pub fn encode_record(hash: u64, vector: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(record_size(vector.len() as u32));
    buf.extend_from_slice(&hash.to_le_bytes());
    buf.extend_from_slice(&(vector.len() as u32).to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    for value in vector {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf
}
