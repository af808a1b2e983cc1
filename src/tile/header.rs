//! The fixed 28-byte b3dm header.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::format::*;
use crate::util::{Error, Result};

/// Decoded b3dm header.
///
/// Field values are kept exactly as declared on disk. Nothing here is
/// corrected on read, so a malformed file can still be inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    /// Total size of the file, header included.
    pub byte_length: u32,
    /// Feature table JSON length, padding included.
    pub feature_table_json_byte_length: u32,
    pub feature_table_binary_byte_length: u32,
    /// Batch table JSON length, padding included.
    pub batch_table_json_byte_length: u32,
    pub batch_table_binary_byte_length: u32,
}

impl Default for Header {
    /// Header of an empty container: no tables, no payload.
    fn default() -> Self {
        Self {
            magic: *B3DM_MAGIC,
            version: CURRENT_VERSION,
            byte_length: HEADER_SIZE as u32,
            feature_table_json_byte_length: 0,
            feature_table_binary_byte_length: 0,
            batch_table_json_byte_length: 0,
            batch_table_binary_byte_length: 0,
        }
    }
}

impl Header {
    /// Build a header for a JSON-only layout.
    ///
    /// Lengths are taken as given; callers pass already padded JSON lengths.
    /// Fails with [`Error::TooLarge`] when a length or the total does not
    /// fit in a u32 field.
    pub fn for_segments(feature_json_len: usize, batch_json_len: usize, payload_len: usize) -> Result<Self> {
        let total = (HEADER_SIZE as u64)
            .checked_add(feature_json_len as u64)
            .and_then(|n| n.checked_add(batch_json_len as u64))
            .and_then(|n| n.checked_add(payload_len as u64))
            .unwrap_or(u64::MAX);
        let byte_length = u32::try_from(total).map_err(|_| Error::TooLarge { total })?;

        // Each part is bounded by the total, so these cannot fail once it fits
        Ok(Self {
            byte_length,
            feature_table_json_byte_length: feature_json_len as u32,
            batch_table_json_byte_length: batch_json_len as u32,
            ..Self::default()
        })
    }

    /// Parse a header from the first 28 bytes of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::TruncatedHeader { available: data.len() });
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if &magic != B3DM_MAGIC {
            return Err(Error::BadMagic(magic));
        }

        let field = |offset: usize| LittleEndian::read_u32(&data[offset..offset + 4]);
        Ok(Self {
            magic,
            version: field(VERSION_OFFSET),
            byte_length: field(BYTE_LENGTH_OFFSET),
            feature_table_json_byte_length: field(FEATURE_TABLE_JSON_OFFSET),
            feature_table_binary_byte_length: field(FEATURE_TABLE_BINARY_OFFSET),
            batch_table_json_byte_length: field(BATCH_TABLE_JSON_OFFSET),
            batch_table_binary_byte_length: field(BATCH_TABLE_BINARY_OFFSET),
        })
    }

    /// Serialize the header as 28 little-endian bytes.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.magic)?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(self.byte_length)?;
        w.write_u32::<LittleEndian>(self.feature_table_json_byte_length)?;
        w.write_u32::<LittleEndian>(self.feature_table_binary_byte_length)?;
        w.write_u32::<LittleEndian>(self.batch_table_json_byte_length)?;
        w.write_u32::<LittleEndian>(self.batch_table_binary_byte_length)?;
        Ok(())
    }

    /// Header as a byte array.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        // Writing into a fixed slice of the exact size cannot fail
        let _ = self.write_to(&mut buf[..]);
        buf
    }

    /// Magic tag as text, lossy for non-ASCII bytes.
    pub fn magic_str(&self) -> String {
        String::from_utf8_lossy(&self.magic).into_owned()
    }

    #[inline]
    pub fn is_supported_version(&self) -> bool {
        self.version == CURRENT_VERSION
    }

    /// True if either table declares a binary body.
    #[inline]
    pub fn has_binary_tables(&self) -> bool {
        self.feature_table_binary_byte_length != 0 || self.batch_table_binary_byte_length != 0
    }

    /// Combined length of all four table segments.
    pub fn body_len(&self) -> u64 {
        self.feature_table_json_byte_length as u64
            + self.feature_table_binary_byte_length as u64
            + self.batch_table_json_byte_length as u64
            + self.batch_table_binary_byte_length as u64
    }

    /// Byte offset of the first payload byte.
    #[inline]
    pub fn payload_offset(&self) -> u64 {
        HEADER_SIZE as u64 + self.body_len()
    }

    /// The `byteLength` this header should declare for a payload of `payload_len` bytes.
    #[inline]
    pub fn expected_byte_length(&self, payload_len: usize) -> u64 {
        self.payload_offset() + payload_len as u64
    }
}
