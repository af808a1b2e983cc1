//! In-memory b3dm container.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use super::format::{padded_len, PADDING_BYTE};
use super::header::Header;
use super::reader::read_container;
use super::writer::write_container_to;
use crate::util::{Error, Result};

const PADDING_CHAR: char = PADDING_BYTE as char;

/// One b3dm file: header, two JSON tables and the embedded GLB payload.
///
/// The header is the one declared by the source. The writer never trusts
/// it and derives every length field from the content instead; that
/// derived header is computed once, on construction, so a `Container` that
/// exists can always be written.
///
/// Table strings are held without trailing spaces, the same form the
/// reader exposes once padding is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    header: Header,
    write_header: Header,
    feature_table_json: String,
    batch_table_json: String,
    payload: Vec<u8>,
}

impl Container {
    /// Create a container from its logical content.
    ///
    /// Empty JSON strings mean the table is absent. Fails with
    /// [`Error::TooLarge`] when the content cannot be described by the
    /// u32 header fields.
    pub fn new(
        feature_table_json: impl Into<String>,
        batch_table_json: impl Into<String>,
        payload: Vec<u8>,
    ) -> Result<Self> {
        let feature_table_json = trim_padding(feature_table_json.into());
        let batch_table_json = trim_padding(batch_table_json.into());
        let header = layout_header(&feature_table_json, &batch_table_json, &payload)?;
        Ok(Self {
            header,
            write_header: header,
            feature_table_json,
            batch_table_json,
            payload,
        })
    }

    /// Wrap a standalone GLB asset with empty tables.
    pub fn from_glb(glb: Vec<u8>) -> Result<Self> {
        Self::new(String::new(), String::new(), glb)
    }

    /// Container with a declared header kept as read.
    pub(crate) fn from_parts(
        header: Header,
        feature_table_json: String,
        batch_table_json: String,
        payload: Vec<u8>,
    ) -> Result<Self> {
        let write_header = layout_header(&feature_table_json, &batch_table_json, &payload)?;
        Ok(Self {
            header,
            write_header,
            feature_table_json: trim_padding(feature_table_json),
            batch_table_json: trim_padding(batch_table_json),
            payload,
        })
    }

    /// Parse a container from an in-memory buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        read_container(data)
    }

    /// Open a b3dm file for reading with memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "opening b3dm");
        if size == 0 {
            return Err(Error::TruncatedHeader { available: 0 });
        }

        // Safety: file is opened read-only and the map does not outlive this call
        let mmap = unsafe { Mmap::map(&file) }?;
        read_container(&mmap[..])
    }

    /// Write the container to a file, replacing any existing content.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<u64> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        let written = write_container_to(self, &mut writer)?;
        writer.flush()?;
        debug!(path = %path.as_ref().display(), written, "saved b3dm");
        Ok(written)
    }

    /// Copy with a new feature table. Length fields are recomputed.
    pub fn with_feature_table_json(&self, json: impl Into<String>) -> Result<Self> {
        Self::new(json, self.batch_table_json.clone(), self.payload.clone())
    }

    /// Copy with a new batch table. Length fields are recomputed.
    pub fn with_batch_table_json(&self, json: impl Into<String>) -> Result<Self> {
        Self::new(self.feature_table_json.clone(), json, self.payload.clone())
    }

    /// Header as declared by the source.
    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The header [`write_container`](super::write_container) will emit.
    #[inline]
    pub fn header_for_write(&self) -> Header {
        self.write_header
    }

    /// Feature table JSON with padding removed.
    #[inline]
    pub fn feature_table_json(&self) -> &str {
        &self.feature_table_json
    }

    /// Batch table JSON with padding removed.
    #[inline]
    pub fn batch_table_json(&self) -> &str {
        &self.batch_table_json
    }

    /// Embedded GLB bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

fn layout_header(feature_table_json: &str, batch_table_json: &str, payload: &[u8]) -> Result<Header> {
    // Padding is measured on the trimmed text, matching what gets written
    let feature_len = feature_table_json.trim_end_matches(PADDING_CHAR).len();
    let batch_len = batch_table_json.trim_end_matches(PADDING_CHAR).len();
    Header::for_segments(
        padded_len(feature_len),
        padded_len(batch_len),
        payload.len(),
    )
}

fn trim_padding(mut json: String) -> String {
    let len = json.trim_end_matches(PADDING_CHAR).len();
    json.truncate(len);
    json
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::format::HEADER_SIZE;

    #[test]
    fn test_new_computes_header() {
        let c = Container::new("{\"a\":1}", "", vec![0u8; 16]).unwrap();
        let h = c.header();
        assert_eq!(h.feature_table_json_byte_length, 8);
        assert_eq!(h.batch_table_json_byte_length, 0);
        assert_eq!(h.byte_length, (HEADER_SIZE + 8 + 16) as u32);
        assert_eq!(*h, c.header_for_write());
    }

    #[test]
    fn test_from_glb() {
        let c = Container::from_glb(vec![1, 2, 3]).unwrap();
        assert_eq!(c.feature_table_json(), "");
        assert_eq!(c.batch_table_json(), "");
        assert_eq!(c.payload(), &[1, 2, 3]);
        assert_eq!(c.header().byte_length, 31);
    }

    #[test]
    fn test_with_tables_keeps_payload() {
        let c = Container::from_glb(vec![9; 4]).unwrap();
        let edited = c.with_batch_table_json("{\"id\":[0]}").unwrap();
        assert_eq!(edited.payload(), c.payload());
        assert_eq!(edited.batch_table_json(), "{\"id\":[0]}");
        assert_eq!(edited.header().batch_table_json_byte_length, 16);
        // Source untouched
        assert_eq!(c.batch_table_json(), "");
        assert_eq!(c.into_payload(), vec![9; 4]);
    }

    #[test]
    fn test_trailing_spaces_are_normalized() {
        let c = Container::new("{\"a\":1}  ", "   ", vec![1, 2]).unwrap();
        assert_eq!(c.feature_table_json(), "{\"a\":1}");
        assert_eq!(c.batch_table_json(), "");
        assert_eq!(c.header().feature_table_json_byte_length, 8);
        assert_eq!(c.header().batch_table_json_byte_length, 0);

        let edited = c.with_feature_table_json("{} ").unwrap();
        assert_eq!(edited.feature_table_json(), "{}");
    }

    #[test]
    fn test_from_bytes() {
        let mut data = b"b3dm".to_vec();
        for v in [1u32, 38, 8, 0, 0, 0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(b"{}      \x01\x02");
        let c = Container::from_bytes(&data).unwrap();
        assert_eq!(c.feature_table_json(), "{}");
        assert_eq!(c.payload(), &[1, 2]);
        assert_eq!(c.header_for_write(), *c.header());
    }

    #[test]
    fn test_open_missing_file() {
        let result = Container::open("does/not/exist.b3dm");
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
