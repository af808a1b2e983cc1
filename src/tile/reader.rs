//! b3dm reader.
//!
//! Single forward pass over any [`Read`] source. Fatal failures abort the
//! read without exposing a partial container.

use std::io::Read;

use tracing::{debug, trace, warn};

use super::container::Container;
use super::format::*;
use super::header::Header;
use crate::util::{Error, Result};

/// Read a complete container from a byte source.
pub fn read_container<R: Read>(mut source: R) -> Result<Container> {
    let mut head = Vec::with_capacity(HEADER_SIZE);
    source.by_ref().take(HEADER_SIZE as u64).read_to_end(&mut head)?;
    let header = Header::parse(&head)?;

    trace!(?header, "parsed b3dm header");
    if !header.is_supported_version() {
        warn!(version = header.version, "unsupported b3dm version, reading anyway");
    }

    let feature_table_json = read_json_segment(
        &mut source,
        header.feature_table_json_byte_length,
        "feature table JSON",
    )?;
    skip_segment(
        &mut source,
        header.feature_table_binary_byte_length,
        "feature table binary",
    )?;
    let batch_table_json = read_json_segment(
        &mut source,
        header.batch_table_json_byte_length,
        "batch table JSON",
    )?;
    skip_segment(
        &mut source,
        header.batch_table_binary_byte_length,
        "batch table binary",
    )?;

    let payload = if header.byte_length == 0 {
        let mut rest = Vec::new();
        source.read_to_end(&mut rest)?;
        rest
    } else {
        // A byteLength smaller than the tables leaves no room for a payload;
        // the validator reports the mismatch.
        let remaining = (header.byte_length as u64).saturating_sub(header.payload_offset());
        read_segment(&mut source, remaining, "payload")?
    };

    debug!(
        byte_length = header.byte_length,
        feature_json = feature_table_json.len(),
        batch_json = batch_table_json.len(),
        payload = payload.len(),
        "read b3dm container"
    );

    Container::from_parts(header, feature_table_json, batch_table_json, payload)
}

/// Read exactly `len` bytes or fail with [`Error::TruncatedBody`].
fn read_segment<R: Read>(source: &mut R, len: u64, segment: &'static str) -> Result<Vec<u8>> {
    // Grow with the data rather than trusting the declared length up front.
    let mut buf = Vec::new();
    source.by_ref().take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(Error::TruncatedBody {
            segment,
            needed: len as usize,
            available: buf.len(),
        });
    }
    Ok(buf)
}

/// Read a JSON segment and strip its trailing space padding.
fn read_json_segment<R: Read>(source: &mut R, len: u32, segment: &'static str) -> Result<String> {
    let mut bytes = read_segment(source, len as u64, segment)?;
    let end = bytes
        .iter()
        .rposition(|&b| b != PADDING_BYTE)
        .map_or(0, |i| i + 1);
    bytes.truncate(end);
    Ok(String::from_utf8(bytes)?)
}

/// Consume a binary table body. JSON-only containers never carry one.
fn skip_segment<R: Read>(source: &mut R, len: u32, segment: &'static str) -> Result<()> {
    if len == 0 {
        return Ok(());
    }
    warn!(len, segment, "skipping binary table body");
    let skipped = std::io::copy(&mut source.by_ref().take(len as u64), &mut std::io::sink())?;
    if skipped < len as u64 {
        return Err(Error::TruncatedBody {
            segment,
            needed: len as usize,
            available: skipped as usize,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(fields: [u32; 6]) -> Vec<u8> {
        let mut data = b"b3dm".to_vec();
        for v in fields {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_read_minimal() {
        let mut data = header_bytes([1, 36, 8, 0, 0, 0]);
        data.extend_from_slice(b"{\"a\":1} ");
        let c = read_container(data.as_slice()).unwrap();
        assert_eq!(c.feature_table_json(), "{\"a\":1}");
        assert_eq!(c.header().feature_table_json_byte_length, 8);
        assert_eq!(c.batch_table_json(), "");
        assert!(c.payload().is_empty());
    }

    #[test]
    fn test_truncated_header() {
        let data = header_bytes([1, 28, 0, 0, 0, 0]);
        let result = read_container(&data[..27]);
        assert!(matches!(result, Err(Error::TruncatedHeader { available: 27 })));
    }

    #[test]
    fn test_truncated_json() {
        let mut data = header_bytes([1, 44, 16, 0, 0, 0]);
        data.extend_from_slice(b"{}  ");
        let result = read_container(data.as_slice());
        assert!(matches!(
            result,
            Err(Error::TruncatedBody { needed: 16, available: 4, .. })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let mut data = header_bytes([1, 44, 0, 0, 0, 0]);
        data.extend_from_slice(&[0u8; 10]);
        let result = read_container(data.as_slice());
        assert!(matches!(
            result,
            Err(Error::TruncatedBody { segment: "payload", needed: 16, available: 10 })
        ));
    }

    #[test]
    fn test_zero_byte_length_reads_to_end() {
        let mut data = header_bytes([1, 0, 0, 0, 0, 0]);
        data.extend_from_slice(&[7u8; 5]);
        let c = read_container(data.as_slice()).unwrap();
        assert_eq!(c.payload(), &[7u8; 5]);
    }

    #[test]
    fn test_trailing_bytes_not_consumed() {
        let mut data = header_bytes([1, 30, 0, 0, 0, 0]);
        data.extend_from_slice(&[1, 2, 3, 4]);
        let mut src = data.as_slice();
        let c = read_container(&mut src).unwrap();
        assert_eq!(c.payload(), &[1, 2]);
        assert_eq!(src, &[3, 4]);
    }

    #[test]
    fn test_binary_bodies_are_skipped() {
        let mut data = header_bytes([1, 28 + 8 + 4 + 2, 0, 8, 0, 4]);
        data.extend_from_slice(&[0xAA; 8]);
        data.extend_from_slice(&[0xBB; 4]);
        data.extend_from_slice(&[1, 2]);
        let c = read_container(data.as_slice()).unwrap();
        assert_eq!(c.payload(), &[1, 2]);
        assert!(c.header().has_binary_tables());
    }

    #[test]
    fn test_unsupported_version_still_reads() {
        let data = header_bytes([2, 28, 0, 0, 0, 0]);
        let c = read_container(data.as_slice()).unwrap();
        assert_eq!(c.header().version, 2);
    }

    #[test]
    fn test_short_byte_length_gives_empty_payload() {
        let mut data = header_bytes([1, 20, 8, 0, 0, 0]);
        data.extend_from_slice(b"{}      ");
        let c = read_container(data.as_slice()).unwrap();
        assert!(c.payload().is_empty());
        assert_eq!(c.feature_table_json(), "{}");
    }

    #[test]
    fn test_invalid_utf8_json() {
        let mut data = header_bytes([1, 36, 8, 0, 0, 0]);
        data.extend_from_slice(&[0xFF; 8]);
        assert!(matches!(read_container(data.as_slice()), Err(Error::Utf8(_))));
    }
}
