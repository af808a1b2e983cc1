//! b3dm writer.
//!
//! Every header field is derived from the container content, never copied
//! from the header it was read with.

use std::io::Write;

use tracing::trace;

use super::container::Container;
use super::format::*;
use crate::util::Result;

/// Serialize a container into a new byte buffer.
pub fn write_container(container: &Container) -> Vec<u8> {
    let header = container.header_for_write();
    let mut out = Vec::with_capacity(header.byte_length as usize);
    // Vec<u8> as a sink never fails
    let _ = write_container_to(container, &mut out);
    out
}

/// Serialize a container into `w` and return the number of bytes written.
pub fn write_container_to<W: Write>(container: &Container, mut w: W) -> Result<u64> {
    let header = container.header_for_write();
    trace!(?header, "writing b3dm header");

    header.write_to(&mut w)?;
    write_padded_json(&mut w, container.feature_table_json())?;
    write_padded_json(&mut w, container.batch_table_json())?;
    w.write_all(container.payload())?;

    Ok(header.byte_length as u64)
}

fn write_padded_json<W: Write>(w: &mut W, json: &str) -> Result<()> {
    const SPACES: [u8; SEGMENT_ALIGNMENT] = [PADDING_BYTE; SEGMENT_ALIGNMENT];

    w.write_all(json.as_bytes())?;
    w.write_all(&SPACES[..padding_for(json.len())])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::header::Header;

    #[test]
    fn test_write_layout() {
        let c = Container::new("{\"a\":1}", "{}", vec![0xAB; 3]).unwrap();
        let bytes = write_container(&c);

        assert_eq!(&bytes[0..4], B3DM_MAGIC);
        assert_eq!(bytes.len(), HEADER_SIZE + 8 + 8 + 3);

        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.byte_length as usize, bytes.len());
        assert_eq!(header.feature_table_json_byte_length, 8);
        assert_eq!(header.batch_table_json_byte_length, 8);
        assert_eq!(header.feature_table_binary_byte_length, 0);
        assert_eq!(header.batch_table_binary_byte_length, 0);

        assert_eq!(&bytes[28..36], b"{\"a\":1} ");
        assert_eq!(&bytes[36..44], b"{}      ");
        assert_eq!(&bytes[44..], &[0xAB; 3]);
    }

    #[test]
    fn test_empty_tables_stay_empty() {
        let c = Container::from_glb(vec![0u8; 16]).unwrap();
        let bytes = write_container(&c);
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.byte_length, 44);
        assert_eq!(header.feature_table_json_byte_length, 0);
        assert_eq!(header.batch_table_json_byte_length, 0);
        assert_eq!(bytes.len(), 44);
    }

    #[test]
    fn test_stale_header_is_ignored() {
        // Header claims lengths that do not match the content
        let stale = Header {
            byte_length: 999,
            feature_table_json_byte_length: 5,
            version: 7,
            ..Header::default()
        };
        let c = Container::from_parts(stale, "{}".into(), String::new(), vec![1]).unwrap();
        let header = Header::parse(&write_container(&c)).unwrap();
        assert_eq!(header.version, CURRENT_VERSION);
        assert_eq!(header.feature_table_json_byte_length, 8);
        assert_eq!(header.byte_length, 28 + 8 + 1);
    }

    #[test]
    fn test_write_to_reports_length() {
        let c = Container::new("", "{\"x\":true}", vec![0; 5]).unwrap();
        let mut sink = Vec::new();
        let n = write_container_to(&c, &mut sink).unwrap();
        assert_eq!(n as usize, sink.len());
        assert_eq!(sink, write_container(&c));
    }

    #[test]
    fn test_write_failure_surfaces_io_error() {
        let c = Container::from_glb(vec![0; 64]).unwrap();
        let mut small = [0u8; 10];
        let result = write_container_to(&c, &mut small[..]);
        assert!(matches!(result, Err(crate::util::Error::Io(_))));
    }
}
