//! Batched 3D Model format constants and layout helpers.

/// Magic bytes at the start of a b3dm file.
pub const B3DM_MAGIC: &[u8; 4] = b"b3dm";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 28;

/// Offset of the version in the header.
pub const VERSION_OFFSET: usize = 4;

/// Offset of the total byte length in the header.
pub const BYTE_LENGTH_OFFSET: usize = 8;

/// Offset of the feature table JSON length in the header.
pub const FEATURE_TABLE_JSON_OFFSET: usize = 12;

/// Offset of the feature table binary length in the header.
pub const FEATURE_TABLE_BINARY_OFFSET: usize = 16;

/// Offset of the batch table JSON length in the header.
pub const BATCH_TABLE_JSON_OFFSET: usize = 20;

/// Offset of the batch table binary length in the header.
pub const BATCH_TABLE_BINARY_OFFSET: usize = 24;

/// The only format version this crate writes.
pub const CURRENT_VERSION: u32 = 1;

/// JSON segments are padded to a multiple of this many bytes.
pub const SEGMENT_ALIGNMENT: usize = 8;

/// Filler byte appended to JSON segments (ASCII space).
pub const PADDING_BYTE: u8 = 0x20;

/// Number of padding bytes needed to bring `len` up to the segment alignment.
#[inline]
pub const fn padding_for(len: usize) -> usize {
    (SEGMENT_ALIGNMENT - len % SEGMENT_ALIGNMENT) % SEGMENT_ALIGNMENT
}

/// Length of a segment of `len` bytes once padded. Zero stays zero.
#[inline]
pub const fn padded_len(len: usize) -> usize {
    len + padding_for(len)
}

/// Check whether a declared segment length honours the alignment rule.
#[inline]
pub const fn is_aligned(len: u32, alignment: u32) -> bool {
    alignment == 0 || len % alignment == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic() {
        assert_eq!(B3DM_MAGIC, b"b3dm");
        assert_eq!(B3DM_MAGIC.len(), 4);
    }

    #[test]
    fn test_header_offsets() {
        // Seven u32 fields, magic included
        assert_eq!(BATCH_TABLE_BINARY_OFFSET + 4, HEADER_SIZE);
        assert_eq!(HEADER_SIZE, 7 * 4);
    }

    #[test]
    fn test_padding() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 8);
        assert_eq!(padded_len(7), 8);
        assert_eq!(padded_len(8), 8);
        assert_eq!(padded_len(9), 16);
        assert_eq!(padding_for(7), 1);
        assert_eq!(padding_for(16), 0);
    }

    #[test]
    fn test_alignment() {
        assert!(is_aligned(0, 8));
        assert!(is_aligned(24, 8));
        assert!(!is_aligned(5, 8));
        // Zero alignment disables the check
        assert!(is_aligned(5, 0));
    }
}
