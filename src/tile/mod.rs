//! Batched 3D Model (.b3dm) container codec.
//!
//! A b3dm tile wraps a binary glTF asset together with two JSON tables.
//! This module reads, writes and validates the container framing; the
//! embedded GLB is carried as opaque bytes.
//!
//! ## File Structure
//!
//! ```text
//! +--------------------------+
//! | Magic: "b3dm"            |  4 bytes
//! +--------------------------+
//! | Version                  |  u32 LE (1)
//! | Byte length              |  u32 LE (whole file)
//! | Feature table JSON len   |  u32 LE
//! | Feature table binary len |  u32 LE (always 0 on write)
//! | Batch table JSON len     |  u32 LE
//! | Batch table binary len   |  u32 LE (always 0 on write)
//! +--------------------------+
//! | Feature table JSON       |  space padded to a multiple of 8
//! | Batch table JSON         |  space padded to a multiple of 8
//! +--------------------------+
//! | GLB payload              |  remaining bytes
//! +--------------------------+
//! ```

mod format;
mod header;
mod container;
mod reader;
mod writer;
mod validator;

pub use format::*;
pub use header::*;
pub use container::*;
pub use reader::*;
pub use writer::*;
pub use validator::*;
