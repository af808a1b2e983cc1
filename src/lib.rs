//! # b3dm
//!
//! Reader, writer and validator for Batched 3D Model (.b3dm) tiles, the
//! binary container used by 3D Tiles to ship a glTF asset together with
//! its feature and batch tables.
//!
//! ## Modules
//!
//! - [`util`] - Errors
//! - [`tile`] - Container codec (header, reader, writer, validator)
//! - [`glb`] - Informational inspection of the embedded GLB payload
//!
//! ## Example
//!
//! ```no_run
//! use b3dm::tile::{validate_container, write_container, Container, ValidationConfig};
//!
//! let tile = Container::open("tile.b3dm")?;
//! for issue in validate_container(&tile, &ValidationConfig::default()) {
//!     println!("{}", issue);
//! }
//!
//! let edited = tile.with_batch_table_json(r#"{"name":["roof"]}"#)?;
//! let bytes = write_container(&edited);
//! # Ok::<(), b3dm::Error>(())
//! ```

pub mod util;
pub mod tile;
pub mod glb;

// Re-export commonly used types
pub use util::{Error, Result};
pub use tile::{read_container, validate, write_container, Container, Header, ValidationIssue};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::tile::{
        read_container, validate, validate_container, write_container, write_container_to,
        Container, Header, ValidationConfig, ValidationIssue,
    };
    pub use crate::glb::{inspect_glb, GlbSummary, PayloadIssue, PayloadReport};
}
