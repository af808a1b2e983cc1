//! Binary glTF (GLB) payload inspection.
//!
//! Purely informational: the b3dm codec never depends on the outcome. The
//! inspector checks the GLB framing, parses the JSON chunk and reports a
//! short summary, or the first problem found.

use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Magic bytes at the start of a GLB file.
pub const GLB_MAGIC: &[u8; 4] = b"glTF";

/// GLB container version understood by the inspector.
pub const GLB_VERSION: u32 = 2;

/// GLB header: magic, version, total length.
pub const GLB_HEADER_SIZE: usize = 12;

/// Chunk header: length, type.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Chunk type tag for the JSON chunk ("JSON").
pub const CHUNK_JSON: u32 = 0x4E4F_534A;

/// Chunk type tag for the binary chunk ("BIN\0").
pub const CHUNK_BIN: u32 = 0x004E_4942;

/// Summary of a GLB that parsed cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlbSummary {
    pub container_version: u32,
    pub generator: Option<String>,
    pub asset_version: String,
    pub mesh_count: usize,
    pub primitive_count: usize,
    /// Declared length of the first buffer, if any.
    pub buffer_byte_length: Option<u64>,
}

/// Why a payload failed inspection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadIssue {
    /// Wrong magic, unsupported version or malformed JSON
    #[error("schema error: {0}")]
    Schema(String),

    #[error("truncated data: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// An index or buffer reference points at nothing
    #[error("link error: {0}")]
    Link(String),
}

/// Outcome of [`inspect_glb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadReport {
    Valid(GlbSummary),
    Invalid(PayloadIssue),
}

impl PayloadReport {
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn summary(&self) -> Option<&GlbSummary> {
        match self {
            Self::Valid(s) => Some(s),
            Self::Invalid(_) => None,
        }
    }

    pub fn issue(&self) -> Option<&PayloadIssue> {
        match self {
            Self::Invalid(i) => Some(i),
            Self::Valid(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct Document {
    asset: Asset,
    #[serde(default)]
    meshes: Vec<Mesh>,
    #[serde(default)]
    accessors: Vec<serde_json::Value>,
    #[serde(default)]
    buffers: Vec<Buffer>,
}

#[derive(Deserialize)]
struct Asset {
    version: String,
    generator: Option<String>,
}

#[derive(Deserialize)]
struct Mesh {
    primitives: Vec<Primitive>,
}

#[derive(Deserialize)]
struct Primitive {
    #[serde(default)]
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Buffer {
    byte_length: u64,
    uri: Option<String>,
}

/// Inspect a GLB blob.
pub fn inspect_glb(data: &[u8]) -> PayloadReport {
    match inspect(data) {
        Ok(summary) => PayloadReport::Valid(summary),
        Err(issue) => {
            debug!(%issue, "payload inspection failed");
            PayloadReport::Invalid(issue)
        }
    }
}

fn inspect(data: &[u8]) -> Result<GlbSummary, PayloadIssue> {
    require(data, GLB_HEADER_SIZE)?;
    if &data[0..4] != GLB_MAGIC {
        return Err(PayloadIssue::Schema(format!(
            "not a binary glTF, magic is {:?}",
            String::from_utf8_lossy(&data[0..4])
        )));
    }

    let version = LittleEndian::read_u32(&data[4..8]);
    if version != GLB_VERSION {
        return Err(PayloadIssue::Schema(format!("glTF version {} not supported", version)));
    }

    let length = LittleEndian::read_u32(&data[8..12]) as usize;
    require(data, length)?;
    let data = &data[..length];

    let (json_type, json) = chunk_at(data, GLB_HEADER_SIZE)?;
    if json_type != CHUNK_JSON {
        return Err(PayloadIssue::Schema(format!(
            "first chunk must be JSON, found type 0x{:08x}",
            json_type
        )));
    }

    let doc: Document =
        serde_json::from_slice(json).map_err(|e| PayloadIssue::Schema(e.to_string()))?;

    // Chunks are 4-byte aligned; the JSON chunk length already includes padding
    let bin_pos = GLB_HEADER_SIZE + CHUNK_HEADER_SIZE + json.len();
    let has_bin = if data.len() >= bin_pos + CHUNK_HEADER_SIZE {
        let (kind, _) = chunk_at(data, bin_pos)?;
        kind == CHUNK_BIN
    } else {
        false
    };

    check_links(&doc, has_bin)?;

    Ok(GlbSummary {
        container_version: version,
        generator: doc.asset.generator,
        asset_version: doc.asset.version,
        mesh_count: doc.meshes.len(),
        primitive_count: doc.meshes.iter().map(|m| m.primitives.len()).sum(),
        buffer_byte_length: doc.buffers.first().map(|b| b.byte_length),
    })
}

fn require(data: &[u8], needed: usize) -> Result<(), PayloadIssue> {
    if data.len() < needed {
        return Err(PayloadIssue::Truncated { needed, available: data.len() });
    }
    Ok(())
}

/// Chunk type and body at `pos`.
fn chunk_at(data: &[u8], pos: usize) -> Result<(u32, &[u8]), PayloadIssue> {
    require(data, pos + CHUNK_HEADER_SIZE)?;
    let len = LittleEndian::read_u32(&data[pos..pos + 4]) as usize;
    let kind = LittleEndian::read_u32(&data[pos + 4..pos + 8]);
    let start = pos + CHUNK_HEADER_SIZE;
    require(data, start + len)?;
    Ok((kind, &data[start..start + len]))
}

fn check_links(doc: &Document, has_bin: bool) -> Result<(), PayloadIssue> {
    let accessor_count = doc.accessors.len();
    for (m, mesh) in doc.meshes.iter().enumerate() {
        for (p, prim) in mesh.primitives.iter().enumerate() {
            let refs = prim
                .attributes
                .iter()
                .map(|(name, &idx)| (name.as_str(), idx))
                .chain(prim.indices.map(|idx| ("indices", idx)));
            for (name, idx) in refs {
                if idx >= accessor_count {
                    return Err(PayloadIssue::Link(format!(
                        "mesh {} primitive {} {} references accessor {}, only {} defined",
                        m, p, name, idx, accessor_count
                    )));
                }
            }
        }
    }

    for (i, buffer) in doc.buffers.iter().enumerate() {
        // Only the first buffer may live in the BIN chunk
        if buffer.uri.is_none() && (i != 0 || !has_bin) {
            return Err(PayloadIssue::Link(format!(
                "buffer {} has no uri and no BIN chunk backs it",
                i
            )));
        }
    }

    Ok(())
}

/// Build a minimal GLB around a JSON document and optional binary chunk.
///
/// Used by tests and by tools that need a placeholder payload.
pub fn build_glb(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
    let pad4 = |n: usize| (4 - n % 4) % 4;

    let json_len = json.len() + pad4(json.len());
    let bin_len = bin.map(|b| b.len() + pad4(b.len()));
    let total = GLB_HEADER_SIZE
        + CHUNK_HEADER_SIZE
        + json_len
        + bin_len.map_or(0, |n| CHUNK_HEADER_SIZE + n);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json.as_bytes());
    out.resize(out.len() + pad4(json.len()), b' ');

    if let (Some(bin), Some(bin_len)) = (bin, bin_len) {
        out.extend_from_slice(&(bin_len as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(out.len() + pad4(bin.len()), 0);
    }
    out
}
