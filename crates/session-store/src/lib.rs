//! Versioned snapshot persistence so a long exploration can resume after
//! interruption.
//!
//! On-disk layout: 4-byte magic, 2-byte little-endian format version, then
//! a zstd-compressed JSON document. Older or foreign files are rejected
//! cleanly; a corrupt snapshot never reaches the graph.

mod codec;
mod model;
mod store;

pub use codec::{decode, encode, FORMAT_VERSION, MAGIC};
pub use model::SessionSnapshot;
pub use store::SessionStore;

use thiserror::Error;

/// Persistence failures. `Corrupt` and `UnsupportedVersion` mean the caller
/// starts a fresh session rather than risking graph corruption.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot corrupt: {0}")]
    Corrupt(String),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("snapshot not found at {0}")]
    NotFound(String),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}
