//! Snapshot wire format.

use crate::model::SessionSnapshot;
use crate::StoreError;

/// File magic, bumped together with `FORMAT_VERSION` on layout changes.
pub const MAGIC: &[u8; 4] = b"SWKS";
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;
const ZSTD_LEVEL: i32 = 3;

/// Serialize a snapshot into the framed, compressed form.
pub fn encode(snapshot: &SessionSnapshot) -> Result<Vec<u8>, StoreError> {
    let json =
        serde_json::to_vec(snapshot).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    let compressed =
        zstd::encode_all(json.as_slice(), ZSTD_LEVEL).map_err(StoreError::Io)?;

    let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Parse framed bytes back into a snapshot, rejecting foreign or damaged
/// input instead of misreading it.
pub fn decode(bytes: &[u8]) -> Result<SessionSnapshot, StoreError> {
    if bytes.len() < HEADER_LEN {
        return Err(StoreError::Corrupt("truncated header".to_string()));
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(StoreError::Corrupt("bad magic".to_string()));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: version,
            expected: FORMAT_VERSION,
        });
    }

    let json = zstd::decode_all(&bytes[HEADER_LEN..])
        .map_err(|err| StoreError::Corrupt(format!("decompress failed: {err}")))?;
    serde_json::from_slice(&json).map_err(|err| StoreError::Corrupt(err.to_string()))
}
