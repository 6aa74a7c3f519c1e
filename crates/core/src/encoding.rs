//! Hex encoding helpers and serde adapters for 32-byte hashes.
//!
//! Everything that leaves the process (exports, CLI output, logs) uses
//! lowercase `0x`-prefixed hex so values can be pasted straight into a
//! block explorer or contract call.

use crate::{ClaimCraftError, Result};

/// 32-byte keccak256 digest (leaf, node or root)
pub type Hash = [u8; 32];

/// Encode bytes as lowercase `0x`-prefixed hex.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Short form for log lines: first 8 bytes of the value.
pub fn short_hex(bytes: &[u8]) -> String {
    let end = bytes.len().min(8);
    hex::encode(&bytes[..end])
}

/// Parse a 32-byte hash from hex, with or without the `0x` prefix.
pub fn parse_hash(s: &str) -> Result<Hash> {
    let trimmed = s.trim();
    let cleaned = trimmed.strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if cleaned.len() != 64 {
        return Err(ClaimCraftError::InvalidHash(format!(
            "expected 64 hex chars, got {}",
            cleaned.len()
        )));
    }
    let mut out = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut out)
        .map_err(|e| ClaimCraftError::InvalidHash(e.to_string()))?;
    Ok(out)
}

/// Serde adapter: `Hash` as a `0x` hex string.
pub mod hash_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{hex_encode, parse_hash, Hash};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex_encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hash(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: `Vec<Hash>` as an array of `0x` hex strings.
pub mod hash_vec_hex {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{hex_encode, parse_hash, Hash};

    pub fn serialize<S: Serializer>(hashes: &[Hash], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(hashes.len()))?;
        for hash in hashes {
            seq.serialize_element(&hex_encode(hash))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Hash>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| parse_hash(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
