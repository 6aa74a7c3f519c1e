//! Parsing of proofs pasted by hand.
//!
//! Two accepted shapes: a JSON array of strings, or loose text with
//! entries separated by whitespace, commas or newlines (surrounding
//! brackets and quotes are stripped). Each entry must be `0x` followed by
//! exactly 64 hex chars; anything else is dropped.

use tracing::debug;

use claimcraft_core::{parse_hash, Hash};

/// Manual proof parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofParseError {
    #[error("No valid 32-byte hex values found in proof input")]
    Empty,
}

/// Parse a manually entered proof into an ordered list of hashes.
pub fn parse_manual_proof(input: &str) -> Result<Vec<Hash>, ProofParseError> {
    let candidates: Vec<String> = match serde_json::from_str::<Vec<String>>(input.trim()) {
        Ok(list) => list,
        Err(_) => input
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(|s| s.trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '\'')).to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    };

    let mut proof = Vec::with_capacity(candidates.len());
    for entry in &candidates {
        match parse_entry(entry) {
            Some(hash) => proof.push(hash),
            None => debug!("Dropping malformed proof entry: {:?}", entry),
        }
    }

    if proof.is_empty() {
        return Err(ProofParseError::Empty);
    }
    Ok(proof)
}

fn parse_entry(entry: &str) -> Option<Hash> {
    let entry = entry.trim();
    if entry.len() != 66 || !(entry.starts_with("0x") || entry.starts_with("0X")) {
        return None;
    }
    parse_hash(entry).ok()
}
