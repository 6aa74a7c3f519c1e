//! Leaf encoding.
//!
//! A leaf is `keccak256(abi.encode(address, uint256))`: the address
//! left-padded to a 32-byte word followed by the amount as a 32-byte
//! big-endian word.

use sha3::{Digest, Keccak256};

use claimcraft_core::{Hash, Recipient};

/// Keccak-256 digest of arbitrary bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

/// ABI encoding of `(address, uint256)` for one recipient.
pub fn abi_encode_recipient(recipient: &Recipient) -> [u8; 64] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&recipient.address.to_word());
    buf[32..].copy_from_slice(&recipient.amount.to_be_bytes());
    buf
}

/// Leaf hash for one recipient.
pub fn encode_leaf(recipient: &Recipient) -> Hash {
    keccak256(abi_encode_recipient(recipient))
}
