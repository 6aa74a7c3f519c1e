//! ClaimCraft Merkle
//!
//! Leaf encoding and sorted-pair binary Merkle tree for airdrop
//! distributions.
//!
//! The tree is built off-chain and its root is published to the
//! distribution contract, which verifies claims with the standard
//! sorted-pair verifier. Every byte of the leaf encoding and the pair
//! hashing must therefore match the contract exactly.

pub mod leaf;
pub mod manual;
pub mod tree;

pub use leaf::{abi_encode_recipient, encode_leaf, keccak256};
pub use manual::{parse_manual_proof, ProofParseError};
pub use tree::{hash_pair, process_proof, verify_proof, MerkleError, MerkleTree, Proof};
