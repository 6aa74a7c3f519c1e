//! Sorted-pair binary Merkle tree.
//!
//! Leaves are sorted before building so the root depends only on the
//! set of recipients, never on input order. Each parent is
//! `keccak256(min(a, b) ++ max(a, b))`. When a level has an odd number
//! of nodes the last one is carried up unchanged and contributes no
//! proof entry at that level.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use claimcraft_core::{short_hex, Address, Hash, Recipient};

use crate::leaf::{encode_leaf, keccak256};

/// Sibling hashes from leaf to root.
pub type Proof = Vec<Hash>;

/// Tree construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    #[error("Recipient list is empty")]
    EmptyRecipients,

    #[error("Duplicate recipient address: {0}")]
    DuplicateAddress(Address),
}

/// Hash two nodes in canonical (sorted) order.
pub fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo);
    buf[32..].copy_from_slice(hi);
    keccak256(buf)
}

/// Fold a leaf with its proof to the root it implies.
pub fn process_proof(leaf: &Hash, proof: &[Hash]) -> Hash {
    proof.iter().fold(*leaf, |acc, sibling| hash_pair(&acc, sibling))
}

/// Check that `leaf` is included under `root`.
pub fn verify_proof(leaf: &Hash, proof: &[Hash], root: &Hash) -> bool {
    process_proof(leaf, proof) == *root
}

/// A fully built distribution tree.
///
/// Construction is all-or-nothing: a `MerkleTree` value always carries a
/// root and a proof for every recipient.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// levels[0] = sorted leaves, last level = [root]
    levels: Vec<Vec<Hash>>,
    recipients: Vec<Recipient>,
    leaf_of: HashMap<Address, Hash>,
}

impl MerkleTree {
    /// Build a tree from a recipient list.
    ///
    /// Rejects empty input and duplicate addresses before hashing anything.
    pub fn build(recipients: &[Recipient]) -> Result<Self, MerkleError> {
        if recipients.is_empty() {
            return Err(MerkleError::EmptyRecipients);
        }

        let mut seen = HashSet::with_capacity(recipients.len());
        for r in recipients {
            if !seen.insert(r.address) {
                return Err(MerkleError::DuplicateAddress(r.address));
            }
        }

        let leaf_of: HashMap<Address, Hash> = recipients
            .iter()
            .map(|r| (r.address, encode_leaf(r)))
            .collect();

        let mut leaves: Vec<Hash> = leaf_of.values().copied().collect();
        leaves.sort_unstable();

        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let current = &levels[levels.len() - 1];
            let next: Vec<Hash> = current
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => hash_pair(a, b),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            levels.push(next);
        }

        let tree = Self {
            levels,
            recipients: recipients.to_vec(),
            leaf_of,
        };

        debug!(
            "Built Merkle tree: {} recipients, depth {}, root {}",
            tree.len(),
            tree.levels.len() - 1,
            short_hex(&tree.root()),
        );

        Ok(tree)
    }

    /// Merkle root.
    pub fn root(&self) -> Hash {
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of recipients (leaves).
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Recipients in input order.
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Leaf hash for an address, if it is in the tree.
    pub fn leaf_of(&self, address: &Address) -> Option<Hash> {
        self.leaf_of.get(address).copied()
    }

    /// Inclusion proof for an address, leaf to root.
    pub fn proof_of(&self, address: &Address) -> Option<Proof> {
        let leaf = self.leaf_of(address)?;
        let mut index = self.levels[0].binary_search(&leaf).ok()?;

        let mut proof = Vec::with_capacity(self.levels.len() - 1);
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if sibling < level.len() {
                proof.push(level[sibling]);
            }
            index /= 2;
        }
        Some(proof)
    }

    /// Proof for every recipient.
    pub fn proofs(&self) -> HashMap<Address, Proof> {
        self.recipients
            .iter()
            .filter_map(|r| self.proof_of(&r.address).map(|p| (r.address, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimcraft_core::TokenAmount;
    use rand::seq::SliceRandom;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn recipients(n: u8) -> Vec<Recipient> {
        (1..=n).map(|i| Recipient::new(addr(i), u64::from(i) * 100)).collect()
    }

    #[test]
    fn test_hash_pair_commutative() {
        let a = [0x01; 32];
        let b = [0x02; 32];
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let r = Recipient::new(addr(0xAA), 1000u64);
        let tree = MerkleTree::build(&[r]).unwrap();
        assert_eq!(tree.root(), encode_leaf(&r));
        assert!(tree.proof_of(&r.address).unwrap().is_empty());
    }

    #[test]
    fn test_two_leaf_root() {
        let a = Recipient::new(addr(0xAA), 1000u64);
        let b = Recipient::new(addr(0xBB), 500u64);
        let tree = MerkleTree::build(&[a, b]).unwrap();
        assert_eq!(tree.root(), hash_pair(&encode_leaf(&a), &encode_leaf(&b)));
        assert_eq!(tree.proof_of(&a.address).unwrap(), vec![encode_leaf(&b)]);
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(MerkleTree::build(&[]).unwrap_err(), MerkleError::EmptyRecipients);
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let list = [
            Recipient::new(addr(0xAA), 100u64),
            Recipient::new(addr(0xAA), 200u64),
        ];
        assert_eq!(
            MerkleTree::build(&list).unwrap_err(),
            MerkleError::DuplicateAddress(addr(0xAA))
        );
    }

    #[test]
    fn test_order_independence() {
        let mut list = recipients(13);
        let root = MerkleTree::build(&list).unwrap().root();

        let mut rng = rand::thread_rng();
        for _ in 0..10 {
            list.shuffle(&mut rng);
            assert_eq!(MerkleTree::build(&list).unwrap().root(), root);
        }
    }

    #[test]
    fn test_every_proof_verifies_for_sizes_1_to_17() {
        for n in 1..=17u8 {
            let list = recipients(n);
            let tree = MerkleTree::build(&list).unwrap();
            let root = tree.root();
            for r in &list {
                let proof = tree.proof_of(&r.address).unwrap();
                assert!(
                    verify_proof(&encode_leaf(r), &proof, &root),
                    "proof failed for size {} recipient {}",
                    n,
                    r.address
                );
            }
        }
    }

    #[test]
    fn test_odd_node_carried_up() {
        // Three leaves: the lone third leaf joins at the next level.
        let list = recipients(3);
        let tree = MerkleTree::build(&list).unwrap();
        let mut leaves: Vec<Hash> = list.iter().map(encode_leaf).collect();
        leaves.sort_unstable();

        let expected = hash_pair(&hash_pair(&leaves[0], &leaves[1]), &leaves[2]);
        assert_eq!(tree.root(), expected);

        let lone = list.iter().find(|r| encode_leaf(r) == leaves[2]).unwrap();
        assert_eq!(tree.proof_of(&lone.address).unwrap().len(), 1);
    }

    #[test]
    fn test_proof_exclusivity() {
        let list = recipients(8);
        let tree = MerkleTree::build(&list).unwrap();
        let root = tree.root();

        let proof_a = tree.proof_of(&list[0].address).unwrap();
        for other in &list[1..] {
            assert!(!verify_proof(&encode_leaf(other), &proof_a, &root));
        }

        let tampered = Recipient { address: list[0].address, amount: TokenAmount::from(1u64) };
        assert!(!verify_proof(&encode_leaf(&tampered), &proof_a, &root));
    }

    #[test]
    fn test_amount_change_changes_root() {
        let a = Recipient::new(addr(0xAA), 1000u64);
        let b = Recipient::new(addr(0xBB), 500u64);
        let tree = MerkleTree::build(&[a, b]).unwrap();
        let other = MerkleTree::build(&[Recipient::new(addr(0xAA), 999u64), b]).unwrap();

        let proof = tree.proof_of(&a.address).unwrap();
        assert!(verify_proof(&encode_leaf(&a), &proof, &tree.root()));
        assert!(!verify_proof(&encode_leaf(&a), &proof, &other.root()));
    }

    #[test]
    fn test_proofs_map_covers_all() {
        let list = recipients(6);
        let tree = MerkleTree::build(&list).unwrap();
        let proofs = tree.proofs();
        assert_eq!(proofs.len(), 6);
        assert_eq!(tree.len(), 6);
        assert!(tree.proof_of(&addr(0xEE)).is_none());
        assert!(tree.leaf_of(&addr(0xEE)).is_none());
    }

    #[test]
    fn test_recipients_keep_input_order() {
        let mut list = recipients(5);
        list.reverse();
        let tree = MerkleTree::build(&list).unwrap();
        assert_eq!(tree.recipients(), list.as_slice());
    }
}
