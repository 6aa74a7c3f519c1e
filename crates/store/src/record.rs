//! Persisted distribution record and its JSON form.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use claimcraft_core::{hash_vec_hex, Address, Hash, Recipient, TokenAmount};
use claimcraft_merkle::{encode_leaf, verify_proof, MerkleTree, Proof};

use crate::{Result, StoreError};

/// Amount and proof for one recipient of one distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    pub amount: TokenAmount,
    pub proof: Proof,
}

#[derive(Serialize, Deserialize)]
struct ProofEntry(#[serde(with = "hash_vec_hex")] Proof);

/// Everything needed to serve claims for one Merkle root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct DistributionRecord {
    pub root: Hash,
    pub recipients: Vec<Recipient>,
    pub proofs: BTreeMap<Address, Proof>,
    pub distribution_contract: Option<Address>,
}

impl DistributionRecord {
    /// Snapshot a freshly built tree.
    pub fn from_tree(tree: &MerkleTree) -> Self {
        Self {
            root: tree.root(),
            recipients: tree.recipients().to_vec(),
            proofs: tree.proofs().into_iter().collect(),
            distribution_contract: None,
        }
    }

    /// Amount and proof for `recipient`, if listed.
    pub fn entitlement(&self, recipient: &Address) -> Option<Entitlement> {
        let amount = self.recipients.iter().find(|r| r.address == *recipient)?.amount;
        let proof = self.proofs.get(recipient)?.clone();
        Some(Entitlement { amount, proof })
    }

    /// Same root, recipient set and proofs; recipient order and the
    /// attached contract are ignored.
    pub fn same_content(&self, other: &DistributionRecord) -> bool {
        let mut ours = self.recipients.clone();
        let mut theirs = other.recipients.clone();
        ours.sort_by_key(|r| r.address);
        theirs.sort_by_key(|r| r.address);
        self.root == other.root && ours == theirs && self.proofs == other.proofs
    }

    /// Check structural completeness and that every proof verifies.
    pub fn validate(&self) -> Result<()> {
        if self.recipients.is_empty() {
            return Err(StoreError::InvalidRecord("no recipients".to_string()));
        }

        let mut seen = HashSet::with_capacity(self.recipients.len());
        for r in &self.recipients {
            if !seen.insert(r.address) {
                return Err(StoreError::InvalidRecord(format!("duplicate recipient {}", r.address)));
            }
            let proof = self.proofs.get(&r.address).ok_or_else(|| {
                StoreError::InvalidRecord(format!("missing proof for {}", r.address))
            })?;
            if !verify_proof(&encode_leaf(r), proof, &self.root) {
                return Err(StoreError::InvalidRecord(format!(
                    "proof for {} does not verify against root",
                    r.address
                )));
            }
        }

        if let Some(extra) = self.proofs.keys().find(|a| !seen.contains(*a)) {
            return Err(StoreError::InvalidRecord(format!("proof for unknown recipient {}", extra)));
        }

        Ok(())
    }
}

/// Wire shape. Every field is optional here so a missing one is reported
/// as an invalid record instead of a generic decode error.
#[derive(Serialize, Deserialize)]
struct RawRecord {
    #[serde(default, with = "opt_hash_hex", skip_serializing_if = "Option::is_none")]
    root: Option<Hash>,
    #[serde(default)]
    recipients: Option<Vec<Recipient>>,
    #[serde(default)]
    proofs: Option<BTreeMap<Address, ProofEntry>>,
    #[serde(rename = "distributionContract", default)]
    distribution_contract: Option<Address>,
}

impl TryFrom<RawRecord> for DistributionRecord {
    type Error = StoreError;

    fn try_from(raw: RawRecord) -> Result<Self> {
        let root = raw.root.ok_or_else(|| StoreError::InvalidRecord("missing root".to_string()))?;
        let recipients = raw
            .recipients
            .ok_or_else(|| StoreError::InvalidRecord("missing recipients".to_string()))?;
        let proofs = raw
            .proofs
            .ok_or_else(|| StoreError::InvalidRecord("missing proofs".to_string()))?
            .into_iter()
            .map(|(addr, ProofEntry(proof))| (addr, proof))
            .collect();

        Ok(Self {
            root,
            recipients,
            proofs,
            distribution_contract: raw.distribution_contract,
        })
    }
}

impl From<DistributionRecord> for RawRecord {
    fn from(record: DistributionRecord) -> Self {
        Self {
            root: Some(record.root),
            recipients: Some(record.recipients),
            proofs: Some(
                record
                    .proofs
                    .into_iter()
                    .map(|(addr, proof)| (addr, ProofEntry(proof)))
                    .collect(),
            ),
            distribution_contract: record.distribution_contract,
        }
    }
}

mod opt_hash_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use claimcraft_core::{hex_encode, parse_hash, Hash};

    pub fn serialize<S: Serializer>(hash: &Option<Hash>, serializer: S) -> Result<S::Ok, S::Error> {
        match hash {
            Some(h) => serializer.serialize_str(&hex_encode(h)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Hash>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| parse_hash(&s).map_err(serde::de::Error::custom)).transpose()
    }
}
