//! Proof store: distribution records indexed by root and by contract.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use claimcraft_core::{hex_encode, short_hex, Address, Hash};

use crate::{DistributionRecord, Entitlement, KvStore, Result, StoreError};

/// Backend key holding the serialized record index
pub const DISTRIBUTIONS_KEY: &str = "claimcraft.distributions";

/// How a caller names a distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKey {
    Root(Hash),
    Contract(Address),
}

impl From<Hash> for DistributionKey {
    fn from(root: Hash) -> Self {
        DistributionKey::Root(root)
    }
}

impl From<Address> for DistributionKey {
    fn from(contract: Address) -> Self {
        DistributionKey::Contract(contract)
    }
}

impl std::fmt::Display for DistributionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionKey::Root(root) => write!(f, "root {}", hex_encode(root)),
            DistributionKey::Contract(addr) => write!(f, "contract {}", addr),
        }
    }
}

#[derive(Default)]
struct Index {
    records: HashMap<Hash, Arc<DistributionRecord>>,
    /// contract -> root; lookups by contract always go through the root
    aliases: HashMap<Address, Hash>,
}

impl Index {
    fn resolve(&self, key: &DistributionKey) -> Option<Hash> {
        match key {
            DistributionKey::Root(root) => Some(*root),
            DistributionKey::Contract(addr) => self.aliases.get(addr).copied(),
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    distributions: Vec<DistributionRecord>,
}

/// Local cache of built distributions and their proofs.
///
/// Writers hold the lock across persistence, so readers never see a
/// record that is in memory but not yet on the backend. The on-chain
/// root stays authoritative; a miss here only means the user has to
/// supply the proof themselves.
pub struct ProofStore {
    backend: Arc<dyn KvStore>,
    index: RwLock<Index>,
}

impl ProofStore {
    /// Load the persisted index from `backend`; an absent key is an empty store.
    pub fn open(backend: Arc<dyn KvStore>) -> Result<Self> {
        let mut index = Index::default();

        if let Some(bytes) = backend.get(DISTRIBUTIONS_KEY)? {
            let file: StoreFile = serde_json::from_slice(&bytes)?;
            for record in file.distributions {
                if let Err(e) = record.validate() {
                    warn!("Skipping stored distribution {}: {}", short_hex(&record.root), e);
                    continue;
                }
                if index.records.contains_key(&record.root) {
                    warn!("Skipping duplicate stored distribution {}", short_hex(&record.root));
                    continue;
                }
                if let Some(contract) = record.distribution_contract {
                    if let Some(other) = index.aliases.get(&contract) {
                        warn!(
                            "Skipping stored distribution {}: contract {} already points at {}",
                            short_hex(&record.root),
                            contract,
                            short_hex(other)
                        );
                        continue;
                    }
                    index.aliases.insert(contract, record.root);
                }
                index.records.insert(record.root, Arc::new(record));
            }
            info!(
                "Loaded proof store: {} distributions, {} contract aliases",
                index.records.len(),
                index.aliases.len()
            );
        } else {
            debug!("No persisted distributions, starting empty");
        }

        Ok(Self {
            backend,
            index: RwLock::new(index),
        })
    }

    /// Store a record under its root.
    ///
    /// Re-saving identical content is a no-op, except that a contract the
    /// stored copy lacks is attached. Different content under an existing
    /// root is a conflict.
    pub fn save(&self, record: DistributionRecord) -> Result<()> {
        let mut index = self.index.write();

        if let Some(existing) = index.records.get(&record.root) {
            if existing.same_content(&record) {
                return match record.distribution_contract {
                    Some(contract) => self.attach_locked(&mut index, &record.root, contract),
                    None => {
                        debug!("Distribution {} already stored", short_hex(&record.root));
                        Ok(())
                    }
                };
            }
            return Err(StoreError::Conflict(format!(
                "root {} already stored with different content",
                hex_encode(record.root)
            )));
        }

        if let Some(contract) = record.distribution_contract {
            if let Some(other) = index.aliases.get(&contract) {
                return Err(StoreError::Conflict(format!(
                    "contract {} already points at root {}",
                    contract,
                    hex_encode(other)
                )));
            }
        }

        let root = record.root;
        let contract = record.distribution_contract;
        let record = Arc::new(record);

        self.persist(&index, Some(&record))?;
        index.records.insert(root, record);
        if let Some(contract) = contract {
            index.aliases.insert(contract, root);
        }

        info!("Saved distribution {}", short_hex(&root));
        Ok(())
    }

    /// Point `contract` at the record stored under `root`.
    pub fn attach_distribution_address(&self, root: &Hash, contract: Address) -> Result<()> {
        let mut index = self.index.write();
        self.attach_locked(&mut index, root, contract)
    }

    fn attach_locked(&self, index: &mut Index, root: &Hash, contract: Address) -> Result<()> {
        let existing = index
            .records
            .get(root)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hex_encode(root)))?;

        if let Some(aliased) = index.aliases.get(&contract) {
            if aliased == root {
                return Ok(());
            }
            return Err(StoreError::Conflict(format!(
                "contract {} already points at root {}",
                contract,
                hex_encode(aliased)
            )));
        }

        if let Some(current) = existing.distribution_contract {
            return Err(StoreError::Conflict(format!(
                "root {} already attached to contract {}",
                hex_encode(root),
                current
            )));
        }

        let updated = Arc::new(DistributionRecord {
            distribution_contract: Some(contract),
            ..(*existing).clone()
        });

        self.persist(index, Some(&updated))?;
        index.records.insert(*root, updated);
        index.aliases.insert(contract, *root);

        info!("Attached contract {} to distribution {}", contract, short_hex(root));
        Ok(())
    }

    /// Full record for a key.
    pub fn record(&self, key: &DistributionKey) -> Option<Arc<DistributionRecord>> {
        let index = self.index.read();
        let root = index.resolve(key)?;
        index.records.get(&root).cloned()
    }

    /// Amount and proof for one recipient; `None` when either the
    /// distribution or the recipient is unknown locally.
    pub fn lookup(&self, key: &DistributionKey, recipient: &Address) -> Option<Entitlement> {
        self.record(key)?.entitlement(recipient)
    }

    /// All stored roots.
    pub fn roots(&self) -> Vec<Hash> {
        let mut roots: Vec<Hash> = self.index.read().records.keys().copied().collect();
        roots.sort_unstable();
        roots
    }

    /// Pretty JSON for the record under `root`.
    pub fn export(&self, root: &Hash) -> Result<String> {
        let record = self
            .record(&DistributionKey::Root(*root))
            .ok_or_else(|| StoreError::NotFound(hex_encode(root)))?;
        Ok(serde_json::to_string_pretty(record.as_ref())?)
    }

    /// Parse, validate and save an exported record.
    pub fn import(&self, text: &str) -> Result<DistributionRecord> {
        let record: DistributionRecord = serde_json::from_str(text).map_err(|e| {
            warn!("Rejected distribution import: {}", e);
            StoreError::InvalidRecord(e.to_string())
        })?;
        record.validate()?;
        self.save(record.clone())?;
        Ok(record)
    }

    /// Write every record, with `pending` replacing the one sharing its root.
    fn persist(&self, index: &Index, pending: Option<&Arc<DistributionRecord>>) -> Result<()> {
        let mut distributions: Vec<DistributionRecord> = index
            .records
            .values()
            .filter(|r| pending.map_or(true, |p| p.root != r.root))
            .map(|r| (**r).clone())
            .collect();
        if let Some(p) = pending {
            distributions.push((**p).clone());
        }
        distributions.sort_by(|a, b| a.root.cmp(&b.root));

        let bytes = serde_json::to_vec_pretty(&StoreFile { distributions })?;
        self.backend.set(DISTRIBUTIONS_KEY, &bytes).map_err(|e| {
            warn!("Failed to persist proof store: {}", e);
            e
        })
    }
}
