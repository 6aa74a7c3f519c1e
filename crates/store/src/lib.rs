//! ClaimCraft Proof Store
//!
//! Persists built distributions (root, recipients, per-address proofs)
//! behind a pluggable key-value backend, and serves proof lookups by
//! Merkle root or by the distribution contract address once one is
//! attached.

mod backend;
mod error;
mod record;
mod store;

pub use backend::{FileKvStore, KvStore, MemoryKvStore};
pub use error::{Result, StoreError};
pub use record::{DistributionRecord, Entitlement};
pub use store::{DistributionKey, ProofStore, DISTRIBUTIONS_KEY};
