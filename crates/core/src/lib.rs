//! ClaimCraft Core Types
//!
//! This crate defines the fundamental data structures shared by the
//! entitlement engine: EVM addresses, 256-bit token amounts, recipients,
//! and the hex encodings used when distributions leave the process.

mod encoding;
mod error;
mod recipients;
mod types;

pub use encoding::*;
pub use error::*;
pub use recipients::*;
pub use types::*;
