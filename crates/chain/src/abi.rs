//! Contract call description and ABI calldata encoding.

use std::fmt;

use primitive_types::U256;

use claimcraft_core::{Address, Hash};
use claimcraft_merkle::keccak256;

/// Solidity signatures of every function the engine calls.
pub mod signatures {
    // Reputation registry
    pub const IS_ACTIVATED: &str = "isActivated(address)";
    pub const GET_TRUST_SCORE: &str = "getTrustScore(address)";
    pub const GET_KYC_LEVEL: &str = "getKycLevel(address)";
    pub const IS_BLACKLISTED: &str = "isBlacklisted(address)";

    // Distribution contract
    pub const HAS_CLAIMED: &str = "hasClaimed(address)";
    pub const MERKLE_ROOT: &str = "merkleRoot()";
    pub const REQUIRED_TRUST_SCORE: &str = "requiredTrustScore()";
    pub const REQUIRED_KYC_LEVEL: &str = "requiredKycLevel()";
    pub const START_TIME: &str = "startTime()";
    pub const END_TIME: &str = "endTime()";
    pub const REPUTATION_REGISTRY: &str = "reputationRegistry()";
    pub const CLAIM: &str = "claim(address,uint256,bytes32[])";
}

/// One ABI argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Address(Address),
    Uint(U256),
    Bytes32Array(Vec<Hash>),
}

/// A call to a contract function, used for both reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: Address,
    pub signature: &'static str,
    pub args: Vec<CallArg>,
}

impl ContractCall {
    pub fn new(contract: Address, signature: &'static str, args: Vec<CallArg>) -> Self {
        Self { contract, signature, args }
    }

    /// Call with no arguments.
    pub fn getter(contract: Address, signature: &'static str) -> Self {
        Self::new(contract, signature, Vec::new())
    }

    /// Call taking a single account address.
    pub fn for_account(contract: Address, signature: &'static str, account: Address) -> Self {
        Self::new(contract, signature, vec![CallArg::Address(account)])
    }

    /// First four bytes of keccak256 of the signature.
    pub fn selector(&self) -> [u8; 4] {
        let digest = keccak256(self.signature.as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    /// Full calldata: selector, then heads, then tails for dynamic args.
    pub fn encode(&self) -> Vec<u8> {
        let head_len = 32 * self.args.len();
        let mut heads = Vec::with_capacity(head_len);
        let mut tails = Vec::new();

        for arg in &self.args {
            match arg {
                CallArg::Address(addr) => heads.extend_from_slice(&addr.to_word()),
                CallArg::Uint(value) => heads.extend_from_slice(&uint_word(*value)),
                CallArg::Bytes32Array(items) => {
                    let offset = head_len + tails.len();
                    heads.extend_from_slice(&uint_word(U256::from(offset)));
                    tails.extend_from_slice(&uint_word(U256::from(items.len())));
                    for item in items {
                        tails.extend_from_slice(item);
                    }
                }
            }
        }

        let mut data = Vec::with_capacity(4 + heads.len() + tails.len());
        data.extend_from_slice(&self.selector());
        data.extend_from_slice(&heads);
        data.extend_from_slice(&tails);
        data
    }

    /// Address argument at `index`, if present.
    pub fn address_arg(&self, index: usize) -> Option<Address> {
        match self.args.get(index)? {
            CallArg::Address(addr) => Some(*addr),
            _ => None,
        }
    }

    /// Uint argument at `index`, if present.
    pub fn uint_arg(&self, index: usize) -> Option<U256> {
        match self.args.get(index)? {
            CallArg::Uint(value) => Some(*value),
            _ => None,
        }
    }

    /// `bytes32[]` argument at `index`, if present.
    pub fn bytes32_array_arg(&self, index: usize) -> Option<&[Hash]> {
        match self.args.get(index)? {
            CallArg::Bytes32Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.contract, self.signature)
    }
}

fn uint_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimcraft_core::hex_encode;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_known_selectors() {
        let transfer = ContractCall::getter(addr(1), "transfer(address,uint256)");
        assert_eq!(transfer.selector(), [0xa9, 0x05, 0x9c, 0xbb]);

        let balance = ContractCall::getter(addr(1), "balanceOf(address)");
        assert_eq!(balance.selector(), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_encode_static_args() {
        let call = ContractCall::for_account(addr(1), signatures::IS_ACTIVATED, addr(0xAB));
        let data = call.encode();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[4..16], [0u8; 12]);
        assert_eq!(data[16..36], [0xAB; 20]);
    }

    #[test]
    fn test_encode_getter_is_selector_only() {
        let call = ContractCall::getter(addr(1), signatures::MERKLE_ROOT);
        assert_eq!(call.encode(), call.selector().to_vec());
    }

    #[test]
    fn test_encode_claim_with_dynamic_proof() {
        let call = ContractCall::new(
            addr(1),
            signatures::CLAIM,
            vec![
                CallArg::Address(addr(0xAA)),
                CallArg::Uint(U256::from(1000u64)),
                CallArg::Bytes32Array(vec![[0x11; 32], [0x22; 32]]),
            ],
        );
        let data = call.encode();
        let body = &data[4..];

        // 3 heads + length word + 2 elements
        assert_eq!(body.len(), 32 * 6);
        assert_eq!(body[12..32], [0xAA; 20]);
        assert_eq!(body[62..64], [0x03, 0xE8]);
        // offset of the array tail = 3 * 32
        assert_eq!(body[95], 96);
        // array length
        assert_eq!(body[127], 2);
        assert_eq!(body[128..160], [0x11; 32]);
        assert_eq!(body[160..192], [0x22; 32]);
    }

    #[test]
    fn test_encode_empty_array() {
        let call = ContractCall::new(
            addr(1),
            signatures::CLAIM,
            vec![
                CallArg::Address(addr(0xAA)),
                CallArg::Uint(U256::one()),
                CallArg::Bytes32Array(Vec::new()),
            ],
        );
        assert_eq!(call.encode().len(), 4 + 32 * 4);
    }

    #[test]
    fn test_arg_accessors() {
        let call = ContractCall::new(
            addr(1),
            signatures::CLAIM,
            vec![
                CallArg::Address(addr(0xAA)),
                CallArg::Uint(U256::from(5u64)),
                CallArg::Bytes32Array(vec![[0x01; 32]]),
            ],
        );
        assert_eq!(call.address_arg(0), Some(addr(0xAA)));
        assert_eq!(call.uint_arg(1), Some(U256::from(5u64)));
        assert_eq!(call.bytes32_array_arg(2).unwrap().len(), 1);
        assert_eq!(call.address_arg(1), None);
        assert_eq!(call.uint_arg(7), None);
    }

    #[test]
    fn test_display() {
        let call = ContractCall::getter(addr(0xCD), signatures::END_TIME);
        assert_eq!(call.to_string(), format!("{}.endTime()", hex_encode([0xCD; 20])));
    }
}
