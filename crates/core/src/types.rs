use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{hex_encode, ClaimCraftError, Result};

/// 20-byte EVM account or contract address.
///
/// Parsing is case-insensitive (checksummed, upper and lower case hex all
/// map to the same bytes), so comparisons on `Address` never depend on how
/// the user typed it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Left-pad to a 32-byte ABI word.
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }

    /// Parse from an arbitrary byte slice; anything but 20 bytes is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| {
            ClaimCraftError::InvalidAddress(format!("expected 20 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex_encode(self.0)
    }
}

impl FromStr for Address {
    type Err = ClaimCraftError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let cleaned = trimmed.strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if cleaned.len() != 40 {
            return Err(ClaimCraftError::InvalidAddress(format!(
                "expected 40 hex chars, got {}",
                cleaned.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(cleaned, &mut bytes)
            .map_err(|e| ClaimCraftError::InvalidAddress(format!("{}: {}", trimmed, e)))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Unsigned 256-bit token amount (ABI `uint256`).
///
/// Parsed only from plain base-10 digit strings. Scientific notation,
/// signs, separators and fractions are rejected rather than rounded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(U256([0u64; 4]));

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a base-10 integer string.
    pub fn from_dec_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClaimCraftError::InvalidAmount(trimmed.to_string()));
        }
        U256::from_dec_str(trimmed)
            .map(Self)
            .map_err(|_| ClaimCraftError::InvalidAmount(format!("{} overflows uint256", trimmed)))
    }

    /// 32-byte big-endian ABI word.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        self.0.to_big_endian(&mut word);
        word
    }

    pub fn from_be_bytes(word: &[u8; 32]) -> Self {
        Self(U256::from_big_endian(word))
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for TokenAmount {
    type Err = ClaimCraftError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_dec_str(s)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAmount({})", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_dec_str(&s).map_err(serde::de::Error::custom)
    }
}

/// One entitlement line of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Claiming account
    pub address: Address,
    /// Tokens the account may claim
    pub amount: TokenAmount,
}

impl Recipient {
    pub fn new(address: Address, amount: impl Into<TokenAmount>) -> Self {
        Self { address, amount: amount.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x1234567890abcdef1234567890abcdef12345678";

    #[test]
    fn test_parse_address_with_prefix() {
        let addr: Address = ADDR.parse().unwrap();
        assert_eq!(addr.as_bytes()[0], 0x12);
        assert_eq!(addr.to_hex(), ADDR);
    }

    #[test]
    fn test_parse_address_without_prefix() {
        let addr: Address = ADDR[2..].parse().unwrap();
        assert_eq!(addr.to_hex(), ADDR);
    }

    #[test]
    fn test_parse_address_case_insensitive() {
        let lower: Address = ADDR.parse().unwrap();
        let upper: Address = format!("0x{}", ADDR[2..].to_uppercase()).parse().unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_address_invalid_length() {
        assert!(matches!("0x1234".parse::<Address>(), Err(ClaimCraftError::InvalidAddress(_))));
    }

    #[test]
    fn test_parse_address_invalid_hex() {
        let bad = format!("0x{}", "g".repeat(40));
        assert!(bad.parse::<Address>().is_err());
    }

    #[test]
    fn test_address_from_slice() {
        assert!(Address::from_slice(&[1u8; 20]).is_ok());
        assert!(Address::from_slice(&[1u8; 19]).is_err());
        assert!(Address::from_slice(&[1u8; 32]).is_err());
    }

    #[test]
    fn test_address_to_word_left_pads() {
        let addr = Address::from_bytes([0xAB; 20]);
        let word = addr.to_word();
        assert_eq!(word[..12], [0u8; 12]);
        assert_eq!(word[12..], [0xAB; 20]);
    }

    #[test]
    fn test_amount_parse_plain_digits() {
        let amount = TokenAmount::from_dec_str("1000").unwrap();
        assert_eq!(amount, TokenAmount::from(1000u64));
        assert_eq!(amount.to_string(), "1000");
    }

    #[test]
    fn test_amount_rejects_scientific_and_signs() {
        for bad in ["1e18", "-5", "+5", "1.5", "", "1_000", "0x10"] {
            assert!(TokenAmount::from_dec_str(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_amount_max_uint256() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        let amount = TokenAmount::from_dec_str(max).unwrap();
        assert_eq!(amount.to_be_bytes(), [0xFF; 32]);

        let overflow = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(TokenAmount::from_dec_str(overflow).is_err());
    }

    #[test]
    fn test_amount_big_endian_word() {
        let word = TokenAmount::from(0x0102u64).to_be_bytes();
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert_eq!(word[..30], [0u8; 30]);
        assert_eq!(TokenAmount::from_be_bytes(&word), TokenAmount::from(0x0102u64));
    }

    #[test]
    fn test_recipient_serde_shape() {
        let recipient = Recipient::new(ADDR.parse().unwrap(), 500u64);
        let json = serde_json::to_value(recipient).unwrap();
        assert_eq!(json["address"], ADDR);
        assert_eq!(json["amount"], "500");
    }
}
