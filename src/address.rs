use base58::{FromBase58, ToBase58};
use secp256k1::PublicKey;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ADDRESS_SIZE: usize = 20;

#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    #[error("address is not valid base58")]
    InvalidBase58,
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// The identity of a Darknode on the network.
///
/// An `Address` is the last 20 bytes of the blake3 digest of the uncompressed
/// public key (without its 0x04 prefix). It is written as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        let digest = blake3::hash(&uncompressed[1..]);
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&digest.as_bytes()[32 - ADDRESS_SIZE..]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = s.from_base58().map_err(|_| AddressError::InvalidBase58)?;
        if decoded.len() != ADDRESS_SIZE {
            return Err(AddressError::InvalidLength(decoded.len()));
        }
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&decoded);
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::Keypair;

    #[test]
    fn address_from_public_key_test() {
        let keypair = Keypair::new();
        let address = Address::from_public_key(keypair.public_key());
        assert_eq!(address, keypair.address());
        assert_ne!(address, Keypair::new().address());
    }

    #[test]
    fn address_string_test() {
        let address = Keypair::new().address();
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);

        assert_eq!("0OIl".parse::<Address>(), Err(AddressError::InvalidBase58));
        assert_eq!(
            [1u8, 2, 3].to_base58().parse::<Address>(),
            Err(AddressError::InvalidLength(3))
        );
    }

    #[test]
    fn address_serde_test() {
        let address = Address::new([7; ADDRESS_SIZE]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
