use crate::address::Address;
use crate::crypto::{generate_keys, sign, CryptoError, DarknodeSignature};
use secp256k1::{PublicKey, SecretKey, SECP256K1};
use std::fmt;

/// An secp256k1 keypair for signing messages and decrypting messages sent to us
#[derive(Clone, PartialEq)]
pub struct Keypair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl Keypair {
    /// Create and return a keypair with a randomly generated private key.
    pub fn new() -> Keypair {
        let (public_key, secret_key) = generate_keys();
        Keypair {
            secret_key,
            public_key,
        }
    }

    /// Create and return a keypair with the given u8 array as the private key
    pub fn from_secret_slice(slice: &[u8]) -> Result<Keypair, secp256k1::Error> {
        let secret_key = SecretKey::from_slice(slice)?;
        let public_key = PublicKey::from_secret_key(&SECP256K1, &secret_key);

        Ok(Keypair {
            secret_key,
            public_key,
        })
    }

    /// Create and return a keypair with the given hex string as the private key
    pub fn from_secret_hex(secret_hex: &str) -> Result<Keypair, CryptoError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(secret_hex, &mut bytes as &mut [u8])
            .map_err(|_| CryptoError::Secp256k1(secp256k1::Error::InvalidSecretKey))?;
        Ok(Keypair::from_secret_slice(&bytes)?)
    }

    /// Get the Darknode address of the keypair
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Raw bytes of the private key
    pub fn secret_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.secret_key[..]);
        bytes
    }

    /// Hash and sign message bytes
    pub fn sign_message(&self, message_bytes: &[u8]) -> Result<DarknodeSignature, CryptoError> {
        sign(message_bytes, &self.secret_key)
    }
}

impl Default for Keypair {
    fn default() -> Self {
        Keypair::new()
    }
}

impl fmt::Display for Keypair {
    /// formats a Keypair for println! without leaking the private key
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "address:{} pubkey:{}", self.address(), self.public_key)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .field("public_key", &hex::encode(self.public_key.serialize()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::recover;

    const MOCK_SECRET_KEY: &str =
        "da79fe6d86347e8f8dc71eb3dbab9ba5623eaaed6c5dd0bb257c0d631faaff16";

    #[test]
    fn keypair_signing_test() {
        let keypair = Keypair::from_secret_hex(MOCK_SECRET_KEY).unwrap();
        let signature = keypair.sign_message(b"hello world").unwrap();
        let signer = recover(b"hello world", &signature).unwrap();
        assert_eq!(&signer, keypair.public_key());
        assert_eq!(Address::from_public_key(&signer), keypair.address());
    }

    #[test]
    fn keypair_new_from_secret_key_test() {
        let keypair = Keypair::from_secret_hex(MOCK_SECRET_KEY).unwrap();
        assert_eq!(keypair.secret_key().to_string(), MOCK_SECRET_KEY);
        assert_eq!(hex::encode(keypair.secret_bytes()), MOCK_SECRET_KEY);
        assert_eq!(
            keypair,
            Keypair::from_secret_slice(&keypair.secret_bytes()).unwrap()
        );

        assert!(Keypair::from_secret_hex("randomtext").is_err());
        assert!(Keypair::from_secret_hex("").is_err());
    }

    #[test]
    fn keypair_formatting_hides_secret_test() {
        let keypair = Keypair::from_secret_hex(MOCK_SECRET_KEY).unwrap();
        let debug = format!("{:?}", keypair);
        assert!(!debug.contains(MOCK_SECRET_KEY));
        assert!(debug.contains(&keypair.address().to_string()));
        assert!(!keypair.to_string().contains(MOCK_SECRET_KEY));
    }

    #[test]
    fn keypair_new_test() {
        let keypair = Keypair::new();
        assert_eq!(keypair.secret_key().to_string().len(), 64);
        assert_ne!(keypair, Keypair::new());
    }
}
