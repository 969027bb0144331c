use crate::address::Address;
use crate::crypto::{decrypt, CryptoError, DarknodeSignature, Decrypter, Signer};
use crate::keypair::Keypair;
use aes::Aes128;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

// create an alias for convenience
type Aes128Cbc = Cbc<Aes128, Pkcs7>;

pub const KEYSTORE_VERSION: u32 = 1;

const PASSWORD_KEY_CONTEXT: &str = "republic_rust 2021-10 keystore password key";

#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("keystore io: {0}")]
    Io(#[from] std::io::Error),
    #[error("keystore json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keystore hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("keystore key: {0}")]
    Crypto(#[from] CryptoError),
    #[error("unsupported keystore version {0}")]
    UnsupportedVersion(u32),
    #[error("wrong keystore password")]
    WrongPassword,
}

/// The `Keystore` holds the private keys of the local Darknode: an ECDSA key
/// which identifies the node and signs its messages, and an encryption key
/// used by other Darknodes to send it confidential messages.
#[derive(Clone, Debug)]
pub struct Keystore {
    id: Uuid,
    ecdsa_key: Keypair,
    encryption_key: Keypair,
}

/// On-disk form of a `Keystore`. Both secrets are stored AES encrypted under
/// a key derived from the password.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedKeystore {
    id: Uuid,
    version: u32,
    address: Address,
    iv: String,
    ciphertext: String,
}

impl Keystore {
    pub fn new(ecdsa_key: Keypair, encryption_key: Keypair) -> Keystore {
        Keystore {
            id: Uuid::new_v4(),
            ecdsa_key,
            encryption_key,
        }
    }

    pub fn random() -> Keystore {
        Keystore::new(Keypair::new(), Keypair::new())
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// The Darknode address of this node
    pub fn address(&self) -> Address {
        self.ecdsa_key.address()
    }

    pub fn ecdsa_key(&self) -> &Keypair {
        &self.ecdsa_key
    }

    pub fn encryption_key(&self) -> &Keypair {
        &self.encryption_key
    }

    /// The key other Darknodes should encrypt messages to us with
    pub fn encryption_public_key(&self) -> &PublicKey {
        self.encryption_key.public_key()
    }

    pub fn encrypt(&self, password: &str) -> Result<EncryptedKeystore, KeystoreError> {
        let iv: [u8; 16] = rand::random();
        let cipher = Keystore::create_cipher_from_password(password, &iv)?;

        let mut secrets = Vec::with_capacity(64);
        secrets.extend(&self.ecdsa_key.secret_bytes());
        secrets.extend(&self.encryption_key.secret_bytes());

        Ok(EncryptedKeystore {
            id: self.id,
            version: KEYSTORE_VERSION,
            address: self.address(),
            iv: hex::encode(iv),
            ciphertext: hex::encode(cipher.encrypt_vec(&secrets)),
        })
    }

    pub fn decrypt_keystore(
        encrypted: &EncryptedKeystore,
        password: &str,
    ) -> Result<Keystore, KeystoreError> {
        if encrypted.version != KEYSTORE_VERSION {
            return Err(KeystoreError::UnsupportedVersion(encrypted.version));
        }
        let iv = hex::decode(&encrypted.iv)?;
        let cipher = Keystore::create_cipher_from_password(password, &iv)?;
        let secrets = cipher
            .decrypt_vec(&hex::decode(&encrypted.ciphertext)?)
            .map_err(|_| KeystoreError::WrongPassword)?;
        if secrets.len() != 64 {
            return Err(KeystoreError::WrongPassword);
        }

        let ecdsa_key =
            Keypair::from_secret_slice(&secrets[..32]).map_err(|_| KeystoreError::WrongPassword)?;
        let encryption_key =
            Keypair::from_secret_slice(&secrets[32..]).map_err(|_| KeystoreError::WrongPassword)?;
        // padding can survive a wrong password by chance, the address cannot
        if ecdsa_key.address() != encrypted.address {
            return Err(KeystoreError::WrongPassword);
        }

        Ok(Keystore {
            id: encrypted.id,
            ecdsa_key,
            encryption_key,
        })
    }

    /// Write the keystore, encrypted with `password`, to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P, password: &str) -> Result<(), KeystoreError> {
        let encrypted = self.encrypt(password)?;
        fs::write(path.as_ref(), serde_json::to_vec_pretty(&encrypted)?)?;
        info!("saved keystore {} to {}", self.address(), path.as_ref().display());
        Ok(())
    }

    /// Read and decrypt the keystore at `path`
    pub fn load<P: AsRef<Path>>(path: P, password: &str) -> Result<Keystore, KeystoreError> {
        debug!("reading keystore from {}", path.as_ref().display());
        let encrypted: EncryptedKeystore = serde_json::from_slice(&fs::read(path.as_ref())?)?;
        Keystore::decrypt_keystore(&encrypted, password)
    }

    fn create_cipher_from_password(password: &str, iv: &[u8]) -> Result<Aes128Cbc, KeystoreError> {
        let mut key_material = password.as_bytes().to_vec();
        key_material.extend(iv);
        let derived = blake3::derive_key(PASSWORD_KEY_CONTEXT, &key_material);
        Aes128Cbc::new_from_slices(&derived[..16], iv)
            .map_err(|_| KeystoreError::Crypto(CryptoError::Cipher))
    }
}

impl Signer for Keystore {
    type Error = CryptoError;

    fn sign(&self, data: &[u8]) -> Result<DarknodeSignature, CryptoError> {
        self.ecdsa_key.sign_message(data)
    }
}

impl Decrypter for Keystore {
    type Error = CryptoError;

    fn decrypt(&self, cipher_text: &[u8]) -> Result<Vec<u8>, CryptoError> {
        decrypt(self.encryption_key.secret_key(), cipher_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{encrypt, recover};

    #[test]
    fn keystore_sign_test() {
        let keystore = Keystore::random();
        let signature = keystore.sign(b"hello world").unwrap();
        let signer = recover(b"hello world", &signature).unwrap();
        assert_eq!(Address::from_public_key(&signer), keystore.address());
    }

    #[test]
    fn keystore_decrypt_test() {
        let keystore = Keystore::random();
        let cipher_text = encrypt(keystore.encryption_public_key(), b"hello").unwrap();
        assert_eq!(keystore.decrypt(&cipher_text).unwrap(), b"hello".to_vec());

        // the ecdsa key is not the encryption key
        let wrong_cipher_text = encrypt(keystore.ecdsa_key().public_key(), b"hello").unwrap();
        assert!(keystore.decrypt(&wrong_cipher_text).is_err());
    }

    #[test]
    fn keystore_debug_hides_secrets_test() {
        let keystore = Keystore::random();
        let debug = format!("{:?}", keystore);
        assert!(!debug.contains(&hex::encode(keystore.ecdsa_key().secret_bytes())));
        assert!(!debug.contains(&hex::encode(keystore.encryption_key().secret_bytes())));
        assert!(debug.contains(&keystore.address().to_string()));
    }

    #[test]
    fn keystore_save_load_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        let keystore = Keystore::random();
        keystore.save(&path, "asdf").unwrap();

        let loaded = Keystore::load(&path, "asdf").unwrap();
        assert_eq!(loaded.id(), keystore.id());
        assert_eq!(loaded.address(), keystore.address());
        assert_eq!(loaded.ecdsa_key(), keystore.ecdsa_key());
        assert_eq!(loaded.encryption_key(), keystore.encryption_key());
    }

    #[test]
    fn keystore_wrong_password_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        Keystore::random().save(&path, "asdf").unwrap();
        assert!(matches!(
            Keystore::load(&path, "qwerty"),
            Err(KeystoreError::WrongPassword)
        ));
    }

    #[test]
    fn keystore_version_test() {
        let mut encrypted = Keystore::random().encrypt("asdf").unwrap();
        encrypted.version = 2;
        assert!(matches!(
            Keystore::decrypt_keystore(&encrypted, "asdf"),
            Err(KeystoreError::UnsupportedVersion(2))
        ));
    }
}
