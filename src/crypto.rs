use aes::Aes128;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use secp256k1::ecdh::SharedSecret;
use secp256k1::recovery::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, SecretKey, SECP256K1};
use thiserror::Error;

pub use secp256k1::PublicKey;

// create an alias for convenience
type Aes128Cbc = Cbc<Aes128, Pkcs7>;

pub type DarknodeHash = [u8; 32];
/// Compact recoverable signature followed by its recovery id.
pub type DarknodeSignature = [u8; SIGNATURE_SIZE];

pub const SIGNATURE_SIZE: usize = 65;
pub const IV_SIZE: usize = 16;
pub const MAC_SIZE: usize = 32;
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

const CIPHER_KEY_CONTEXT: &str = "republic_rust 2021-10 darknode message cipher key";
const MAC_KEY_CONTEXT: &str = "republic_rust 2021-10 darknode message mac key";

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secp256k1: {0}")]
    Secp256k1(#[from] secp256k1::Error),
    #[error("malformed signature of {0} bytes")]
    MalformedSignature(usize),
    #[error("malformed cipher text of {0} bytes")]
    MalformedCipherText(usize),
    #[error("cipher text authentication failed")]
    MacMismatch,
    #[error("block cipher failure")]
    Cipher,
}

/// Anything holding a private key able to produce `DarknodeSignature`s.
pub trait Signer {
    type Error;
    fn sign(&self, data: &[u8]) -> Result<DarknodeSignature, Self::Error>;
}

/// Anything able to decide whether a signature over some data is acceptable.
pub trait Verifier {
    type Error;
    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<(), Self::Error>;
}

pub trait Encrypter {
    type Address: ?Sized;
    type Error;
    fn encrypt(&self, address: &Self::Address, plain_text: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

pub trait Decrypter {
    type Error;
    fn decrypt(&self, cipher_text: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

pub fn hash(data: &[u8]) -> DarknodeHash {
    *blake3::hash(data).as_bytes()
}

/// Generate a random secret key. Rejection sampling covers the (negligible)
/// case of 32 random bytes falling outside the curve order.
pub fn generate_secret_key() -> SecretKey {
    loop {
        let bytes: [u8; 32] = rand::random();
        if let Ok(secret_key) = SecretKey::from_slice(&bytes) {
            return secret_key;
        }
    }
}

pub fn generate_keys() -> (PublicKey, SecretKey) {
    let secret_key = generate_secret_key();
    let public_key = PublicKey::from_secret_key(&SECP256K1, &secret_key);
    (public_key, secret_key)
}

/// Hash `data` and sign the digest, keeping the recovery id so the signer can
/// later be recovered from the signature alone.
pub fn sign(data: &[u8], secret_key: &SecretKey) -> Result<DarknodeSignature, CryptoError> {
    let message = message_from_data(data)?;
    let (recovery_id, compact) = SECP256K1
        .sign_recoverable(&message, secret_key)
        .serialize_compact();

    let mut signature = [0u8; SIGNATURE_SIZE];
    signature[..64].copy_from_slice(&compact);
    signature[64] = recovery_id.to_i32() as u8;
    Ok(signature)
}

/// Recover the public key which produced `signature` over `data`.
pub fn recover(data: &[u8], signature: &[u8]) -> Result<PublicKey, CryptoError> {
    if signature.len() != SIGNATURE_SIZE {
        return Err(CryptoError::MalformedSignature(signature.len()));
    }
    let recovery_id = RecoveryId::from_i32(signature[64] as i32)?;
    let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id)?;
    let public_key = SECP256K1.recover(&message_from_data(data)?, &recoverable)?;
    Ok(public_key)
}

/// Encrypt `plain_text` so that only the holder of the secret half of
/// `public_key` can read it.
///
/// Layout: ephemeral public key (33) | iv (16) | AES-128-CBC cipher text | MAC (32).
pub fn encrypt(public_key: &PublicKey, plain_text: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let (ephemeral_public_key, ephemeral_secret_key) = generate_keys();
    let (cipher_key, mac_key) = derive_keys(public_key, &ephemeral_secret_key);
    let iv: [u8; IV_SIZE] = rand::random();

    let cipher =
        Aes128Cbc::new_from_slices(&cipher_key, &iv).map_err(|_| CryptoError::Cipher)?;
    let encrypted = cipher.encrypt_vec(plain_text);

    let mut cipher_text = Vec::with_capacity(
        COMPRESSED_PUBLIC_KEY_SIZE + IV_SIZE + encrypted.len() + MAC_SIZE,
    );
    cipher_text.extend(&ephemeral_public_key.serialize());
    cipher_text.extend(&iv);
    cipher_text.extend(&encrypted);
    let mac = blake3::keyed_hash(&mac_key, &cipher_text);
    cipher_text.extend(mac.as_bytes());
    Ok(cipher_text)
}

/// Reverse of `encrypt`.
pub fn decrypt(secret_key: &SecretKey, cipher_text: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let header_size = COMPRESSED_PUBLIC_KEY_SIZE + IV_SIZE;
    if cipher_text.len() < header_size + MAC_SIZE {
        return Err(CryptoError::MalformedCipherText(cipher_text.len()));
    }
    let (authenticated, mac) = cipher_text.split_at(cipher_text.len() - MAC_SIZE);

    let ephemeral_public_key = PublicKey::from_slice(&authenticated[..COMPRESSED_PUBLIC_KEY_SIZE])?;
    let (cipher_key, mac_key) = derive_keys(&ephemeral_public_key, secret_key);

    let mut expected_mac = [0u8; MAC_SIZE];
    expected_mac.copy_from_slice(mac);
    // blake3::Hash compares in constant time
    if blake3::keyed_hash(&mac_key, authenticated) != blake3::Hash::from(expected_mac) {
        return Err(CryptoError::MacMismatch);
    }

    let iv = &authenticated[COMPRESSED_PUBLIC_KEY_SIZE..header_size];
    let cipher = Aes128Cbc::new_from_slices(&cipher_key, iv).map_err(|_| CryptoError::Cipher)?;
    cipher
        .decrypt_vec(&authenticated[header_size..])
        .map_err(|_| CryptoError::Cipher)
}

fn message_from_data(data: &[u8]) -> Result<Message, CryptoError> {
    Ok(Message::from_slice(&hash(data))?)
}

fn derive_keys(public_key: &PublicKey, secret_key: &SecretKey) -> ([u8; 16], [u8; 32]) {
    let shared_secret = SharedSecret::new(public_key, secret_key);
    let key_material = blake3::derive_key(CIPHER_KEY_CONTEXT, shared_secret.as_ref());
    let mut cipher_key = [0u8; 16];
    cipher_key.copy_from_slice(&key_material[..16]);
    let mac_key = blake3::derive_key(MAC_KEY_CONTEXT, shared_secret.as_ref());
    (cipher_key, mac_key)
}
