use crate::address::Address;
use crate::binder::{BinderError, ContractBinder};
use crate::cache::TtlCache;
use crate::crypto::{
    encrypt, recover, CryptoError, DarknodeSignature, Decrypter, Encrypter, Signer, Verifier,
};
use crate::keystore::Keystore;
use crate::settings::CrypterSettings;
use secp256k1::PublicKey;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CrypterError {
    #[error("cannot recover signer: {0}")]
    Recovery(#[source] CryptoError),
    #[error("{0} is not a registered darknode")]
    InvalidRegistration(Address),
    #[error(transparent)]
    Binder(#[from] BinderError),
    #[error("cannot verify {address}: {source}")]
    Verification {
        address: Address,
        #[source]
        source: Box<CrypterError>,
    },
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl CrypterError {
    /// Whether the counterparty was rejected because it is not registered,
    /// as opposed to the registry being unreachable.
    pub fn is_invalid_registration(&self) -> bool {
        match self {
            CrypterError::InvalidRegistration(_) => true,
            CrypterError::Verification { source, .. } => source.is_invalid_registration(),
            _ => false,
        }
    }
}

/// The `Crypter` signs, verifies, encrypts and decrypts the messages a
/// Darknode exchanges with the rest of the network.
///
/// Signing and decrypting only use the local `Keystore`. Verifying and
/// encrypting only succeed for counterparties that are registered Darknodes,
/// which is checked against the `ContractBinder`. Registrations and public keys
/// are cached for `cache_update_period`, and at most `cache_limit` addresses
/// are cached at once.
///
/// `verify` locks the registry cache. `encrypt` locks the registry cache and
/// then the public key cache, in that order, for the whole lookup.
#[derive(Debug)]
pub struct Crypter<B> {
    keystore: Keystore,
    binder: B,
    registry_cache: Mutex<TtlCache<bool>>,
    public_key_cache: Mutex<TtlCache<PublicKey>>,
}

impl<B: ContractBinder> Crypter<B> {
    pub fn new(
        keystore: Keystore,
        binder: B,
        cache_limit: usize,
        cache_update_period: Duration,
    ) -> Self {
        Crypter {
            keystore,
            binder,
            registry_cache: Mutex::new(TtlCache::new(cache_limit, cache_update_period)),
            public_key_cache: Mutex::new(TtlCache::new(cache_limit, cache_update_period)),
        }
    }

    pub fn from_settings(keystore: Keystore, binder: B, settings: &CrypterSettings) -> Self {
        Crypter::new(
            keystore,
            binder,
            settings.cache_limit,
            settings.cache_update_period,
        )
    }

    pub fn keystore(&self) -> &Keystore {
        &self.keystore
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    pub fn sign(&self, data: &[u8]) -> Result<DarknodeSignature, CrypterError> {
        Ok(self.keystore.sign(data)?)
    }

    /// Check that `signature` over `data` was produced by a registered Darknode.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> Result<(), CrypterError> {
        let signer = recover(data, signature).map_err(CrypterError::Recovery)?;
        self.verify_address(&Address::from_public_key(&signer))
    }

    /// Encrypt `plain_text` for the registered Darknode at `address`.
    pub fn encrypt(&self, address: &Address, plain_text: &[u8]) -> Result<Vec<u8>, CrypterError> {
        let public_key = {
            let mut registry_cache = lock(&self.registry_cache);
            self.verify_address_with(&mut registry_cache, address)
                .map_err(|err| CrypterError::Verification {
                    address: *address,
                    source: Box::new(err),
                })?;

            let mut public_key_cache = lock(&self.public_key_cache);
            public_key_cache.refresh(address, |address| self.binder.public_key(address))?
        };
        Ok(encrypt(&public_key, plain_text)?)
    }

    pub fn decrypt(&self, cipher_text: &[u8]) -> Result<Vec<u8>, CrypterError> {
        Ok(self.keystore.decrypt(cipher_text)?)
    }

    /// Succeeds when `address` is a registered Darknode according to the
    /// (possibly cached) registry.
    pub fn verify_address(&self, address: &Address) -> Result<(), CrypterError> {
        let mut registry_cache = lock(&self.registry_cache);
        self.verify_address_with(&mut registry_cache, address)
    }

    pub fn registry_cache_len(&self) -> usize {
        lock(&self.registry_cache).len()
    }

    pub fn public_key_cache_len(&self) -> usize {
        lock(&self.public_key_cache).len()
    }

    fn verify_address_with(
        &self,
        registry_cache: &mut TtlCache<bool>,
        address: &Address,
    ) -> Result<(), CrypterError> {
        let is_registered = registry_cache.refresh(address, |address| {
            debug!("querying registration of {}", address);
            self.binder.is_registered(address)
        })?;
        if !is_registered {
            debug!("rejecting unregistered darknode {}", address);
            return Err(CrypterError::InvalidRegistration(*address));
        }
        Ok(())
    }
}

// a panic while holding a cache lock cannot leave a half written entry behind
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<B: ContractBinder> Signer for Crypter<B> {
    type Error = CrypterError;

    fn sign(&self, data: &[u8]) -> Result<DarknodeSignature, CrypterError> {
        Crypter::sign(self, data)
    }
}

impl<B: ContractBinder> Verifier for Crypter<B> {
    type Error = CrypterError;

    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<(), CrypterError> {
        Crypter::verify(self, data, signature)
    }
}

impl<B: ContractBinder> Encrypter for Crypter<B> {
    type Address = Address;
    type Error = CrypterError;

    fn encrypt(&self, address: &Address, plain_text: &[u8]) -> Result<Vec<u8>, CrypterError> {
        Crypter::encrypt(self, address, plain_text)
    }
}

impl<B: ContractBinder> Decrypter for Crypter<B> {
    type Error = CrypterError;

    fn decrypt(&self, cipher_text: &[u8]) -> Result<Vec<u8>, CrypterError> {
        Crypter::decrypt(self, cipher_text)
    }
}
