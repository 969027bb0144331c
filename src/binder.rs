use crate::address::Address;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BinderError {
    #[error("public key not found for {0}")]
    PublicKeyNotFound(Address),
    #[error("malformed address {0}")]
    MalformedAddress(String),
    #[error("registry unavailable: {0}")]
    Unavailable(String),
    #[error("registry file: {0}")]
    Registry(String),
}

/// The view of the Darknode registry contract that the `Crypter` relies on.
///
/// Production implementations call the contract on chain; they are expected
/// to handle their own retries. Calls may block.
pub trait ContractBinder {
    /// The key other Darknodes must use to encrypt messages for `address`.
    fn public_key(&self, address: &Address) -> Result<PublicKey, BinderError>;

    /// Whether `address` is currently a registered Darknode. Unregistered
    /// addresses return `Ok(false)`, not an error.
    fn is_registered(&self, address: &Address) -> Result<bool, BinderError>;
}

impl<B: ContractBinder + ?Sized> ContractBinder for Arc<B> {
    fn public_key(&self, address: &Address) -> Result<PublicKey, BinderError> {
        (**self).public_key(address)
    }

    fn is_registered(&self, address: &Address) -> Result<bool, BinderError> {
        (**self).is_registered(address)
    }
}

impl<B: ContractBinder + ?Sized> ContractBinder for &B {
    fn public_key(&self, address: &Address) -> Result<PublicKey, BinderError> {
        (**self).public_key(address)
    }

    fn is_registered(&self, address: &Address) -> Result<bool, BinderError> {
        (**self).is_registered(address)
    }
}

#[derive(Debug, Clone)]
struct DarknodeRecord {
    public_key: Option<PublicKey>,
    registered: bool,
}

/// A registry held in memory. Used to run Darknodes against a fixed registry
/// (see `from_registry_file`) and in tests.
#[derive(Debug, Default)]
pub struct InMemoryBinder {
    darknodes: RwLock<HashMap<Address, DarknodeRecord>>,
}

/// One entry of a registry file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub address: Address,
    /// hex of the compressed public key
    pub public_key: Option<String>,
    pub registered: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    pub darknodes: Vec<RegistryEntry>,
}

impl InMemoryBinder {
    pub fn new() -> Self {
        InMemoryBinder::default()
    }

    /// Load a registry from a JSON `RegistryFile`.
    pub fn from_registry_file<P: AsRef<Path>>(path: P) -> Result<Self, BinderError> {
        let bytes =
            std::fs::read(path.as_ref()).map_err(|err| BinderError::Registry(err.to_string()))?;
        let file: RegistryFile =
            serde_json::from_slice(&bytes).map_err(|err| BinderError::Registry(err.to_string()))?;
        InMemoryBinder::from_entries(file.darknodes)
    }

    pub fn from_entries(entries: Vec<RegistryEntry>) -> Result<Self, BinderError> {
        let binder = InMemoryBinder::new();
        for entry in entries {
            let public_key = match entry.public_key {
                Some(public_key_hex) => {
                    let bytes = hex::decode(&public_key_hex)
                        .map_err(|err| BinderError::Registry(err.to_string()))?;
                    Some(
                        PublicKey::from_slice(&bytes)
                            .map_err(|err| BinderError::Registry(err.to_string()))?,
                    )
                }
                None => None,
            };
            binder.write().insert(
                entry.address,
                DarknodeRecord {
                    public_key,
                    registered: entry.registered,
                },
            );
        }
        debug!("loaded registry of {} darknodes", binder.read().len());
        Ok(binder)
    }

    /// Register `address` with the key used to encrypt messages to it.
    pub fn register(&self, address: Address, public_key: PublicKey) {
        self.write().insert(
            address,
            DarknodeRecord {
                public_key: Some(public_key),
                registered: true,
            },
        );
    }

    /// Mark `address` as no longer registered. Its public key stays known.
    pub fn deregister(&self, address: &Address) {
        if let Some(record) = self.write().get_mut(address) {
            record.registered = false;
        }
    }

    pub fn set_public_key(&self, address: Address, public_key: PublicKey) {
        self.update(address, |record| record.public_key = Some(public_key));
    }

    /// Change the registration of `address` without touching its public key.
    pub fn set_registered(&self, address: Address, registered: bool) {
        self.update(address, |record| record.registered = registered);
    }

    fn update<F: FnOnce(&mut DarknodeRecord)>(&self, address: Address, f: F) {
        let mut darknodes = self.write();
        let record = darknodes.entry(address).or_insert(DarknodeRecord {
            public_key: None,
            registered: false,
        });
        f(record);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Address, DarknodeRecord>> {
        self.darknodes
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Address, DarknodeRecord>> {
        self.darknodes
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ContractBinder for InMemoryBinder {
    fn public_key(&self, address: &Address) -> Result<PublicKey, BinderError> {
        self.read()
            .get(address)
            .and_then(|record| record.public_key)
            .ok_or(BinderError::PublicKeyNotFound(*address))
    }

    fn is_registered(&self, address: &Address) -> Result<bool, BinderError> {
        Ok(self
            .read()
            .get(address)
            .map(|record| record.registered)
            .unwrap_or(false))
    }
}
