use crate::address::{Address, ADDRESS_SIZE};
use crate::binder::{BinderError, ContractBinder, InMemoryBinder};
use crate::crypto::{hash, DarknodeHash};
use crate::epoch::Epoch;
use crate::keystore::Keystore;
use crate::pod::Pod;
use crate::pod_heap::{OrderId, PodHeap};
use secp256k1::PublicKey;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn make_mock_addresses(count: usize) -> Vec<Address> {
    (0..count)
        .map(|_| Address::new(rand::random::<[u8; ADDRESS_SIZE]>()))
        .collect()
}

/// A pod of `size` random darknodes. The hash commits to the members so every
/// mock pod has a distinct hash.
pub fn make_mock_pod(position: usize, size: usize) -> Pod {
    let darknodes = make_mock_addresses(size);
    let mut preimage = position.to_be_bytes().to_vec();
    for darknode in &darknodes {
        preimage.extend(darknode.as_bytes());
    }
    Pod::new(position, hash(&preimage), darknodes).unwrap()
}

pub fn make_mock_heap(pod_count: usize) -> PodHeap {
    PodHeap::new((0..pod_count).map(|position| make_mock_pod(position, 3)).collect())
}

pub fn make_mock_epoch(hash: DarknodeHash, pod_count: usize, pod_size: usize) -> Epoch {
    let pods = (0..pod_count)
        .map(|position| make_mock_pod(position, pod_size))
        .collect();
    Epoch::new(hash, pods, 0, 100)
}

/// An order id whose integer value is `value`.
pub fn make_order_id(value: u64) -> OrderId {
    let mut order_id = [0; 32];
    order_id[24..].copy_from_slice(&value.to_be_bytes());
    order_id
}

/// Keystores for `count` darknodes, all registered with `binder`.
pub fn make_registered_keystores(binder: &CountingBinder, count: usize) -> Vec<Keystore> {
    (0..count)
        .map(|_| {
            let keystore = Keystore::random();
            binder.register(keystore.address(), *keystore.encryption_public_key());
            keystore
        })
        .collect()
}

/// An `InMemoryBinder` that counts the registry queries made through the
/// `ContractBinder` trait and can be switched to fail all of them.
#[derive(Debug, Default)]
pub struct CountingBinder {
    registry: InMemoryBinder,
    is_registered_calls: AtomicUsize,
    public_key_calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl CountingBinder {
    pub fn new() -> Self {
        CountingBinder::default()
    }

    pub fn register(&self, address: Address, public_key: PublicKey) {
        self.registry.register(address, public_key);
    }

    pub fn register_without_key(&self, address: Address) {
        self.registry.set_registered(address, true);
    }

    pub fn deregister(&self, address: &Address) {
        self.registry.deregister(address);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn is_registered_calls(&self) -> usize {
        self.is_registered_calls.load(Ordering::SeqCst)
    }

    pub fn public_key_calls(&self) -> usize {
        self.public_key_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), BinderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BinderError::Unavailable(String::from("mock registry is down")));
        }
        Ok(())
    }
}

impl ContractBinder for CountingBinder {
    fn public_key(&self, address: &Address) -> Result<PublicKey, BinderError> {
        self.public_key_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.registry.public_key(address)
    }

    fn is_registered(&self, address: &Address) -> Result<bool, BinderError> {
        self.is_registered_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.registry.is_registered(address)
    }
}
