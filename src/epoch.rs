use crate::address::Address;
use crate::crypto::DarknodeHash;
use crate::pod::Pod;
use crate::pod_heap::{OrderId, PodHeap};
use crate::pod_path::PodPath;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("pod not found")]
    PodNotFound,
    #[error("pod must contain at least one darknode")]
    EmptyPod,
}

/// An `Epoch` is a snapshot of the Darknode registry: which Darknodes are
/// registered and how they are grouped into Pods. A new epoch is taken every
/// `block_interval` blocks; the previous one is discarded.
///
/// Two epochs are equal when their hashes are equal. The contents are not
/// compared, the hash already commits to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawEpoch")]
pub struct Epoch {
    #[serde(with = "hex")]
    hash: DarknodeHash,
    pods: Vec<Pod>,
    darknodes: Vec<Address>,
    block_number: u64,
    block_interval: u64,
}

impl Epoch {
    /// Create new `Epoch`. The flat list of darknodes is taken from the pods,
    /// in pod order.
    pub fn new(hash: DarknodeHash, pods: Vec<Pod>, block_number: u64, block_interval: u64) -> Self {
        let darknodes = pods
            .iter()
            .flat_map(|pod| pod.darknodes().iter().copied())
            .collect();
        Epoch {
            hash,
            pods,
            darknodes,
            block_number,
            block_interval,
        }
    }

    pub fn hash(&self) -> &DarknodeHash {
        &self.hash
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    pub fn darknodes(&self) -> &[Address] {
        &self.darknodes
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn block_interval(&self) -> u64 {
        self.block_interval
    }

    /// Find the `Pod` the Darknode at `address` belongs to in this epoch.
    pub fn pod(&self, address: &Address) -> Result<&Pod, RegistryError> {
        self.pods
            .iter()
            .find(|pod| pod.contains(address))
            .ok_or(RegistryError::PodNotFound)
    }

    pub fn pod_heap(&self) -> PodHeap {
        PodHeap::new(self.pods.clone())
    }

    /// The path of pods responsible for `order_id` in this epoch.
    pub fn path_of_order(&self, order_id: &OrderId) -> PodPath {
        self.pod_heap().path_of_order(order_id)
    }
}

impl PartialEq for Epoch {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Epoch {}

// the flat darknode list is always rebuilt from the pods
#[derive(Deserialize)]
struct RawEpoch {
    #[serde(with = "hex")]
    hash: DarknodeHash,
    pods: Vec<Pod>,
    block_number: u64,
    block_interval: u64,
}

impl From<RawEpoch> for Epoch {
    fn from(raw: RawEpoch) -> Self {
        Epoch::new(raw.hash, raw.pods, raw.block_number, raw.block_interval)
    }
}
