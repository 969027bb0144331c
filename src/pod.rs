use crate::address::Address;
use crate::crypto::DarknodeHash;
use crate::epoch::RegistryError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// A `Pod` is a fixed group of Darknodes which jointly run the matching
/// protocol for the orders routed to it. Pods are built when an `Epoch`
/// snapshot is taken and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPod")]
pub struct Pod {
    position: usize,
    #[serde(with = "hex")]
    hash: DarknodeHash,
    darknodes: Vec<Address>,
}

impl Pod {
    /// Create new `Pod`
    ///
    /// * `position` - index of the pod in its epoch
    /// * `hash` - digest of the pod membership, computed by the registry
    /// * `darknodes` - the members, must not be empty
    pub fn new(
        position: usize,
        hash: DarknodeHash,
        darknodes: Vec<Address>,
    ) -> Result<Pod, RegistryError> {
        if darknodes.is_empty() {
            return Err(RegistryError::EmptyPod);
        }
        Ok(Pod {
            position,
            hash,
            darknodes,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn hash(&self) -> &DarknodeHash {
        &self.hash
    }

    pub fn darknodes(&self) -> &[Address] {
        &self.darknodes
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.darknodes.iter().any(|darknode| darknode == address)
    }

    pub fn size(&self) -> usize {
        self.darknodes.len()
    }

    /// Minimum number of honest members needed to run the matching protocol,
    /// the ceiling of 2/3 of the pod size.
    pub fn threshold(&self) -> usize {
        (2 * (self.size() + 1)) / 3
    }
}

// deserialization goes through `Pod::new` so the membership invariant holds
#[derive(Deserialize)]
struct RawPod {
    position: usize,
    #[serde(with = "hex")]
    hash: DarknodeHash,
    darknodes: Vec<Address>,
}

impl TryFrom<RawPod> for Pod {
    type Error = RegistryError;

    fn try_from(raw: RawPod) -> Result<Self, Self::Error> {
        Pod::new(raw.position, raw.hash, raw.darknodes)
    }
}
