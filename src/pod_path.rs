use crate::address::Address;
use crate::pod::Pod;
use std::ops::Deref;

/// A `PodPath` is the sequence of pods, from the root of a `PodHeap` down to a
/// leaf, that take part in matching an order. It is recomputed from the
/// current epoch whenever it is needed and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodPath {
    pods: Vec<Pod>,
}

impl PodPath {
    pub fn new(pods: Vec<Pod>) -> Self {
        PodPath { pods }
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    pub fn into_pods(self) -> Vec<Pod> {
        self.pods
    }

    pub fn root(&self) -> Option<&Pod> {
        self.pods.first()
    }

    pub fn leaf(&self) -> Option<&Pod> {
        self.pods.last()
    }

    /// Position of `pod` in the path, compared by hash
    pub fn index_of_pod(&self, pod: &Pod) -> Option<usize> {
        self.pods
            .iter()
            .position(|candidate| candidate.hash() == pod.hash())
    }

    /// Position of the first pod, from the root, that `address` is a member of
    pub fn index_of_address(&self, address: &Address) -> Option<usize> {
        self.pods.iter().position(|pod| pod.contains(address))
    }

    /// The longest common prefix of two paths, compared pod by pod from the
    /// root. Two orders whose paths share an ancestor can be matched by the
    /// pods of that ancestor.
    pub fn ancestor(&self, other: &PodPath) -> PodPath {
        let pods = self
            .pods
            .iter()
            .zip(other.pods.iter())
            .take_while(|(mine, theirs)| mine.hash() == theirs.hash())
            .map(|(mine, _)| mine.clone())
            .collect();
        PodPath { pods }
    }
}

impl Deref for PodPath {
    type Target = [Pod];

    fn deref(&self) -> &Self::Target {
        &self.pods
    }
}

impl From<Vec<Pod>> for PodPath {
    fn from(pods: Vec<Pod>) -> Self {
        PodPath::new(pods)
    }
}

impl IntoIterator for PodPath {
    type Item = Pod;
    type IntoIter = std::vec::IntoIter<Pod>;

    fn into_iter(self) -> Self::IntoIter {
        self.pods.into_iter()
    }
}

impl<'a> IntoIterator for &'a PodPath {
    type Item = &'a Pod;
    type IntoIter = std::slice::Iter<'a, Pod>;

    fn into_iter(self) -> Self::IntoIter {
        self.pods.iter()
    }
}
