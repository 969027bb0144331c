use crate::pod::Pod;
use crate::pod_path::PodPath;
use bigint::uint::U256;
use std::ops::Deref;
use tracing::trace;

/// Orders are identified by a 32 byte digest, read as a big-endian 256 bit
/// unsigned integer when routing.
pub type OrderId = [u8; 32];

/// Index of the parent of heap node `index`, `None` for the root.
pub fn parent_index(index: usize) -> Option<usize> {
    if index == 0 {
        None
    } else {
        Some((index - 1) / 2)
    }
}

/// Indices of the left and right children of heap node `index`. The caller
/// checks them against the heap length.
pub fn child_indices(index: usize) -> (usize, usize) {
    (2 * index + 1, 2 * index + 2)
}

//
// A PodHeap is the ordered list of pods of an epoch, read as an implicit
// binary tree. Orders are routed to one of the leaves and every pod on the
// way from the root to that leaf takes part in matching them.
//
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PodHeap {
    pods: Vec<Pod>,
}

impl PodHeap {
    pub fn new(pods: Vec<Pod>) -> Self {
        PodHeap { pods }
    }

    pub fn pods(&self) -> &[Pod] {
        &self.pods
    }

    /// Nodes `[0, len / 2)` are internal, `[len / 2, len)` are leaves.
    pub fn first_leaf_index(&self) -> usize {
        self.pods.len() / 2
    }

    pub fn number_of_leaves(&self) -> usize {
        self.pods.len() - self.first_leaf_index()
    }

    /// Index of the leaf pod which owns `order_id`. `None` when the heap is
    /// empty.
    pub fn leaf_of_order(&self, order_id: &OrderId) -> Option<usize> {
        if self.pods.is_empty() {
            return None;
        }
        let threshold = self.first_leaf_index();
        let number_of_leaves = U256::from(self.number_of_leaves() as u64);
        let leaf_offset = U256::from_big_endian(order_id) % number_of_leaves;
        // the offset is below number_of_leaves, which came from a usize
        Some(threshold + leaf_offset.low_u64() as usize)
    }

    /// Deterministically route `order_id` to a leaf and return every pod from
    /// the root down to that leaf. Heaps of zero or one pod have no branching
    /// and are returned whole.
    pub fn path_of_order(&self, order_id: &OrderId) -> PodPath {
        if self.pods.len() <= 1 {
            return PodPath::new(self.pods.clone());
        }

        let mut index = match self.leaf_of_order(order_id) {
            Some(leaf) => leaf,
            None => return PodPath::default(),
        };
        trace!("order {} routed to leaf {}", hex::encode(order_id), index);

        let mut pods = vec![self.pods[index].clone()];
        while let Some(parent) = parent_index(index) {
            pods.push(self.pods[parent].clone());
            index = parent;
        }
        pods.reverse();
        PodPath::new(pods)
    }
}

impl Deref for PodHeap {
    type Target = [Pod];

    fn deref(&self) -> &Self::Target {
        &self.pods
    }
}

impl From<Vec<Pod>> for PodHeap {
    fn from(pods: Vec<Pod>) -> Self {
        PodHeap::new(pods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::mocks::{make_mock_heap, make_order_id};

    #[test]
    fn heap_index_test() {
        assert_eq!(parent_index(0), None);
        assert_eq!(parent_index(1), Some(0));
        assert_eq!(parent_index(2), Some(0));
        assert_eq!(parent_index(5), Some(2));
        assert_eq!(parent_index(6), Some(2));
        assert_eq!(child_indices(0), (1, 2));
        assert_eq!(child_indices(2), (5, 6));
        for index in 0..100 {
            let (left, right) = child_indices(index);
            assert_eq!(parent_index(left), Some(index));
            assert_eq!(parent_index(right), Some(index));
        }
    }

    #[test]
    fn path_of_order_small_heap_test() {
        let empty = PodHeap::default();
        assert!(empty.path_of_order(&[7; 32]).is_empty());
        assert_eq!(empty.leaf_of_order(&[7; 32]), None);

        let single = make_mock_heap(1);
        assert_eq!(single.path_of_order(&[7; 32]).pods(), single.pods());
    }

    #[test]
    fn path_of_order_three_pods_test() {
        let heap = make_mock_heap(3);
        assert_eq!(heap.first_leaf_index(), 1);
        assert_eq!(heap.number_of_leaves(), 2);

        let path = heap.path_of_order(&make_order_id(0));
        assert_eq!(path.pods(), &[heap[0].clone(), heap[1].clone()]);

        let path = heap.path_of_order(&make_order_id(1));
        assert_eq!(path.pods(), &[heap[0].clone(), heap[2].clone()]);

        let path = heap.path_of_order(&make_order_id(2));
        assert_eq!(path.pods(), &[heap[0].clone(), heap[1].clone()]);
    }

    #[test]
    fn path_of_order_uneven_heap_test() {
        // 6 pods: leaves are 3, 4, 5 and pod 5 hangs off pod 2
        let heap = make_mock_heap(6);
        assert_eq!(heap.leaf_of_order(&make_order_id(2)), Some(5));
        let path = heap.path_of_order(&make_order_id(2));
        assert_eq!(path.pods(), &[heap[0].clone(), heap[2].clone(), heap[5].clone()]);

        let path = heap.path_of_order(&make_order_id(3));
        assert_eq!(path.pods(), &[heap[0].clone(), heap[1].clone(), heap[3].clone()]);
    }

    #[test]
    fn path_of_order_wide_order_id_test() {
        // 2^255 mod 3 == 2, only visible if the whole id takes part in the modulo
        let heap = make_mock_heap(6);
        let mut order_id = [0u8; 32];
        order_id[0] = 0x80;
        assert_eq!(heap.leaf_of_order(&order_id), Some(5));
    }

    #[test]
    fn path_of_order_properties_test() {
        for size in 2..40 {
            let heap = make_mock_heap(size);
            for _ in 0..50 {
                let order_id: OrderId = rand::random();
                let path = heap.path_of_order(&order_id);
                assert_eq!(path, heap.path_of_order(&order_id));

                let leaf = path.leaf().unwrap();
                let leaf_index = heap.iter().position(|pod| pod == leaf).unwrap();
                assert!(leaf_index >= size / 2);
                assert_eq!(path.root(), Some(&heap[0]));

                // consecutive pods on the path are parent and child
                for pair in path.pods().windows(2) {
                    let parent = heap.iter().position(|pod| pod == &pair[0]).unwrap();
                    let child = heap.iter().position(|pod| pod == &pair[1]).unwrap();
                    assert_eq!(parent_index(child), Some(parent));
                }
            }
        }
    }

    #[test]
    fn path_of_order_distribution_test() {
        let heap = make_mock_heap(7);
        let samples = 20_000;
        let mut counts = vec![0usize; heap.len()];
        for _ in 0..samples {
            let order_id: OrderId = rand::random();
            counts[heap.leaf_of_order(&order_id).unwrap()] += 1;
        }

        let expected = samples / heap.number_of_leaves();
        for (index, count) in counts.iter().enumerate() {
            if index < heap.first_leaf_index() {
                assert_eq!(*count, 0);
            } else {
                assert!(*count > expected * 85 / 100, "leaf {} got {}", index, count);
                assert!(*count < expected * 115 / 100, "leaf {} got {}", index, count);
            }
        }
    }
}
