//! # 2D k-d tree
//!
//! Per-frame spatial index over the particle positions. It answers
//! "which `k` positions are closest to this point?" and returns them in
//! increasing Euclidean distance.
//!
//! ## Lifetime
//!
//! The tree copies the positions it is built from, so it always describes
//! the frame it was built in. It is rebuilt from scratch every step and
//! dropped before any particle moves.
//!
//! ## Layout
//!
//! - Nodes live in a flat arena (`nodes`), children are arena indices.
//! - `order` is a permutation of `0..len`; every leaf owns a contiguous
//!   range of it.
//! - Internal nodes split at the median along the widest axis of their
//!   bounding box, so the depth stays `O(log N)` even for clumped input.
//!
//! ## Queries
//!
//! `query_nearest` keeps the best `k` candidates in a max-heap and skips
//! a far subtree once the splitting line is further away than the worst
//! candidate. With `k == len` every point is visited, which is what the
//! all-pairs force model asks for: the tree then only provides the sorted
//! enumeration.
//!
//! Ties in distance are broken by ascending index, which keeps the output
//! identical across rebuilds over the same positions.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::simulation::states::NVec2;

/// Maximum number of points stored in a leaf
const LEAF_SIZE: usize = 8;

#[derive(Debug, Clone, Copy)]
enum KdNode {
    Leaf {
        start: usize, // range into `order`
        end: usize,
    },
    Internal {
        dim: usize, // 0 = x, 1 = y
        split: f64,
        left: usize, // arena indices
        right: usize,
    },
}

/// Immutable 2D k-d tree over a snapshot of positions
#[derive(Debug, Clone)]
pub struct KdTree2 {
    points: Vec<NVec2>,
    order: Vec<usize>,
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

impl KdTree2 {
    /// Build a tree over `positions`. Returned indices refer to this slice.
    pub fn build(positions: &[NVec2]) -> Self {
        let mut tree = KdTree2 {
            points: positions.to_vec(),
            order: Vec::new(),
            nodes: Vec::with_capacity(2 * positions.len() / LEAF_SIZE + 1),
            root: None,
        };

        let mut order: Vec<usize> = (0..positions.len()).collect();
        if !order.is_empty() {
            tree.root = Some(tree.build_node(&mut order, 0));
        }
        tree.order = order;

        tree
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position `i` as it was when the tree was built
    pub fn position(&self, i: usize) -> NVec2 {
        self.points[i]
    }

    /// Up to `k` nearest entries to `point` as `(index, distance)`,
    /// ascending by distance.
    ///
    /// If `point` is one of the indexed positions, that entry comes back
    /// first with distance 0; callers computing interactions must skip it.
    pub fn query_nearest(&self, point: NVec2, k: usize) -> Vec<(usize, f64)> {
        let k = k.min(self.points.len());
        let Some(root) = self.root else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(root, &point, k, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| (c.index, c.dist2.sqrt()))
            .collect()
    }

    // helpers ==============================================================================

    fn build_node(&mut self, order: &mut [usize], offset: usize) -> usize {
        let node_idx = self.nodes.len();

        if order.len() <= LEAF_SIZE {
            self.nodes.push(KdNode::Leaf {
                start: offset,
                end: offset + order.len(),
            });
            return node_idx;
        }

        // Reserve the slot, patched once both children exist
        self.nodes.push(KdNode::Leaf { start: offset, end: offset });

        let dim = self.widest_axis(order);
        let mid = order.len() / 2;
        let points = &self.points;
        order.select_nth_unstable_by(mid, |&a, &b| points[a][dim].total_cmp(&points[b][dim]));
        let split = self.points[order[mid]][dim];

        let (lo, hi) = order.split_at_mut(mid);
        let left = self.build_node(lo, offset);
        let right = self.build_node(hi, offset + mid);

        self.nodes[node_idx] = KdNode::Internal { dim, split, left, right };
        node_idx
    }

    fn widest_axis(&self, order: &[usize]) -> usize {
        let mut min = [f64::MAX; 2];
        let mut max = [f64::MIN; 2];
        for &i in order {
            let p = self.points[i];
            for d in 0..2 {
                min[d] = min[d].min(p[d]);
                max[d] = max[d].max(p[d]);
            }
        }

        if max[1] - min[1] > max[0] - min[0] { 1 } else { 0 }
    }

    fn search(&self, node_idx: usize, point: &NVec2, k: usize, heap: &mut BinaryHeap<Candidate>) {
        match self.nodes[node_idx] {
            KdNode::Leaf { start, end } => {
                for &i in &self.order[start..end] {
                    let cand = Candidate {
                        dist2: (self.points[i] - point).norm_squared(),
                        index: i,
                    };
                    if heap.len() < k {
                        heap.push(cand);
                    } else if heap.peek().is_some_and(|worst| cand < *worst) {
                        heap.pop();
                        heap.push(cand);
                    }
                }
            }
            KdNode::Internal { dim, split, left, right } => {
                let diff = point[dim] - split;
                let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };

                self.search(near, point, k, heap);

                // Everything behind the split line is at least |diff| away
                let visit_far = heap.len() < k
                    || heap.peek().map_or(true, |worst| diff * diff <= worst.dist2);
                if visit_far {
                    self.search(far, point, k, heap);
                }
            }
        }
    }
}

/// Heap entry ordered by squared distance, then by index
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    dist2: f64,
    index: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist2
            .total_cmp(&other.dist2)
            .then(self.index.cmp(&other.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
