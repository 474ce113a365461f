use std::collections::BinaryHeap;

use nalgebra::Vector3;
use ndarray::ArrayView2;
use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::access::{check_point_set, ToVector3};
use crate::error::Error;

const LEAF_SIZE: usize = 16;

/// Result of a nearest neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row of the indexed point set.
    pub index: usize,
    /// Squared euclidean distance to the query.
    pub sq_distance: f64,
}

impl Neighbor {
    /// Euclidean distance to the query.
    pub fn distance(&self) -> f64 {
        self.sq_distance.sqrt()
    }
}

/// Nearest neighbor search over a fixed point set.
///
/// Implementations are built once from a (N, 3) array and are only read
/// afterwards, so a single index can be queried from many threads.
pub trait SpatialIndex: Send + Sync {
    /// Finds the indexed row closest to `query`.
    fn nearest(&self, query: &Vector3<f64>) -> Neighbor;

    /// Number of indexed points.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the nearest indexed row for every row of `queries`. Queries run in parallel.
    ///
    /// # Arguments
    ///
    /// * queries - (M, 3) array of query points.
    ///
    /// # Returns
    ///
    /// One neighbor per query row, in query order.
    fn nearest_all(&self, queries: &ArrayView2<f64>) -> Vec<Neighbor> {
        (0..queries.nrows())
            .into_par_iter()
            .map(|row| self.nearest(&queries.row(row).to_vector3()))
            .collect()
    }
}

enum KdNode {
    Leaf {
        points: Vec<Vector3<f64>>,
        indices: Vec<usize>,
    },
    NonLeaf {
        axis: usize,
        middle_value: f64,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

/// KdTree for fast nearest neighbor search.
pub struct KdTree {
    root: Box<KdNode>,
    len: usize,
}

impl KdTree {
    /// Create a new KdTree from a set of points.
    /// The points are stored in a 2D array, where each row is a point.
    ///
    /// # Arguments
    ///
    /// * points - (N, 3) array of points. Must not be empty.
    pub fn new(points: &ArrayView2<f64>) -> Result<Self, Error> {
        check_point_set("target", points)?;

        // Recursive creation.
        fn rec(points: &[Vector3<f64>], mut indices: Vec<usize>, depth: usize) -> KdNode {
            // Stop recursion if this should be a leaf node.
            if indices.len() <= LEAF_SIZE {
                return KdNode::Leaf {
                    points: indices.iter().map(|&idx| points[idx]).collect(),
                    indices,
                };
            }

            let axis = depth % 3;
            let mid = indices.len() / 2;
            indices.select_nth_unstable_by(mid, |idx1, idx2| {
                points[*idx1][axis].total_cmp(&points[*idx2][axis])
            });
            let right = indices.split_off(mid);

            KdNode::NonLeaf {
                axis,
                middle_value: points[right[0]][axis],
                left: Box::new(rec(points, indices, depth + 1)),
                right: Box::new(rec(points, right, depth + 1)),
            }
        }

        let vectors: Vec<Vector3<f64>> = points.rows().into_iter().map(|row| row.to_vector3()).collect();
        let len = vectors.len();
        Ok(KdTree {
            root: Box::new(rec(&vectors, (0..len).collect(), 0)),
            len,
        })
    }

    /// Find the `k` nearest neighbors of a query point.
    ///
    /// # Returns
    ///
    /// Up to `k` neighbors sorted by increasing distance.
    pub fn knn(&self, query: &Vector3<f64>, k: usize) -> Vec<Neighbor> {
        let mut heap = BinaryHeap::with_capacity(k + 1);
        if k > 0 {
            knn_rec(&self.root, query, k, &mut heap);
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|(sq_distance, index)| Neighbor {
                index,
                sq_distance: sq_distance.0,
            })
            .collect()
    }
}

fn nearest_rec(node: &KdNode, query: &Vector3<f64>, best: &mut Neighbor) {
    match node {
        KdNode::Leaf { points, indices } => {
            for (point, index) in points.iter().zip(indices) {
                let sq_distance = (point - query).norm_squared();
                if sq_distance < best.sq_distance {
                    *best = Neighbor {
                        index: *index,
                        sq_distance,
                    };
                }
            }
        }
        KdNode::NonLeaf {
            axis,
            middle_value,
            left,
            right,
        } => {
            let diff = query[*axis] - middle_value;
            let (near, far) = if diff < 0.0 {
                (left, right)
            } else {
                (right, left)
            };

            nearest_rec(near, query, best);
            if diff * diff < best.sq_distance {
                nearest_rec(far, query, best);
            }
        }
    }
}

fn knn_rec(
    node: &KdNode,
    query: &Vector3<f64>,
    k: usize,
    heap: &mut BinaryHeap<(OrderedFloat<f64>, usize)>,
) {
    match node {
        KdNode::Leaf { points, indices } => {
            for (point, index) in points.iter().zip(indices) {
                let sq_distance = OrderedFloat((point - query).norm_squared());
                if heap.len() < k {
                    heap.push((sq_distance, *index));
                } else if let Some(&(worst, _)) = heap.peek() {
                    if sq_distance < worst {
                        heap.pop();
                        heap.push((sq_distance, *index));
                    }
                }
            }
        }
        KdNode::NonLeaf {
            axis,
            middle_value,
            left,
            right,
        } => {
            let diff = query[*axis] - middle_value;
            let (near, far) = if diff < 0.0 {
                (left, right)
            } else {
                (right, left)
            };

            knn_rec(near, query, k, heap);
            let bound = if heap.len() < k {
                f64::INFINITY
            } else {
                heap.peek().map_or(f64::INFINITY, |(worst, _)| worst.0)
            };
            if diff * diff < bound {
                knn_rec(far, query, k, heap);
            }
        }
    }
}

impl SpatialIndex for KdTree {
    fn nearest(&self, query: &Vector3<f64>) -> Neighbor {
        let mut best = Neighbor {
            index: 0,
            sq_distance: f64::INFINITY,
        };
        nearest_rec(&self.root, query, &mut best);
        best
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Linear scan index. Only worth it for small point sets, also useful as a reference.
pub struct BruteForce {
    points: Vec<Vector3<f64>>,
}

impl BruteForce {
    pub fn new(points: &ArrayView2<f64>) -> Result<Self, Error> {
        check_point_set("target", points)?;
        Ok(Self {
            points: points.rows().into_iter().map(|row| row.to_vector3()).collect(),
        })
    }
}

impl SpatialIndex for BruteForce {
    fn nearest(&self, query: &Vector3<f64>) -> Neighbor {
        self.points
            .iter()
            .enumerate()
            .map(|(index, point)| Neighbor {
                index,
                sq_distance: (point - query).norm_squared(),
            })
            .min_by(|a, b| a.sq_distance.total_cmp(&b.sq_distance))
            .unwrap_or(Neighbor {
                index: 0,
                sq_distance: f64::INFINITY,
            })
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}
