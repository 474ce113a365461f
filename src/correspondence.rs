use itertools::izip;
use ndarray::{Array2, ArrayView2, Axis};

use crate::access::{check_point_set, check_same_rows, ToVector3};
use crate::error::Error;
use crate::kdtree::{KdTree, SpatialIndex};
use crate::normals::check_normals;
use crate::trig::angle_between_lines;

/// Pairs of processed and target points.
#[derive(Debug, Clone)]
pub struct Correspondences {
    /// (K, 3) processed points, in query order.
    pub processed: Array2<f64>,
    /// (K, 3) matched target points; row `i` is the closest target point to `processed` row `i`.
    pub matched: Array2<f64>,
    /// Target row of each match.
    pub target_indices: Vec<usize>,
    /// Squared distance of each pair.
    pub sq_distances: Vec<f64>,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.target_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target_indices.is_empty()
    }

    /// Mean of the squared pair distances, 0 for no pairs.
    pub fn mean_squared_distance(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.sq_distances.iter().sum::<f64>() / self.len() as f64
    }
}

/// Correspondences carrying the normal of each matched target point.
#[derive(Debug, Clone)]
pub struct NormalCorrespondences {
    /// Accepted pairs.
    pub pairs: Correspondences,
    /// (K, 3) normals of the matched target points.
    pub matched_normals: Array2<f64>,
    /// Processed row of each accepted pair.
    pub processed_indices: Vec<usize>,
    /// Number of processed points whose match was rejected.
    pub rejected: usize,
}

/// Matches every processed point to its nearest target point.
///
/// # Arguments
///
/// * target - (N, 3) target point set. Must not be empty.
/// * processed - (M, 3) points to match.
///
/// # Returns
///
/// M pairs, one per processed row. Several processed rows may share the same target row.
pub fn find_correspondences(
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
) -> Result<Correspondences, Error> {
    let kdtree = KdTree::new(target)?;
    find_correspondences_with(&kdtree, target, processed)
}

/// Same as [`find_correspondences`], but reuses an index built over `target`.
pub fn find_correspondences_with<I: SpatialIndex>(
    index: &I,
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
) -> Result<Correspondences, Error> {
    check_point_set("target", target)?;
    check_point_set("processed", processed)?;
    check_same_rows("index", index.len(), "target", target.nrows())?;

    let neighbors = index.nearest_all(processed);
    let target_indices: Vec<usize> = neighbors.iter().map(|nn| nn.index).collect();

    Ok(Correspondences {
        processed: processed.to_owned(),
        matched: target.select(Axis(0), &target_indices),
        sq_distances: neighbors.iter().map(|nn| nn.sq_distance).collect(),
        target_indices,
    })
}

/// Nearest point matching that also returns target normals and filters
/// matches with incompatible normals.
///
/// A match is rejected when the target normal is unavailable (zero), or when
/// the processed normal is available and the angle between the lines of both
/// normals is above `max_normal_angle`. The sign of the normals is ignored
/// since point cloud normals are not consistently oriented.
///
/// # Arguments
///
/// * index - Index built over `target`.
/// * target - (N, 3) target points.
/// * processed - (M, 3) points to match.
/// * target_normals - (N, 3) target normals.
/// * processed_normals - Optional (M, 3) normals of the processed points. Without them no angle test is done.
/// * max_normal_angle - Maximum angle in radians.
pub fn find_correspondences_normal_based<I: SpatialIndex>(
    index: &I,
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
    target_normals: &ArrayView2<f64>,
    processed_normals: Option<&ArrayView2<f64>>,
    max_normal_angle: f64,
) -> Result<NormalCorrespondences, Error> {
    check_normals("target normals", target_normals, target.nrows())?;
    if let Some(processed_normals) = processed_normals {
        check_normals("processed normals", processed_normals, processed.nrows())?;
    }

    let all = find_correspondences_with(index, target, processed)?;

    let accepted: Vec<usize> = (0..all.len())
        .filter(|&row| {
            let target_normal = target_normals.row(all.target_indices[row]).to_vector3();
            if target_normal.norm_squared() == 0.0 {
                return false;
            }

            match processed_normals.map(|normals| normals.row(row).to_vector3()) {
                Some(processed_normal) => angle_between_lines(&processed_normal, &target_normal)
                    .map_or(true, |angle| angle <= max_normal_angle),
                None => true,
            }
        })
        .collect();

    let rejected = all.len() - accepted.len();
    if rejected > 0 {
        log::trace!("Rejected {} of {} normal matches", rejected, all.len());
    }

    let target_indices: Vec<usize> = accepted.iter().map(|&row| all.target_indices[row]).collect();
    let sq_distances = accepted.iter().map(|&row| all.sq_distances[row]).collect();
    Ok(NormalCorrespondences {
        pairs: Correspondences {
            processed: all.processed.select(Axis(0), &accepted),
            matched: all.matched.select(Axis(0), &accepted),
            sq_distances,
            target_indices: target_indices.clone(),
        },
        matched_normals: target_normals.select(Axis(0), &target_indices),
        processed_indices: accepted,
        rejected,
    })
}

/// Sum of the squared distances between the rows of two paired arrays.
pub(crate) fn sum_squared_distances(lhs: &ArrayView2<f64>, rhs: &ArrayView2<f64>) -> f64 {
    izip!(lhs.axis_iter(Axis(0)), rhs.axis_iter(Axis(0)))
        .map(|(l, r)| (l.to_vector3() - r.to_vector3()).norm_squared())
        .sum()
}
