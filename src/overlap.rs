use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::access::{check_point_set, ToVector3};
use crate::error::Error;
use crate::kdtree::{KdTree, SpatialIndex};
use crate::mesh::check_faces;

/// Multiple of the median target point spacing used as default overlap distance.
pub const OVERLAP_SPACING_FACTOR: f64 = 3.0;

/// Split of the processed faces by whether they overlap the target.
#[derive(Debug, Clone, PartialEq)]
pub struct FacePartition {
    /// Rows of the faces whose three vertices are close to the target.
    pub overlapping: Vec<usize>,
    /// Rows of the remaining faces.
    pub non_overlapping: Vec<usize>,
    /// Distance threshold used for the split.
    pub max_distance: f64,
}

impl FacePartition {
    /// Gathers the overlapping rows of `faces`.
    pub fn overlapping_faces(&self, faces: &ArrayView2<usize>) -> Array2<usize> {
        faces.select(Axis(0), &self.overlapping)
    }

    /// Gathers the non overlapping rows of `faces`.
    pub fn non_overlapping_faces(&self, faces: &ArrayView2<usize>) -> Array2<usize> {
        faces.select(Axis(0), &self.non_overlapping)
    }
}

/// Neighbors searched per point to skip duplicates of it.
const SPACING_NEIGHBORS: usize = 16;

/// Median distance between each target point and its closest distinct target point.
///
/// Coincident points, e.g. duplicated mesh vertices along seams, are skipped.
fn median_spacing(kdtree: &KdTree, target: &ArrayView2<f64>) -> Result<f64, Error> {
    if target.nrows() < 2 {
        return Err(Error::invalid_parameter(
            "overlap distance can not be derived from a target with less than 2 points",
        ));
    }

    let mut spacings: Vec<f64> = (0..target.nrows())
        .into_par_iter()
        .filter_map(|row| {
            kdtree
                .knn(&target.row(row).to_vector3(), SPACING_NEIGHBORS)
                .into_iter()
                .find(|nn| nn.sq_distance > 0.0)
                .map(|nn| nn.distance())
        })
        .collect();

    if spacings.is_empty() {
        return Err(Error::invalid_parameter(
            "overlap distance can not be derived from a target of coincident points",
        ));
    }

    let mid = spacings.len() / 2;
    let (_, median, _) = spacings.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    Ok(*median)
}

/// Classifies the faces of the processed mesh into overlapping and non overlapping.
///
/// A face overlaps when each of its three vertices lies within `max_distance`
/// of its nearest target point.
///
/// # Arguments
///
/// * target - (N, 3) target points.
/// * processed - (M, 3) vertices of the processed mesh.
/// * faces - (F, 3) vertex indices into `processed`.
/// * max_distance - Overlap threshold. When `None`, [`OVERLAP_SPACING_FACTOR`]
///   times the median point spacing of the target.
///
/// # Returns
///
/// A disjoint partition of `0..F`, both lists in increasing order.
pub fn find_non_overlapping_faces(
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
    faces: &ArrayView2<usize>,
    max_distance: Option<f64>,
) -> Result<FacePartition, Error> {
    check_point_set("processed", processed)?;
    check_faces(faces, processed.nrows())?;
    let kdtree = KdTree::new(target)?;

    let max_distance = match max_distance {
        Some(distance) if distance.is_finite() && distance >= 0.0 => distance,
        Some(distance) => {
            return Err(Error::invalid_parameter(format!(
                "max_distance must be finite and >= 0, got {}",
                distance
            )))
        }
        None => OVERLAP_SPACING_FACTOR * median_spacing(&kdtree, target)?,
    };

    let max_sq_distance = max_distance * max_distance;
    let close: Vec<bool> = kdtree
        .nearest_all(processed)
        .iter()
        .map(|nn| nn.sq_distance <= max_sq_distance)
        .collect();

    let (overlapping, non_overlapping): (Vec<usize>, Vec<usize>) = (0..faces.nrows())
        .partition(|&face| faces.row(face).iter().all(|&vertex| close[vertex]));

    log::debug!(
        "{} of {} faces overlap at distance {}",
        overlapping.len(),
        faces.nrows(),
        max_distance
    );

    Ok(FacePartition {
        overlapping,
        non_overlapping,
        max_distance,
    })
}
