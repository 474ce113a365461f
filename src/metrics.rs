use ndarray::{ArrayView2, Axis};

use crate::access::check_point_set;
use crate::error::Error;
use crate::kdtree::{KdTree, SpatialIndex};
use crate::overlap::find_non_overlapping_faces;
use crate::transform::RigidTransform;

/// Mean euclidean distance from every processed point to its nearest target point.
///
/// # Arguments
///
/// * target - (N, 3) target points.
/// * processed - (M, 3) points to evaluate.
///
/// # Returns
///
/// A value >= 0, zero only when every processed point lies on a target point.
pub fn error_metric(target: &ArrayView2<f64>, processed: &ArrayView2<f64>) -> Result<f64, Error> {
    let kdtree = KdTree::new(target)?;
    error_metric_with(&kdtree, processed)
}

/// Same as [`error_metric`] with an index already built over the target.
pub fn error_metric_with<I: SpatialIndex>(
    index: &I,
    processed: &ArrayView2<f64>,
) -> Result<f64, Error> {
    check_point_set("processed", processed)?;
    let distance_sum: f64 = index
        .nearest_all(processed)
        .iter()
        .map(|nn| nn.distance())
        .sum();
    Ok(distance_sum / processed.nrows() as f64)
}

/// Error metric restricted to the vertices of the faces that overlap the target.
///
/// See [`find_non_overlapping_faces`] for the meaning of `max_distance`.
/// Returns [`Error::EmptyPointSet`] when no face overlaps.
pub fn overlap_error_metric(
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
    faces: &ArrayView2<usize>,
    max_distance: Option<f64>,
) -> Result<f64, Error> {
    let partition = find_non_overlapping_faces(target, processed, faces, max_distance)?;

    let mut vertices: Vec<usize> = partition
        .overlapping_faces(faces)
        .iter()
        .copied()
        .collect();
    vertices.sort_unstable();
    vertices.dedup();
    if vertices.is_empty() {
        return Err(Error::EmptyPointSet("overlapping vertices"));
    }

    error_metric(target, &processed.select(Axis(0), &vertices).view())
}

/// Metrics for comparing two transforms.
#[derive(Clone, Debug, Default)]
pub struct TransformMetrics {
    /// Angle between the two rotations in radians.
    pub angle: f64,
    /// Translation vector size between the two transforms.
    pub translation: f64,
}

impl TransformMetrics {
    /// Creates a new `TransformMetrics` from two transforms.
    pub fn new(lfs: &RigidTransform, rhs: &RigidTransform) -> Self {
        let diff = &lfs.inverse() * rhs;

        Self {
            angle: diff.angle(),
            translation: diff.translation.norm(),
        }
    }

    /// Returns the total error of the two transforms.
    pub fn total(&self) -> f64 {
        self.angle + self.translation
    }
}

impl std::fmt::Display for TransformMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "angle: {:.2}°, translation: {:.5}",
            self.angle.to_degrees(),
            self.translation
        )
    }
}
