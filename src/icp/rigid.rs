use itertools::izip;
use nalgebra::{Matrix3, Rotation3, Vector3};
use ndarray::{ArrayView2, Axis};

use super::cost_function::PointPlaneDistance;
use crate::access::{centroid, check_point_set, check_same_rows, ToVector3};
use crate::correspondence::sum_squared_distances;
use crate::error::Error;
use crate::normals::check_normals;
use crate::optim::GaussNewton;
use crate::transform::RigidTransform;

/// Minimum number of pairs to estimate a rigid transform.
pub const MIN_CORRESPONDENCES: usize = 3;

/// Result of the point to point estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidEstimate {
    /// Transform that maps the processed points onto the matched ones.
    pub transform: RigidTransform,
    /// Mean of `|R * p + t - q|^2` over the pairs, after applying `transform`.
    pub mean_squared_error: f64,
}

fn check_pairs(matched: &ArrayView2<f64>, processed: &ArrayView2<f64>) -> Result<(), Error> {
    check_point_set("matched", matched)?;
    check_point_set("processed", processed)?;
    check_same_rows("matched", matched.nrows(), "processed", processed.nrows())?;
    if matched.nrows() < MIN_CORRESPONDENCES {
        return Err(Error::InsufficientCorrespondences {
            found: matched.nrows(),
            required: MIN_CORRESPONDENCES,
        });
    }
    Ok(())
}

/// Least squares rigid transform between paired point sets (Kabsch/Procrustes).
///
/// # Arguments
///
/// * matched - (K, 3) target side of the pairs.
/// * processed - (K, 3) points to move, row `i` pairs with `matched` row `i`.
///
/// # Returns
///
/// The transform minimizing the sum of `|R * processed_i + t - matched_i|^2`.
/// A reflection in the SVD solution is corrected, so the rotation always has
/// determinant +1.
pub fn estimate_rigid_transform(
    matched: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
) -> Result<RigidEstimate, Error> {
    check_pairs(matched, processed)?;

    let target_centroid = centroid(matched);
    let source_centroid = centroid(processed);

    let cross_covariance = izip!(processed.axis_iter(Axis(0)), matched.axis_iter(Axis(0)))
        .map(|(p, q)| {
            (p.to_vector3() - source_centroid) * (q.to_vector3() - target_centroid).transpose()
        })
        .sum::<Matrix3<f64>>();

    let svd = cross_covariance.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(Error::degenerate("SVD of the cross covariance failed")),
    };

    let mut v = v_t.transpose();
    let mut rotation = v * u.transpose();
    if rotation.determinant() < 0.0 {
        let smallest = svd.singular_values.imin();
        let flipped = -v.column(smallest);
        v.set_column(smallest, &flipped);
        rotation = v * u.transpose();
    }

    let transform = RigidTransform::from_parts(
        rotation,
        target_centroid - rotation * source_centroid,
    );

    let moved = &transform * processed;
    let mean_squared_error =
        sum_squared_distances(&moved.view(), matched) / matched.nrows() as f64;

    Ok(RigidEstimate {
        transform,
        mean_squared_error,
    })
}

/// Rigid transform minimizing the point to plane distance of the pairs.
///
/// The problem is linearized around the identity (small rotation `w`) and
/// solved in one Gauss Newton step. Points are centered on the processed
/// centroid before the linearization. The rotation is rebuilt with the
/// exponential map, so it is exactly orthonormal.
///
/// # Arguments
///
/// * matched - (K, 3) target side of the pairs.
/// * processed - (K, 3) points to move.
/// * matched_normals - (K, 3) normals of `matched`. Pairs with a zero normal are ignored.
///
/// # Returns
///
/// The transform, or [`Error::Degenerate`] when the pairs do not constrain all
/// six degrees of freedom, e.g. every normal parallel or a spherical target.
pub fn estimate_rigid_transform_normal_based(
    matched: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
    matched_normals: &ArrayView2<f64>,
) -> Result<RigidTransform, Error> {
    check_pairs(matched, processed)?;
    check_normals("matched normals", matched_normals, matched.nrows())?;

    let center = centroid(processed);
    let term = PointPlaneDistance::about(center);
    let mut optimizer = GaussNewton::<6>::new();
    for (p, q, n) in izip!(
        processed.axis_iter(Axis(0)),
        matched.axis_iter(Axis(0)),
        matched_normals.axis_iter(Axis(0))
    ) {
        if let Some((residual, jacobian)) =
            term.linearize(&p.to_vector3(), &q.to_vector3(), &n.to_vector3())
        {
            optimizer.step(residual, &jacobian);
        }
    }

    if optimizer.count() < MIN_CORRESPONDENCES {
        return Err(Error::InsufficientCorrespondences {
            found: optimizer.count(),
            required: MIN_CORRESPONDENCES,
        });
    }

    let update = optimizer.solve().ok_or_else(|| {
        Error::degenerate(format!(
            "point to plane system of {} pairs is singular",
            optimizer.count()
        ))
    })?;

    let translation = Vector3::new(update[0], update[1], update[2]);
    let rotation = *Rotation3::new(Vector3::new(update[3], update[4], update[5])).matrix();

    // p -> R (p - c) + t + c
    Ok(RigidTransform::from_parts(
        rotation,
        translation + center - rotation * center,
    ))
}
