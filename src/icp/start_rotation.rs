use nalgebra::{Matrix3, Rotation3};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use super::icp::{Icp, IcpResult};
use super::icp_params::IcpParams;
use crate::access::{centroid, check_point_set};
use crate::error::Error;
use crate::transform::RigidTransform;

/// Two rotations closer than this (max absolute entry difference) are the same candidate.
const SAME_ROTATION_EPSILON: f64 = 1e-9;

/// Best initial orientation of the processed points.
#[derive(Debug, Clone)]
pub struct StartRotation {
    /// The processed points after the winning trial run.
    pub points: Array2<f64>,
    /// Rotation about the processed centroid the winning trial started from.
    pub rotation: RigidTransform,
    /// Transform from the processed points to `points`, `rotation` included.
    pub transform: RigidTransform,
    /// Error metric of `points`, never above the error of the unrotated points.
    pub error: f64,
    /// Index of the winning rotation in [`candidate_rotations`].
    pub candidate: usize,
}

/// Distinct rotations of the euler angle grid with increment `step` about x, y and z.
///
/// The identity always comes first. A 90 degrees step gives the 24 rotations of the cube.
pub fn candidate_rotations(step: f64) -> Vec<Matrix3<f64>> {
    let steps = ((std::f64::consts::TAU / step) + 1e-9).floor().max(1.0) as usize;
    let angles: Vec<f64> = (0..steps).map(|i| i as f64 * step).collect();

    let mut rotations: Vec<Matrix3<f64>> = Vec::new();
    for &x in &angles {
        for &y in &angles {
            for &z in &angles {
                let rotation = *Rotation3::from_euler_angles(x, y, z).matrix();
                if !rotations
                    .iter()
                    .any(|other| (other - rotation).amax() < SAME_ROTATION_EPSILON)
                {
                    rotations.push(rotation);
                }
            }
        }
    }
    rotations
}

/// Searches the start orientation from which ICP best aligns the processed points.
///
/// Every candidate of [`candidate_rotations`] rotates the processed points
/// about their centroid, then a short point to point ICP of
/// `params.trial_iterations` iterations scores it. Candidates are evaluated in
/// parallel; ties go to the earliest candidate. The winning trial's aligned
/// points are returned.
///
/// # Arguments
///
/// * target - (N, 3) target points.
/// * processed - (M, 3) points to orient.
/// * params - `start_rotation_step`, `trial_iterations` and the ICP parameters of the trials.
pub fn find_best_start_rotation(
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
    params: &IcpParams,
) -> Result<StartRotation, Error> {
    check_point_set("processed", processed)?;

    let mut trial_params = *params;
    trial_params.max_iterations(params.trial_iterations);
    let icp = Icp::new(trial_params, target)?;

    let center = centroid(processed);
    let about_center =
        |rotation: &Matrix3<f64>| RigidTransform::from_parts(*rotation, center - rotation * center);

    let candidates = candidate_rotations(params.start_rotation_step);
    let trials = candidates
        .par_iter()
        .enumerate()
        .map(|(index, rotation)| {
            let rotated = &about_center(rotation) * processed;
            // The trial keeps the lowest error geometry, the rotated start included.
            let trial =
                icp.align_with_seed(&rotated.view(), params.seed.wrapping_add(index as u64))?;
            log::trace!(
                "Start rotation {}: error {:.6e} after {} iterations",
                index,
                trial.error,
                trial.iterations
            );
            Ok(trial)
        })
        .collect::<Result<Vec<IcpResult>, Error>>()?;

    let candidate = trials
        .iter()
        .enumerate()
        .fold(0, |best, (index, trial)| {
            if trial.error < trials[best].error {
                index
            } else {
                best
            }
        });
    let best = trials.into_iter().nth(candidate).ok_or_else(|| {
        Error::invalid_parameter("start_rotation_step gives no candidate rotation")
    })?;

    let rotation = about_center(&candidates[candidate]);
    log::debug!(
        "Best start rotation {} of {} (angle {:.1}°), error {:.6e}",
        candidate,
        candidates.len(),
        rotation.angle().to_degrees(),
        best.error
    );

    Ok(StartRotation {
        points: best.points,
        transform: &best.transform * &rotation,
        rotation,
        error: best.error,
        candidate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    use crate::metrics::error_metric;
    use crate::unit_test::grid_cloud;

    #[test]
    fn test_candidate_rotations() {
        let rotations = candidate_rotations(std::f64::consts::FRAC_PI_2);
        assert_eq!(rotations.len(), 24);
        assert_eq!(rotations[0], Matrix3::identity());
        for rotation in &rotations {
            assert_abs_diff_eq!(rotation.determinant(), 1.0, epsilon = 1e-9);
        }

        assert_eq!(candidate_rotations(std::f64::consts::TAU).len(), 1);
        assert_eq!(candidate_rotations(std::f64::consts::PI).len(), 4);
    }

    #[test]
    fn test_recovers_half_turn() {
        let mut rng = StdRng::seed_from_u64(7);
        let target = Array2::from_shape_fn((200, 3), |(_, axis)| {
            rng.gen_range(0.0..[3.0, 2.0, 1.0][axis])
        });
        let center = centroid(&target.view());
        let half_turn = *Rotation3::from_euler_angles(0.0, 0.0, std::f64::consts::PI).matrix();
        let processed =
            &RigidTransform::from_parts(half_turn, center - half_turn * center) * &target;

        let result =
            find_best_start_rotation(&target.view(), &processed.view(), &IcpParams::default())
                .unwrap();

        assert!(result.error < 1e-9, "error {}", result.error);
        assert_ne!(result.candidate, 0);
        assert_abs_diff_eq!(result.rotation.angle(), std::f64::consts::PI, epsilon = 1e-6);
        assert!(result.rotation.is_proper(1e-9));
        assert_abs_diff_eq!(
            error_metric(&target.view(), &result.points.view()).unwrap(),
            0.0,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_never_worse_than_start(grid_cloud: Array2<f64>) {
        let processed = &RigidTransform::from_parts(
            *Rotation3::from_euler_angles(0.4, 0.1, -0.3).matrix(),
            Vector3::new(0.3, 0.1, 0.0),
        ) * &grid_cloud;
        let mut params = IcpParams::default();
        params.trial_iterations = 2;

        let result =
            find_best_start_rotation(&grid_cloud.view(), &processed.view(), &params).unwrap();

        let returned = error_metric(&grid_cloud.view(), &result.points.view()).unwrap();
        assert_abs_diff_eq!(returned, result.error, epsilon = 1e-12);
        assert!(returned <= error_metric(&grid_cloud.view(), &processed.view()).unwrap() + 1e-12);
    }

    #[rstest]
    #[case(0, 66.1)]
    #[case(3, 45.0)]
    #[case(19, 29.2)]
    fn test_returned_points_match_error(#[case] seed: u64, #[case] degrees: f64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let target = Array2::from_shape_fn((200, 3), |(_, axis)| {
            rng.gen_range(0.0..[3.0, 2.0, 1.0][axis])
        });
        let processed = &RigidTransform::from_euler(0.0, 0.0, degrees.to_radians()) * &target;

        let result =
            find_best_start_rotation(&target.view(), &processed.view(), &IcpParams::default())
                .unwrap();

        let returned = error_metric(&target.view(), &result.points.view()).unwrap();
        assert_abs_diff_eq!(returned, result.error, epsilon = 1e-12);
        assert!(returned <= error_metric(&target.view(), &processed.view()).unwrap());

        // The points are the processed points moved by the reported transform.
        assert!(result.transform.is_proper(1e-9));
        let expected = &result.transform * &processed;
        for (actual, expected) in result.points.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(actual, expected, epsilon = 1e-9);
        }
    }
}
