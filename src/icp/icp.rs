use std::time::Instant;

use ndarray::{Array2, ArrayView2, Axis};
use rand::{rngs::StdRng, SeedableRng};

use super::icp_params::IcpParams;
use super::rigid::{
    estimate_rigid_transform, estimate_rigid_transform_normal_based, MIN_CORRESPONDENCES,
};
use crate::{
    access::check_point_set,
    correspondence::{find_correspondences_normal_based, find_correspondences_with},
    error::Error,
    kdtree::KdTree,
    metrics::error_metric_with,
    normals::{check_normals, estimate_normals},
    sampling::subsample_indices_at_least,
    transform::RigidTransform,
};

/// Progress of an ICP run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcpState {
    Initialized,
    Iterating,
    /// The error changed less than the tolerance between two iterations.
    Converged,
    /// Stopped by the iteration cap. Not an error, the best geometry is still returned.
    MaxIterationsReached,
    /// An iteration after the first could not estimate a transform. The best
    /// geometry found before it is returned.
    Interrupted,
}

/// Output of an ICP run.
#[derive(Debug, Clone)]
pub struct IcpResult {
    /// Lowest error geometry seen, possibly the input itself.
    pub points: Array2<f64>,
    /// Cumulative transform from the input processed points to `points`.
    pub transform: RigidTransform,
    pub state: IcpState,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Error metric of `points`.
    pub error: f64,
}

/// Local transform of one iteration and the number of pairs that produced it.
struct IterationStep {
    transform: RigidTransform,
    correspondences: usize,
}

/// Iterative Closest Point (ICP) alignment of a processed point set onto a fixed target.
///
/// The target index is built once, so one instance can align several processed sets.
pub struct Icp<'target> {
    /// Parameters of the ICP algorithm.
    pub params: IcpParams,
    target: ArrayView2<'target, f64>,
    kdtree: KdTree,
    target_normals: Option<Array2<f64>>,
}

impl<'target> Icp<'target> {
    /// Create a new ICP instance.
    ///
    /// # Arguments
    ///
    /// * params - Parameters of the ICP algorithm. Validated here.
    /// * target - (N, 3) target points.
    pub fn new(params: IcpParams, target: &ArrayView2<'target, f64>) -> Result<Self, Error> {
        params.validate()?;
        Ok(Self {
            params,
            target: target.clone(),
            kdtree: KdTree::new(target)?,
            target_normals: None,
        })
    }

    /// Uses the given (N, 3) target normals, e.g. mesh normals, instead of
    /// estimating them in [`Icp::align_normal_based`]. Zero rows mark missing normals.
    pub fn with_target_normals(mut self, normals: &ArrayView2<f64>) -> Result<Self, Error> {
        check_normals("target normals", normals, self.target.nrows())?;
        self.target_normals = Some(normals.to_owned());
        Ok(self)
    }

    /// Aligns the processed points to the target with point to point steps.
    ///
    /// # Arguments
    ///
    /// * processed - (M, 3) points to move.
    ///
    /// # Returns
    ///
    /// The best aligned points, their transform and how the run ended.
    pub fn align(&self, processed: &ArrayView2<f64>) -> Result<IcpResult, Error> {
        self.align_with_seed(processed, self.params.seed)
    }

    pub(crate) fn align_with_seed(
        &self,
        processed: &ArrayView2<f64>,
        seed: u64,
    ) -> Result<IcpResult, Error> {
        self.run(processed, seed, |working, _, _| {
            let pairs = find_correspondences_with(&self.kdtree, &self.target, working)?;
            let estimate =
                estimate_rigid_transform(&pairs.matched.view(), &pairs.processed.view())?;
            Ok(IterationStep {
                transform: estimate.transform,
                correspondences: pairs.len(),
            })
        })
    }

    /// Aligns the processed points to the target with point to plane steps.
    ///
    /// Matches whose normals differ by more than `max_normal_angle` are
    /// dropped. Normals of the processed points are estimated once and rotated
    /// along with the points.
    ///
    /// # Returns
    ///
    /// [`Error::Degenerate`] if the first iteration's pairs can not constrain
    /// every degree of freedom, e.g. on a planar target. A later degenerate
    /// iteration ends the run with [`IcpState::Interrupted`].
    pub fn align_normal_based(&self, processed: &ArrayView2<f64>) -> Result<IcpResult, Error> {
        check_point_set("processed", processed)?;

        let estimated;
        let target_normals = match &self.target_normals {
            Some(normals) => normals.view(),
            None => {
                estimated = estimate_normals(&self.target, self.params.normal_neighbors)?;
                estimated.view()
            }
        };
        let processed_normals = estimate_normals(processed, self.params.normal_neighbors)?;

        self.run(processed, self.params.seed, |working, sample, transform| {
            let working_normals = transform
                .transform_normals(&processed_normals.select(Axis(0), sample).view());
            let found = find_correspondences_normal_based(
                &self.kdtree,
                &self.target,
                working,
                &target_normals,
                Some(&working_normals.view()),
                self.params.max_normal_angle,
            )?;
            let transform = estimate_rigid_transform_normal_based(
                &found.pairs.matched.view(),
                &found.pairs.processed.view(),
                &found.matched_normals.view(),
            )?;
            Ok(IterationStep {
                transform,
                correspondences: found.pairs.len(),
            })
        })
    }

    /// Runs the iterations, `estimate` computes the local transform of the
    /// working subsample given the sampled rows and the cumulative transform.
    ///
    /// A failing `estimate` on the first iteration is returned as the error.
    /// Later failures stop the run with [`IcpState::Interrupted`].
    fn run<F>(
        &self,
        processed: &ArrayView2<f64>,
        seed: u64,
        mut estimate: F,
    ) -> Result<IcpResult, Error>
    where
        F: FnMut(&ArrayView2<f64>, &[usize], &RigidTransform) -> Result<IterationStep, Error>,
    {
        check_point_set("processed", processed)?;

        let num_points = processed.nrows();
        let min_rows = MIN_CORRESPONDENCES.min(num_points);
        let rate = self.params.subsample_rate;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample = subsample_indices_at_least(num_points, rate, min_rows, &mut rng)?;

        let mut points = processed.to_owned();
        let mut transform = RigidTransform::identity();
        let mut error = error_metric_with(&self.kdtree, &points.view())?;

        let mut best_points = points.clone();
        let mut best_transform = transform.clone();
        let mut best_error = error;

        let mut state = IcpState::Initialized;
        let mut iterations = 0;
        log::debug!(
            "ICP {:?}: {} processed points, {} sampled, error {:.6e}",
            state,
            processed.nrows(),
            sample.len(),
            error
        );

        for iteration in 0..self.params.max_iterations {
            if state == IcpState::Initialized {
                state = IcpState::Iterating;
                log::debug!("ICP {:?}", state);
            }

            let start = Instant::now();
            if iteration > 0 && self.params.resample_each_iteration {
                sample = subsample_indices_at_least(num_points, rate, min_rows, &mut rng)?;
            }
            let working = points.select(Axis(0), &sample);
            let step = match estimate(&working.view(), sample.as_slice(), &transform) {
                Ok(step) => step,
                Err(err) if iteration > 0 => {
                    log::warn!("ICP iteration {} failed, keeping best: {}", iteration + 1, err);
                    state = IcpState::Interrupted;
                    break;
                }
                Err(err) => return Err(err),
            };

            points = &step.transform * &points;
            transform = &step.transform * &transform;
            let new_error = error_metric_with(&self.kdtree, &points.view())?;
            iterations = iteration + 1;

            log::debug!(
                "ICP iteration {}: {} correspondences, error {:.6e}, {:?}",
                iterations,
                step.correspondences,
                new_error,
                start.elapsed()
            );

            if new_error < best_error {
                best_error = new_error;
                best_points = points.clone();
                best_transform = transform.clone();
            }

            let change = (error - new_error).abs();
            error = new_error;
            if change < self.params.tolerance {
                state = IcpState::Converged;
                break;
            }
        }

        if !matches!(state, IcpState::Converged | IcpState::Interrupted) {
            state = IcpState::MaxIterationsReached;
        }
        log::debug!(
            "ICP {:?} after {} iterations, best error {:.6e}",
            state,
            iterations,
            best_error
        );

        Ok(IcpResult {
            points: best_points,
            transform: best_transform,
            state,
            iterations,
            error: best_error,
        })
    }
}

/// Point to point ICP of `processed` onto `target`. See [`Icp::align`].
pub fn icp_optimized(
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
    params: &IcpParams,
) -> Result<IcpResult, Error> {
    Icp::new(*params, target)?.align(processed)
}

/// Point to plane ICP of `processed` onto `target` with estimated normals.
/// See [`Icp::align_normal_based`].
pub fn icp_normal_based(
    target: &ArrayView2<f64>,
    processed: &ArrayView2<f64>,
    params: &IcpParams,
) -> Result<IcpResult, Error> {
    Icp::new(*params, target)?.align_normal_based(processed)
}
