use nalgebra::{Cholesky, Const, SMatrix, SVector};

/// Smallest accepted ratio between the smallest and the largest squared Cholesky pivot.
const MIN_CONDITION_RATIO: f64 = 1e-12;

/// Implements the standard Gauss Newton optimization
///
/// # Type parameters
///
/// * `DIM` - The dimension of the problem.
pub struct GaussNewton<const DIM: usize> {
    hessian: SMatrix<f64, DIM, DIM>,
    gradient: SVector<f64, DIM>,
    count: usize,
}

impl<const DIM: usize> Default for GaussNewton<DIM> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const DIM: usize> GaussNewton<DIM> {
    /// Creates a new Gauss Newton optimizer.
    pub fn new() -> Self {
        Self {
            hessian: SMatrix::zeros(),
            gradient: SVector::zeros(),
            count: 0,
        }
    }

    /// Adds a new step to the optimizer.
    ///
    /// # Arguments
    ///
    /// * `residual` - The residual of the step.
    /// * `jacobian` - The jacobian of the step.
    pub fn step(&mut self, residual: f64, jacobian: &[f64; DIM]) {
        for i in 0..DIM {
            let ival = jacobian[i];
            self.gradient[i] += ival * residual;

            self.hessian[(i, i)] += ival * ival;
            for j in i + 1..DIM {
                let mul = ival * jacobian[j];
                self.hessian[(i, j)] += mul;
                self.hessian[(j, i)] += mul;
            }
        }

        self.count += 1;
    }

    /// Solve the current gauss newton system.
    ///
    /// # Returns
    ///
    /// The update vector, or `None` if no step was added or the system is
    /// singular (some direction is not constrained by the steps).
    pub fn solve(&self) -> Option<SVector<f64, DIM>> {
        if self.count == 0 {
            return None;
        }

        let cholesky = Cholesky::<f64, Const<DIM>>::new(self.hessian)?;
        let (min_pivot, max_pivot) = {
            let l = cholesky.l_dirty();
            (0..DIM).fold((f64::INFINITY, 0.0f64), |(min, max), i| {
                let pivot = l[(i, i)] * l[(i, i)];
                (min.min(pivot), max.max(pivot))
            })
        };
        if min_pivot <= MIN_CONDITION_RATIO * max_pivot {
            return None;
        }

        Some(cholesky.solve(&self.gradient))
    }

    /// Number of steps added.
    pub fn count(&self) -> usize {
        self.count
    }
}
