use serde_derive::{Deserialize, Serialize};

use crate::error::Error;

/// Parameters of the ICP drivers and of the start rotation search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcpParams {
    /// Fraction of the processed points used to estimate each iteration's transform, in (0, 1].
    pub subsample_rate: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// The driver stops when the error metric changes less than this between two iterations.
    pub tolerance: f64,
    /// Maximum angle in radians between matched normals for normal based matching.
    pub max_normal_angle: f64,
    /// Neighborhood size used to estimate point cloud normals.
    pub normal_neighbors: usize,
    /// Euler angle increment in radians of the start rotation candidates.
    pub start_rotation_step: f64,
    /// Iterations of the trial alignment run for each start rotation candidate.
    pub trial_iterations: usize,
    /// Seed of the subsampling random generator.
    pub seed: u64,
    /// Draws a new subsample every iteration instead of once per run.
    pub resample_each_iteration: bool,
}

impl Default for IcpParams {
    fn default() -> Self {
        Self {
            subsample_rate: 0.3,
            max_iterations: 50,
            tolerance: 1e-6,
            max_normal_angle: std::f64::consts::FRAC_PI_4,
            normal_neighbors: 10,
            start_rotation_step: std::f64::consts::FRAC_PI_2,
            trial_iterations: 10,
            seed: 0,
            resample_each_iteration: false,
        }
    }
}

impl IcpParams {
    pub fn subsample_rate(&'_ mut self, value: f64) -> &'_ mut IcpParams {
        self.subsample_rate = value;
        self
    }

    pub fn max_iterations(&'_ mut self, value: usize) -> &'_ mut IcpParams {
        self.max_iterations = value;
        self
    }

    pub fn tolerance(&'_ mut self, value: f64) -> &'_ mut IcpParams {
        self.tolerance = value;
        self
    }

    pub fn max_normal_angle(&'_ mut self, value: f64) -> &'_ mut IcpParams {
        self.max_normal_angle = value;
        self
    }

    pub fn seed(&'_ mut self, value: u64) -> &'_ mut IcpParams {
        self.seed = value;
        self
    }

    pub fn resample_each_iteration(&'_ mut self, value: bool) -> &'_ mut IcpParams {
        self.resample_each_iteration = value;
        self
    }

    /// Checks every parameter range. Called by the drivers before any computation.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.subsample_rate > 0.0 && self.subsample_rate <= 1.0) {
            return Err(Error::invalid_parameter(format!(
                "subsample_rate must be in (0, 1], got {}",
                self.subsample_rate
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid_parameter("max_iterations must be positive"));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(Error::invalid_parameter(format!(
                "tolerance must be finite and >= 0, got {}",
                self.tolerance
            )));
        }
        if !(self.max_normal_angle > 0.0 && self.max_normal_angle <= std::f64::consts::PI) {
            return Err(Error::invalid_parameter(format!(
                "max_normal_angle must be in (0, pi], got {}",
                self.max_normal_angle
            )));
        }
        if self.normal_neighbors < 3 {
            return Err(Error::invalid_parameter(
                "normal_neighbors must be at least 3",
            ));
        }
        if !(self.start_rotation_step > 0.0
            && self.start_rotation_step <= std::f64::consts::TAU)
        {
            return Err(Error::invalid_parameter(format!(
                "start_rotation_step must be in (0, 2pi], got {}",
                self.start_rotation_step
            )));
        }
        if self.trial_iterations == 0 {
            return Err(Error::invalid_parameter("trial_iterations must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::IcpParams;
    use crate::error::Error;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(IcpParams::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut params = IcpParams::default();
        assert!(matches!(
            params.subsample_rate(0.0).validate(),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            params.subsample_rate(1.2).validate(),
            Err(Error::InvalidParameter(_))
        ));

        let mut params = IcpParams::default();
        assert!(matches!(
            params.max_iterations(0).validate(),
            Err(Error::InvalidParameter(_))
        ));

        let mut params = IcpParams::default();
        assert!(matches!(
            params.tolerance(-1.0).validate(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_partial_config() {
        let params: IcpParams =
            serde_json::from_str(r#"{"subsample_rate": 0.5, "max_iterations": 20}"#).unwrap();
        assert_eq!(params.subsample_rate, 0.5);
        assert_eq!(params.max_iterations, 20);
        assert_eq!(params.tolerance, IcpParams::default().tolerance);
        assert!(!params.resample_each_iteration);

        let params: IcpParams =
            serde_json::from_str(r#"{"resample_each_iteration": true}"#).unwrap();
        assert!(params.resample_each_iteration);
    }
}
