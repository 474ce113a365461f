use nalgebra::Vector3;

/// Angle in radians between the lines supported by two vectors, in [0, pi/2].
/// The sign of the vectors is ignored. Returns `None` if any of them is zero.
pub fn angle_between_lines(lfs: &Vector3<f64>, rfs: &Vector3<f64>) -> Option<f64> {
    let norms = lfs.norm() * rfs.norm();
    if norms <= f64::EPSILON {
        return None;
    }
    Some((lfs.dot(rfs).abs() / norms).min(1.0).acos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_angles() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);

        assert_abs_diff_eq!(
            angle_between_lines(&x, &y).unwrap(),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(angle_between_lines(&x, &(-x * 2.0)).unwrap(), 0.0);
        assert_abs_diff_eq!(
            angle_between_lines(&x, &Vector3::new(1.0, 1.0, 0.0)).unwrap(),
            std::f64::consts::FRAC_PI_4,
            epsilon = 1e-12
        );
        assert_eq!(angle_between_lines(&x, &Vector3::zeros()), None);
    }
}
