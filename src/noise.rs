use ndarray::{Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::access::check_point_set;
use crate::error::Error;

/// Adds independent gaussian noise to every coordinate. Meant for generating test data.
///
/// # Arguments
///
/// * points - (N, 3) point set.
/// * sd - Standard deviation of the noise, must be finite and >= 0.
/// * rng - Random source.
pub fn add_noise<R: Rng + ?Sized>(
    points: &ArrayView2<f64>,
    sd: f64,
    rng: &mut R,
) -> Result<Array2<f64>, Error> {
    check_point_set("noisy", points)?;
    if !(sd.is_finite() && sd >= 0.0) {
        return Err(Error::invalid_parameter(format!(
            "noise standard deviation must be finite and >= 0, got {}",
            sd
        )));
    }
    if sd == 0.0 {
        return Ok(points.to_owned());
    }

    let distribution = Normal::new(0.0, sd).map_err(Error::invalid_parameter)?;
    Ok(points + &Array2::random_using(points.dim(), distribution, rng))
}

/// Largest side of the axis-aligned bounding box of a point set.
pub fn bounding_box_scale(points: &ArrayView2<f64>) -> Result<f64, Error> {
    check_point_set("measured", points)?;
    Ok(points
        .axis_iter(Axis(1))
        .map(|coords| {
            let (min, max) = coords
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
                    (min.min(v), max.max(v))
                });
            max - min
        })
        .fold(0.0, f64::max))
}
