use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;

use crate::access::check_point_set;
use crate::error::Error;

fn check_rate(rate: f64) -> Result<(), Error> {
    if !(rate > 0.0 && rate <= 1.0) {
        return Err(Error::invalid_parameter(format!(
            "subsample rate must be in (0, 1], got {}",
            rate
        )));
    }
    Ok(())
}

/// Draws the rows of a uniform random subsample, without replacement.
///
/// # Arguments
///
/// * len - Number of rows of the point set.
/// * rate - Fraction of rows to keep, in (0, 1].
/// * rng - Random source. Seed it to get reproducible subsamples.
///
/// # Returns
///
/// `clamp(round(rate * len), 1, len)` distinct row indices in ascending order.
pub fn subsample_indices<R: Rng + ?Sized>(
    len: usize,
    rate: f64,
    rng: &mut R,
) -> Result<Vec<usize>, Error> {
    subsample_indices_at_least(len, rate, 1, rng)
}

/// Same as [`subsample_indices`], but keeps at least `min(min_rows, len)` rows.
pub fn subsample_indices_at_least<R: Rng + ?Sized>(
    len: usize,
    rate: f64,
    min_rows: usize,
    rng: &mut R,
) -> Result<Vec<usize>, Error> {
    check_rate(rate)?;
    if len == 0 {
        return Err(Error::EmptyPointSet("subsampled"));
    }

    let amount = ((rate * len as f64).round() as usize)
        .max(min_rows)
        .clamp(1, len);
    if amount == len {
        return Ok((0..len).collect());
    }

    let mut indices = rand::seq::index::sample(rng, len, amount).into_vec();
    indices.sort_unstable();
    Ok(indices)
}

/// Uniform random subsample of a point set.
///
/// # Arguments
///
/// * points - (N, 3) point set.
/// * rate - Fraction of rows to keep, in (0, 1].
/// * rng - Random source.
///
/// # Returns
///
/// A new (M, 3) array with M = `clamp(round(rate * N), 1, N)`, rows kept in their original order.
pub fn subsample<R: Rng + ?Sized>(
    points: &ArrayView2<f64>,
    rate: f64,
    rng: &mut R,
) -> Result<Array2<f64>, Error> {
    check_point_set("subsampled", points)?;
    let indices = subsample_indices(points.nrows(), rate, rng)?;
    Ok(points.select(Axis(0), &indices))
}
