use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::access::{centroid, flatten_vectors, ToVector3};
use crate::error::Error;
use crate::kdtree::KdTree;

/// Relative eigenvalue below which a neighborhood is taken as a line (or a single point).
const COLINEAR_RATIO: f64 = 1e-10;

/// Plane normal of a neighborhood, or `None` if it does not span a plane.
fn fit_plane_normal(neighbors: &[Vector3<f64>]) -> Option<Vector3<f64>> {
    if neighbors.len() < 3 {
        return None;
    }

    let mean = neighbors.iter().sum::<Vector3<f64>>() / neighbors.len() as f64;
    let covariance = neighbors
        .iter()
        .map(|p| {
            let centered = p - mean;
            centered * centered.transpose()
        })
        .sum::<Matrix3<f64>>();

    let eigen = SymmetricEigen::new(covariance);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    let (smallest, middle, largest) = (order[0], order[1], order[2]);

    let largest_value = eigen.eigenvalues[largest];
    if largest_value <= f64::EPSILON
        || eigen.eigenvalues[middle] <= COLINEAR_RATIO * largest_value
    {
        return None;
    }

    let normal = eigen.eigenvectors.column(smallest).into_owned();
    let norm = normal.norm();
    (norm > f64::EPSILON).then(|| normal / norm)
}

/// Estimates per point normals of an unstructured point cloud.
///
/// Each normal is the direction of least variance of the `k` nearest
/// neighbors of the point (itself included). Normals are flipped to point away
/// from the cloud centroid; this orientation is a heuristic and is only
/// reliable for closed, roughly convex shapes.
///
/// # Arguments
///
/// * points - (N, 3) point cloud.
/// * k - Neighborhood size, at least 3.
///
/// # Returns
///
/// (N, 3) unit normals. Points whose neighborhood is degenerate (fewer than 3
/// points, or all colinear) get a zero vector, meaning "normal unavailable".
pub fn estimate_normals(points: &ArrayView2<f64>, k: usize) -> Result<Array2<f64>, Error> {
    if k < 3 {
        return Err(Error::invalid_parameter(format!(
            "normal estimation needs at least 3 neighbors, got {}",
            k
        )));
    }
    let kdtree = KdTree::new(points)?;
    let center = centroid(points);

    let normals: Vec<Vector3<f64>> = (0..points.nrows())
        .into_par_iter()
        .map(|row| {
            let point = points.row(row).to_vector3();
            let neighbors: Vec<Vector3<f64>> = kdtree
                .knn(&point, k)
                .iter()
                .map(|nn| points.row(nn.index).to_vector3())
                .collect();

            match fit_plane_normal(&neighbors) {
                Some(normal) if normal.dot(&(point - center)) < 0.0 => -normal,
                Some(normal) => normal,
                None => Vector3::zeros(),
            }
        })
        .collect();

    Ok(flatten_vectors(normals))
}

/// Checks that a (N, 3) normal array pairs with a point set of `num_points` rows.
pub(crate) fn check_normals(
    name: &'static str,
    normals: &ArrayView2<f64>,
    num_points: usize,
) -> Result<(), Error> {
    let (rows, cols) = normals.dim();
    if cols != 3 {
        return Err(Error::InvalidShape {
            name,
            rows,
            cols,
            expected_cols: 3,
        });
    }
    crate::access::check_same_rows(name, rows, "points", num_points)
}
