use nalgebra::Vector3;
use ndarray::{Array2, ArrayBase, ArrayView2, Data, Ix1};

use crate::error::Error;

/// Conversion of an ndarray row into a nalgebra vector.
pub trait ToVector3<T> {
    fn to_vector3(&self) -> Vector3<T>;
}

impl<S, T> ToVector3<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
    T: nalgebra::Scalar,
{
    fn to_vector3(&self) -> Vector3<T> {
        Vector3::new(self[0].clone(), self[1].clone(), self[2].clone())
    }
}

/// Packs a sequence of vectors into a (N, 3) array.
pub fn flatten_vectors<I>(vectors: I) -> Array2<f64>
where
    I: IntoIterator<Item = Vector3<f64>>,
{
    let vectors: Vec<Vector3<f64>> = vectors.into_iter().collect();
    Array2::from_shape_fn((vectors.len(), 3), |(i, j)| vectors[i][j])
}

/// Checks that `points` is a non empty (N, 3) array of finite values.
pub(crate) fn check_point_set(name: &'static str, points: &ArrayView2<f64>) -> Result<(), Error> {
    let (rows, cols) = points.dim();
    if cols != 3 {
        return Err(Error::InvalidShape {
            name,
            rows,
            cols,
            expected_cols: 3,
        });
    }
    if rows == 0 {
        return Err(Error::EmptyPointSet(name));
    }
    if !points.iter().all(|v| v.is_finite()) {
        return Err(Error::invalid_parameter(format!(
            "{} contains non-finite coordinates",
            name
        )));
    }
    Ok(())
}

/// Checks that two paired arrays have the same number of rows.
pub(crate) fn check_same_rows(
    left: &'static str,
    left_rows: usize,
    right: &'static str,
    right_rows: usize,
) -> Result<(), Error> {
    if left_rows != right_rows {
        return Err(Error::ShapeMismatch {
            left,
            left_rows,
            right,
            right_rows,
        });
    }
    Ok(())
}

/// Mean of the rows of a (N, 3) array.
pub(crate) fn centroid(points: &ArrayView2<f64>) -> Vector3<f64> {
    let sum = points
        .rows()
        .into_iter()
        .fold(Vector3::zeros(), |acc, row| acc + row.to_vector3());
    sum / points.nrows().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_check_point_set() {
        assert!(check_point_set("points", &array![[1.0, 2.0, 3.0]].view()).is_ok());
        assert_eq!(
            check_point_set("points", &Array2::<f64>::zeros((0, 3)).view()),
            Err(Error::EmptyPointSet("points"))
        );
        assert!(matches!(
            check_point_set("points", &array![[1.0, 2.0]].view()),
            Err(Error::InvalidShape { cols: 2, .. })
        ));
        assert!(matches!(
            check_point_set("points", &array![[1.0, f64::NAN, 0.0]].view()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_flatten_and_centroid() {
        let points = flatten_vectors(vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(3.0, 2.0, 4.0)]);
        assert_eq!(points, array![[1.0, 0.0, 0.0], [3.0, 2.0, 4.0]]);
        assert_eq!(centroid(&points.view()), Vector3::new(2.0, 1.0, 2.0));
        assert_eq!(points.row(1).to_vector3(), Vector3::new(3.0, 2.0, 4.0));
    }
}
