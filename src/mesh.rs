use nalgebra::Vector3;
use ndarray::{Array2, ArrayView2, Axis};

use crate::access::{check_point_set, flatten_vectors, ToVector3};
use crate::error::Error;

/// Checks that `faces` is a non empty (M, 3) array of indices into `num_vertices` points.
pub fn check_faces(faces: &ArrayView2<usize>, num_vertices: usize) -> Result<(), Error> {
    let (rows, cols) = faces.dim();
    if cols != 3 {
        return Err(Error::InvalidShape {
            name: "faces",
            rows,
            cols,
            expected_cols: 3,
        });
    }
    if rows == 0 {
        return Err(Error::EmptyPointSet("faces"));
    }

    for (face, vertices) in faces.axis_iter(Axis(0)).enumerate() {
        if let Some(&index) = vertices.iter().find(|&&index| index >= num_vertices) {
            return Err(Error::FaceIndexOutOfRange {
                face,
                index,
                num_vertices,
            });
        }
    }
    Ok(())
}

/// Computes per vertex normals of a triangle mesh.
///
/// Each vertex normal is the sum of the (unnormalized) cross products of its
/// incident faces, so larger faces weight more, normalized at the end.
/// Orientation follows the face winding.
///
/// # Arguments
///
/// * points - (N, 3) vertices.
/// * faces - (M, 3) vertex indices.
///
/// # Returns
///
/// (N, 3) unit normals. Vertices without any incident face of non-zero area get a zero vector.
pub fn compute_normals(
    points: &ArrayView2<f64>,
    faces: &ArrayView2<usize>,
) -> Result<Array2<f64>, Error> {
    check_point_set("vertex", points)?;
    check_faces(faces, points.nrows())?;

    let mut vertex_normals = vec![Vector3::<f64>::zeros(); points.nrows()];
    for face in faces.axis_iter(Axis(0)) {
        let p0 = points.row(face[0]).to_vector3();
        let p1 = points.row(face[1]).to_vector3();
        let p2 = points.row(face[2]).to_vector3();

        let weighted_normal = (p1 - p0).cross(&(p2 - p0));
        for f in [face[0], face[1], face[2]] {
            vertex_normals[f] += weighted_normal;
        }
    }

    Ok(flatten_vectors(vertex_normals.into_iter().map(|normal| {
        let mag = normal.norm();
        if mag > f64::EPSILON {
            normal / mag
        } else {
            Vector3::zeros()
        }
    })))
}
