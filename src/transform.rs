use std::ops;

use nalgebra::{Matrix3, Rotation3, Vector3};
use ndarray::{Array2, ArrayView2, Axis};

use crate::access::{check_point_set, ToVector3};
use crate::error::Error;

/// Rigid motion `p -> rotation * p + translation`.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidTransform {
    /// Orthonormal 3x3 matrix with determinant +1.
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Creates a transform from its parts. The rotation must be proper.
    pub fn from_parts(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Rotation given by euler angles in radians (roll about x, pitch about y, yaw about z).
    pub fn from_euler(x: f64, y: f64, z: f64) -> Self {
        Self {
            rotation: *Rotation3::from_euler_angles(x, y, z).matrix(),
            translation: Vector3::zeros(),
        }
    }

    pub fn transform_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point + self.translation
    }

    /// Rotates a direction, e.g. a normal. Translation is ignored.
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.transpose();
        Self {
            translation: -(rotation * self.translation),
            rotation,
        }
    }

    /// Rotation angle in radians.
    pub fn angle(&self) -> f64 {
        ((self.rotation.trace() - 1.0) * 0.5).clamp(-1.0, 1.0).acos()
    }

    /// Whether the rotation is orthonormal with determinant +1 within `epsilon`.
    pub fn is_proper(&self, epsilon: f64) -> bool {
        let orthogonality = (self.rotation.transpose() * self.rotation - Matrix3::identity()).abs().max();
        orthogonality < epsilon && (self.rotation.determinant() - 1.0).abs() < epsilon
    }

    /// Transforms every row of a (N, 3) array.
    pub fn transform(&self, mut points: Array2<f64>) -> Array2<f64> {
        for mut point in points.axis_iter_mut(Axis(0)) {
            let v = self.transform_point(&point.to_vector3());
            point[0] = v[0];
            point[1] = v[1];
            point[2] = v[2];
        }

        points
    }

    /// Rotates every row of a (N, 3) array of directions.
    pub fn transform_normals(&self, normals: &ArrayView2<f64>) -> Array2<f64> {
        let mut result = normals.to_owned();
        for mut normal in result.axis_iter_mut(Axis(0)) {
            let v = self.transform_vector(&normal.to_vector3());
            normal[0] = v[0];
            normal[1] = v[1];
            normal[2] = v[2];
        }
        result
    }
}

impl ops::Mul<&ArrayView2<'_, f64>> for &RigidTransform {
    type Output = Array2<f64>;

    fn mul(self, rhs: &ArrayView2<f64>) -> Self::Output {
        self.transform(rhs.to_owned())
    }
}

impl ops::Mul<&Array2<f64>> for &RigidTransform {
    type Output = Array2<f64>;

    fn mul(self, rhs: &Array2<f64>) -> Self::Output {
        self.transform(rhs.clone())
    }
}

impl ops::Mul<&Vector3<f64>> for &RigidTransform {
    type Output = Vector3<f64>;

    fn mul(self, rhs: &Vector3<f64>) -> Self::Output {
        self.transform_point(rhs)
    }
}

/// Composition: `(lhs * rhs)(p) = lhs(rhs(p))`.
impl ops::Mul<&RigidTransform> for &RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: &RigidTransform) -> Self::Output {
        RigidTransform {
            rotation: self.rotation * rhs.rotation,
            translation: self.rotation * rhs.translation + self.translation,
        }
    }
}

/// Applies a rigid transform to a point set.
///
/// # Returns
///
/// A new array with the same shape as `points`.
pub fn apply_rigid_transform(
    points: &ArrayView2<f64>,
    transform: &RigidTransform,
) -> Result<Array2<f64>, Error> {
    check_point_set("transformed", points)?;
    Ok(transform * points)
}

/// Rotates a point set about the origin.
///
/// # Arguments
///
/// * points - (N, 3) point set.
/// * x, y, z - Euler angles in radians, applied about the x, y and z axis.
pub fn rotate(points: &ArrayView2<f64>, x: f64, y: f64, z: f64) -> Result<Array2<f64>, Error> {
    apply_rigid_transform(points, &RigidTransform::from_euler(x, y, z))
}
