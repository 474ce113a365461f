use nalgebra::Vector3;

/// Point to plane term of a pair, linearized around the identity motion
/// about a fixed pivot.
///
/// With `p' = p - pivot`, a small motion `p' -> p' + w x p' + t` changes the
/// distance of the processed point to the matched plane by `[n, p' x n] . [t, w]`.
pub struct PointPlaneDistance {
    pivot: Vector3<f64>,
}

impl PointPlaneDistance {
    /// Linearizes about `pivot`, usually the centroid of the processed points.
    pub fn about(pivot: Vector3<f64>) -> Self {
        Self { pivot }
    }

    /// Residual and Jacobian of one pair.
    ///
    /// # Arguments
    ///
    /// * processed - Point to move.
    /// * matched - Its match on the target.
    /// * normal - Normal of the target at `matched`.
    ///
    /// # Returns
    ///
    /// `((matched - processed) . normal, [normal, (processed - pivot) x normal])`,
    /// or `None` for a zero normal, which gives no plane to measure against.
    pub fn linearize(
        &self,
        processed: &Vector3<f64>,
        matched: &Vector3<f64>,
        normal: &Vector3<f64>,
    ) -> Option<(f64, [f64; 6])> {
        if normal.norm_squared() == 0.0 {
            return None;
        }

        let lever = (processed - self.pivot).cross(normal);
        let residual = (matched - processed).dot(normal);
        Some((
            residual,
            [normal.x, normal.y, normal.z, lever.x, lever.y, lever.z],
        ))
    }
}
