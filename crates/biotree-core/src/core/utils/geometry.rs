use nalgebra::{Matrix3, Point3, Vector3};

/// Applies a right-multiplying rotation followed by a translation: `p * R + t`.
///
/// The rotation is applied to the coordinate as a row vector, which is the
/// convention used by superposition routines that return `(rot, tran)` pairs.
pub fn apply_rigid_transform(
    point: &Point3<f64>,
    rotation: &Matrix3<f64>,
    translation: &Vector3<f64>,
) -> Point3<f64> {
    Point3::from(rotation.transpose() * point.coords + translation)
}

/// Weighted mean of a set of points.
///
/// Returns `None` when `points` is empty or the weights sum to zero. Pass
/// `None` as `weights` for the unweighted (geometric) mean.
pub fn weighted_centroid(points: &[Point3<f64>], weights: Option<&[f64]>) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    match weights {
        None => {
            let sum = points
                .iter()
                .fold(Vector3::zeros(), |acc, p| acc + p.coords);
            Some(Point3::from(sum / points.len() as f64))
        }
        Some(weights) => {
            if weights.len() != points.len() {
                return None;
            }
            let total: f64 = weights.iter().sum();
            if total == 0.0 {
                return None;
            }
            let sum = points
                .iter()
                .zip(weights)
                .fold(Vector3::zeros(), |acc, (p, w)| acc + p.coords * *w);
            Some(Point3::from(sum / total))
        }
    }
}

/// Element-wise closeness test with `numpy.allclose` default tolerances.
pub fn points_close(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    const RTOL: f64 = 1e-5;
    const ATOL: f64 = 1e-8;
    a.coords
        .iter()
        .zip(b.coords.iter())
        .all(|(x, y)| (x - y).abs() <= ATOL + RTOL * y.abs())
}
