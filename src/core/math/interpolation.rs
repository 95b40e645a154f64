use nalgebra::{Point2, Vector3};

const EPSILON: f32 = 1e-5;

/// Calculates the barycentric coordinates (alpha, beta, gamma) of point p
/// with respect to triangle (v1, v2, v3).
///
/// Returns `None` if the triangle is degenerate (area is near zero).
pub fn barycentric_coordinates(
    p: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
    v3: Point2<f32>,
) -> Option<Vector3<f32>> {
    let e1 = v2 - v1;
    let e2 = v3 - v1;
    let p_v1 = p - v1;

    // Determinant (2x area of the triangle)
    let total_area_x2 = e1.x * e2.y - e1.y * e2.x;
    if total_area_x2.abs() < EPSILON {
        return None;
    }
    let inv_total_area_x2 = 1.0 / total_area_x2;

    let beta = (p_v1.x * e2.y - p_v1.y * e2.x) * inv_total_area_x2;
    let gamma = (e1.x * p_v1.y - e1.y * p_v1.x) * inv_total_area_x2;
    let alpha = 1.0 - beta - gamma;

    Some(Vector3::new(alpha, beta, gamma))
}

/// Checks if the barycentric coordinates represent a point inside the triangle.
#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
}

/// Compute perspective-correct barycentric coordinates.
///
/// The corrected weights are `alpha * (1/w1)` etc., renormalized to sum to 1.
/// Returns `None` when numerical instability is detected (sum near zero).
pub fn perspective_correct_barycentric(
    bary: Vector3<f32>,
    w1: f32,
    w2: f32,
    w3: f32,
) -> Option<Vector3<f32>> {
    let inv_w1 = if w1.abs() > EPSILON { 1.0 / w1 } else { 1.0 };
    let inv_w2 = if w2.abs() > EPSILON { 1.0 / w2 } else { 1.0 };
    let inv_w3 = if w3.abs() > EPSILON { 1.0 / w3 } else { 1.0 };

    let wa = bary.x * inv_w1;
    let wb = bary.y * inv_w2;
    let wc = bary.z * inv_w3;

    let sum = wa + wb + wc;
    if sum.abs() < EPSILON {
        return None;
    }
    let inv_sum = 1.0 / sum;
    Some(Vector3::new(wa * inv_sum, wb * inv_sum, wc * inv_sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barycentric_center_is_one_third_each() {
        let bary = barycentric_coordinates(
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 3.0),
        )
        .unwrap();
        assert!((bary.x - 1.0 / 3.0).abs() < 1e-5);
        assert!((bary.y - 1.0 / 3.0).abs() < 1e-5);
        assert!((bary.z - 1.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn degenerate_triangle_returns_none() {
        let bary = barycentric_coordinates(
            Point2::new(0.5, 0.5),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        );
        assert!(bary.is_none());
    }

    #[test]
    fn outside_point_is_rejected() {
        let bary = barycentric_coordinates(
            Point2::new(-1.0, -1.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        )
        .unwrap();
        assert!(!is_inside_triangle(bary));
    }
}
