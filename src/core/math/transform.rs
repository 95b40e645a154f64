use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for creating transformation matrices.
/// Manually implemented to ensure control over the coordinate system (Right-Handed).
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Creates a translation matrix.
    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Creates a uniform scaling matrix.
    pub fn scaling(scale: f32) -> Matrix4<f32> {
        Matrix4::new(
            scale, 0.0,   0.0,   0.0,
            0.0,   scale, 0.0,   0.0,
            0.0,   0.0,   scale, 0.0,
            0.0,   0.0,   0.0,   1.0,
        )
    }

    /// Creates a View matrix (Look-At, Right-Handed).
    /// Transforms world space coordinates to camera/view space.
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        // In RHS, camera looks down -Z
        let z_axis = (eye - target).normalize();
        let x_axis = up.cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);

        let rotation = Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, 0.0,
            y_axis.x, y_axis.y, y_axis.z, 0.0,
            z_axis.x, z_axis.y, z_axis.z, 0.0,
            0.0,      0.0,      0.0,      1.0,
        );

        rotation * Self::translation(&-eye.coords)
    }

    /// Creates a Perspective Projection matrix (Right-Handed).
    /// Maps the view frustum to NDC [-1, 1].
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad / 2.0).tan();
        let nf = 1.0 / (near - far);

        Matrix4::new(
            f / aspect_ratio, 0.0, 0.0,                0.0,
            0.0,              f,   0.0,                0.0,
            0.0,              0.0, (far + near) * nf,  2.0 * far * near * nf,
            0.0,              0.0, -1.0,               0.0,
        )
    }
}

/// Computes the normal matrix for a model matrix:
/// the transpose of the inverse of its upper-left 3x3 block.
///
/// Falls back to the plain 3x3 block when the matrix is not invertible
/// (degenerate scale), which only ever happens for zero-scaled objects.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into();
    match linear.try_inverse() {
        Some(inv) => inv.transpose(),
        None => linear,
    }
}

//=================================
// Core Transformation Functions
//=================================

/// Performs perspective division: Clip Space -> NDC.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Point3<f32> {
    let w = clip.w;
    if w.abs() > 1e-6 {
        Point3::new(clip.x / w, clip.y / w, clip.z / w)
    } else {
        Point3::origin()
    }
}

/// Converts NDC coordinates to Screen coordinates (Viewport Transform).
/// Note: Y-axis is flipped (NDC +Y is up, Screen +Y is down).
#[inline]
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, width: f32, height: f32) -> Point2<f32> {
    Point2::new(
        (ndc_x + 1.0) * 0.5 * width,
        (1.0 - (ndc_y + 1.0) * 0.5) * height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn look_at_maps_eye_to_origin() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        let view = TransformFactory::look_at(
            &eye,
            &Point3::new(0.0, 0.0, 0.0),
            &Vector3::new(0.0, 1.0, 0.0),
        );
        let mapped = view * eye.to_homogeneous();
        assert!(mapped.x.abs() < 1e-5);
        assert!(mapped.y.abs() < 1e-5);
        assert!(mapped.z.abs() < 1e-5);
    }

    #[test]
    fn normal_matrix_of_identity_is_identity() {
        let m = Matrix4::identity();
        assert!((normal_matrix(&m) - Matrix3::identity()).norm() < 1e-6);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_model_scale() {
        // Scaling X by 2 must scale normals' X by 1/2 (before renormalization).
        let mut model = Matrix4::identity();
        model[(0, 0)] = 2.0;
        let n = normal_matrix(&model);
        assert!((n[(0, 0)] - 0.5).abs() < 1e-6);
        assert!((n[(1, 1)] - 1.0).abs() < 1e-6);
    }
}
