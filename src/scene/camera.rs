use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Pitch is clamped short of the poles so the view direction never becomes
/// collinear with the up vector.
const PITCH_LIMIT: f32 = 89.0;
const FOV_MIN: f32 = 1.0;
const FOV_MAX: f32 = 45.0;

/// Free-fly camera driven by yaw/pitch Euler angles in degrees.
///
/// The fields are private: every mutation goes through [`rotate`],
/// [`zoom`] or [`translate`], which maintain the angle and field-of-view
/// clamps and keep the cached view direction in sync.
///
/// [`rotate`]: Camera::rotate
/// [`zoom`]: Camera::zoom
/// [`translate`]: Camera::translate
#[derive(Debug, Clone)]
pub struct Camera {
    position: Point3<f32>,
    up: Vector3<f32>,
    /// Unit view direction derived from yaw and pitch.
    target: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    fov: f32,
}

impl Camera {
    pub fn new(position: Point3<f32>, yaw: f32, pitch: f32, fov: f32) -> Self {
        let mut camera = Self {
            position,
            up: Vector3::y(),
            target: -Vector3::z(),
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov: fov.clamp(FOV_MIN, FOV_MAX),
        };
        camera.update_target();
        camera
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Unit vector the camera looks along.
    pub fn target(&self) -> Vector3<f32> {
        self.target
    }

    /// Unit vector pointing to the camera's right, in the ground plane.
    pub fn right(&self) -> Vector3<f32> {
        self.target.cross(&self.up).normalize()
    }

    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::look_at(&self.position, &(self.position + self.target), &self.up)
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.position += offset;
    }

    /// Applies pre-scaled yaw and pitch offsets in degrees. Pitch is
    /// clamped to +-89 degrees; yaw accumulates unbounded.
    pub fn rotate(&mut self, yaw_offset: f32, pitch_offset: f32) {
        self.yaw += yaw_offset;
        self.pitch = (self.pitch + pitch_offset).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_target();
    }

    /// Narrows the field of view by `offset` degrees (scroll up zooms in).
    pub fn zoom(&mut self, offset: f32) {
        self.fov = (self.fov - offset).clamp(FOV_MIN, FOV_MAX);
    }

    fn update_target(&mut self) {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.target = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }
}
