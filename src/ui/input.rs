use crate::scene::camera::Camera;

/// Per-frame snapshot of the input the camera cares about.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSample {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Cursor movement since the previous frame, in pixels. Positive Y
    /// means the cursor moved up.
    pub mouse_delta: (f32, f32),
    pub scroll_delta: f32,
}

/// Turns absolute cursor positions into per-frame deltas. The first sample
/// yields zero so an off-center initial cursor does not snap the view.
#[derive(Debug, Default)]
pub struct CursorTracker {
    last: Option<(f32, f32)>,
}

impl CursorTracker {
    pub fn delta(&mut self, x: f32, y: f32) -> (f32, f32) {
        let delta = match self.last {
            // Screen Y grows downward, so invert it here.
            Some((last_x, last_y)) => (x - last_x, last_y - y),
            None => (0.0, 0.0),
        };
        self.last = Some((x, y));
        delta
    }
}

/// Maps an [`InputSample`] onto camera motion: WASD translation scaled by
/// speed and frame time, mouse rotation scaled by sensitivity, scroll zoom.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub speed: f32,
    pub sensitivity: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self { speed, sensitivity }
    }

    pub fn apply(&self, camera: &mut Camera, input: &InputSample, dt: f32) {
        let step = self.speed * dt;
        if input.forward {
            camera.translate(camera.target() * step);
        }
        if input.back {
            camera.translate(-camera.target() * step);
        }
        if input.left {
            camera.translate(-camera.right() * step);
        }
        if input.right {
            camera.translate(camera.right() * step);
        }

        let (dx, dy) = input.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            camera.rotate(dx * self.sensitivity, dy * self.sensitivity);
        }

        if input.scroll_delta != 0.0 {
            camera.zoom(input.scroll_delta);
        }
    }
}
