use nalgebra::Vector3;

/// A 2D buffer holding linear-space color and depth for one frame.
///
/// All rendering is single-threaded, so plain vectors are enough; the
/// buffer is resolved to a packed ARGB image once per frame for display.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    color: Vec<Vector3<f32>>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![Vector3::zeros(); width * height],
            depth: vec![f32::INFINITY; width * height],
        }
    }

    /// Resets every pixel to `color` and every depth sample to infinity.
    pub fn clear(&mut self, color: Vector3<f32>) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Depth test and update. Returns true if `new_depth` is closer than the
    /// stored value, in which case the depth buffer is updated.
    #[inline]
    pub fn depth_test_and_set(&mut self, x: usize, y: usize, new_depth: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        if new_depth >= self.depth[idx] {
            return false;
        }
        self.depth[idx] = new_depth;
        true
    }

    /// Writes a linear-space color. Call only after a passing depth test.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Vector3<f32>) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.color[idx] = color;
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if self.in_bounds(x, y) {
            Some(self.color[self.index(x, y)])
        } else {
            None
        }
    }

    /// Gamma-corrects the linear color buffer and packs it as 0RGB u32
    /// values, the format the window expects for presentation.
    pub fn resolve_argb(&self, out: &mut Vec<u32>) {
        out.clear();
        out.reserve(self.width * self.height);
        let gamma = 1.0 / 2.2;
        for c in &self.color {
            let r = (c.x.max(0.0).powf(gamma).min(1.0) * 255.0) as u32;
            let g = (c.y.max(0.0).powf(gamma).min(1.0) * 255.0) as u32;
            let b = (c.z.max(0.0).powf(gamma).min(1.0) * 255.0) as u32;
            out.push((r << 16) | (g << 8) | b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_accepts_closer_and_rejects_farther() {
        let mut fb = FrameBuffer::new(4, 4);
        assert!(fb.depth_test_and_set(1, 1, 0.5));
        assert!(!fb.depth_test_and_set(1, 1, 0.7));
        assert!(fb.depth_test_and_set(1, 1, 0.2));
    }

    #[test]
    fn clear_resets_color_and_depth() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.depth_test_and_set(0, 0, 0.1);
        fb.set_pixel(0, 0, Vector3::new(1.0, 0.0, 0.0));
        fb.clear(Vector3::new(0.2, 0.2, 0.2));
        assert_eq!(fb.get_pixel(0, 0), Some(Vector3::new(0.2, 0.2, 0.2)));
        assert!(fb.depth_test_and_set(0, 0, 0.9));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        assert!(!fb.depth_test_and_set(5, 5, 0.1));
        assert_eq!(fb.get_pixel(5, 5), None);
    }

    #[test]
    fn resolve_packs_full_white() {
        let mut fb = FrameBuffer::new(1, 1);
        fb.set_pixel(0, 0, Vector3::new(1.0, 1.0, 1.0));
        let mut out = Vec::new();
        fb.resolve_argb(&mut out);
        assert_eq!(out, vec![0x00FF_FFFF]);
    }
}
