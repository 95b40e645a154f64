use nalgebra::{Point3, Vector2, Vector3};

/// Represents a single vertex in 3D space.
///
/// Vertices are packed contiguously for upload: position at byte offset 0,
/// normal at 12, texture coordinates at 24 (see [`VertexLayout::packed`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

/// Byte-offset/stride description telling the device how to interpret a
/// packed vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub position_offset: usize,
    pub normal_offset: usize,
    pub texcoord_offset: usize,
}

impl VertexLayout {
    /// The fixed layout used by every mesh in this crate: three f32 for the
    /// position, three for the normal, two for the texture coordinates.
    pub fn packed() -> Self {
        Self {
            stride: 32,
            position_offset: 0,
            normal_offset: 12,
            texcoord_offset: 24,
        }
    }
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self::packed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_matches_vertex_fields() {
        let layout = VertexLayout::packed();
        assert_eq!(layout.position_offset, 0);
        assert_eq!(layout.normal_offset, 12);
        assert_eq!(layout.texcoord_offset, 24);
        assert_eq!(layout.stride, 32);
    }
}
