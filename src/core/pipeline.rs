use crate::core::geometry::Vertex;
use nalgebra::{Vector3, Vector4};
use std::ops::{Add, Mul};

/// Trait for types that can be linearly interpolated across a triangle's
/// surface: they must support the linear combination `a + b * t` used by
/// barycentric interpolation.
pub trait Interpolatable: Copy + Clone + Add<Output = Self> + Mul<f32, Output = Self> {}

/// The programmable stages a device program runs for each primitive.
///
/// `Varying` is the per-vertex output of the vertex stage; the rasterizer
/// interpolates it with perspective-correct barycentrics and hands the
/// result to the fragment stage.
pub trait Shader {
    type Varying: Interpolatable;

    /// Transforms a vertex into homogeneous clip space and produces the
    /// varying data associated with it.
    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying);

    /// Computes the final linear RGB color for one fragment.
    fn fragment(&self, varying: Self::Varying) -> Vector3<f32>;
}
