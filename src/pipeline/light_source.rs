use crate::core::geometry::Vertex;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::gpu::device::UniformMap;
use nalgebra::{Matrix4, Vector3, Vector4};
use std::ops::{Add, Mul};

/// The light-source pass interpolates nothing; this stands in for `()`,
/// which cannot implement `Add` here.
#[derive(Clone, Copy, Debug)]
pub struct NoVarying;

impl Add for NoVarying {
    type Output = Self;

    fn add(self, _other: Self) -> Self {
        NoVarying
    }
}

impl Mul<f32> for NoVarying {
    type Output = Self;

    fn mul(self, _scalar: f32) -> Self {
        NoVarying
    }
}

impl Interpolatable for NoVarying {}

/// Flat-color program for rendering the light marker meshes themselves:
/// transform by the combined matrix, emit `lightColor` unlit.
pub struct LightSourceProgram {
    mvp: Matrix4<f32>,
    color: Vector3<f32>,
}

impl LightSourceProgram {
    pub fn resolve(uniforms: &UniformMap) -> Self {
        let model = uniforms.mat4_or_identity("model");
        let view = uniforms.mat4_or_identity("view");
        let projection = uniforms.mat4_or_identity("projection");

        Self {
            mvp: projection * view * model,
            color: uniforms.vec3_or("lightColor", Vector3::new(1.0, 1.0, 1.0)),
        }
    }
}

impl Shader for LightSourceProgram {
    type Varying = NoVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        (self.mvp * vertex.position.to_homogeneous(), NoVarying)
    }

    fn fragment(&self, _varying: Self::Varying) -> Vector3<f32> {
        self.color
    }
}
