use crate::core::geometry::{Vertex, VertexLayout};
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::collections::HashMap;
use thiserror::Error;

/// Opaque identifier for a device-owned resource (buffer, texture, program).
pub type BufferHandle = u32;
pub type TextureHandle = u32;
pub type ProgramHandle = u32;
pub type VertexArrayHandle = u32;

/// The zero program: produced when shader compilation fails. Binding it is
/// a defined no-op, never a crash.
pub const NULL_PROGRAM: ProgramHandle = 0;

/// Number of texture units the device exposes.
pub const MAX_TEXTURE_UNITS: usize = 16;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader compilation failed: {reason}")]
    CompileFailed { reason: String },
    #[error("program link failed: {reason}")]
    LinkFailed { reason: String },
}

/// The GPU buffer handles owned by one mesh. Deliberately not `Clone`:
/// exactly one owner may release them.
#[derive(Debug)]
pub struct MeshBuffers {
    pub vertex_buffer: BufferHandle,
    pub index_buffer: BufferHandle,
    pub vertex_array: VertexArrayHandle,
}

/// Decoded image bytes ready for upload.
#[derive(Debug, Clone)]
pub struct PixelData {
    pub width: u32,
    pub height: u32,
    /// 3 (RGB) or 4 (RGBA, alpha ignored on upload).
    pub channels: u8,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// Sampler state applied at texture upload time.
#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub generate_mipmaps: bool,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            generate_mipmaps: true,
        }
    }
}

/// A value assignable to a named program uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vector3<f32>),
    Mat3(Matrix3<f32>),
    Mat4(Matrix4<f32>),
}

/// Named uniform storage for one program, with typed accessors used by the
/// built-in pipelines when a draw call is issued.
#[derive(Debug, Default)]
pub struct UniformMap {
    values: HashMap<String, UniformValue>,
}

impl UniformMap {
    pub fn set(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.values.get(name) {
            Some(UniformValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float_or(&self, name: &str, fallback: f32) -> f32 {
        match self.values.get(name) {
            Some(UniformValue::Float(v)) => *v,
            _ => fallback,
        }
    }

    pub fn vec3_or(&self, name: &str, fallback: Vector3<f32>) -> Vector3<f32> {
        match self.values.get(name) {
            Some(UniformValue::Vec3(v)) => *v,
            _ => fallback,
        }
    }

    pub fn mat3_or_identity(&self, name: &str) -> Matrix3<f32> {
        match self.values.get(name) {
            Some(UniformValue::Mat3(v)) => *v,
            _ => Matrix3::identity(),
        }
    }

    pub fn mat4_or_identity(&self, name: &str) -> Matrix4<f32> {
        match self.values.get(name) {
            Some(UniformValue::Mat4(v)) => *v,
            _ => Matrix4::identity(),
        }
    }
}

/// The graphics-device collaborator: buffer/texture upload, program
/// compilation, uniform assignment, and indexed draws, all through opaque
/// handles so callers never alias raw driver state.
///
/// All calls happen on the single render thread that owns the device.
pub trait GraphicsDevice {
    /// Uploads packed vertex and index data, returning the buffer set the
    /// mesh will own. Buffers are immutable after upload.
    fn upload_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        layout: &VertexLayout,
    ) -> MeshBuffers;

    /// Releases a mesh's buffers. Consumes the handle set, so a double
    /// free cannot be expressed.
    fn delete_mesh(&mut self, buffers: MeshBuffers);

    /// Uploads a 2D texture, generating mipmaps per the sampler descriptor.
    /// Leaves the active texture-unit bindings unspecified afterwards.
    fn upload_texture(&mut self, pixels: &PixelData, sampler: &SamplerDesc) -> TextureHandle;

    fn delete_texture(&mut self, handle: TextureHandle);

    /// Binds `handle` to the given texture unit for subsequent draws.
    fn bind_texture(&mut self, unit: usize, handle: TextureHandle);

    /// Clears every texture unit, so stale bindings from a previous draw
    /// cannot leak into the next one.
    fn unbind_all_textures(&mut self);

    /// Compiles and links a program from two source texts. On failure the
    /// caller is expected to log and carry on with [`NULL_PROGRAM`].
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, ShaderError>;

    fn delete_program(&mut self, program: ProgramHandle);

    /// Sets a named uniform on a program. Unknown programs (including the
    /// null program) are ignored.
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue);

    /// Issues one indexed-triangle draw over `index_count` indices of the
    /// bound mesh. Drawing with the null program submits no geometry.
    fn draw_indexed(&mut self, program: ProgramHandle, buffers: &MeshBuffers, index_count: usize);

    /// Clears the color and depth targets.
    fn clear(&mut self, color: Vector3<f32>);
}
