use crate::core::geometry::{Vertex, VertexLayout};
use crate::gpu::device::{GraphicsDevice, MeshBuffers, ProgramHandle, UniformValue};
use crate::scene::texture::{Texture, TextureKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("index count {count} is not a multiple of 3")]
    NotTriangles { count: usize },
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// One drawable unit: geometry uploaded to the device plus the textures it
/// is shaded with. The CPU-side copies stay around so reloads and tests can
/// inspect them.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<Texture>,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// Validates the index list and uploads the geometry. Nothing reaches
    /// the device if validation fails.
    pub fn new<D: GraphicsDevice>(
        device: &mut D,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Texture>,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles {
                count: indices.len(),
            });
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index: bad,
                vertex_count: vertices.len(),
            });
        }

        let buffers = device.upload_mesh(&vertices, &indices, &VertexLayout::packed());
        Ok(Self {
            vertices,
            indices,
            textures,
            buffers: Some(buffers),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    /// Binds this mesh's textures and issues the draw.
    ///
    /// Texture N goes to unit N, and the matching sampler uniform is named
    /// `material.<kind>[<i>]` where `i` counts textures of that kind seen
    /// so far, so two diffuse maps become `material.diffuse[0]` and
    /// `material.diffuse[1]` regardless of what sits between them. Each
    /// array is then terminated with a `-1` entry one past its last index.
    pub fn draw<D: GraphicsDevice>(&self, device: &mut D, program: ProgramHandle) {
        let Some(buffers) = &self.buffers else {
            return;
        };

        device.unbind_all_textures();

        let mut diffuse_n = 0;
        let mut specular_n = 0;
        let mut emission_n = 0;
        for (unit, texture) in self.textures.iter().enumerate() {
            let slot = match texture.kind {
                TextureKind::Diffuse => &mut diffuse_n,
                TextureKind::Specular => &mut specular_n,
                TextureKind::Emission => &mut emission_n,
            };
            let name = format!("material.{}[{}]", texture.kind.sampler_name(), *slot);
            *slot += 1;

            device.set_uniform(program, &name, UniformValue::Int(unit as i32));
            device.bind_texture(unit, texture.handle);
        }

        // Program uniforms outlive the draw call, so a sampler index left
        // over from an earlier mesh would resolve against this draw's
        // bindings. The terminator stops array resolution at our own count.
        for (kind, next) in [
            (TextureKind::Diffuse, diffuse_n),
            (TextureKind::Specular, specular_n),
            (TextureKind::Emission, emission_n),
        ] {
            let name = format!("material.{}[{}]", kind.sampler_name(), next);
            device.set_uniform(program, &name, UniformValue::Int(-1));
        }

        device.draw_indexed(program, buffers, self.indices.len());
    }

    /// Returns the geometry buffers to the device. Safe to call once; the
    /// mesh draws nothing afterwards.
    pub fn release<D: GraphicsDevice>(&mut self, device: &mut D) {
        if let Some(buffers) = self.buffers.take() {
            device.delete_mesh(buffers);
        }
    }
}
