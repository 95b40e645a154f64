#![allow(dead_code)]

use glimmer::core::geometry::{Vertex, VertexLayout};
use glimmer::gpu::device::{
    GraphicsDevice, MeshBuffers, PixelData, ProgramHandle, SamplerDesc, ShaderError,
    TextureHandle, UniformValue,
};
use glimmer::scene::texture::{ImageDecoder, TextureError};
use nalgebra::Vector3;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

/// Everything a device call can do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    UploadMesh {
        vertex_count: usize,
        index_count: usize,
    },
    DeleteMesh {
        vertex_array: u32,
    },
    UploadTexture {
        handle: TextureHandle,
    },
    DeleteTexture {
        handle: TextureHandle,
    },
    Bind {
        unit: usize,
        handle: TextureHandle,
    },
    UnbindAll,
    SetUniform {
        program: ProgramHandle,
        name: String,
        value: UniformValue,
    },
    Draw {
        program: ProgramHandle,
        index_count: usize,
    },
    Clear,
}

/// A device that records every call instead of rendering, so tests can
/// assert on exact call sequences.
#[derive(Default)]
pub struct RecordingDevice {
    next_handle: u32,
    pub events: Vec<Event>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn texture_uploads(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::UploadTexture { .. }))
            .count()
    }

    pub fn mesh_uploads(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::UploadMesh { .. }))
            .count()
    }

    pub fn uniform_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The most recent `Int` value assigned to a uniform, as the program's
    /// uniform storage would hold it.
    pub fn int_uniform(&self, wanted: &str) -> Option<i32> {
        self.events.iter().rev().find_map(|e| match e {
            Event::SetUniform {
                name,
                value: UniformValue::Int(v),
                ..
            } if name == wanted => Some(*v),
            _ => None,
        })
    }

    pub fn deleted_textures(&self) -> Vec<TextureHandle> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::DeleteTexture { handle } => Some(*handle),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn upload_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        _layout: &VertexLayout,
    ) -> MeshBuffers {
        self.events.push(Event::UploadMesh {
            vertex_count: vertices.len(),
            index_count: indices.len(),
        });
        MeshBuffers {
            vertex_buffer: self.alloc(),
            index_buffer: self.alloc(),
            vertex_array: self.alloc(),
        }
    }

    fn delete_mesh(&mut self, buffers: MeshBuffers) {
        self.events.push(Event::DeleteMesh {
            vertex_array: buffers.vertex_array,
        });
    }

    fn upload_texture(&mut self, _pixels: &PixelData, _sampler: &SamplerDesc) -> TextureHandle {
        let handle = self.alloc();
        self.events.push(Event::UploadTexture { handle });
        handle
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.events.push(Event::DeleteTexture { handle });
    }

    fn bind_texture(&mut self, unit: usize, handle: TextureHandle) {
        self.events.push(Event::Bind { unit, handle });
    }

    fn unbind_all_textures(&mut self) {
        self.events.push(Event::UnbindAll);
    }

    fn compile_program(
        &mut self,
        _vertex_src: &str,
        _fragment_src: &str,
    ) -> Result<ProgramHandle, ShaderError> {
        Ok(self.alloc())
    }

    fn delete_program(&mut self, _program: ProgramHandle) {}

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        self.events.push(Event::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }

    fn draw_indexed(&mut self, program: ProgramHandle, _buffers: &MeshBuffers, index_count: usize) {
        self.events.push(Event::Draw {
            program,
            index_count,
        });
    }

    fn clear(&mut self, _color: Vector3<f32>) {
        self.events.push(Event::Clear);
    }
}

/// Decoder that returns a fixed 2x2 image and counts its invocations.
pub struct CountingDecoder {
    decodes: Rc<Cell<usize>>,
}

impl CountingDecoder {
    pub fn new() -> (Self, Rc<Cell<usize>>) {
        let decodes = Rc::new(Cell::new(0));
        (
            Self {
                decodes: Rc::clone(&decodes),
            },
            decodes,
        )
    }
}

impl ImageDecoder for CountingDecoder {
    fn decode(&self, _path: &Path, _flip_vertical: bool) -> Result<PixelData, TextureError> {
        self.decodes.set(self.decodes.get() + 1);
        Ok(PixelData {
            width: 2,
            height: 2,
            channels: 3,
            bytes: vec![128; 12],
        })
    }
}

/// Decoder that always fails, for exercising the degradation paths.
pub struct FailingDecoder;

impl ImageDecoder for FailingDecoder {
    fn decode(&self, path: &Path, _flip_vertical: bool) -> Result<PixelData, TextureError> {
        Err(TextureError::EmptyImage {
            path: path.display().to_string(),
        })
    }
}
