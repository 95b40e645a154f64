use crate::gpu::device::{GraphicsDevice, ProgramHandle};
use crate::scene::mesh::Mesh;

/// A loaded model: the meshes of one source file, drawn and released as a
/// unit.
#[derive(Debug)]
pub struct Model {
    meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self { meshes }
    }

    /// A model that draws nothing. Used when loading fails so the frame
    /// loop can carry on unconditionally.
    pub fn empty() -> Self {
        Self { meshes: Vec::new() }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn draw<D: GraphicsDevice>(&self, device: &mut D, program: ProgramHandle) {
        for mesh in &self.meshes {
            mesh.draw(device, program);
        }
    }

    pub fn release<D: GraphicsDevice>(&mut self, device: &mut D) {
        for mesh in &mut self.meshes {
            mesh.release(device);
        }
        self.meshes.clear();
    }
}
