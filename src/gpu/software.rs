use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::{Vertex, VertexLayout};
use crate::core::rasterizer;
use crate::gpu::device::{
    BufferHandle, GraphicsDevice, MeshBuffers, PixelData, ProgramHandle, SamplerDesc, ShaderError,
    TextureHandle, UniformMap, UniformValue, VertexArrayHandle, WrapMode, MAX_TEXTURE_UNITS,
    NULL_PROGRAM,
};
use crate::pipeline::light_source::LightSourceProgram;
use crate::pipeline::phong::PhongProgram;
use log::{debug, warn};
use nalgebra::Vector3;
use std::collections::HashMap;

/// One mip level of a device texture, stored as linear-space RGB.
#[derive(Debug, Clone)]
struct TextureLevel {
    width: usize,
    height: usize,
    texels: Vec<Vector3<f32>>,
}

impl TextureLevel {
    fn texel(&self, x: usize, y: usize) -> Vector3<f32> {
        self.texels[y * self.width + x]
    }
}

/// A texture as the software device stores it: a mip chain of linear RGB
/// levels plus the sampler state fixed at upload time.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    levels: Vec<TextureLevel>,
    sampler: SamplerDesc,
}

impl GpuTexture {
    fn from_pixels(pixels: &PixelData, sampler: &SamplerDesc) -> Self {
        let width = pixels.width as usize;
        let height = pixels.height as usize;
        let channels = pixels.channels as usize;

        let mut texels = Vec::with_capacity(width * height);
        for i in 0..width * height {
            let offset = i * channels;
            // sRGB bytes to linear; alpha (if present) is dropped.
            texels.push(Vector3::new(
                srgb_to_linear(pixels.bytes[offset]),
                srgb_to_linear(pixels.bytes[offset + 1]),
                srgb_to_linear(pixels.bytes[offset + 2]),
            ));
        }

        let mut levels = vec![TextureLevel {
            width,
            height,
            texels,
        }];
        if sampler.generate_mipmaps {
            while levels[levels.len() - 1].width > 1 || levels[levels.len() - 1].height > 1 {
                let next = downsample(&levels[levels.len() - 1]);
                levels.push(next);
            }
        }

        Self {
            levels,
            sampler: *sampler,
        }
    }

    pub fn width(&self) -> usize {
        self.levels[0].width
    }

    pub fn height(&self) -> usize {
        self.levels[0].height
    }

    pub fn mip_count(&self) -> usize {
        self.levels.len()
    }

    /// Bilinear sample of the base level at normalized coordinates, with
    /// per-axis wrapping from the sampler state.
    pub fn sample(&self, u: f32, v: f32) -> Vector3<f32> {
        let level = &self.levels[0];

        let fx = u * level.width as f32 - 0.5;
        let fy = v * level.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;

        let x0 = x0 as i64;
        let y0 = y0 as i64;
        let xa = wrap_index(x0, level.width, self.sampler.wrap_s);
        let xb = wrap_index(x0 + 1, level.width, self.sampler.wrap_s);
        let ya = wrap_index(y0, level.height, self.sampler.wrap_t);
        let yb = wrap_index(y0 + 1, level.height, self.sampler.wrap_t);

        let top = level.texel(xa, ya) * (1.0 - tx) + level.texel(xb, ya) * tx;
        let bottom = level.texel(xa, yb) * (1.0 - tx) + level.texel(xb, yb) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

fn srgb_to_linear(byte: u8) -> f32 {
    (byte as f32 / 255.0).powf(2.2)
}

fn wrap_index(i: i64, size: usize, mode: WrapMode) -> usize {
    match mode {
        WrapMode::Repeat => i.rem_euclid(size as i64) as usize,
        WrapMode::ClampToEdge => i.clamp(0, size as i64 - 1) as usize,
    }
}

/// 2x2 box filter to the next-smaller mip level.
fn downsample(level: &TextureLevel) -> TextureLevel {
    let width = (level.width / 2).max(1);
    let height = (level.height / 2).max(1);
    let mut texels = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let x0 = (x * 2).min(level.width - 1);
            let x1 = (x * 2 + 1).min(level.width - 1);
            let y0 = (y * 2).min(level.height - 1);
            let y1 = (y * 2 + 1).min(level.height - 1);
            let sum = level.texel(x0, y0)
                + level.texel(x1, y0)
                + level.texel(x0, y1)
                + level.texel(x1, y1);
            texels.push(sum * 0.25);
        }
    }

    TextureLevel {
        width,
        height,
        texels,
    }
}

/// Snapshot of the texture units at draw time, resolved to actual textures.
pub struct BoundTextures<'a> {
    slots: [Option<&'a GpuTexture>; MAX_TEXTURE_UNITS],
}

impl<'a> BoundTextures<'a> {
    pub fn at_unit(&self, unit: usize) -> Option<&'a GpuTexture> {
        self.slots.get(unit).copied().flatten()
    }
}

/// Which built-in pipeline a compiled program dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineKind {
    Phong,
    LightSource,
}

#[derive(Debug)]
struct Program {
    kind: PipelineKind,
    uniforms: UniformMap,
}

#[derive(Debug, Clone, Copy)]
struct VertexArraySpec {
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
}

/// CPU rasterizing backend of [`GraphicsDevice`]. Resources live in handle
/// maps keyed by a single monotonically increasing counter, so no handle is
/// ever reused and zero stays free for [`NULL_PROGRAM`].
pub struct SoftwareDevice {
    framebuffer: FrameBuffer,
    next_handle: u32,
    vertex_buffers: HashMap<BufferHandle, Vec<Vertex>>,
    index_buffers: HashMap<BufferHandle, Vec<u32>>,
    vertex_arrays: HashMap<VertexArrayHandle, VertexArraySpec>,
    textures: HashMap<TextureHandle, GpuTexture>,
    programs: HashMap<ProgramHandle, Program>,
    texture_units: [Option<TextureHandle>; MAX_TEXTURE_UNITS],
}

impl SoftwareDevice {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            framebuffer: FrameBuffer::new(width, height),
            next_handle: 1,
            vertex_buffers: HashMap::new(),
            index_buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            texture_units: [None; MAX_TEXTURE_UNITS],
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    fn alloc_handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Maps two shader source texts onto the built-in pipelines by their
    /// distinguishing uniforms. Unrecognized sources fail compilation;
    /// recognizable but mismatched stages fail the link.
    fn classify_sources(
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<PipelineKind, ShaderError> {
        let fragment_kind = if fragment_src.contains("material.diffuse") {
            PipelineKind::Phong
        } else if fragment_src.contains("lightColor") {
            PipelineKind::LightSource
        } else {
            return Err(ShaderError::CompileFailed {
                reason: "fragment source matches no supported pipeline".to_string(),
            });
        };

        if !vertex_src.contains("gl_Position") {
            return Err(ShaderError::CompileFailed {
                reason: "vertex source writes no position output".to_string(),
            });
        }
        let vertex_kind = if vertex_src.contains("normalMatrix") {
            PipelineKind::Phong
        } else {
            PipelineKind::LightSource
        };

        if vertex_kind != fragment_kind {
            return Err(ShaderError::LinkFailed {
                reason: "vertex and fragment stages target different pipelines".to_string(),
            });
        }
        Ok(fragment_kind)
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn upload_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[u32],
        _layout: &VertexLayout,
    ) -> MeshBuffers {
        let vertex_buffer = self.alloc_handle();
        self.vertex_buffers.insert(vertex_buffer, vertices.to_vec());

        let index_buffer = self.alloc_handle();
        self.index_buffers.insert(index_buffer, indices.to_vec());

        let vertex_array = self.alloc_handle();
        self.vertex_arrays.insert(
            vertex_array,
            VertexArraySpec {
                vertex_buffer,
                index_buffer,
            },
        );

        MeshBuffers {
            vertex_buffer,
            index_buffer,
            vertex_array,
        }
    }

    fn delete_mesh(&mut self, buffers: MeshBuffers) {
        self.vertex_arrays.remove(&buffers.vertex_array);
        self.vertex_buffers.remove(&buffers.vertex_buffer);
        self.index_buffers.remove(&buffers.index_buffer);
    }

    fn upload_texture(&mut self, pixels: &PixelData, sampler: &SamplerDesc) -> TextureHandle {
        let handle = self.alloc_handle();
        self.textures
            .insert(handle, GpuTexture::from_pixels(pixels, sampler));
        handle
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.textures.remove(&handle);
        for slot in self.texture_units.iter_mut() {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
    }

    fn bind_texture(&mut self, unit: usize, handle: TextureHandle) {
        if unit >= MAX_TEXTURE_UNITS {
            warn!("bind_texture: unit {unit} out of range, ignoring");
            return;
        }
        self.texture_units[unit] = Some(handle);
    }

    fn unbind_all_textures(&mut self) {
        self.texture_units = [None; MAX_TEXTURE_UNITS];
    }

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, ShaderError> {
        let kind = Self::classify_sources(vertex_src, fragment_src)?;
        let handle = self.alloc_handle();
        self.programs.insert(
            handle,
            Program {
                kind,
                uniforms: UniformMap::default(),
            },
        );
        debug!("compiled program {handle} as {kind:?}");
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        if let Some(p) = self.programs.get_mut(&program) {
            p.uniforms.set(name, value);
        }
    }

    fn draw_indexed(&mut self, program: ProgramHandle, buffers: &MeshBuffers, index_count: usize) {
        if program == NULL_PROGRAM {
            debug!("draw_indexed with null program, skipping");
            return;
        }
        let Some(program) = self.programs.get(&program) else {
            warn!("draw_indexed: unknown program {program}, skipping");
            return;
        };
        let Some(spec) = self.vertex_arrays.get(&buffers.vertex_array) else {
            warn!(
                "draw_indexed: unknown vertex array {}, skipping",
                buffers.vertex_array
            );
            return;
        };
        let (Some(vertices), Some(indices)) = (
            self.vertex_buffers.get(&spec.vertex_buffer),
            self.index_buffers.get(&spec.index_buffer),
        ) else {
            warn!("draw_indexed: dangling buffer handles, skipping");
            return;
        };

        let count = index_count.min(indices.len());
        let indices = &indices[..count - count % 3];

        let bound = BoundTextures {
            slots: std::array::from_fn(|unit| {
                self.texture_units[unit].and_then(|h| self.textures.get(&h))
            }),
        };

        match program.kind {
            PipelineKind::Phong => {
                let shader = PhongProgram::resolve(&program.uniforms, &bound);
                rasterizer::draw_triangles(&mut self.framebuffer, &shader, vertices, indices);
            }
            PipelineKind::LightSource => {
                let shader = LightSourceProgram::resolve(&program.uniforms);
                rasterizer::draw_triangles(&mut self.framebuffer, &shader, vertices, indices);
            }
        }
    }

    fn clear(&mut self, color: Vector3<f32>) {
        self.framebuffer.clear(color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector2};

    const PHONG_VERT: &str = "uniform mat3 normalMatrix; void main() { gl_Position = vec4(0.0); }";
    const PHONG_FRAG: &str = "uniform sampler2D material.diffuse[1]; // marker";
    const LIGHT_VERT: &str = "void main() { gl_Position = vec4(0.0); }";
    const LIGHT_FRAG: &str = "uniform vec3 lightColor;";

    fn solid_pixels(width: u32, height: u32, rgb: [u8; 3]) -> PixelData {
        let mut bytes = Vec::new();
        for _ in 0..width * height {
            bytes.extend_from_slice(&rgb);
        }
        PixelData {
            width,
            height,
            channels: 3,
            bytes,
        }
    }

    fn fullscreen_triangle() -> (Vec<Vertex>, Vec<u32>) {
        // Covers all of NDC with one triangle at z = 0.
        let vertices = vec![
            Vertex::new(Point3::new(-1.0, -1.0, 0.0), Vector3::y(), Vector2::zeros()),
            Vertex::new(Point3::new(3.0, -1.0, 0.0), Vector3::y(), Vector2::zeros()),
            Vertex::new(Point3::new(-1.0, 3.0, 0.0), Vector3::y(), Vector2::zeros()),
        ];
        (vertices, vec![0, 1, 2])
    }

    #[test]
    fn program_handles_start_above_null() {
        let mut device = SoftwareDevice::new(4, 4);
        let program = device
            .compile_program(LIGHT_VERT, LIGHT_FRAG)
            .expect("light program should compile");
        assert_ne!(program, NULL_PROGRAM);
    }

    #[test]
    fn recognizes_both_pipelines() {
        let mut device = SoftwareDevice::new(4, 4);
        assert!(device.compile_program(PHONG_VERT, PHONG_FRAG).is_ok());
        assert!(device.compile_program(LIGHT_VERT, LIGHT_FRAG).is_ok());
    }

    #[test]
    fn unrecognized_fragment_fails_compilation() {
        let mut device = SoftwareDevice::new(4, 4);
        let err = device
            .compile_program(LIGHT_VERT, "void main() {}")
            .unwrap_err();
        assert!(matches!(err, ShaderError::CompileFailed { .. }));
    }

    #[test]
    fn mismatched_stages_fail_link() {
        let mut device = SoftwareDevice::new(4, 4);
        let err = device.compile_program(LIGHT_VERT, PHONG_FRAG).unwrap_err();
        assert!(matches!(err, ShaderError::LinkFailed { .. }));
    }

    #[test]
    fn null_program_draw_is_a_no_op() {
        let mut device = SoftwareDevice::new(4, 4);
        device.clear(Vector3::zeros());
        let (vertices, indices) = fullscreen_triangle();
        let buffers = device.upload_mesh(&vertices, &indices, &VertexLayout::packed());

        device.draw_indexed(NULL_PROGRAM, &buffers, indices.len());
        assert_eq!(device.framebuffer().get_pixel(2, 2), Some(Vector3::zeros()));
    }

    #[test]
    fn light_source_draw_fills_covered_pixels() {
        let mut device = SoftwareDevice::new(8, 8);
        device.clear(Vector3::zeros());
        let (vertices, indices) = fullscreen_triangle();
        let buffers = device.upload_mesh(&vertices, &indices, &VertexLayout::packed());

        let program = device
            .compile_program(LIGHT_VERT, LIGHT_FRAG)
            .expect("light program should compile");
        device.set_uniform(
            program,
            "lightColor",
            UniformValue::Vec3(Vector3::new(1.0, 0.5, 0.25)),
        );
        device.draw_indexed(program, &buffers, indices.len());

        let center = device.framebuffer().get_pixel(4, 4).expect("in bounds");
        assert!((center.x - 1.0).abs() < 1e-5);
        assert!((center.y - 0.5).abs() < 1e-5);
        assert!((center.z - 0.25).abs() < 1e-5);
    }

    #[test]
    fn mipmap_chain_reaches_one_by_one() {
        let mut device = SoftwareDevice::new(4, 4);
        let handle =
            device.upload_texture(&solid_pixels(8, 4, [255, 255, 255]), &SamplerDesc::default());
        let texture = device.textures.get(&handle).expect("texture stored");
        // 8x4 -> 4x2 -> 2x1 -> 1x1
        assert_eq!(texture.mip_count(), 4);
    }

    #[test]
    fn mipmaps_can_be_disabled() {
        let mut device = SoftwareDevice::new(4, 4);
        let sampler = SamplerDesc {
            generate_mipmaps: false,
            ..SamplerDesc::default()
        };
        let handle = device.upload_texture(&solid_pixels(8, 8, [0, 0, 0]), &sampler);
        assert_eq!(device.textures[&handle].mip_count(), 1);
    }

    #[test]
    fn repeat_sampling_wraps_around() {
        let texture = GpuTexture::from_pixels(
            &solid_pixels(2, 2, [255, 0, 0]),
            &SamplerDesc::default(),
        );
        let inside = texture.sample(0.25, 0.25);
        let wrapped = texture.sample(3.25, -1.75);
        assert!((inside - wrapped).norm() < 1e-6);
    }

    #[test]
    fn deleting_a_bound_texture_clears_its_unit() {
        let mut device = SoftwareDevice::new(4, 4);
        let handle =
            device.upload_texture(&solid_pixels(2, 2, [0, 255, 0]), &SamplerDesc::default());
        device.bind_texture(0, handle);
        device.delete_texture(handle);
        assert!(device.texture_units[0].is_none());
    }
}
