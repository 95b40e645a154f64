mod common;

use common::{Event, RecordingDevice};
use glimmer::core::geometry::Vertex;
use glimmer::gpu::device::GraphicsDevice;
use glimmer::gpu::software::SoftwareDevice;
use glimmer::scene::mesh::{Mesh, MeshError};
use glimmer::scene::texture::{Texture, TextureKind};
use nalgebra::{Point3, Vector2, Vector3};

fn triangle() -> (Vec<Vertex>, Vec<u32>) {
    let vertices = vec![
        Vertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::z(), Vector2::zeros()),
        Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z(), Vector2::new(1.0, 0.0)),
        Vertex::new(Point3::new(0.0, 1.0, 0.0), Vector3::z(), Vector2::new(0.0, 1.0)),
    ];
    (vertices, vec![0, 1, 2])
}

fn texture(device: &mut RecordingDevice, kind: TextureKind, path: &str) -> Texture {
    let handle = device.upload_texture(
        &glimmer::gpu::device::PixelData {
            width: 1,
            height: 1,
            channels: 3,
            bytes: vec![255, 255, 255],
        },
        &glimmer::gpu::device::SamplerDesc::default(),
    );
    Texture {
        handle,
        kind,
        path: path.to_string(),
    }
}

#[test]
fn sampler_uniforms_count_per_kind() {
    let mut device = RecordingDevice::new();
    let textures = vec![
        texture(&mut device, TextureKind::Diffuse, "a.png"),
        texture(&mut device, TextureKind::Diffuse, "b.png"),
        texture(&mut device, TextureKind::Specular, "c.png"),
    ];

    let (vertices, indices) = triangle();
    let mesh = Mesh::new(&mut device, vertices, indices, textures).expect("valid mesh");
    let program = device
        .compile_program("vert", "frag")
        .expect("recording device always compiles");
    mesh.draw(&mut device, program);

    let names = device.uniform_names();
    assert_eq!(
        names,
        vec![
            "material.diffuse[0]",
            "material.diffuse[1]",
            "material.specular[0]",
            // Terminators one past each kind's last entry.
            "material.diffuse[2]",
            "material.specular[1]",
            "material.emission[0]",
        ]
    );
}

#[test]
fn draw_overwrites_stale_sampler_indices_from_an_earlier_mesh() {
    let mut device = RecordingDevice::new();
    let two_diffuse = vec![
        texture(&mut device, TextureKind::Diffuse, "a.png"),
        texture(&mut device, TextureKind::Diffuse, "b.png"),
    ];
    let mixed = vec![
        texture(&mut device, TextureKind::Diffuse, "c.png"),
        texture(&mut device, TextureKind::Specular, "d.png"),
    ];

    let (vertices, indices) = triangle();
    let first = Mesh::new(&mut device, vertices.clone(), indices.clone(), two_diffuse)
        .expect("valid mesh");
    let second = Mesh::new(&mut device, vertices, indices, mixed).expect("valid mesh");
    let program = device.compile_program("vert", "frag").expect("compiles");

    first.draw(&mut device, program);
    second.draw(&mut device, program);

    // The first draw left material.diffuse[1] = 1; the second mesh has one
    // diffuse map, so its draw must close the array at index 1.
    assert_eq!(device.int_uniform("material.diffuse[0]"), Some(0));
    assert_eq!(device.int_uniform("material.diffuse[1]"), Some(-1));
    assert_eq!(device.int_uniform("material.specular[0]"), Some(1));
    assert_eq!(device.int_uniform("material.specular[1]"), Some(-1));
    assert_eq!(device.int_uniform("material.emission[0]"), Some(-1));
}

#[test]
fn stale_sampler_uniforms_do_not_tint_the_next_draw() {
    const VERT: &str = "uniform mat3 normalMatrix; void main() { gl_Position = vec4(0.0); }";
    const FRAG: &str = "uniform sampler2D material.diffuse[4];";

    fn solid(device: &mut SoftwareDevice, kind: TextureKind, rgb: [u8; 3], path: &str) -> Texture {
        let handle = device.upload_texture(
            &glimmer::gpu::device::PixelData {
                width: 1,
                height: 1,
                channels: 3,
                bytes: rgb.to_vec(),
            },
            &glimmer::gpu::device::SamplerDesc::default(),
        );
        Texture {
            handle,
            kind,
            path: path.to_string(),
        }
    }

    fn fullscreen() -> (Vec<Vertex>, Vec<u32>) {
        let vertices = vec![
            Vertex::new(Point3::new(-1.0, -1.0, 0.0), Vector3::y(), Vector2::zeros()),
            Vertex::new(Point3::new(3.0, -1.0, 0.0), Vector3::y(), Vector2::zeros()),
            Vertex::new(Point3::new(-1.0, 3.0, 0.0), Vector3::y(), Vector2::zeros()),
        ];
        (vertices, vec![0, 1, 2])
    }

    let mut device = SoftwareDevice::new(8, 8);
    let program = device.compile_program(VERT, FRAG).expect("phong compiles");

    // Ambient-only directional light, so the output is the diffuse sum.
    device.set_uniform(
        program,
        "dirLight.direction",
        glimmer::gpu::device::UniformValue::Vec3(-Vector3::y()),
    );
    device.set_uniform(
        program,
        "dirLight.ambient",
        glimmer::gpu::device::UniformValue::Vec3(Vector3::new(1.0, 1.0, 1.0)),
    );

    let (vertices, indices) = fullscreen();
    let first_textures = vec![
        solid(&mut device, TextureKind::Diffuse, [255, 255, 255], "w1.png"),
        solid(&mut device, TextureKind::Diffuse, [255, 255, 255], "w2.png"),
    ];
    let second_textures = vec![
        solid(&mut device, TextureKind::Diffuse, [128, 128, 128], "gray.png"),
        solid(&mut device, TextureKind::Specular, [0, 255, 0], "green.png"),
    ];
    let first = Mesh::new(&mut device, vertices.clone(), indices.clone(), first_textures)
        .expect("valid mesh");
    let second =
        Mesh::new(&mut device, vertices, indices, second_textures).expect("valid mesh");

    device.clear(Vector3::zeros());
    first.draw(&mut device, program);
    device.clear(Vector3::zeros());
    second.draw(&mut device, program);

    // The second mesh's base color is its single gray map; the green
    // specular texture on unit 1 must not reach the diffuse sum through
    // the first draw's material.diffuse[1].
    let center = device.framebuffer().get_pixel(4, 4).expect("in bounds");
    assert!(center.y < 0.9, "diffuse sum picked up a foreign map: {center:?}");
    assert!((center.x - center.y).abs() < 1e-4);
    assert!((center.y - center.z).abs() < 1e-4);
}

#[test]
fn draw_unbinds_before_binding_and_then_draws() {
    let mut device = RecordingDevice::new();
    let textures = vec![texture(&mut device, TextureKind::Diffuse, "a.png")];
    let (vertices, indices) = triangle();
    let mesh = Mesh::new(&mut device, vertices, indices, textures).expect("valid mesh");
    let program = device.compile_program("vert", "frag").expect("compiles");

    let before = device.events.len();
    mesh.draw(&mut device, program);
    let events = &device.events[before..];

    assert_eq!(events[0], Event::UnbindAll);
    let unbind_pos = 0;
    let bind_pos = events
        .iter()
        .position(|e| matches!(e, Event::Bind { .. }))
        .expect("texture bound");
    let draw_pos = events
        .iter()
        .position(|e| matches!(e, Event::Draw { .. }))
        .expect("draw issued");
    assert!(unbind_pos < bind_pos && bind_pos < draw_pos);

    assert!(matches!(
        events[draw_pos],
        Event::Draw { index_count: 3, .. }
    ));
}

#[test]
fn textures_map_to_sequential_units() {
    let mut device = RecordingDevice::new();
    let textures = vec![
        texture(&mut device, TextureKind::Specular, "a.png"),
        texture(&mut device, TextureKind::Diffuse, "b.png"),
    ];
    let (vertices, indices) = triangle();
    let mesh = Mesh::new(&mut device, vertices, indices, textures).expect("valid mesh");
    let program = device.compile_program("vert", "frag").expect("compiles");

    let before = device.events.len();
    mesh.draw(&mut device, program);

    let units: Vec<usize> = device.events[before..]
        .iter()
        .filter_map(|e| match e {
            Event::Bind { unit, .. } => Some(*unit),
            _ => None,
        })
        .collect();
    assert_eq!(units, vec![0, 1]);
}

#[test]
fn non_triangle_index_count_is_rejected_before_upload() {
    let mut device = RecordingDevice::new();
    let (vertices, _) = triangle();

    let err = Mesh::new(&mut device, vertices, vec![0, 1], Vec::new()).unwrap_err();
    assert!(matches!(err, MeshError::NotTriangles { count: 2 }));
    assert_eq!(device.mesh_uploads(), 0);
}

#[test]
fn out_of_range_index_is_rejected_before_upload() {
    let mut device = RecordingDevice::new();
    let (vertices, _) = triangle();

    let err = Mesh::new(&mut device, vertices, vec![0, 1, 7], Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        MeshError::IndexOutOfRange {
            index: 7,
            vertex_count: 3,
        }
    ));
    assert_eq!(device.mesh_uploads(), 0);
}

#[test]
fn release_is_idempotent() {
    let mut device = RecordingDevice::new();
    let (vertices, indices) = triangle();
    let mut mesh = Mesh::new(&mut device, vertices, indices, Vec::new()).expect("valid mesh");

    mesh.release(&mut device);
    mesh.release(&mut device);

    let deletions = device
        .events
        .iter()
        .filter(|e| matches!(e, Event::DeleteMesh { .. }))
        .count();
    assert_eq!(deletions, 1);

    // A released mesh draws nothing.
    let program = device.compile_program("vert", "frag").expect("compiles");
    let before = device.events.len();
    mesh.draw(&mut device, program);
    assert_eq!(device.events.len(), before);
}
