use crate::core::math::transform::{normal_matrix, TransformFactory};
use crate::gpu::device::{GraphicsDevice, ProgramHandle, UniformValue, NULL_PROGRAM};
use crate::gpu::software::SoftwareDevice;
use crate::gpu::window::{Window, WindowError};
use crate::io::config::{Config, TextureConfig};
use crate::io::gltf_loader;
use crate::io::obj_loader;
use crate::pipeline::phong::MAX_POINT_LIGHTS;
use crate::scene::camera::Camera;
use crate::scene::mesh::Mesh;
use crate::scene::model::Model;
use crate::scene::texture::{TextureCache, TextureKind};
use crate::ui::input::CameraController;
use log::{error, info, warn};
use nalgebra::{Point3, Vector3};
use std::path::Path;
use std::time::Instant;

const NEAR_PLANE: f32 = 1.0;
const FAR_PLANE: f32 = 100.0;

/// Runs the viewer: loads shaders and models, then drives the frame loop
/// until the window closes. Asset failures degrade (empty model, null
/// program); only window creation is fatal.
pub fn run(config: Config) -> Result<(), WindowError> {
    let width = config.window.width;
    let height = config.window.height;

    info!("Starting viewer ({}x{})...", width, height);
    info!("Controls: WASD=Move, Mouse=Look, Scroll=Zoom, Esc=Quit");

    // 1. Window and device
    let mut window = Window::new(&config.window.title, width, height)?;
    let mut device = SoftwareDevice::new(width, height);

    // 2. Shader programs
    let phong_program = load_program(
        &mut device,
        &config.shaders.phong_vertex,
        &config.shaders.phong_fragment,
    );
    let light_program = load_program(
        &mut device,
        &config.shaders.light_vertex,
        &config.shaders.light_fragment,
    );

    // 3. Scene resources
    let mut cache = TextureCache::with_file_decoder();
    let mut model = load_main_model(&mut device, &mut cache, &config);
    let mut light_model = load_light_model(&mut device, &config);

    // Lighting doesn't change per frame, set it once.
    set_lighting_uniforms(&mut device, phong_program, &config);

    // 4. Camera
    let mut camera = Camera::new(
        Point3::from(config.camera.position),
        config.camera.yaw,
        config.camera.pitch,
        config.camera.fov,
    );
    let controller = CameraController::new(config.camera.speed, config.camera.sensitivity);

    let clear_color = Vector3::from(config.window.clear_color);
    let aspect = width as f32 / height as f32;
    let model_matrix = TransformFactory::translation(&Vector3::from(config.model.position))
        * TransformFactory::scaling(config.model.scale);
    let model_normal_matrix = normal_matrix(&model_matrix);
    let light_color = Vector3::from(config.light_model.color);

    // 5. Frame loop
    let mut last_frame = Instant::now();
    let mut frame_count = 0u32;
    let mut last_fps_update = Instant::now();

    while !window.should_close() {
        let now = Instant::now();
        let dt = (now - last_frame).as_secs_f32();
        last_frame = now;

        let input = window.poll();
        controller.apply(&mut camera, &input, dt);

        device.clear(clear_color);

        let view = camera.view_matrix();
        let projection = TransformFactory::perspective(
            aspect,
            camera.fov().to_radians(),
            NEAR_PLANE,
            FAR_PLANE,
        );

        device.set_uniform(phong_program, "model", UniformValue::Mat4(model_matrix));
        device.set_uniform(phong_program, "view", UniformValue::Mat4(view));
        device.set_uniform(phong_program, "projection", UniformValue::Mat4(projection));
        device.set_uniform(
            phong_program,
            "normalMatrix",
            UniformValue::Mat3(model_normal_matrix),
        );
        device.set_uniform(
            phong_program,
            "viewPos",
            UniformValue::Vec3(camera.position().coords),
        );
        model.draw(&mut device, phong_program);

        device.set_uniform(light_program, "view", UniformValue::Mat4(view));
        device.set_uniform(light_program, "projection", UniformValue::Mat4(projection));
        device.set_uniform(light_program, "lightColor", UniformValue::Vec3(light_color));
        for light in config.point_lights.iter().take(MAX_POINT_LIGHTS) {
            let marker_matrix = TransformFactory::translation(&Vector3::from(light.position))
                * TransformFactory::scaling(config.light_model.scale);
            device.set_uniform(light_program, "model", UniformValue::Mat4(marker_matrix));
            light_model.draw(&mut device, light_program);
        }

        window.present(device.framebuffer())?;

        frame_count += 1;
        if last_fps_update.elapsed().as_secs_f32() >= 1.0 {
            window.set_title(&format!("{} - {} FPS", config.window.title, frame_count));
            frame_count = 0;
            last_fps_update = Instant::now();
        }
    }

    // 6. Release GPU resources before exit
    model.release(&mut device);
    light_model.release(&mut device);
    cache.release(&mut device);
    device.delete_program(phong_program);
    device.delete_program(light_program);
    info!("Shutting down");
    Ok(())
}

/// Reads and compiles a program from two source files. Any failure logs a
/// warning and yields the null program, which draws nothing.
fn load_program(
    device: &mut SoftwareDevice,
    vertex_path: &str,
    fragment_path: &str,
) -> ProgramHandle {
    let vertex = match std::fs::read_to_string(vertex_path) {
        Ok(source) => source,
        Err(e) => {
            warn!("failed to read shader '{}': {}", vertex_path, e);
            return NULL_PROGRAM;
        }
    };
    let fragment = match std::fs::read_to_string(fragment_path) {
        Ok(source) => source,
        Err(e) => {
            warn!("failed to read shader '{}': {}", fragment_path, e);
            return NULL_PROGRAM;
        }
    };

    match device.compile_program(&vertex, &fragment) {
        Ok(program) => {
            info!("compiled program from '{}' + '{}'", vertex_path, fragment_path);
            program
        }
        Err(e) => {
            warn!("{e}; continuing with null program");
            NULL_PROGRAM
        }
    }
}

fn load_main_model(
    device: &mut SoftwareDevice,
    cache: &mut TextureCache,
    config: &Config,
) -> Model {
    let path = Path::new(&config.model.path);
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let result = match extension.as_str() {
        "gltf" | "glb" => {
            gltf_loader::import_model(device, cache, path).map_err(|e| e.to_string())
        }
        _ => load_obj_model(device, cache, path, &config.model.textures),
    };

    match result {
        Ok(model) => model,
        Err(e) => {
            error!("failed to load model '{}': {}", config.model.path, e);
            Model::empty()
        }
    }
}

fn load_obj_model(
    device: &mut SoftwareDevice,
    cache: &mut TextureCache,
    path: &Path,
    texture_configs: &[TextureConfig],
) -> Result<Model, String> {
    let (vertices, indices) = obj_loader::load_obj(path).map_err(|e| e.to_string())?;
    let directory = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let mut textures = Vec::new();
    for entry in texture_configs {
        let Some(kind) = parse_texture_kind(&entry.kind) else {
            warn!(
                "unknown texture kind '{}' for '{}', skipping",
                entry.kind, entry.path
            );
            continue;
        };
        match cache.get_or_load(device, &directory.join(&entry.path), kind, false) {
            Ok(texture) => textures.push(texture),
            Err(e) => warn!("{e}; skipping texture"),
        }
    }

    let mesh = Mesh::new(device, vertices, indices, textures).map_err(|e| e.to_string())?;
    Ok(Model::new(vec![mesh]))
}

fn parse_texture_kind(name: &str) -> Option<TextureKind> {
    match name {
        "diffuse" => Some(TextureKind::Diffuse),
        "specular" => Some(TextureKind::Specular),
        "emission" => Some(TextureKind::Emission),
        _ => None,
    }
}

fn load_light_model(device: &mut SoftwareDevice, config: &Config) -> Model {
    let path = Path::new(&config.light_model.path);
    let meshes = obj_loader::load_obj(path)
        .map_err(|e| e.to_string())
        .and_then(|(vertices, indices)| {
            Mesh::new(device, vertices, indices, Vec::new()).map_err(|e| e.to_string())
        });

    match meshes {
        Ok(mesh) => Model::new(vec![mesh]),
        Err(e) => {
            error!(
                "failed to load light model '{}': {}",
                config.light_model.path, e
            );
            Model::empty()
        }
    }
}

fn set_lighting_uniforms(device: &mut SoftwareDevice, program: ProgramHandle, config: &Config) {
    device.set_uniform(program, "material.shininess", UniformValue::Float(32.0));

    device.set_uniform(
        program,
        "dirLight.direction",
        UniformValue::Vec3(Vector3::from(config.dir_light.direction)),
    );
    device.set_uniform(
        program,
        "dirLight.ambient",
        UniformValue::Vec3(Vector3::from(config.dir_light.ambient)),
    );
    device.set_uniform(
        program,
        "dirLight.diffuse",
        UniformValue::Vec3(Vector3::from(config.dir_light.diffuse)),
    );
    device.set_uniform(
        program,
        "dirLight.specular",
        UniformValue::Vec3(Vector3::from(config.dir_light.specular)),
    );

    if config.point_lights.len() > MAX_POINT_LIGHTS {
        warn!(
            "{} point lights configured, only the first {} are used",
            config.point_lights.len(),
            MAX_POINT_LIGHTS
        );
    }
    for (i, light) in config.point_lights.iter().take(MAX_POINT_LIGHTS).enumerate() {
        let set = |device: &mut SoftwareDevice, field: &str, value: [f32; 3]| {
            device.set_uniform(
                program,
                &format!("pointLights[{i}].{field}"),
                UniformValue::Vec3(Vector3::from(value)),
            );
        };
        set(device, "position", light.position);
        set(device, "ambient", light.ambient);
        set(device, "diffuse", light.diffuse);
        set(device, "specular", light.specular);

        device.set_uniform(
            program,
            &format!("pointLights[{i}].constant"),
            UniformValue::Float(light.constant),
        );
        device.set_uniform(
            program,
            &format!("pointLights[{i}].linear"),
            UniformValue::Float(light.linear),
        );
        device.set_uniform(
            program,
            &format!("pointLights[{i}].quadratic"),
            UniformValue::Float(light.quadratic),
        );
    }
}
