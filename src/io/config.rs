use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub shaders: ShaderConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub light_model: LightModelConfig,
    #[serde(default)]
    pub dir_light: DirLightConfig,
    #[serde(default = "default_point_lights")]
    pub point_lights: Vec<PointLightConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            shaders: ShaderConfig::default(),
            model: ModelConfig::default(),
            light_model: LightModelConfig::default(),
            dir_light: DirLightConfig::default(),
            point_lights: default_point_lights(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            clear_color: default_clear_color(),
        }
    }
}

fn default_width() -> usize {
    1280
}
fn default_height() -> usize {
    720
}
fn default_title() -> String {
    "Glimmer".to_string()
}
fn default_clear_color() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default = "default_yaw")]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            yaw: default_yaw(),
            pitch: 0.0,
            fov: default_fov(),
            speed: default_speed(),
            sensitivity: default_sensitivity(),
        }
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 3.0]
}
fn default_yaw() -> f32 {
    -90.0
}
fn default_fov() -> f32 {
    45.0
}
fn default_speed() -> f32 {
    2.5
}
fn default_sensitivity() -> f32 {
    0.1
}

#[derive(Debug, Deserialize)]
pub struct ShaderConfig {
    #[serde(default = "default_phong_vertex")]
    pub phong_vertex: String,
    #[serde(default = "default_phong_fragment")]
    pub phong_fragment: String,
    #[serde(default = "default_light_vertex")]
    pub light_vertex: String,
    #[serde(default = "default_light_fragment")]
    pub light_fragment: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            phong_vertex: default_phong_vertex(),
            phong_fragment: default_phong_fragment(),
            light_vertex: default_light_vertex(),
            light_fragment: default_light_fragment(),
        }
    }
}

fn default_phong_vertex() -> String {
    "shaders/phong.vert".to_string()
}
fn default_phong_fragment() -> String {
    "shaders/phong.frag".to_string()
}
fn default_light_vertex() -> String {
    "shaders/light_source.vert".to_string()
}
fn default_light_fragment() -> String {
    "shaders/light_source.frag".to_string()
}

/// The main model to view. Texture entries only apply to mesh-text models;
/// imported scenes carry their own material references.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: String,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_unit_scale")]
    pub scale: f32,
    #[serde(default)]
    pub textures: Vec<TextureConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            position: [0.0, 0.0, 0.0],
            scale: default_unit_scale(),
            textures: Vec::new(),
        }
    }
}

fn default_model_path() -> String {
    "assets/model.obj".to_string()
}
fn default_unit_scale() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct TextureConfig {
    pub path: String,
    /// "diffuse", "specular" or "emission".
    pub kind: String,
}

/// Marker mesh drawn at each point-light position.
#[derive(Debug, Deserialize)]
pub struct LightModelConfig {
    #[serde(default = "default_light_model_path")]
    pub path: String,
    #[serde(default = "default_light_scale")]
    pub scale: f32,
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
}

impl Default for LightModelConfig {
    fn default() -> Self {
        Self {
            path: default_light_model_path(),
            scale: default_light_scale(),
            color: default_light_color(),
        }
    }
}

fn default_light_model_path() -> String {
    "assets/cube.obj".to_string()
}
fn default_light_scale() -> f32 {
    0.2
}
fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Deserialize)]
pub struct DirLightConfig {
    #[serde(default = "default_dir_direction")]
    pub direction: [f32; 3],
    #[serde(default = "default_dir_ambient")]
    pub ambient: [f32; 3],
    #[serde(default = "default_dir_diffuse")]
    pub diffuse: [f32; 3],
    #[serde(default = "default_dir_specular")]
    pub specular: [f32; 3],
}

impl Default for DirLightConfig {
    fn default() -> Self {
        Self {
            direction: default_dir_direction(),
            ambient: default_dir_ambient(),
            diffuse: default_dir_diffuse(),
            specular: default_dir_specular(),
        }
    }
}

fn default_dir_direction() -> [f32; 3] {
    [-0.2, -1.0, -0.3]
}
fn default_dir_ambient() -> [f32; 3] {
    [0.05, 0.05, 0.05]
}
fn default_dir_diffuse() -> [f32; 3] {
    [0.4, 0.4, 0.4]
}
fn default_dir_specular() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}

#[derive(Debug, Deserialize)]
pub struct PointLightConfig {
    pub position: [f32; 3],
    #[serde(default = "default_point_ambient")]
    pub ambient: [f32; 3],
    #[serde(default = "default_point_diffuse")]
    pub diffuse: [f32; 3],
    #[serde(default = "default_point_specular")]
    pub specular: [f32; 3],
    #[serde(default = "default_unit_scale")]
    pub constant: f32,
    #[serde(default = "default_point_linear")]
    pub linear: f32,
    #[serde(default = "default_point_quadratic")]
    pub quadratic: f32,
}

fn default_point_ambient() -> [f32; 3] {
    [0.05, 0.05, 0.05]
}
fn default_point_diffuse() -> [f32; 3] {
    [0.8, 0.8, 0.8]
}
fn default_point_specular() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_point_linear() -> f32 {
    0.09
}
fn default_point_quadratic() -> f32 {
    0.032
}

fn default_point_lights() -> Vec<PointLightConfig> {
    [
        [0.7, 0.2, 2.0],
        [2.3, -3.3, -4.0],
        [-4.0, 2.0, -12.0],
        [0.0, 0.0, -3.0],
    ]
    .into_iter()
    .map(|position| PointLightConfig {
        position,
        ambient: default_point_ambient(),
        diffuse: default_point_diffuse(),
        specular: default_point_specular(),
        constant: default_unit_scale(),
        linear: default_point_linear(),
        quadratic: default_point_quadratic(),
    })
    .collect()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Loads the config, falling back to defaults when the file is absent
    /// or unparseable.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; using default configuration");
                Self::default()
            }
        }
    }
}
