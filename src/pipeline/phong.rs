use crate::core::geometry::Vertex;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::gpu::device::UniformMap;
use crate::gpu::software::{BoundTextures, GpuTexture};
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Point lights supported by the phong program, matching the
/// `pointLights[N]` uniform array in the shader source.
pub const MAX_POINT_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct DirLight {
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

/// Data interpolated across the triangle surface.
#[derive(Clone, Copy, Debug)]
pub struct PhongVarying {
    /// Normal vector in world space.
    pub normal: Vector3<f32>,
    /// Position in world space (for view and light vectors).
    pub world_pos: Point3<f32>,
    /// Texture coordinates (UV).
    pub uv: Vector2<f32>,
}

// nalgebra's Point3 doesn't support Point + Point, so go via coordinates.
impl Add for PhongVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            normal: self.normal + other.normal,
            world_pos: Point3::from(self.world_pos.coords + other.world_pos.coords),
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for PhongVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            normal: self.normal * scalar,
            world_pos: Point3::from(self.world_pos.coords * scalar),
            uv: self.uv * scalar,
        }
    }
}

impl Interpolatable for PhongVarying {}

/// The phong lighting program: one optional directional light plus up to
/// four point lights, with per-kind sampler arrays for diffuse, specular
/// and emission maps.
///
/// Built once per draw call from the program's uniform map and the
/// device's current texture-unit bindings.
pub struct PhongProgram<'a> {
    model: Matrix4<f32>,
    mvp: Matrix4<f32>,
    normal_matrix: Matrix3<f32>,
    view_pos: Vector3<f32>,
    shininess: f32,
    dir_light: Option<DirLight>,
    point_lights: Vec<PointLight>,
    diffuse_maps: Vec<&'a GpuTexture>,
    specular_maps: Vec<&'a GpuTexture>,
    emission_maps: Vec<&'a GpuTexture>,
}

impl<'a> PhongProgram<'a> {
    pub fn resolve(uniforms: &UniformMap, bound: &BoundTextures<'a>) -> Self {
        let model = uniforms.mat4_or_identity("model");
        let view = uniforms.mat4_or_identity("view");
        let projection = uniforms.mat4_or_identity("projection");

        Self {
            model,
            mvp: projection * view * model,
            normal_matrix: uniforms.mat3_or_identity("normalMatrix"),
            view_pos: uniforms.vec3_or("viewPos", Vector3::zeros()),
            shininess: uniforms.float_or("material.shininess", 32.0),
            dir_light: resolve_dir_light(uniforms),
            point_lights: resolve_point_lights(uniforms),
            diffuse_maps: resolve_sampler_array(uniforms, bound, "diffuse"),
            specular_maps: resolve_sampler_array(uniforms, bound, "specular"),
            emission_maps: resolve_sampler_array(uniforms, bound, "emission"),
        }
    }

    fn sample_sum(maps: &[&GpuTexture], uv: Vector2<f32>, fallback: Vector3<f32>) -> Vector3<f32> {
        if maps.is_empty() {
            return fallback;
        }
        maps.iter()
            .fold(Vector3::zeros(), |acc, t| acc + t.sample(uv.x, uv.y))
    }
}

fn resolve_dir_light(uniforms: &UniformMap) -> Option<DirLight> {
    if !uniforms.contains("dirLight.direction") {
        return None;
    }
    Some(DirLight {
        direction: uniforms.vec3_or("dirLight.direction", -Vector3::y()),
        ambient: uniforms.vec3_or("dirLight.ambient", Vector3::zeros()),
        diffuse: uniforms.vec3_or("dirLight.diffuse", Vector3::zeros()),
        specular: uniforms.vec3_or("dirLight.specular", Vector3::zeros()),
    })
}

fn resolve_point_lights(uniforms: &UniformMap) -> Vec<PointLight> {
    let mut lights = Vec::new();
    for i in 0..MAX_POINT_LIGHTS {
        let position = format!("pointLights[{i}].position");
        if !uniforms.contains(&position) {
            continue;
        }
        lights.push(PointLight {
            position: uniforms.vec3_or(&position, Vector3::zeros()),
            ambient: uniforms.vec3_or(&format!("pointLights[{i}].ambient"), Vector3::zeros()),
            diffuse: uniforms.vec3_or(&format!("pointLights[{i}].diffuse"), Vector3::zeros()),
            specular: uniforms.vec3_or(&format!("pointLights[{i}].specular"), Vector3::zeros()),
            constant: uniforms.float_or(&format!("pointLights[{i}].constant"), 1.0),
            linear: uniforms.float_or(&format!("pointLights[{i}].linear"), 0.0),
            quadratic: uniforms.float_or(&format!("pointLights[{i}].quadratic"), 0.0),
        });
    }
    lights
}

/// Collects the textures bound for one sampler array, following the
/// `material.<kind>[0]`, `material.<kind>[1]`, ... uniform convention.
/// A missing or negative entry ends the array, so indices written by an
/// earlier draw past the current mesh's terminator are never resolved.
fn resolve_sampler_array<'a>(
    uniforms: &UniformMap,
    bound: &BoundTextures<'a>,
    kind: &str,
) -> Vec<&'a GpuTexture> {
    let mut maps = Vec::new();
    for n in 0.. {
        let Some(unit) = uniforms.int(&format!("material.{kind}[{n}]")) else {
            break;
        };
        if unit < 0 {
            break;
        }
        if let Some(texture) = bound.at_unit(unit as usize) {
            maps.push(texture);
        }
    }
    maps
}

impl Shader for PhongProgram<'_> {
    type Varying = PhongVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let world_pos_homo = self.model * vertex.position.to_homogeneous();
        let world_pos = Point3::from_homogeneous(world_pos_homo)
            .unwrap_or_else(|| vertex.position);
        let world_normal = self.normal_matrix * vertex.normal;

        let varying = PhongVarying {
            normal: world_normal,
            world_pos,
            uv: vertex.texcoord,
        };
        (self.mvp * vertex.position.to_homogeneous(), varying)
    }

    fn fragment(&self, varying: Self::Varying) -> Vector3<f32> {
        let base_color =
            Self::sample_sum(&self.diffuse_maps, varying.uv, Vector3::new(0.8, 0.8, 0.8));
        let specular_color =
            Self::sample_sum(&self.specular_maps, varying.uv, Vector3::new(0.5, 0.5, 0.5));

        let normal = varying
            .normal
            .try_normalize(1e-6)
            .unwrap_or_else(Vector3::y);
        let view_dir = (self.view_pos - varying.world_pos.coords)
            .try_normalize(1e-6)
            .unwrap_or_else(Vector3::z);

        let mut result = Vector3::zeros();

        if let Some(light) = &self.dir_light {
            let light_dir = (-light.direction).normalize();
            result += shade(
                normal,
                view_dir,
                light_dir,
                base_color,
                specular_color,
                self.shininess,
                light.ambient,
                light.diffuse,
                light.specular,
            );
        }

        for light in &self.point_lights {
            let to_light = light.position - varying.world_pos.coords;
            let distance = to_light.norm();
            let light_dir = to_light
                .try_normalize(1e-6)
                .unwrap_or_else(Vector3::y);
            let attenuation = 1.0
                / (light.constant + light.linear * distance + light.quadratic * distance * distance);
            result += shade(
                normal,
                view_dir,
                light_dir,
                base_color,
                specular_color,
                self.shininess,
                light.ambient,
                light.diffuse,
                light.specular,
            ) * attenuation;
        }

        result += Self::sample_sum(&self.emission_maps, varying.uv, Vector3::zeros());

        Vector3::new(result.x.min(1.0), result.y.min(1.0), result.z.min(1.0))
    }
}

/// One light's ambient + diffuse + specular contribution.
#[allow(clippy::too_many_arguments)]
fn shade(
    normal: Vector3<f32>,
    view_dir: Vector3<f32>,
    light_dir: Vector3<f32>,
    base_color: Vector3<f32>,
    specular_color: Vector3<f32>,
    shininess: f32,
    light_ambient: Vector3<f32>,
    light_diffuse: Vector3<f32>,
    light_specular: Vector3<f32>,
) -> Vector3<f32> {
    let ambient = light_ambient.component_mul(&base_color);

    let diff = normal.dot(&light_dir).max(0.0);
    let diffuse = light_diffuse.component_mul(&base_color) * diff;

    let reflect_dir = normal * (2.0 * normal.dot(&light_dir)) - light_dir;
    let spec = view_dir.dot(&reflect_dir).max(0.0).powf(shininess);
    let specular = light_specular.component_mul(&specular_color) * spec;

    ambient + diffuse + specular
}
