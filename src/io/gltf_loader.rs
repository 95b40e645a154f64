use crate::core::geometry::Vertex;
use crate::gpu::device::GraphicsDevice;
use crate::scene::mesh::{Mesh, MeshError};
use crate::scene::model::Model;
use crate::scene::texture::{Texture, TextureCache, TextureError, TextureKind};
use log::{info, warn};
use nalgebra::{Point3, Vector2, Vector3};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("scene import failed: {0}")]
    Load(#[from] gltf::Error),
    #[error("scene has no root node")]
    MissingRoot,
    #[error("mesh primitive '{0}' has no position data")]
    MissingPositions(String),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Imports a glTF scene into a [`Model`], walking the default scene's node
/// tree depth-first. Each primitive becomes one mesh; textures referenced
/// by its material are resolved relative to the model's directory through
/// the shared cache.
///
/// Any failure mid-traversal releases the meshes uploaded so far and
/// returns the error, so a failed import never leaves partial GPU state.
pub fn import_model<D: GraphicsDevice>(
    device: &mut D,
    cache: &mut TextureCache,
    path: &Path,
) -> Result<Model, ImportError> {
    // Buffers are imported here; image data stays with the texture cache
    // so repeated references resolve to one upload.
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    let scene = document.default_scene().ok_or(ImportError::MissingRoot)?;
    let directory = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        if let Err(err) = process_node(device, cache, &node, &buffers, &directory, &mut meshes) {
            for mesh in &mut meshes {
                mesh.release(device);
            }
            return Err(err);
        }
    }

    info!(
        "imported {}: {} meshes, {} cached textures",
        path.display(),
        meshes.len(),
        cache.len()
    );
    Ok(Model::new(meshes))
}

fn process_node<D: GraphicsDevice>(
    device: &mut D,
    cache: &mut TextureCache,
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    directory: &Path,
    meshes: &mut Vec<Mesh>,
) -> Result<(), ImportError> {
    if let Some(mesh) = node.mesh() {
        let name = mesh.name().unwrap_or("unnamed").to_string();
        for primitive in mesh.primitives() {
            let (vertices, indices) = read_primitive(&primitive, buffers, &name)?;
            let textures = load_material_textures(device, cache, &primitive.material(), directory)?;
            meshes.push(Mesh::new(device, vertices, indices, textures)?);
        }
    }

    for child in node.children() {
        process_node(device, cache, &child, buffers, directory, meshes)?;
    }
    Ok(())
}

/// Flattens one primitive into the packed vertex format. Positions are
/// required; normals default to +Y, texcoords to (0, 0), and an unindexed
/// primitive gets sequential indices.
fn read_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    mesh_name: &str,
) -> Result<(Vec<Vertex>, Vec<u32>), ImportError> {
    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| ImportError::MissingPositions(mesh_name.to_string()))?
        .collect();

    let normals: Vec<Vector3<f32>> = reader
        .read_normals()
        .map(|iter| iter.map(Vector3::from).collect())
        .unwrap_or_default();

    let texcoords: Vec<Vector2<f32>> = reader
        .read_tex_coords(0)
        .map(|iter| iter.into_f32().map(Vector2::from).collect())
        .unwrap_or_default();

    let mut vertices = Vec::with_capacity(positions.len());
    for (i, p) in positions.iter().enumerate() {
        vertices.push(Vertex::new(
            Point3::new(p[0], p[1], p[2]),
            normals.get(i).copied().unwrap_or_else(Vector3::y),
            texcoords.get(i).copied().unwrap_or_else(Vector2::zeros),
        ));
    }

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..vertices.len() as u32).collect());

    Ok((vertices, indices))
}

/// Resolves the material's texture slots in a fixed order: base color as
/// diffuse, metallic-roughness as specular, emissive as emission.
fn load_material_textures<D: GraphicsDevice>(
    device: &mut D,
    cache: &mut TextureCache,
    material: &gltf::Material,
    directory: &Path,
) -> Result<Vec<Texture>, ImportError> {
    let mut textures = Vec::new();
    let pbr = material.pbr_metallic_roughness();

    if let Some(info) = pbr.base_color_texture() {
        load_slot(
            device,
            cache,
            &info.texture(),
            TextureKind::Diffuse,
            directory,
            &mut textures,
        )?;
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        load_slot(
            device,
            cache,
            &info.texture(),
            TextureKind::Specular,
            directory,
            &mut textures,
        )?;
    }
    if let Some(info) = material.emissive_texture() {
        load_slot(
            device,
            cache,
            &info.texture(),
            TextureKind::Emission,
            directory,
            &mut textures,
        )?;
    }

    Ok(textures)
}

fn load_slot<D: GraphicsDevice>(
    device: &mut D,
    cache: &mut TextureCache,
    texture: &gltf::Texture,
    kind: TextureKind,
    directory: &Path,
    out: &mut Vec<Texture>,
) -> Result<(), ImportError> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => {
            let path = directory.join(uri);
            // Imported scenes use the flipped texture-coordinate convention.
            out.push(cache.get_or_load(device, &path, kind, true)?);
        }
        gltf::image::Source::View { .. } => {
            warn!(
                "embedded texture '{}' skipped, only file references are supported",
                texture.source().name().unwrap_or("unnamed")
            );
        }
    }
    Ok(())
}
