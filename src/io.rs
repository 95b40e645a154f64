pub mod config;
pub mod gltf_loader;
pub mod obj_loader;
