pub mod light_source;
pub mod phong;
