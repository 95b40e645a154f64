use crate::gpu::device::{GraphicsDevice, PixelData, SamplerDesc, TextureHandle};
use log::debug;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// The material slot a texture feeds. The set is closed: a texture always
/// carries exactly one of these roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Emission,
}

impl TextureKind {
    /// Name fragment used for the `material.<kind>[N]` sampler uniforms.
    pub fn sampler_name(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
            TextureKind::Emission => "emission",
        }
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode texture '{path}': {source}")]
    DecodeFailed {
        path: String,
        source: image::ImageError,
    },
    #[error("texture '{path}' decoded to zero pixels")]
    EmptyImage { path: String },
}

/// Image decoding seam. The cache owns one; tests substitute a counting
/// decoder to observe cache hits without touching the filesystem.
pub trait ImageDecoder {
    fn decode(&self, path: &Path, flip_vertical: bool) -> Result<PixelData, TextureError>;
}

/// Decodes image files from disk as 8-bit RGB.
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path, flip_vertical: bool) -> Result<PixelData, TextureError> {
        let mut img = image::open(path).map_err(|source| TextureError::DecodeFailed {
            path: path.display().to_string(),
            source,
        })?;
        if flip_vertical {
            img = img.flipv();
        }
        let rgb = img.to_rgb8();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(TextureError::EmptyImage {
                path: path.display().to_string(),
            });
        }
        Ok(PixelData {
            width: rgb.width(),
            height: rgb.height(),
            channels: 3,
            bytes: rgb.into_raw(),
        })
    }
}

/// An uploaded texture: the device handle plus the role and source path it
/// was loaded under. Clones share the handle; the cache owns its lifetime.
#[derive(Debug, Clone)]
pub struct Texture {
    pub handle: TextureHandle,
    pub kind: TextureKind,
    pub path: String,
}

/// Deduplicates texture loads by exact path string. A path is decoded and
/// uploaded at most once; later requests get the cached entry back even if
/// they ask for a different kind (the first load's kind wins).
pub struct TextureCache {
    entries: HashMap<String, Texture>,
    decoder: Box<dyn ImageDecoder>,
}

impl TextureCache {
    pub fn new(decoder: Box<dyn ImageDecoder>) -> Self {
        Self {
            entries: HashMap::new(),
            decoder,
        }
    }

    pub fn with_file_decoder() -> Self {
        Self::new(Box::new(FileDecoder))
    }

    pub fn get_or_load<D: GraphicsDevice>(
        &mut self,
        device: &mut D,
        path: &Path,
        kind: TextureKind,
        flip_vertical: bool,
    ) -> Result<Texture, TextureError> {
        let key = path.display().to_string();
        if let Some(existing) = self.entries.get(&key) {
            debug!("texture cache hit: {key}");
            return Ok(existing.clone());
        }

        let pixels = self.decoder.decode(path, flip_vertical)?;
        let handle = device.upload_texture(&pixels, &SamplerDesc::default());
        debug!(
            "loaded texture {key} ({}x{}) as {}",
            pixels.width,
            pixels.height,
            kind.sampler_name()
        );

        let texture = Texture {
            handle,
            kind,
            path: key.clone(),
        };
        self.entries.insert(key, texture.clone());
        Ok(texture)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deletes every cached texture from the device and empties the cache.
    pub fn release<D: GraphicsDevice>(&mut self, device: &mut D) {
        for (_, texture) in self.entries.drain() {
            device.delete_texture(texture.handle);
        }
    }
}
