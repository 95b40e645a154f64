mod common;

use common::{CountingDecoder, FailingDecoder, RecordingDevice};
use glimmer::scene::texture::{TextureCache, TextureError, TextureKind};
use std::path::Path;

#[test]
fn repeated_loads_share_one_upload() {
    let mut device = RecordingDevice::new();
    let (decoder, decodes) = CountingDecoder::new();
    let mut cache = TextureCache::new(Box::new(decoder));

    let first = cache
        .get_or_load(&mut device, Path::new("wall.png"), TextureKind::Diffuse, false)
        .expect("first load succeeds");
    let second = cache
        .get_or_load(&mut device, Path::new("wall.png"), TextureKind::Diffuse, false)
        .expect("cache hit succeeds");

    assert_eq!(first.handle, second.handle);
    assert_eq!(decodes.get(), 1);
    assert_eq!(device.texture_uploads(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_hit_keeps_the_first_kind() {
    let mut device = RecordingDevice::new();
    let (decoder, _) = CountingDecoder::new();
    let mut cache = TextureCache::new(Box::new(decoder));

    let diffuse = cache
        .get_or_load(&mut device, Path::new("shared.png"), TextureKind::Diffuse, false)
        .expect("load succeeds");
    let hit = cache
        .get_or_load(&mut device, Path::new("shared.png"), TextureKind::Specular, false)
        .expect("hit succeeds");

    assert_eq!(diffuse.handle, hit.handle);
    assert_eq!(hit.kind, TextureKind::Diffuse);
}

#[test]
fn distinct_paths_get_distinct_handles() {
    let mut device = RecordingDevice::new();
    let (decoder, decodes) = CountingDecoder::new();
    let mut cache = TextureCache::new(Box::new(decoder));

    let a = cache
        .get_or_load(&mut device, Path::new("a.png"), TextureKind::Diffuse, false)
        .expect("load succeeds");
    let b = cache
        .get_or_load(&mut device, Path::new("b.png"), TextureKind::Diffuse, false)
        .expect("load succeeds");

    assert_ne!(a.handle, b.handle);
    assert_eq!(decodes.get(), 2);
}

#[test]
fn decode_failure_leaves_the_cache_empty() {
    let mut device = RecordingDevice::new();
    let mut cache = TextureCache::new(Box::new(FailingDecoder));

    let err = cache
        .get_or_load(&mut device, Path::new("broken.png"), TextureKind::Diffuse, false)
        .unwrap_err();

    assert!(matches!(err, TextureError::EmptyImage { .. }));
    assert!(cache.is_empty());
    assert_eq!(device.texture_uploads(), 0);
}

#[test]
fn release_deletes_every_uploaded_texture() {
    let mut device = RecordingDevice::new();
    let (decoder, _) = CountingDecoder::new();
    let mut cache = TextureCache::new(Box::new(decoder));

    let a = cache
        .get_or_load(&mut device, Path::new("a.png"), TextureKind::Diffuse, false)
        .expect("load succeeds");
    let b = cache
        .get_or_load(&mut device, Path::new("b.png"), TextureKind::Specular, false)
        .expect("load succeeds");

    cache.release(&mut device);

    assert!(cache.is_empty());
    let mut deleted = device.deleted_textures();
    deleted.sort_unstable();
    let mut expected = vec![a.handle, b.handle];
    expected.sort_unstable();
    assert_eq!(deleted, expected);
}
