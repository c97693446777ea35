use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, warn};

use crate::error::AssetError;
use crate::uri;

/// Longest edge a texture may keep before it is downsampled.
pub const MAX_TEXTURE_SIZE: u32 = 1024;

/// A decoded texture ready for upload: RGBA8, rows flipped bottom-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    /// Index of the glTF image this texture was decoded from.
    pub image_index: usize,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Size that fits `width` x `height` inside `max` x `max` keeping the aspect ratio.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = f64::from(max) / f64::from(width.max(height));
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}

/// Convert to RGBA8, flip vertically, and downsample oversized images.
pub fn prepare_texture(image_index: usize, image: DynamicImage) -> TextureAsset {
    let mut rgba: RgbaImage = image.to_rgba8();
    imageops::flip_vertical_in_place(&mut rgba);

    let (width, height) = rgba.dimensions();
    let (target_w, target_h) = fit_within(width, height, MAX_TEXTURE_SIZE);
    if (target_w, target_h) != (width, height) {
        debug!(
            "Downsampling image {} from {}x{} to {}x{}",
            image_index, width, height, target_w, target_h
        );
        rgba = imageops::resize(&rgba, target_w, target_h, FilterType::Lanczos3);
    }

    let (width, height) = rgba.dimensions();
    TextureAsset {
        image_index,
        width,
        height,
        data: rgba.into_raw(),
    }
}

/// Load an image file and return it as a prepared texture.
pub fn load_texture(image_index: usize, path: &Path) -> Result<TextureAsset, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    let img = image::open(path)
        .map_err(|e| AssetError::ImageLoadFailed(path.display().to_string(), e.to_string()))?;
    Ok(prepare_texture(image_index, img))
}

/// Decode an in-memory image using its MIME type (PNG when unknown).
pub fn decode_texture(
    image_index: usize,
    bytes: &[u8],
    mime_type: Option<&str>,
) -> Result<TextureAsset, AssetError> {
    let format = mime_type
        .and_then(ImageFormat::from_mime_type)
        .unwrap_or(ImageFormat::Png);
    let img = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        AssetError::ImageLoadFailed(format!("embedded image {}", image_index), e.to_string())
    })?;
    Ok(prepare_texture(image_index, img))
}

/// Decode every image referenced by the document.
///
/// Images that cannot be loaded are logged and left out; parts bound to them
/// render untextured.
pub fn resolve_images(
    document: &gltf::Document,
    buffers: &[Vec<u8>],
    asset_dir: &Path,
) -> Vec<TextureAsset> {
    let mut textures = Vec::new();

    for image in document.images() {
        let index = image.index();
        let result = match image.source() {
            gltf::image::Source::Uri { uri: location, .. } if uri::is_data_uri(location) => {
                debug!("Skipping data URI image {}", index);
                continue;
            }
            gltf::image::Source::Uri { uri: location, .. } => {
                let path = uri::resolve_relative(asset_dir, location);
                debug!("Loading external texture {}: {}", index, path.display());
                load_texture(index, &path)
            }
            gltf::image::Source::View { view, mime_type } => {
                embedded_bytes(buffers, &view).and_then(|bytes| {
                    decode_texture(index, bytes, Some(mime_type))
                })
            }
        };

        match result {
            Ok(texture) => {
                debug!(
                    "Decoded image {} ({}x{})",
                    index, texture.width, texture.height
                );
                textures.push(texture);
            }
            Err(e) => warn!("Texture {} unavailable: {}", index, e),
        }
    }

    textures
}

fn embedded_bytes<'a>(
    buffers: &'a [Vec<u8>],
    view: &gltf::buffer::View<'_>,
) -> Result<&'a [u8], AssetError> {
    let buffer_index = view.buffer().index();
    let bytes = buffers.get(buffer_index).ok_or_else(|| {
        AssetError::ImageLoadFailed(
            format!("buffer view {}", view.index()),
            format!("buffer {} was not loaded", buffer_index),
        )
    })?;
    let start = view.offset();
    let end = start.saturating_add(view.length());
    bytes.get(start..end).ok_or_else(|| {
        AssetError::ImageLoadFailed(
            format!("buffer view {}", view.index()),
            format!(
                "range {}..{} exceeds buffer length {}",
                start,
                end,
                bytes.len()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn fit_within_keeps_small_images() {
        assert_eq!(fit_within(512, 256, 1024), (512, 256));
        assert_eq!(fit_within(1024, 1024, 1024), (1024, 1024));
    }

    #[test]
    fn fit_within_preserves_aspect() {
        assert_eq!(fit_within(2048, 1024, 1024), (1024, 512));
        assert_eq!(fit_within(1000, 3000, 1024), (341, 1024));
        assert_eq!(fit_within(5000, 2, 1024), (1024, 1));
    }

    #[test]
    fn prepare_flips_rows() {
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));

        let texture = prepare_texture(3, DynamicImage::ImageRgba8(img));
        assert_eq!(texture.image_index, 3);
        assert_eq!((texture.width, texture.height), (1, 2));
        assert_eq!(&texture.data[0..4], &[0, 0, 255, 255]);
        assert_eq!(&texture.data[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn prepare_converts_rgb_to_rgba() {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]));
        let texture = prepare_texture(0, DynamicImage::ImageRgb8(img));
        assert_eq!(texture.data.len(), 2 * 2 * 4);
        assert_eq!(&texture.data[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn prepare_downsamples_large_images() {
        let img = RgbaImage::from_pixel(2048, 512, Rgba([1, 2, 3, 255]));
        let texture = prepare_texture(0, DynamicImage::ImageRgba8(img));
        assert_eq!((texture.width, texture.height), (1024, 256));
        assert_eq!(texture.data.len(), 1024 * 256 * 4);
    }

    #[test]
    fn decode_garbage_fails() {
        let result = decode_texture(0, b"not an image", Some("image/png"));
        assert!(matches!(result, Err(AssetError::ImageLoadFailed(_, _))));
    }

    #[test]
    fn missing_texture_file() {
        let result = load_texture(0, Path::new("/nonexistent/skin.png"));
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }
}
