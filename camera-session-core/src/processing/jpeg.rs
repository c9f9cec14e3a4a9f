//! Still photo post-processing: rotate upright, then centre-crop to the
//! viewfinder aspect.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::models::error::ProcessingError;

/// Crop rectangle `(x, y, width, height)` that centre-crops a
/// `width`x`height` frame to `crop_aspect_wh`.
///
/// `crop_aspect_wh` is given as landscape (>= 1.0); portrait frames are
/// cropped to its inverse. Frames already within 1% of the target are left
/// whole.
pub fn centre_crop_rect(width: u32, height: u32, crop_aspect_wh: f32) -> (u32, u32, u32, u32) {
    if width == 0 || height == 0 || !crop_aspect_wh.is_finite() || crop_aspect_wh <= 0.0 {
        return (0, 0, width, height);
    }

    let w = width as f32;
    let h = height as f32;
    let src_aspect = w / h;
    let dst_aspect = if src_aspect > 1.0 {
        crop_aspect_wh
    } else {
        1.0 / crop_aspect_wh
    };

    if (src_aspect * 100.0) as i32 == (dst_aspect * 100.0) as i32 {
        return (0, 0, width, height);
    }

    if src_aspect < dst_aspect {
        // Cut off top and bottom.
        let dst_h = (w / dst_aspect).round().min(h) as u32;
        let top = (height - dst_h) / 2;
        (0, top, width, dst_h)
    } else {
        // Cut off left and right.
        let dst_w = (h * dst_aspect).round().min(w) as u32;
        let left = (width - dst_w) / 2;
        (left, 0, dst_w, height)
    }
}

/// Decode `src` as JPEG, rotate clockwise by `rotation` degrees, crop to
/// `crop_aspect_wh` and re-encode at `quality`.
pub fn crop_rotate_jpeg(
    src: &[u8],
    rotation: u32,
    crop_aspect_wh: f32,
    quality: u8,
) -> Result<Vec<u8>, ProcessingError> {
    let decoded = image::load_from_memory_with_format(src, ImageFormat::Jpeg)
        .map_err(|e| ProcessingError::Decode(e.to_string()))?;

    let rotated = match rotation % 360 {
        90 => decoded.rotate90(),
        180 => decoded.rotate180(),
        270 => decoded.rotate270(),
        _ => decoded,
    };

    let (x, y, w, h) = centre_crop_rect(rotated.width(), rotated.height(), crop_aspect_wh);
    let cropped = rotated.crop_imm(x, y, w, h);

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    DynamicImage::ImageRgb8(cropped.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    Ok(out)
}
