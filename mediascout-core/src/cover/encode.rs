use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, RgbImage, RgbaImage};

use crate::error::{Result, ScoutError};

/// Decode artwork and re-encode it as a `size`×`size` JPEG.
///
/// Transparent pixels are composited onto white, the image is center-cropped
/// to a square and then resized with Lanczos3.
pub fn encode_cover_jpeg(bytes: &[u8], size: u32, quality: u8) -> Result<Vec<u8>> {
    if size == 0 {
        return Err(ScoutError::Internal(
            "cover dimensions must be non-zero".into(),
        ));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ScoutError::InvalidImage(e.to_string()))?;
    let rgb = flatten_onto_white(decoded);

    let (w, h) = rgb.dimensions();
    let side = w.min(h);
    let cropped =
        image::imageops::crop_imm(&rgb, (w - side) / 2, (h - side) / 2, side, side)
            .to_image();
    let resized =
        image::imageops::resize(&cropped, size, size, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder
        .encode(resized.as_raw(), size, size, ColorType::Rgb8.into())
        .map_err(|e| {
            ScoutError::InvalidImage(format!("failed to encode cover JPEG: {e}"))
        })?;

    Ok(out.into_inner())
}

fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba: RgbaImage = image.into_rgba8();
    let (w, h) = rgba.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| -> u8 {
            let alpha = a as u16;
            ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8
        };
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
