//! Image to printable raster conversion.
//!
//! The printer consumes 1-bit graphic data one column line at a time,
//! advancing along the tape's feed direction. An arbitrary source image
//! is fitted to the tape width, reduced to black and white, rotated so
//! the feed direction becomes row-major, then packed 8 pixels per byte.

use image::imageops::{self, BiLevel, FilterType};
use image::GenericImageView;
use log::debug;

use crate::{error::Error, media::TapeProfile};

/// A bit-packed monochrome raster ready for chunking.
///
/// `width_px` and `height_px` are the dimensions after fitting to the
/// tape but before rotation: `height_px` spans the tape's short axis
/// and `width_px` runs along the feed direction, which is what the
/// print-length computation needs.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Packed pixels, MSB first, 1 = printed. Only the final byte may
    /// carry padding bits, which are always zero.
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

/// Convert encoded image bytes into a raster fitted to the given tape.
///
/// The image is resampled (bilinear) so its height equals the tape's
/// pixel count, scaling width proportionally. With `dither` enabled the
/// grayscale is reduced by Floyd-Steinberg error diffusion, otherwise
/// by a flat midpoint threshold. Pixels darker than the threshold
/// print.
pub fn rasterize(data: &[u8], profile: &TapeProfile, dither: bool) -> Result<Raster, Error> {
    let img = image::load_from_memory(data)?;

    let target_height = profile.width_pixels();
    let target_width =
        (img.width() as f64 * target_height as f64 / img.height() as f64).round() as u32;

    debug!(
        "fitting {}x{} image to {}x{} for {}mm tape",
        img.width(),
        img.height(),
        target_width,
        target_height,
        profile.width_mm()
    );

    let mut gray = img
        .resize_exact(target_width, target_height, FilterType::Triangle)
        .to_luma8();

    if dither {
        imageops::dither(&mut gray, &BiLevel);
    } else {
        for pixel in gray.pixels_mut() {
            pixel.0[0] = if pixel.0[0] < 128 { 0 } else { 255 };
        }
    }

    // The tape feeds through the head sideways relative to the image,
    // so a 270 degree turn puts the short axis on the fast axis.
    let rotated = imageops::rotate90(&gray);

    let bytes = pack_bits(rotated.pixels().map(|pixel| pixel.0[0] == 0));

    Ok(Raster {
        bytes,
        width_px: target_width,
        height_px: target_height,
    })
}

/// Pack a bit sequence into bytes, MSB first.
///
/// Unused low-order bits of the final byte are left zero.
fn pack_bits<I>(bits: I) -> Vec<u8>
where
    I: Iterator<Item = bool>,
{
    let mut bytes = Vec::new();
    let mut acc = 0u8;
    let mut filled = 0u8;

    for bit in bits {
        acc = (acc << 1) | bit as u8;
        filled += 1;
        if filled == 8 {
            bytes.push(acc);
            acc = 0;
            filled = 0;
        }
    }
    if filled > 0 {
        bytes.push(acc << (8 - filled));
    }

    bytes
}
