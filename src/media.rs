//! Tape media handling and printer status decoding.

use crate::{
    error::Error,
    units::pixels_for_width,
};

/// Tape widths in millimeters the printer firmware recognizes.
pub const SUPPORTED_TAPE_WIDTHS: [u8; 10] = [4, 6, 9, 12, 18, 24, 36, 48, 50, 100];

/// Decode the tape-width status code into a width in millimeters.
///
/// The code is byte 3 of the 8-byte port status response. Unmapped
/// codes decode to 0 (no tape); 0xFF decodes to 255 (unknown tape).
pub fn tape_width_from_status(code: u8) -> u8 {
    match code {
        0x00 => 0,
        0x01 => 6,
        0x02 => 9,
        0x03 => 12,
        0x04 => 18,
        0x05 => 24,
        0x06 => 36,
        0x07 => 48,
        0x0B => 4,
        0x21 => 50,
        0x23 => 100,
        0xFF => 255,
        _ => 0,
    }
}

/// The tape cartridge a job prints onto.
///
/// The width governs both the raster's short-axis pixel count and the
/// graphic chunk size, so it is validated once here and the rest of the
/// pipeline derives from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeProfile {
    width_mm: u8,
}

impl TapeProfile {
    /// Build a profile for an explicitly chosen tape width.
    pub fn new(width_mm: u8) -> Result<Self, Error> {
        if SUPPORTED_TAPE_WIDTHS.contains(&width_mm) {
            Ok(TapeProfile { width_mm })
        } else {
            Err(Error::InvalidTapeWidth(width_mm))
        }
    }

    /// Build a profile from the device's 8-byte port status response.
    pub fn from_status(status: &[u8; 8]) -> Result<Self, Error> {
        match tape_width_from_status(status[3]) {
            0 => Err(Error::NoTapeInstalled),
            width => Self::new(width),
        }
    }

    pub fn width_mm(&self) -> u8 {
        self.width_mm
    }

    /// Pixels spanning the tape's short axis.
    pub fn width_pixels(&self) -> u32 {
        pixels_for_width(self.width_mm)
    }

    /// Raster bytes per column line.
    ///
    /// Integer division: 9mm tape yields 108 bits per line, which is
    /// not byte aligned. Every other supported width divides evenly.
    pub fn chunk_size(&self) -> usize {
        (self.width_pixels() / 8) as usize
    }
}
