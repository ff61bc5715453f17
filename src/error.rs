//! Error types for TEPRA printer operations.
//!
//! All failures are detected before or at the point of command
//! construction and propagate synchronously to the caller; nothing is
//! retried. A partially transmitted job cannot be replayed on a physical
//! printer, so the caller decides what to do next.

use rusb;
use thiserror::Error;

/// Main error type for TEPRA printer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues,
    /// timeouts, or permission problems.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// Printer device is not connected or not responding.
    #[error("Device is offline")]
    DeviceOffline,

    #[error("Can't read device list, permission issue ?")]
    DeviceListNotReadable,

    #[error("Device is missing a bulk-out endpoint")]
    MissingEndpoint,

    /// The device returned fewer bytes than the request calls for.
    #[error("Received invalid response from printer ({0} bytes)")]
    InvalidResponse(usize),

    /// A bracketed command must carry at least an opcode.
    #[error("Command body must contain an opcode")]
    EmptyCommand,

    /// Contrast is a seven-step scale centered on zero.
    #[error("Contrast level {0} is out of range, must be between -3 and 3")]
    InvalidContrast(i8),

    #[error("Invalid configuration parameter: {0}")]
    InvalidConfig(String),

    /// The firmware only recognizes a fixed set of tape widths.
    #[error("Unsupported tape width: {0}mm")]
    InvalidTapeWidth(u8),

    #[error("No tape is installed in the printer")]
    NoTapeInstalled,

    /// Source bytes could not be decoded as a raster image.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(#[from] image::ImageError),

    /// Packed raster data must split evenly into column lines.
    ///
    /// Sending a short final chunk leaves the printer waiting for the
    /// rest of the line, so the shape is validated before transmission.
    #[error("Raster length {len} is not a multiple of the chunk size {chunk_size}")]
    DataShapeMismatch { len: usize, chunk_size: usize },
}
