//! TEPRA Printer Driver
//!
//! This crate provides a printer driver for King Jim TEPRA series tape
//! label printers (tested with the SR920), speaking the device's USB
//! command protocol directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use tepra::{Config, CutMode, PrintSettings, Printer};
//!
//! let printer = Printer::new(Config::new()).unwrap();
//! let profile = printer.tape_profile().unwrap();
//!
//! let image = std::fs::read("label.png").unwrap();
//! let raster = tepra::rasterize(&image, &profile, true).unwrap();
//!
//! let settings = PrintSettings::new()
//!     .cut_mode(CutMode::HalfCut)
//!     .copies(2);
//! printer.print(&profile, &settings, &raster).unwrap();
//! ```

mod command;
mod error;
mod job;
mod media;
mod printer;
mod raster;
mod units;

pub use crate::{
    command::{frame_bracketed, frame_graphic_chunk, Command, CutMode, TAPE_CUT, TAPE_FEED},
    error::Error,
    job::{build_job, PrintSettings},
    media::{tape_width_from_status, TapeProfile, SUPPORTED_TAPE_WIDTHS},
    printer::{Config, Printer},
    raster::{rasterize, Raster},
    units::{mm_to_points, mm_to_units, pixels_for_width, DOTS_PER_MM, UNITS_PER_MM},
};
