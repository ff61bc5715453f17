//! Print job sequencing.
//!
//! A job is a fixed command sequence: global setup (cut mode, contrast,
//! close-settings), then per copy the print length, start offset, every
//! graphic chunk, a form-feed byte and the end-of-label command. The
//! whole sequence is constructed and validated up front; nothing is
//! handed to the transport until every command encoded cleanly, so a
//! malformed job never leaves the printer mid-label.

use log::debug;

use crate::{
    command::{frame_graphic_chunk, Command, CutMode},
    error::Error,
    media::TapeProfile,
    raster::Raster,
    units::UNITS_PER_MM,
};

/// Form feed, sent once after the last graphic chunk of each copy.
const GRAPHIC_TERMINATOR: u8 = 0x0C;

/// Job-scoped print parameters.
///
/// Owned by the caller for the duration of one job; a fresh value is
/// expected per job.
#[derive(Debug, Clone)]
pub struct PrintSettings {
    start_margin_mm: u16,
    contrast: i8,
    print_length_mm: u16,
    cut_mode: CutMode,
    dither: bool,
    copies: u16,
}

impl PrintSettings {
    /// Default settings: 2mm margin, neutral contrast, automatic print
    /// length, full cut per label, dithering on, one copy.
    pub fn new() -> Self {
        PrintSettings {
            start_margin_mm: 2,
            contrast: 0,
            print_length_mm: 0,
            cut_mode: CutMode::Cut,
            dither: true,
            copies: 1,
        }
    }

    pub fn start_margin_mm(self, start_margin_mm: u16) -> Self {
        PrintSettings {
            start_margin_mm,
            ..self
        }
    }

    /// Contrast from -3 to 3. Validated when the job is built.
    pub fn contrast(self, contrast: i8) -> Self {
        PrintSettings { contrast, ..self }
    }

    /// Explicit print length in millimeters; 0 derives the length from
    /// the rasterized image.
    pub fn print_length_mm(self, print_length_mm: u16) -> Self {
        PrintSettings {
            print_length_mm,
            ..self
        }
    }

    pub fn cut_mode(self, cut_mode: CutMode) -> Self {
        PrintSettings { cut_mode, ..self }
    }

    pub fn dither(self, dither: bool) -> Self {
        PrintSettings { dither, ..self }
    }

    pub fn copies(self, copies: u16) -> Self {
        PrintSettings { copies, ..self }
    }

    pub fn use_dither(&self) -> bool {
        self.dither
    }
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the complete wire command sequence for one job.
///
/// Returns the commands in transmission order. Fails before producing
/// anything transmittable if the contrast is out of range, the copy
/// count is zero, or the raster does not split evenly into chunks.
pub fn build_job(
    profile: &TapeProfile,
    settings: &PrintSettings,
    raster: &Raster,
) -> Result<Vec<Vec<u8>>, Error> {
    if settings.copies < 1 {
        return Err(Error::InvalidConfig(
            "copies must be at least 1".to_string(),
        ));
    }

    let chunk_size = profile.chunk_size();
    if raster.bytes.len() % chunk_size != 0 {
        return Err(Error::DataShapeMismatch {
            len: raster.bytes.len(),
            chunk_size,
        });
    }

    let length_mm = if settings.print_length_mm > 0 {
        settings.print_length_mm
    } else {
        (raster.width_px as f64 / UNITS_PER_MM) as u16 + settings.start_margin_mm
    };

    debug!(
        "job: {}mm tape, {} copies, length {}mm, {} chunks per copy",
        profile.width_mm(),
        settings.copies,
        length_mm,
        raster.bytes.len() / chunk_size
    );

    // The bits-per-line wire field is a single byte. Widths over 21mm
    // overflow it and are untested against hardware.
    let bits_per_line = profile.width_pixels() as u8;

    let mut commands: Vec<Vec<u8>> = Vec::new();

    commands.push(settings.cut_mode.command().to_vec());
    commands.push(Command::contrast(settings.contrast)?.encode()?);
    commands.push(Command::close_settings().encode()?);

    for _ in 0..settings.copies {
        commands.push(Command::print_length(length_mm).encode()?);
        commands.push(Command::print_offset(settings.start_margin_mm).encode()?);
        for chunk in raster.bytes.chunks(chunk_size) {
            commands.push(frame_graphic_chunk(bits_per_line, chunk));
        }
        commands.push(vec![GRAPHIC_TERMINATOR]);
        commands.push(Command::end_of_label().encode()?);
    }

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_raster(profile: &TapeProfile, lines: usize) -> Raster {
        Raster {
            bytes: vec![0xAA; profile.chunk_size() * lines],
            width_px: lines as u32,
            height_px: profile.width_pixels(),
        }
    }

    #[test]
    fn job_sequence_is_setup_then_per_copy() {
        let profile = TapeProfile::new(12).unwrap();
        let raster = test_raster(&profile, 3);
        let settings = PrintSettings::new().cut_mode(CutMode::HalfCut);

        let commands = build_job(&profile, &settings, &raster).unwrap();

        // setup: cut mode, contrast, close settings
        assert_eq!(commands[0], CutMode::HalfCut.command().to_vec());
        assert_eq!(commands[1], Command::contrast(0).unwrap().encode().unwrap());
        assert_eq!(commands[2], Command::close_settings().encode().unwrap());

        // per copy: length, offset, 3 chunks, form feed, end of label
        assert_eq!(commands.len(), 3 + 2 + 3 + 2);
        assert_eq!(commands[3][3], 0x4C);
        assert_eq!(commands[4][3], 0x54);
        for chunk_cmd in &commands[5..8] {
            assert_eq!(&chunk_cmd[..6], &[0x1B, 0x2E, 0x00, 0x0A, 0x0A, 0x01]);
            assert_eq!(chunk_cmd[6], 144);
            assert_eq!(chunk_cmd.len(), 8 + profile.chunk_size());
        }
        assert_eq!(commands[8], vec![0x0C]);
        assert_eq!(commands[9], Command::end_of_label().encode().unwrap());
    }

    #[test]
    fn copies_repeat_the_per_copy_block() {
        let profile = TapeProfile::new(6).unwrap();
        let raster = test_raster(&profile, 2);
        let settings = PrintSettings::new().copies(3);

        let commands = build_job(&profile, &settings, &raster).unwrap();

        let per_copy = 2 + 2 + 2;
        assert_eq!(commands.len(), 3 + per_copy * 3);

        // Each copy ends with form feed followed by end-of-label.
        for copy in 0..3 {
            let end = 3 + per_copy * (copy + 1);
            assert_eq!(commands[end - 2], vec![0x0C]);
            assert_eq!(commands[end - 1], Command::end_of_label().encode().unwrap());
        }
    }

    #[test]
    fn automatic_length_derives_from_raster_width() {
        let profile = TapeProfile::new(12).unwrap();
        let mut raster = test_raster(&profile, 8);
        raster.width_px = 144;
        let settings = PrintSettings::new().start_margin_mm(2);

        let commands = build_job(&profile, &settings, &raster).unwrap();

        // 144px / 14.173 = 10mm, plus the 2mm margin.
        assert_eq!(commands[3], Command::print_length(12).encode().unwrap());
    }

    #[test]
    fn explicit_length_wins_over_automatic() {
        let profile = TapeProfile::new(12).unwrap();
        let raster = test_raster(&profile, 8);
        let settings = PrintSettings::new().print_length_mm(30);

        let commands = build_job(&profile, &settings, &raster).unwrap();

        assert_eq!(commands[3], Command::print_length(30).encode().unwrap());
    }

    #[test]
    fn misaligned_raster_is_rejected_before_any_output() {
        let profile = TapeProfile::new(12).unwrap();
        let raster = Raster {
            bytes: vec![0x00; profile.chunk_size() * 2 + 1],
            width_px: 2,
            height_px: profile.width_pixels(),
        };

        assert!(matches!(
            build_job(&profile, &PrintSettings::new(), &raster),
            Err(Error::DataShapeMismatch { chunk_size: 18, .. })
        ));
    }

    #[test]
    fn zero_copies_is_rejected() {
        let profile = TapeProfile::new(12).unwrap();
        let raster = test_raster(&profile, 1);
        let settings = PrintSettings::new().copies(0);

        assert!(matches!(
            build_job(&profile, &settings, &raster),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn bad_contrast_fails_the_whole_job() {
        let profile = TapeProfile::new(12).unwrap();
        let raster = test_raster(&profile, 1);
        let settings = PrintSettings::new().contrast(5);

        assert!(matches!(
            build_job(&profile, &settings, &raster),
            Err(Error::InvalidContrast(5))
        ));
    }
}
