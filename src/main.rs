//! # tepraprint
//!
//! Command-line control for TEPRA label printers.
//!
//! ## Usage
//!
//! ```bash
//! # Show the connected printer and installed tape
//! tepraprint --info
//!
//! # Print an image, two copies, half cut between labels
//! tepraprint -i label.png --copies 2 --cut-mode half-cut
//!
//! # Print from stdin with an explicit length
//! cat label.png | tepraprint -i - --print-length 40
//!
//! # Inspect the command stream without a printer attached
//! tepraprint -i label.png --tape-width 12 --dry-run
//! ```

use clap::{Parser, ValueEnum};
use std::io::Read;

use tepra::{build_job, rasterize, Config, CutMode, PrintSettings, Printer, TapeProfile};

/// TEPRA label printer control
#[derive(Parser, Debug)]
#[command(name = "tepraprint", version, about)]
struct Cli {
    /// Print device information and exit
    #[arg(long)]
    info: bool,

    /// Feed the tape and exit
    #[arg(long)]
    feed: bool,

    /// Cut the tape and exit
    #[arg(long)]
    cut: bool,

    /// Build the command stream and hex-dump it instead of printing
    #[arg(long)]
    dry_run: bool,

    /// Tape cut mode
    #[arg(long, value_enum, default_value_t = CutModeArg::Cut)]
    cut_mode: CutModeArg,

    /// Tape width in mm, 0 to ask the printer
    #[arg(long, default_value_t = 0)]
    tape_width: u8,

    /// Number of copies to print
    #[arg(long, default_value_t = 1)]
    copies: u16,

    /// Label length in mm, 0 for automatic
    #[arg(long, default_value_t = 0)]
    print_length: u16,

    /// Print start margin in mm
    #[arg(long, default_value_t = 2)]
    print_margin: u16,

    /// Print contrast, -3 (lightest) to 3 (darkest)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    print_contrast: i8,

    /// Reduce with a flat threshold instead of Floyd-Steinberg dithering
    #[arg(long)]
    no_dither: bool,

    /// Image file to print, '-' for stdin
    #[arg(short, long)]
    input: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CutModeArg {
    None,
    Cut,
    HalfCut,
    JobCut,
    JobHalfCut,
}

impl From<CutModeArg> for CutMode {
    fn from(arg: CutModeArg) -> Self {
        match arg {
            CutModeArg::None => CutMode::None,
            CutModeArg::Cut => CutMode::Cut,
            CutModeArg::HalfCut => CutMode::HalfCut,
            CutModeArg::JobCut => CutMode::JobCut,
            CutModeArg::JobHalfCut => CutMode::JobHalfCut,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.dry_run {
        return dry_run(&cli);
    }

    let printer = Printer::new(Config::new())?;

    if cli.info {
        println!("Device   : {}", printer.device_id()?);
        println!("Media(mm): {}", printer.tape_width_mm()?);
        return Ok(());
    }

    if cli.feed {
        return Ok(printer.feed()?);
    }

    if cli.cut {
        return Ok(printer.cut()?);
    }

    let profile = if cli.tape_width > 0 {
        TapeProfile::new(cli.tape_width)?
    } else {
        printer.tape_profile()?
    };

    let image = read_input(cli.input.as_deref())?;
    let settings = settings_from(&cli);
    let raster = rasterize(&image, &profile, settings.use_dither())?;

    printer.print(&profile, &settings, &raster)?;
    Ok(())
}

/// Build and dump the job without touching the device.
fn dry_run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.tape_width == 0 {
        return Err("--dry-run needs an explicit --tape-width".into());
    }

    let profile = TapeProfile::new(cli.tape_width)?;
    let image = read_input(cli.input.as_deref())?;
    let settings = settings_from(cli);
    let raster = rasterize(&image, &profile, settings.use_dither())?;

    for command in build_job(&profile, &settings, &raster)? {
        println!("{}", hex(&command));
    }
    Ok(())
}

fn settings_from(cli: &Cli) -> PrintSettings {
    PrintSettings::new()
        .cut_mode(cli.cut_mode.into())
        .contrast(cli.print_contrast)
        .print_length_mm(cli.print_length)
        .start_margin_mm(cli.print_margin)
        .dither(!cli.no_dither)
        .copies(cli.copies)
}

fn read_input(input: Option<&str>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    match input {
        None => Err("an input image is required (use -i FILE, or -i - for stdin)".into()),
        Some("-") => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read(path)?),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
