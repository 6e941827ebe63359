//! leemstack command-line interface.
//!
//! Loads an energy-resolved image stack and prints curves, writes display
//! frames, or exports selections, without a graphical front end.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use leemstack_core::util::usize_to_f64;
use leemstack_core::WindowSpec;
use leemstack_io::{ByteOrder, ImageSource, LoadRequest, RawLayout};
use leemstack_session::{LoadStatus, LogSink, ReportSink, Session, SessionConfig};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load error: {0}")]
    Ingest(#[from] leemstack_io::IngestError),

    #[error("Core error: {0}")]
    Core(#[from] leemstack_core::Error),

    #[error("Smoothing error: {0}")]
    Smooth(#[from] leemstack_core::SmoothError),

    #[error("{0}")]
    Session(#[from] leemstack_session::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("raw mode needs --height and --width")]
    MissingDimensions,

    #[error("frame of {height}x{width} cannot be encoded")]
    FrameTooLarge { height: usize, width: usize },

    #[error("load finished without producing a stack")]
    NotLoaded,
}

/// Frame file format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Headered raw binary frames
    Raw,
    /// Raster images (tif, png, jpg, ...)
    Image,
}

/// Byte order of raw 16-bit samples.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Endian {
    Little,
    Big,
}

impl From<Endian> for ByteOrder {
    fn from(e: Endian) -> Self {
        match e {
            Endian::Little => ByteOrder::Little,
            Endian::Big => ByteOrder::Big,
        }
    }
}

/// Where the stack comes from and how to read it.
#[derive(Debug, Args)]
struct SourceArgs {
    /// Directory holding one frame per energy
    #[arg(short, long)]
    dir: PathBuf,

    /// Frame file format
    #[arg(short, long, value_enum, default_value = "raw")]
    mode: Mode,

    /// Frame height in pixels (raw mode)
    #[arg(long)]
    height: Option<usize>,

    /// Frame width in pixels (raw mode)
    #[arg(long)]
    width: Option<usize>,

    /// Bits per sample (raw mode)
    #[arg(long, default_value = "16")]
    bits: u8,

    /// Byte order (raw mode)
    #[arg(long, value_enum, default_value = "little")]
    byte_order: Endian,

    /// File extension filter (default: dat for raw, tif for images)
    #[arg(long)]
    ext: Option<String>,

    /// Byte-swap 16-bit image samples after decoding
    #[arg(long)]
    swap: bool,

    /// Energy of the first frame (eV)
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    start_energy: f64,

    /// Energy step between frames (eV)
    #[arg(long, default_value = "0.1", allow_hyphen_values = true)]
    step: f64,
}

impl SourceArgs {
    fn request(&self) -> Result<LoadRequest> {
        let request = match self.mode {
            Mode::Raw => {
                let (Some(height), Some(width)) = (self.height, self.width) else {
                    return Err(CliError::MissingDimensions);
                };
                let mut layout = RawLayout::new(&self.dir, height, width)
                    .with_bit_depth(self.bits)
                    .with_byte_order(self.byte_order.into());
                if let Some(ext) = &self.ext {
                    layout = layout.with_extension(ext.clone());
                }
                LoadRequest::raw(layout)
            }
            Mode::Image => {
                let ext = self.ext.clone().unwrap_or_else(|| "tif".to_string());
                LoadRequest::image(ImageSource::new(&self.dir, ext).with_swap_bytes(self.swap))
            }
        };
        Ok(request.with_energy(self.start_energy, self.step))
    }
}

/// Smoothing window selection.
#[derive(Debug, Args)]
struct WindowArgs {
    /// Window length (odd lengths are bumped to the next even number)
    #[arg(long, default_value = "10")]
    window_len: usize,

    /// Window shape: flat, hanning, hamming, bartlett or blackman
    #[arg(long, default_value = "flat")]
    window_type: String,
}

impl WindowArgs {
    fn spec(&self) -> Result<WindowSpec> {
        Ok(WindowSpec::parse(self.window_len, &self.window_type)?)
    }
}

/// Explore energy-resolved LEEM/LEED image stacks.
#[derive(Parser)]
#[command(name = "leemstack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dimensions and energy range of a stack
    Info {
        #[command(flatten)]
        source: SourceArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the intensity curve of one pixel
    Curve {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long)]
        row: usize,

        #[arg(long)]
        col: usize,

        /// Print the unsmoothed curve
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Print the box-integrated curve around a diffraction spot
    Integrate {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(long)]
        row: usize,

        #[arg(long)]
        col: usize,

        /// Box half-width in pixels
        #[arg(long, default_value = "20")]
        half_width: usize,
    },

    /// Write one display-mapped frame as an 8-bit PNG
    Frame {
        #[command(flatten)]
        source: SourceArgs,

        /// Frame index (default: middle frame)
        #[arg(long)]
        index: Option<usize>,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Lower display bound (default: frame minimum)
        #[arg(long)]
        lower: Option<u32>,

        /// Upper display bound (default: frame maximum)
        #[arg(long)]
        upper: Option<u32>,
    },

    /// Export curves of selected pixels and spots as text files
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Real-space pixel as row,col (repeatable)
        #[arg(long, value_parser = parse_pixel)]
        pixel: Vec<(usize, usize)>,

        /// Diffraction spot centre as row,col (repeatable)
        #[arg(long, value_parser = parse_pixel)]
        region: Vec<(usize, usize)>,

        /// Box half-width for spots
        #[arg(long, default_value = "20")]
        half_width: usize,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// File name prefix
        #[arg(long, default_value = "curve")]
        base: String,

        /// Smooth curves before writing
        #[arg(long)]
        smooth: bool,

        #[command(flatten)]
        window: WindowArgs,
    },
}

fn parse_pixel(s: &str) -> std::result::Result<(usize, usize), String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected row,col but got '{s}'"))?;
    let row = row.trim().parse::<usize>().map_err(|e| format!("bad row '{row}': {e}"))?;
    let col = col.trim().parse::<usize>().map_err(|e| format!("bad column '{col}': {e}"))?;
    Ok((row, col))
}

#[derive(Serialize)]
struct StackInfo {
    dir: PathBuf,
    height: usize,
    width: usize,
    frames: usize,
    bits: u32,
    energy_start: Option<f64>,
    energy_end: Option<f64>,
}

fn open<'a>(
    source: &SourceArgs,
    config: SessionConfig,
    sink: &'a dyn ReportSink,
    verbose: bool,
) -> Result<Session<'a>> {
    let start = Instant::now();
    let mut session = Session::new(config, sink);
    session.load(source.request()?);
    match session.wait() {
        LoadStatus::Ready {
            height,
            width,
            depth,
        } => {
            if verbose {
                eprintln!(
                    "Loaded {depth} frames of {height}x{width} in {:.2}s",
                    start.elapsed().as_secs_f64()
                );
            }
            Ok(session)
        }
        LoadStatus::Failed(e) => Err(e.into()),
        LoadStatus::Idle | LoadStatus::Loading => Err(CliError::NotLoaded),
    }
}

fn print_curve(energy: &[f64], values: &[f64]) {
    for (e, v) in energy.iter().zip(values) {
        println!("{e}\t{v}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    let sink = LogSink;
    let verbose = cli.verbose;

    match cli.command {
        Commands::Info { source, json } => {
            let session = open(&source, SessionConfig::default(), &sink, verbose)?;
            let stack = session.store().require()?;
            let (height, width, frames) = stack.volume().dim();
            let range = stack.energy().range();
            let info = StackInfo {
                dir: source.dir.clone(),
                height,
                width,
                frames,
                bits: stack.volume().sample_depth().bits(),
                energy_start: range.map(|r| r.0),
                energy_end: range.map(|r| r.1),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Directory:    {}", info.dir.display());
                println!("Frames:       {frames}");
                println!("Frame size:   {height}x{width}");
                println!("Sample depth: {}", stack.volume().sample_depth());
                if let Some((lo, hi)) = range {
                    println!("Energy:       {lo} .. {hi} eV");
                }
                if let Some(cache) = session.store().cache() {
                    println!(
                        "Smooth cache: {:.1} MiB",
                        usize_to_f64(cache.footprint()) / (1024.0 * 1024.0)
                    );
                }
            }
        }

        Commands::Curve {
            source,
            row,
            col,
            raw,
            window,
        } => {
            let mut session = open(&source, SessionConfig::default(), &sink, verbose)?;
            let values = if raw {
                session.store().raw_spectrum(row, col)?
            } else {
                session.set_hover_window(window.spec()?);
                session.hover(row, col)?.to_vec()
            };
            let energy = session.energy().ok_or(CliError::NotLoaded)?;
            print_curve(energy.values(), &values);
        }

        Commands::Integrate {
            source,
            row,
            col,
            half_width,
        } => {
            let config = SessionConfig::default().with_region_half_width(half_width);
            let mut session = open(&source, config, &sink, verbose)?;
            session.select_region(row, col)?;
            let energy = session.energy().ok_or(CliError::NotLoaded)?;
            if let Some(curve) = session.region_curves().first() {
                print_curve(energy.values(), curve.values);
            }
        }

        Commands::Frame {
            source,
            index,
            output,
            lower,
            upper,
        } => {
            let mut session = open(&source, SessionConfig::default(), &sink, verbose)?;
            if let Some(index) = index {
                session.set_frame(index)?;
            }
            let frame = session.display_frame(lower, upper)?;
            let (height, width) = frame.dim();
            let too_large = || CliError::FrameTooLarge { height, width };
            let img = image::GrayImage::from_raw(
                u32::try_from(width).map_err(|_| too_large())?,
                u32::try_from(height).map_err(|_| too_large())?,
                frame.iter().copied().collect(),
            )
            .ok_or_else(too_large)?;
            img.save(&output)?;
            if verbose {
                eprintln!(
                    "Wrote frame {} ({:?} eV) to {}",
                    session.current_frame(),
                    session.current_energy(),
                    output.display()
                );
            }
        }

        Commands::Export {
            source,
            pixel,
            region,
            half_width,
            out_dir,
            base,
            smooth,
            window,
        } => {
            let smoothing = if smooth { Some(window.spec()?) } else { None };
            let config = SessionConfig::default()
                .with_region_half_width(half_width)
                .with_export_smoothing(smoothing);
            let mut session = open(&source, config, &sink, verbose)?;
            std::fs::create_dir_all(&out_dir)?;

            for &(row, col) in &pixel {
                session.select_pixel(row, col)?;
            }
            for &(row, col) in &region {
                session.select_region(row, col)?;
            }

            let mut written = Vec::new();
            if !pixel.is_empty() {
                session.export_pixels(&out_dir, &format!("{base}_pixel"))?;
                written.extend(session.wait_exports()?);
            }
            if !region.is_empty() {
                session.export_regions(&out_dir, &format!("{base}_region"))?;
                written.extend(session.wait_exports()?);
            }
            for path in &written {
                println!("{}", path.display());
            }
            if verbose {
                eprintln!("Exported {} curve(s)", written.len());
            }
        }
    }

    Ok(())
}
