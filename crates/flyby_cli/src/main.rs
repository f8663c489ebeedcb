//! Flyby CLI
//!
//! Inspect and sample keyframed camera paths described in TOML.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{PathFile, PATH_FILE};
use flyby_animation::{CameraPath, TrackKind};
use flyby_core::CameraState;

#[derive(Parser)]
#[command(name = "flyby")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keyframed camera path sampler", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a path at a fixed frame rate
    Sample {
        /// Path file
        #[arg(default_value = PATH_FILE)]
        path: PathBuf,

        /// Frames per second
        #[arg(short, long, default_value = "30")]
        fps: f64,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Start time in seconds
        #[arg(long, default_value = "0")]
        start: f64,

        /// End time in seconds (defaults to the path duration)
        #[arg(long)]
        end: Option<f64>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sample a path at a single time
    At {
        /// Time in seconds
        time: f64,

        /// Path file
        #[arg(default_value = PATH_FILE)]
        path: PathBuf,
    },

    /// Solve every bracket of a path and report problems
    Check {
        /// Path file
        #[arg(default_value = PATH_FILE)]
        path: PathBuf,
    },

    /// Show track and keyframe information
    Info {
        /// Path file
        #[arg(default_value = PATH_FILE)]
        path: PathBuf,
    },

    /// Write an example path file
    Init {
        /// Destination
        #[arg(default_value = PATH_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Comma-separated values with a header row
    Csv,
}

/// One sampled camera frame
#[derive(Debug, Serialize)]
struct Frame {
    time: f64,
    latitude: f64,
    longitude: f64,
    zoom: f64,
    heading: f64,
    pitch: f64,
}

impl Frame {
    fn new(time: f64, state: &CameraState) -> Self {
        Self {
            time,
            latitude: state.center.latitude.degrees(),
            longitude: state.center.longitude.degrees(),
            zoom: state.zoom.value(),
            heading: state.heading.degrees(),
            pitch: state.pitch.degrees(),
        }
    }

    fn write_csv(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "{:.4},{:.8},{:.8},{:.6},{:.6},{:.6}",
            self.time, self.latitude, self.longitude, self.zoom, self.heading, self.pitch
        )
    }
}

const CSV_HEADER: &str = "time,latitude,longitude,zoom,heading,pitch";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Frames go to stdout, so logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Sample {
            path,
            fps,
            format,
            start,
            end,
            output,
        } => cmd_sample(&path, fps, format, start, end, output.as_deref()),

        Commands::At { time, path } => cmd_at(&path, time),

        Commands::Check { path } => cmd_check(&path),

        Commands::Info { path } => cmd_info(&path),

        Commands::Init { path, force } => cmd_init(&path, force),
    }
}

fn load_path(path: &Path) -> Result<CameraPath> {
    let file = PathFile::load(path)?;
    debug!(
        "Loaded {} ({} center, {} zoom, {} heading, {} pitch keyframes)",
        path.display(),
        file.center.len(),
        file.zoom.len(),
        file.heading.len(),
        file.pitch.len()
    );
    file.build()
}

/// Frame times from `start` to `end` inclusive at `fps`
fn frame_times(start: f64, end: f64, fps: f64) -> impl Iterator<Item = f64> {
    let frames = ((end - start) * fps).round().max(0.0) as u64;
    (0..=frames).map(move |frame| (start + frame as f64 / fps).min(end))
}

/// Reject sampling ranges that are not finite, negative or reversed
fn check_range(start: f64, end: f64) -> Result<()> {
    for (name, value) in [("Start", start), ("End", end)] {
        if !value.is_finite() || value < 0.0 {
            anyhow::bail!("{} time must be finite and non-negative, got {}", name, value);
        }
    }
    if end < start {
        anyhow::bail!("End time {} is before start time {}", end, start);
    }
    Ok(())
}

fn cmd_sample(
    path: &Path,
    fps: f64,
    format: OutputFormat,
    start: f64,
    end: Option<f64>,
    output: Option<&Path>,
) -> Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        anyhow::bail!("Invalid frame rate {}", fps);
    }

    let mut camera_path = load_path(path)?;
    let duration = camera_path
        .time()
        .with_context(|| format!("Failed to solve {}", path.display()))?;
    let end = end.unwrap_or(duration);
    check_range(start, end)?;

    let writer: Box<dyn Write> = match output {
        Some(file) => Box::new(
            fs::File::create(file)
                .with_context(|| format!("Failed to create {}", file.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(writer);

    if format == OutputFormat::Csv {
        writeln!(out, "{}", CSV_HEADER)?;
    }

    let mut frames = 0u64;
    for time in frame_times(start, end, fps) {
        let state = camera_path
            .state_at(time)
            .with_context(|| format!("Failed to sample at {}s", time))?;
        let frame = Frame::new(time, &state);
        match format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, &frame)?;
                writeln!(out)?;
            }
            OutputFormat::Csv => frame.write_csv(&mut out)?,
        }
        frames += 1;
    }
    out.flush()?;

    info!(
        "Sampled {} frames from {:.2}s to {:.2}s at {} fps",
        frames,
        start,
        end,
        fps
    );
    if let Some(file) = output {
        info!("Frames written to {}", file.display());
    }

    Ok(())
}

fn cmd_at(path: &Path, time: f64) -> Result<()> {
    let mut camera_path = load_path(path)?;
    let state = camera_path
        .state_at(time)
        .with_context(|| format!("Failed to sample at {}s", time))?;
    println!("{}", serde_json::to_string_pretty(&Frame::new(time, &state))?);
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let mut camera_path = load_path(path)?;
    camera_path
        .refresh()
        .with_context(|| format!("Failed to solve {}", path.display()))?;
    info!(
        "{} is valid ({:.2}s)",
        path.display(),
        camera_path.time()?
    );
    Ok(())
}

fn cmd_info(path: &Path) -> Result<()> {
    let mut camera_path = load_path(path)?;

    println!("Camera path: {}", path.display());
    println!("==================");
    println!();
    println!("Tracks:");
    for kind in TrackKind::ALL {
        println!(
            "  - {:<8} {} keyframes, {:.2}s",
            kind.name(),
            camera_path.keyframe_count(kind),
            camera_path.track_duration(kind)
        );
    }
    println!();
    match camera_path.time() {
        Ok(duration) => println!("Duration: {:.2}s", duration),
        Err(error) => println!("Unsolvable: {}", error),
    }

    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let content = PathFile::example().to_toml()?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Example path written to {}", path.display());
    info!("To sample it:");
    info!("  flyby sample {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_times_cover_range() {
        let times: Vec<f64> = frame_times(0.0, 1.0, 4.0).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_frame_times_clamp_to_end() {
        let times: Vec<f64> = frame_times(0.0, 1.1, 2.0).collect();
        assert_eq!(times.len(), 3);
        assert_eq!(*times.last().unwrap(), 1.0);
        assert!(times.iter().all(|t| *t <= 1.1));
    }

    #[test]
    fn test_frame_times_are_lazy() {
        // A huge range only produces the frames that are pulled
        let times: Vec<f64> = frame_times(0.0, 1e9, 1000.0).take(3).collect();
        assert_eq!(times, vec![0.0, 0.001, 0.002]);
    }

    #[test]
    fn test_check_range_rejects_bad_bounds() {
        assert!(check_range(0.0, 30.0).is_ok());
        assert!(check_range(5.0, 5.0).is_ok());

        let error = check_range(0.0, f64::INFINITY).unwrap_err();
        assert!(error.to_string().contains("End time must be finite"));
        assert!(check_range(f64::NAN, 10.0).is_err());
        assert!(check_range(-1.0, 10.0).is_err());
        assert!(check_range(10.0, 5.0)
            .unwrap_err()
            .to_string()
            .contains("before start time"));
    }

    #[test]
    fn test_csv_row() {
        let mut path = PathFile::example().build().unwrap();
        let state = path.state_at(0.0).unwrap();
        let mut out = Vec::new();
        Frame::new(0.0, &state).write_csv(&mut out).unwrap();
        let row = String::from_utf8(out).unwrap();
        assert_eq!(row.trim_end().split(',').count(), CSV_HEADER.split(',').count());
        assert!(row.starts_with("0.0000,-27.47000000,153.02000000,12.000000"));
    }
}
