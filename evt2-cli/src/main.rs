//! EVT 2.0 encoder CLI application.
//!
//! Encodes CSV event lists into EVT 2.0 raw files.

use anyhow::{Context, Result};
use clap::Parser;
use evt2_core::{input, writer, FieldOrder, RawHeader, SensorMetadata};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

/// EVT 2.0 raw file encoder for Prophesee-compatible event cameras.
///
/// Reads CD events from CSV (one event per line) and writes them as an
/// EVT 2.0 .raw recording with time high words interleaved.
#[derive(Parser, Debug)]
#[command(name = "evt2-encode")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file with CD events
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output EVT2 .raw file path
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Field order of the input CSV.
    ///
    /// Format: comma-separated field names (x, y, p, t)
    ///
    /// Examples:
    /// - "x,y,p,t" (default)
    /// - "t,x,y,p" (timestamp first)
    /// - "x,y,t,p"
    #[arg(short, long, default_value = "x,y,p,t")]
    format: String,

    /// Input CSV with trigger events (value,id,timestamp)
    #[arg(short, long, value_name = "PATH")]
    triggers: Option<PathBuf>,

    /// Sensor width, overrides any %geometry line in the input
    #[arg(long)]
    width: Option<u32>,

    /// Sensor height, overrides any %geometry line in the input
    #[arg(long)]
    height: Option<u32>,

    /// Integrator name written to the header
    #[arg(long, default_value = evt2_core::header::DEFAULT_INTEGRATOR)]
    integrator: String,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let field_order = FieldOrder::from_str(&args.format)
        .context("Invalid field format. Use comma-separated: x,y,p,t")?;

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb
    };

    let start_time = Instant::now();

    progress.set_message(format!(
        "Reading {:?}...",
        args.input.file_name().unwrap_or_default()
    ));

    let cd_input = input::read_cd_csv(&args.input, field_order)
        .with_context(|| format!("Failed to read CD events from {:?}", args.input))?;
    log::info!(
        "Read {} CD events from {:?}",
        cd_input.events.len(),
        args.input
    );

    let trigger_events = match &args.triggers {
        Some(path) => {
            let events = input::read_trigger_csv(path)
                .with_context(|| format!("Failed to read trigger events from {:?}", path))?;
            log::info!("Read {} trigger events from {:?}", events.len(), path);
            events
        }
        None => Vec::new(),
    };

    let metadata = match &cd_input.metadata {
        Some(metadata) => metadata.clone(),
        None => {
            let metadata = SensorMetadata::default();
            log::warn!(
                "No geometry in input, using {}x{} unless overridden",
                metadata.width,
                metadata.height
            );
            metadata
        }
    };
    let metadata = SensorMetadata {
        width: args.width.unwrap_or(metadata.width),
        height: args.height.unwrap_or(metadata.height),
    };
    if !metadata.fits_cd_fields() {
        log::warn!(
            "Geometry {}x{} exceeds the EVT 2.0 CD fields (x < 1024, y < 4096); \
             coordinates beyond them cannot be encoded",
            metadata.width,
            metadata.height
        );
    }

    let header = RawHeader {
        metadata,
        integrator: args.integrator.clone(),
        date: Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
    };

    progress.set_message(format!(
        "Writing {:?}...",
        args.output.file_name().unwrap_or_default()
    ));

    let stats = writer::write_raw_file(
        &args.output,
        &header,
        &cd_input.events,
        &trigger_events,
    )
    .context("Failed to write EVT2 raw file")?;

    log::debug!(
        "{} time high words, {} clock restarts",
        stats.time_high_words,
        stats.resyncs
    );

    let total_duration = start_time.elapsed();

    progress.finish_with_message(format!(
        "Done! Encoded {} events in {:.2}s (sensor: {}x{})",
        stats.cd_events + stats.trigger_events,
        total_duration.as_secs_f64(),
        header.metadata.width,
        header.metadata.height
    ));

    if !args.quiet {
        let events_per_sec = stats.cd_events as f64 / total_duration.as_secs_f64();
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", args.input);
        eprintln!("  Output:       {:?}", args.output);
        eprintln!("  CD Events:    {}", stats.cd_events);
        eprintln!("  Triggers:     {}", stats.trigger_events);
        eprintln!("  Time High:    {}", stats.time_high_words);
        eprintln!("  Words:        {}", stats.total_words());
        eprintln!(
            "  Sensor:       {}x{}",
            header.metadata.width, header.metadata.height
        );
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
        eprintln!("  Throughput:   {:.0} events/s", events_per_sec);
    }

    Ok(())
}
