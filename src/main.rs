use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use coord_sift::csv::{CsvPointSource, CsvRecordSink};
use coord_sift::dedup::{DedupConfig, DedupProcessor};
use coord_sift::utils;

#[derive(Parser)]
#[command(name = "coord-sift")]
#[command(about = "Coord Sift - finds every record stacked on a duplicate coordinate in huge geodata files")]
struct Args {
    #[arg(short, long, help = "Input CSV file (id,lon,lat[,attributes...])")]
    input: PathBuf,

    #[arg(short, long, help = "Output CSV file for records at duplicate coordinates")]
    output: PathBuf,

    #[arg(short, long, help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Working directory for bucket files")]
    work_dir: Option<PathBuf>,

    #[arg(long, help = "Number of bucket files (power of two)")]
    buckets: Option<usize>,

    #[arg(long, help = "Keep bucket files after the run")]
    keep_bucket_files: bool,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DedupConfig::from_file(path)?,
        None => DedupConfig::default(),
    };

    if let Some(work_dir) = args.work_dir {
        config.work_directory = work_dir;
    }
    if let Some(buckets) = args.buckets {
        config.bucket_count = buckets;
    }
    config.keep_bucket_files = args.keep_bucket_files;
    config.verbose = args.verbose;

    utils::setup_logging(if args.verbose { "verbose" } else { "normal" })?;

    info!("Starting Coord Sift");
    info!("Input file: {}", args.input.display());
    info!("Output file: {}", args.output.display());

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    let mut source = CsvPointSource::new(args.input)
        .with_io_buffer_size(config.io_buffer_size_bytes());
    let mut sink = CsvRecordSink::create(&args.output)?;

    let mut processor = DedupProcessor::new(config)?;
    let stats = processor.process(&mut source, &mut sink).await?;

    if stats.phase2_skipped {
        info!("No duplicates found. Done.");
    } else {
        info!("Found {} duplicate coordinate(s)", stats.duplicate_coordinates);
        info!("Matched {} record(s) at those locations", stats.matched_records);
    }

    info!("Records scanned: {}", stats.total_records);
    info!("Processing time: {}", utils::format_duration(Duration::from_millis(stats.processing_time_ms)));
    if stats.peak_memory_mb > 0.0 {
        info!("Peak memory usage: {}", utils::format_bytes(
            (stats.peak_memory_mb * 1024.0 * 1024.0) as usize));
    }

    Ok(())
}
