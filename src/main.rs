//! Command-line entry point.
//!
//! # Run sequence
//!
//! 1. Initialise logging.
//! 2. Parse arguments and load + validate the TOML configuration
//!    (fatal on any problem — exits non-zero before touching the corpus).
//! 3. Read the catalog and select clips against the duration budgets.
//! 4. Dispatch the selection: decode → sign → upload, one clip at a time.
//! 5. Print the failed clip paths, if any, and exit zero.
//!
//! Per-item upload failures do not affect the exit code; they are listed
//! for an out-of-band re-run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use sound_curator::audio::WavDecoder;
use sound_curator::catalog::{read_catalog, select_clips};
use sound_curator::config::CuratorConfig;
use sound_curator::envelope::EnvelopeBuilder;
use sound_curator::upload::{Dispatcher, HttpTransport};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "sound-curator")]
#[command(about = "Curate labeled audio clips and upload them to an ingestion service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "curator.toml", env = "CURATOR_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Configuration
    let args = Args::parse();
    let config = CuratorConfig::load_from(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;
    config.validate().context("invalid configuration")?;

    // 3. Catalog scan
    let rows = read_catalog(&config.catalog.metadata_file).with_context(|| {
        format!(
            "failed to read catalog {}",
            config.catalog.metadata_file.display()
        )
    })?;
    log::info!("catalog: {} rows", rows.len());

    let decoder = Arc::new(WavDecoder::new());
    let clips = select_clips(
        &rows,
        &config.catalog.audio_dir,
        &config.selection.label,
        config.selection.target_duration_secs,
        config.selection.foreground_fraction,
        decoder.as_ref(),
    );
    let total_secs: f64 = clips.iter().map(|c| c.duration_secs).sum();
    log::info!(
        "selected {} clips of class {:?} ({total_secs:.1}s)",
        clips.len(),
        config.selection.label,
    );

    // 4. Dispatch
    let builder = EnvelopeBuilder::new(
        config.ingestion.hmac_key.as_bytes(),
        config.device.name.clone(),
        config.device.device_type.clone(),
    );
    let transport = Arc::new(HttpTransport::from_config(&config.ingestion));
    let dispatcher = Dispatcher::new(decoder, builder, transport);

    let report = dispatcher
        .run(clips, &config.selection.label, config.selection.testing_fraction)
        .await;

    // 5. Summary
    log::info!(
        "done: {} uploaded, {} failed",
        report.success_count(),
        report.failure_count(),
    );
    if report.failure_count() > 0 {
        println!("failed uploads:");
        for reference in report.failures() {
            println!("  {}", reference.path.display());
        }
    }

    Ok(())
}
