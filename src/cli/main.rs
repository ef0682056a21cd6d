//! Mask Merger CLI Tool
//!
//! Runs one batch through [`BatchController`], rendering its events as log
//! lines or a progress bar. Ctrl-C stops the batch between images.

use super::config::CliConfigBuilder;
use crate::{
    batch::{BatchJob, BatchSummary},
    controller::{BatchController, StartOutcome},
    error::MergeError,
    events::{BatchEvent, EventSink, TracingEventSink},
    settings::{Settings, SettingsStore, AUTOSAVE_DELAY},
    tracing_config::{init_cli_tracing, TracingFormat},
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};

/// Interval at which the event loop checks whether the worker has exited
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Exit status when the batch could not start processing at all
const EXIT_FATAL: u8 = 2;

/// Composite photographs over black using their segmentation masks
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "mask-merger")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Directory containing <name>.JPG images [default: saved setting]
    #[arg(short, long, value_name = "DIR")]
    pub image_dir: Option<String>,

    /// Directory containing <name>.JPG.mask.png masks [default: saved setting]
    #[arg(short, long, value_name = "DIR")]
    pub mask_dir: Option<String>,

    /// Directory receiving <name>_black_background.png results [default: saved setting]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Use a custom settings file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub settings_file: Option<String>,

    /// Do not remember the directories used for this run
    #[arg(long)]
    pub no_save_settings: bool,

    /// Print the effective settings and exit
    #[arg(long)]
    pub show_settings: bool,

    /// Show a progress bar instead of per-image log lines
    #[arg(long)]
    pub progress: bool,

    /// Disable colored log output (also off when stdout is not a terminal)
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let format = TracingFormat::select(cli.no_color, std::io::stdout().is_terminal());
    init_cli_tracing(cli.verbose, format).context("Failed to initialize tracing")?;

    let store = match &cli.settings_file {
        Some(path) => SettingsStore::at(path),
        None => SettingsStore::new().context("Failed to locate settings file")?,
    };
    let saved = store.load().unwrap_or_else(|e| {
        warn!("Ignoring saved settings: {}", e);
        Settings::default()
    });
    let settings = CliConfigBuilder::resolve(&cli, &saved);

    if cli.show_settings {
        show_settings(&store, &settings);
        return Ok(ExitCode::SUCCESS);
    }

    let job = settings
        .to_job()
        .context("Pass the missing directory on the command line")?;

    let autosaver = (!cli.no_save_settings).then(|| store.autosaver(AUTOSAVE_DELAY));
    if let Some(saver) = &autosaver {
        if settings != saved {
            saver.submit(settings.clone());
        }
    }

    let outcome = run_batch(&cli, job).await;

    // Graceful shutdown: persist edits even if the batch failed.
    if let Some(saver) = autosaver {
        saver.flush().await;
    }

    let summary = match outcome {
        Ok(summary) => summary,
        Err(error) if is_fatal_failure(&error) => {
            error!("{:#}", error);
            return Ok(ExitCode::from(EXIT_FATAL));
        },
        Err(error) => return Err(error),
    };

    if let Some(summary) = summary {
        info!(
            "Merged {}/{} image(s) in {:.2}s ({} skipped)",
            summary.processed,
            summary.total,
            summary.elapsed.as_secs_f64(),
            summary.skipped
        );
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_batch(cli: &Cli, job: BatchJob) -> Result<Option<BatchSummary>> {
    let (controller, mut events) = BatchController::new();
    if controller.start_batch(job) == StartOutcome::Rejected {
        anyhow::bail!("Process already running");
    }

    let progress_bar = cli.progress.then(create_progress_bar);
    let mut stop_result = None;
    let mut listen_for_interrupt = true;
    let mut worker_poll = tokio::time::interval(WORKER_POLL_INTERVAL);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                report_event(&event, progress_bar.as_ref());
                if event.is_terminal() {
                    break;
                }
            },
            signal = &mut interrupt, if listen_for_interrupt => {
                listen_for_interrupt = false;
                match signal {
                    Ok(()) => {
                        warn!("Interrupt received, stopping after the current image");
                        stop_result = Some(controller.request_stop().await);
                    },
                    Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
                }
            },
            _ = worker_poll.tick() => {
                if !controller.is_running() {
                    while let Ok(event) = events.try_recv() {
                        report_event(&event, progress_bar.as_ref());
                    }
                    break;
                }
            },
        }
    }

    if let Some(bar) = &progress_bar {
        bar.finish_and_clear();
    }

    let result = match stop_result {
        Some(result) => result,
        None => controller.wait().await,
    };
    result.context("Batch processing failed")
}

/// Whether the batch aborted during setup rather than on an unexpected error
fn is_fatal_failure(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<MergeError>()
        .is_some_and(MergeError::is_fatal)
}

fn create_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    bar.set_style(style);
    bar
}

fn report_event(event: &BatchEvent, progress_bar: Option<&ProgressBar>) {
    let Some(bar) = progress_bar else {
        TracingEventSink.emit(event.clone());
        return;
    };

    match event {
        BatchEvent::Started { total } => bar.set_length(*total as u64),
        BatchEvent::Processed { image, .. } => {
            bar.set_message(image.clone());
            bar.inc(1);
        },
        e if e.is_skip() => {
            bar.println(e.to_string());
            bar.inc(1);
        },
        e => bar.println(e.to_string()),
    }
}

fn show_settings(store: &SettingsStore, settings: &Settings) {
    println!("Settings file: {}", store.path().display());
    println!("  Image directory:  {}", settings.image_dir);
    println!("  Mask directory:   {}", settings.mask_dir);
    println!("  Output directory: {}", settings.output_dir);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_setup_failure_maps_to_fatal_exit() {
        let error = anyhow::Error::new(MergeError::OutputDirectory {
            path: PathBuf::from("/out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
        .context("Batch processing failed");
        assert!(is_fatal_failure(&error));

        let error = anyhow::Error::new(MergeError::AlreadyRunning).context("Batch processing failed");
        assert!(!is_fatal_failure(&error));

        assert!(!is_fatal_failure(&anyhow::anyhow!("Failed to initialize tracing")));
    }

    #[test]
    fn test_no_color_flag_parses() {
        let cli = Cli::try_parse_from(["mask-merger", "--no-color", "-i", "photos"]).unwrap();
        assert!(cli.no_color);
        assert_eq!(cli.image_dir.as_deref(), Some("photos"));
        assert_eq!(
            TracingFormat::select(cli.no_color, true),
            TracingFormat::Compact
        );
    }
}
