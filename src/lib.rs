#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Mask Merger
//!
//! Batch compositing of photographs against black using binary segmentation
//! masks.
//!
//! For every `<name>.JPG` in an image directory, the mask
//! `<name>.JPG.mask.png` is loaded from a mask directory and thresholded
//! (samples above 127 are foreground). Foreground pixels keep their colour and
//! everything else becomes black. The result is written losslessly as
//! `<name>_black_background.png` in an output directory.
//!
//! ## Features
//!
//! - **Sequential, interruptible batches**: one background worker, cancelled
//!   between images, with stop requests that wait for the worker to exit
//! - **Contained failures**: unreadable files and size mismatches are logged
//!   and skipped, never aborting the batch
//! - **Event stream**: human-readable [`BatchEvent`]s delivered over a channel
//! - **Persisted settings**: the three directories are remembered between runs
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask_merger::{BatchJob, BatchRunner, TracingEventSink};
//! use tokio_util::sync::CancellationToken;
//!
//! # fn example() -> mask_merger::Result<()> {
//! let job = BatchJob::new("photos", "masks", "output");
//! let summary = BatchRunner::new(job, TracingEventSink).run(&CancellationToken::new())?;
//! println!("{} of {} images merged", summary.processed, summary.total);
//! # Ok(())
//! # }
//! ```
//!
//! For a non-blocking run with stop support, see [`BatchController`].

pub mod batch;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod events;
pub mod paths;
pub mod services;
pub mod settings;
pub mod tracing_config;

pub use batch::{BatchJob, BatchRunner, BatchStatus, BatchSummary};
pub use compositor::{MaskCompositor, MaskStatistics, MASK_THRESHOLD};
pub use controller::{BatchController, StartOutcome};
pub use debounce::Debouncer;
pub use error::{MergeError, Result};
pub use events::{BatchEvent, ChannelEventSink, EventSink, NoOpEventSink, TracingEventSink};
pub use services::{ImagePair, ImagePairLoader, PairRole};
pub use settings::{Settings, SettingsStore, AUTOSAVE_DELAY};

#[cfg(feature = "cli")]
pub use tracing_config::init_cli_tracing;
pub use tracing_config::{TracingConfig, TracingFormat};
