//! Sequential, cancellable batch merging of image/mask pairs

use crate::{
    compositor::{MaskCompositor, MaskStatistics},
    error::{MergeError, Result},
    events::{BatchEvent, EventSink},
    paths,
    services::ImagePairLoader,
    tracing_config::spans,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// The three directories a batch run works on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    /// Directory holding `<name>.JPG` source images
    pub image_dir: PathBuf,
    /// Directory holding `<name>.JPG.mask.png` masks
    pub mask_dir: PathBuf,
    /// Directory receiving `<name>_black_background.png` results; created if missing
    pub output_dir: PathBuf,
}

impl BatchJob {
    pub fn new<A, B, C>(image_dir: A, mask_dir: B, output_dir: C) -> Self
    where
        A: Into<PathBuf>,
        B: Into<PathBuf>,
        C: Into<PathBuf>,
    {
        Self {
            image_dir: image_dir.into(),
            mask_dir: mask_dir.into(),
            output_dir: output_dir.into(),
        }
    }
}

/// How a run that did not hit a fatal error ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Completed,
    Stopped,
}

/// Statistics for a finished batch run
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Number of qualifying images found
    pub total: usize,
    /// Number of composites written
    pub processed: usize,
    /// Number of images skipped because of load, size or save errors
    pub skipped: usize,
    pub status: BatchStatus,
    pub elapsed: Duration,
}

/// Drives the load, validate, composite and write pipeline over one directory
pub struct BatchRunner<S> {
    job: BatchJob,
    sink: S,
}

impl<S: EventSink> BatchRunner<S> {
    pub fn new(job: BatchJob, sink: S) -> Self {
        Self { job, sink }
    }

    /// Run the batch to completion or until `cancel` fires
    ///
    /// Cancellation is checked before each image; an image already in flight
    /// is finished. Per-item failures are reported as events and skipped. An
    /// `Err` is returned only when the output directory cannot be created or
    /// the image directory cannot be listed, after a single
    /// [`BatchEvent::Failed`] has been emitted.
    pub fn run(&self, cancel: &CancellationToken) -> Result<BatchSummary> {
        match self.run_inner(cancel) {
            Ok(summary) => Ok(summary),
            Err(error) => {
                self.sink.emit(BatchEvent::Failed {
                    reason: error.to_string(),
                });
                Err(error)
            },
        }
    }

    fn run_inner(&self, cancel: &CancellationToken) -> Result<BatchSummary> {
        let start_time = Instant::now();

        Self::prepare_output_dir(&self.job.output_dir)?;
        let images = Self::list_images(&self.job.image_dir)?;

        let span = spans::batch_processing(images.len());
        let _guard = span.enter();

        self.sink.emit(BatchEvent::Started {
            total: images.len(),
        });

        let mut processed = 0;
        let mut skipped = 0;
        for image_name in &images {
            if cancel.is_cancelled() {
                break;
            }
            if self.process_image(image_name) {
                processed += 1;
            } else {
                skipped += 1;
            }
        }

        // Cancellation observed after the last image still counts as a stop.
        let status = if cancel.is_cancelled() {
            self.sink.emit(BatchEvent::Stopped);
            BatchStatus::Stopped
        } else {
            self.sink.emit(BatchEvent::Completed { processed, skipped });
            BatchStatus::Completed
        };

        let elapsed = start_time.elapsed();
        tracing::debug!(
            processed,
            skipped,
            total = images.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch finished"
        );

        Ok(BatchSummary {
            total: images.len(),
            processed,
            skipped,
            status,
            elapsed,
        })
    }

    /// Names of the qualifying images directly inside `image_dir`, sorted
    pub fn list_images(image_dir: &Path) -> Result<Vec<String>> {
        let read_dir_error = |source: std::io::Error| MergeError::ImageDirectory {
            path: image_dir.to_path_buf(),
            source,
        };

        let mut images = Vec::new();
        for entry in std::fs::read_dir(image_dir).map_err(read_dir_error)? {
            let entry = entry.map_err(read_dir_error)?;
            match entry.file_name().into_string() {
                Ok(name) if paths::is_source_image(&name) => images.push(name),
                Ok(_) => {},
                Err(name) => {
                    tracing::debug!(name = ?name, "Ignoring non-UTF-8 file name");
                },
            }
        }
        images.sort();
        Ok(images)
    }

    fn prepare_output_dir(output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir).map_err(|source| MergeError::OutputDirectory {
            path: output_dir.to_path_buf(),
            source,
        })
    }

    /// Returns whether a composite was written
    fn process_image(&self, image_name: &str) -> bool {
        let image_path = self.job.image_dir.join(image_name);
        let span = spans::file_processing(&image_path);
        let _guard = span.enter();

        match self.merge_one(image_name, &image_path) {
            Ok(output) => {
                self.sink.emit(BatchEvent::Processed {
                    image: image_name.to_string(),
                    output,
                });
                true
            },
            Err(error) => {
                self.sink.emit(skip_event(image_name, &error));
                false
            },
        }
    }

    fn merge_one(&self, image_name: &str, image_path: &Path) -> Result<PathBuf> {
        let mask_path = paths::mask_path_for(image_name, &self.job.mask_dir);
        let pair = ImagePairLoader::load_pair(image_path, &mask_path)?;
        pair.ensure_same_dimensions()?;

        let stats = MaskStatistics::from_mask(&pair.mask);
        tracing::debug!(
            foreground_pixels = stats.foreground_pixels,
            background_pixels = stats.background_pixels,
            foreground_ratio = stats.foreground_ratio,
            "Mask statistics"
        );

        let result = MaskCompositor::merge(&pair.image, &pair.mask);
        let output_path = paths::output_path_for(image_name, &self.job.output_dir);
        ImagePairLoader::save_png(&result, &output_path)?;
        Ok(output_path)
    }
}

fn skip_event(image_name: &str, error: &MergeError) -> BatchEvent {
    let image = image_name.to_string();
    match error {
        MergeError::DimensionMismatch {
            image: image_size,
            mask: mask_size,
        } => BatchEvent::DimensionMismatch {
            image,
            image_size: *image_size,
            mask_size: *mask_size,
        },
        MergeError::Save { .. } => BatchEvent::SaveFailed {
            image,
            reason: error.to_string(),
        },
        _ => BatchEvent::LoadFailed {
            image,
            reason: error.to_string(),
        },
    }
}
