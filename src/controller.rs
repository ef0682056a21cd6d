//! Single-worker batch controller used by frontends
//!
//! At most one batch runs at a time, on a blocking worker separate from the
//! caller. Events flow back through an unbounded channel the caller drains on
//! its own schedule.

use crate::{
    batch::{BatchJob, BatchRunner, BatchSummary},
    error::{MergeError, Result},
    events::{BatchEvent, ChannelEventSink},
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new worker was spawned
    Started,
    /// Another run is still active; nothing was changed
    Rejected,
}

/// A run stays in the controller's slot until its worker has exited, even
/// while some caller is awaiting its join handle.
struct ActiveRun {
    cancel: CancellationToken,
    /// `None` once a caller has taken the handle to join it
    handle: Option<JoinHandle<Result<BatchSummary>>>,
    /// Closes when the worker drops its sender on exit
    exited: watch::Receiver<()>,
}

impl ActiveRun {
    fn is_alive(&self) -> bool {
        self.exited.has_changed().is_ok()
    }
}

/// Starts, stops and awaits batch runs
///
/// # Examples
/// ```rust,no_run
/// use mask_merger::{BatchController, BatchJob, StartOutcome};
///
/// # async fn example() -> mask_merger::Result<()> {
/// let (controller, mut events) = BatchController::new();
/// let job = BatchJob::new("photos", "masks", "output");
/// assert_eq!(controller.start_batch(job), StartOutcome::Started);
///
/// while let Some(event) = events.recv().await {
///     println!("{event}");
///     if event.is_terminal() {
///         break;
///     }
/// }
/// controller.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct BatchController {
    active: Mutex<Option<ActiveRun>>,
    events: UnboundedSender<BatchEvent>,
}

impl BatchController {
    /// Create a controller and the receiving end of its event stream
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<BatchEvent>) {
        let (events, receiver) = unbounded_channel();
        (
            Self {
                active: Mutex::new(None),
                events,
            },
            receiver,
        )
    }

    /// Start a run on a background worker unless one is already active
    ///
    /// A run counts as active until its worker thread has exited, including
    /// while another task is inside [`wait`](Self::wait) or
    /// [`request_stop`](Self::request_stop). Must be called from within a
    /// tokio runtime.
    pub fn start_batch(&self, job: BatchJob) -> StartOutcome {
        let mut active = self.lock_active();

        if active.as_ref().is_some_and(ActiveRun::is_alive) {
            tracing::warn!("{}", MergeError::AlreadyRunning);
            return StartOutcome::Rejected;
        }

        tracing::info!(
            image_dir = %job.image_dir.display(),
            mask_dir = %job.mask_dir.display(),
            output_dir = %job.output_dir.display(),
            "Starting batch"
        );

        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let (exit_signal, exited) = watch::channel(());
        let runner = BatchRunner::new(job, ChannelEventSink::new(self.events.clone()));
        let handle = tokio::task::spawn_blocking(move || {
            let _exit_signal = exit_signal;
            runner.run(&worker_cancel)
        });

        *active = Some(ActiveRun {
            cancel,
            handle: Some(handle),
            exited,
        });
        StartOutcome::Started
    }

    /// Whether a worker is currently running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(ActiveRun::is_alive)
    }

    /// Signal cancellation and wait until the worker has exited
    ///
    /// Returns `Ok(None)` if no run was started since the last stop or wait,
    /// or if another caller is already joining the run (this call still waits
    /// for the worker to exit). Once this returns, the worker has emitted its
    /// final event and will write nothing more.
    pub async fn request_stop(&self) -> Result<Option<BatchSummary>> {
        let outcome = self.finish(true).await;
        if !matches!(outcome, Ok(None)) {
            tracing::info!("Stopped processing at user's request.");
        }
        outcome
    }

    /// Wait for the current run to finish without cancelling it
    pub async fn wait(&self) -> Result<Option<BatchSummary>> {
        self.finish(false).await
    }

    async fn finish(&self, cancel: bool) -> Result<Option<BatchSummary>> {
        let (handle, mut exited) = {
            let mut active = self.lock_active();
            let Some(run) = active.as_mut() else {
                return Ok(None);
            };
            if cancel {
                run.cancel.cancel();
            }
            (run.handle.take(), run.exited.clone())
        };

        let outcome = match handle {
            Some(handle) => Some(Self::join(handle).await),
            None => {
                // Another caller owns the handle; wait for the worker to exit.
                while exited.changed().await.is_ok() {}
                None
            },
        };

        self.clear_joined_run();
        outcome.transpose()
    }

    /// Drop the slot once its worker has exited and its handle was taken.
    /// A run started after that exit is left alone.
    fn clear_joined_run(&self) {
        let mut active = self.lock_active();
        if active
            .as_ref()
            .is_some_and(|run| run.handle.is_none() && !run.is_alive())
        {
            *active = None;
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn join(handle: JoinHandle<Result<BatchSummary>>) -> Result<BatchSummary> {
        handle
            .await
            .map_err(|e| MergeError::internal(format!("Batch worker failed: {}", e)))?
    }
}
