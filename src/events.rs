//! Batch events and the sinks that deliver them
//!
//! The batch worker never touches caller state directly. It pushes
//! [`BatchEvent`]s into an [`EventSink`], and frontends render them however they
//! like. `Display` gives the human-readable log line for each event.

use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// Something that happened during a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Enumeration finished; `total` images qualify
    Started { total: usize },
    /// A composite was written
    Processed { image: String, output: PathBuf },
    /// The image or its mask could not be decoded
    LoadFailed { image: String, reason: String },
    /// Image and mask sizes differ
    DimensionMismatch {
        image: String,
        image_size: (u32, u32),
        mask_size: (u32, u32),
    },
    /// The composite could not be written
    SaveFailed { image: String, reason: String },
    /// Cancellation was observed; remaining images were skipped
    Stopped,
    /// Every qualifying image was visited without cancellation
    Completed { processed: usize, skipped: usize },
    /// The run aborted before processing any image
    Failed { reason: String },
}

impl BatchEvent {
    /// Whether this is the last event of a run
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::Completed { .. } | Self::Failed { .. }
        )
    }

    /// Whether this event reports a skipped item
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::LoadFailed { .. } | Self::DimensionMismatch { .. } | Self::SaveFailed { .. }
        )
    }
}

impl fmt::Display for BatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { total } => write!(f, "Found {} image(s) to merge.", total),
            Self::Processed { output, .. } => {
                write!(f, "Processed and saved: {}", output.display())
            },
            Self::LoadFailed { image, reason } => {
                write!(f, "Error loading {} ({}). Skipping.", image, reason)
            },
            Self::DimensionMismatch {
                image,
                image_size,
                mask_size,
            } => write!(
                f,
                "Skipping {} due to mismatch in dimensions (image {}x{}, mask {}x{}).",
                image, image_size.0, image_size.1, mask_size.0, mask_size.1
            ),
            Self::SaveFailed { image, reason } => {
                write!(f, "Error saving result for {} ({}). Skipping.", image, reason)
            },
            Self::Stopped => write!(f, "Processing was stopped by user."),
            Self::Completed { .. } => {
                write!(f, "All images have been successfully merged and saved.")
            },
            Self::Failed { reason } => write!(f, "Processing aborted: {}", reason),
        }
    }
}

/// Receiver of batch events; called from the worker thread
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BatchEvent);
}

/// Hands events to another context through an unbounded channel
#[derive(Clone)]
pub struct ChannelEventSink {
    sender: UnboundedSender<BatchEvent>,
}

impl ChannelEventSink {
    #[must_use]
    pub fn new(sender: UnboundedSender<BatchEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: BatchEvent) {
        // A dropped receiver only means nobody is listening any more.
        if self.sender.send(event).is_err() {
            tracing::trace!("Batch event receiver dropped");
        }
    }
}

/// Forwards events into `tracing` at a matching severity
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: BatchEvent) {
        match &event {
            BatchEvent::Failed { .. } => tracing::error!("{}", event),
            e if e.is_skip() => tracing::warn!("{}", event),
            _ => tracing::info!("{}", event),
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: BatchEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_event_messages() {
        let event = BatchEvent::Processed {
            image: "a.JPG".to_string(),
            output: PathBuf::from("out/a_black_background.png"),
        };
        assert_eq!(
            event.to_string(),
            "Processed and saved: out/a_black_background.png"
        );

        let event = BatchEvent::DimensionMismatch {
            image: "a.JPG".to_string(),
            image_size: (100, 100),
            mask_size: (50, 50),
        };
        let message = event.to_string();
        assert!(message.starts_with("Skipping a.JPG due to mismatch in dimensions"));
        assert!(message.contains("100x100"));
        assert!(message.contains("50x50"));

        assert_eq!(
            BatchEvent::Stopped.to_string(),
            "Processing was stopped by user."
        );
    }

    #[test]
    fn test_terminal_and_skip_classification() {
        assert!(BatchEvent::Stopped.is_terminal());
        assert!(BatchEvent::Completed {
            processed: 1,
            skipped: 0
        }
        .is_terminal());
        assert!(BatchEvent::Failed {
            reason: "x".to_string()
        }
        .is_terminal());
        assert!(!BatchEvent::Started { total: 3 }.is_terminal());

        let skip = BatchEvent::LoadFailed {
            image: "b.JPG".to_string(),
            reason: "missing".to_string(),
        };
        assert!(skip.is_skip());
        assert!(!skip.is_terminal());
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (tx, mut rx) = unbounded_channel();
        let sink = ChannelEventSink::new(tx);
        sink.emit(BatchEvent::Started { total: 0 });
        sink.emit(BatchEvent::Completed {
            processed: 0,
            skipped: 0,
        });

        assert_eq!(rx.try_recv().unwrap(), BatchEvent::Started { total: 0 });
        assert!(rx.try_recv().unwrap().is_terminal());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        ChannelEventSink::new(tx).emit(BatchEvent::Stopped);
    }
}
