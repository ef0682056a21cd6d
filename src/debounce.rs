//! Trailing-edge debouncing: the last submitted value wins once input has been
//! quiet for the configured delay.

use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;

/// Applies the latest submitted value after `delay` of inactivity
///
/// Each [`submit`](Debouncer::submit) restarts the delay. [`flush`](Debouncer::flush)
/// applies a pending value immediately and stops the background task.
pub struct Debouncer<T> {
    sender: UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debouncing task; must be called from within a tokio runtime
    pub fn new<F>(delay: Duration, mut action: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (sender, mut receiver) = unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                if pending.is_some() {
                    tokio::select! {
                        next = receiver.recv() => match next {
                            Some(value) => pending = Some(value),
                            None => break,
                        },
                        () = tokio::time::sleep(delay) => {
                            if let Some(value) = pending.take() {
                                action(value);
                            }
                        },
                    }
                } else {
                    match receiver.recv().await {
                        Some(value) => pending = Some(value),
                        None => break,
                    }
                }
            }
            if let Some(value) = pending.take() {
                action(value);
            }
        });

        Self { sender, task }
    }

    /// Queue `value`, replacing any value still waiting out the delay
    pub fn submit(&self, value: T) {
        if self.sender.send(value).is_err() {
            tracing::warn!("Debounce task is no longer running; value dropped");
        }
    }

    /// Apply any pending value now and wait for the task to finish
    pub async fn flush(self) {
        let Self { sender, task } = self;
        drop(sender);
        if let Err(e) = task.await {
            tracing::warn!("Debounce task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&applied);
        (applied, move |value| sink.lock().unwrap().push(value))
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_value_wins_after_quiet_period() {
        let (applied, action) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(2000), action);

        debouncer.submit(1);
        debouncer.submit(2);
        debouncer.submit(3);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(*applied.lock().unwrap(), vec![3]);
        debouncer.flush().await;
        assert_eq!(*applied.lock().unwrap(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_restarts_delay() {
        let (applied, action) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(2000), action);

        debouncer.submit(1);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        debouncer.submit(2);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(applied.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(*applied.lock().unwrap(), vec![2]);
        debouncer.flush().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_applies_pending_value() {
        let (applied, action) = recorder();
        let debouncer = Debouncer::new(Duration::from_secs(60), action);

        debouncer.submit(7);
        debouncer.flush().await;
        assert_eq!(*applied.lock().unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_flush_without_values_applies_nothing() {
        let (applied, action) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(10), action);
        debouncer.flush().await;
        assert!(applied.lock().unwrap().is_empty());
    }
}
