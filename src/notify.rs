//! Fire-and-forget notification side channel.
//!
//! Terminal trading events (trades placed, leg failures, fatal conditions)
//! are pushed onto an unbounded channel and delivered by a detached task.
//! Delivery failures are logged and never affect trading decisions.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Delivery backend for human-readable event messages.
pub trait NotificationSink: Send + Sync {
    /// Deliver one message. Best effort; implementations log their own
    /// failures.
    fn deliver(&self, message: &str);
}

/// Sink that writes notifications to the log. The default backend when no
/// external transport (e-mail, chat webhook) is wired in.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, message: &str) {
        info!(target: "notifications", "{message}");
    }
}

/// Sink that records messages in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// All messages delivered so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Cheap cloneable handle for emitting notifications.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<String>,
}

impl Notifier {
    /// Spawn the delivery task for `sink` and return the emitting handle.
    pub fn spawn(sink: Arc<dyn NotificationSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                sink.deliver(&message);
            }
        });
        (Self { tx }, handle)
    }

    /// Emit a notification. Never blocks; a closed channel is logged and
    /// ignored.
    pub fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        if self.tx.send(message).is_err() {
            warn!("notification channel closed; event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn messages_reach_the_sink() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, handle) = Notifier::spawn(sink.clone());

        notifier.notify("first");
        notifier.notify("second");
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(sink.messages(), vec!["first".to_string(), "second".to_string()]);
        handle.abort();
    }

    #[tokio::test]
    async fn notify_after_worker_death_does_not_panic() {
        let sink = Arc::new(RecordingSink::default());
        let (notifier, handle) = Notifier::spawn(sink);
        handle.abort();
        tokio::time::sleep(Duration::from_millis(10)).await;

        notifier.notify("dropped");
    }
}
