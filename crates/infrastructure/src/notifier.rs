//! Notifier adapters.

use fundgate_application::Notifier;
use fundgate_domain::Severity;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Notifier that writes user-facing messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(notification = %message, "user notification"),
            Severity::Warning => warn!(notification = %message, "user notification"),
            Severity::Error => error!(notification = %message, "user notification"),
        }
    }
}

/// Message delivered through a [`ChannelNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text shown to the user.
    pub message: String,
    /// Presentation severity.
    pub severity: Severity,
}

/// Notifier that forwards messages to a receiver owned by a UI loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver its messages are delivered to.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let notification = Notification {
            message: message.to_owned(),
            severity,
        };
        if self.sender.send(notification).is_err() {
            debug!(notification = %message, "notification receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use fundgate_application::Notifier;
    use fundgate_domain::Severity;

    use super::{ChannelNotifier, Notification};

    #[tokio::test]
    async fn channel_notifier_delivers_in_order() {
        let (notifier, mut receiver) = ChannelNotifier::channel();
        notifier.notify("first", Severity::Warning);
        notifier.notify("second", Severity::Error);

        assert_eq!(
            receiver.recv().await,
            Some(Notification {
                message: "first".to_owned(),
                severity: Severity::Warning,
            })
        );
        assert_eq!(
            receiver.recv().await.map(|notification| notification.message),
            Some("second".to_owned())
        );
    }

    #[test]
    fn closed_receiver_is_ignored() {
        let (notifier, receiver) = ChannelNotifier::channel();
        drop(receiver);
        notifier.notify("nobody listening", Severity::Info);
    }
}
