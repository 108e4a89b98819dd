//! Print notifications
//!
//! An explicitly constructed event bus replacing any global notification
//! state. Whoever builds the executor owns the bus; UI layers subscribe.
//! After `close()` publishing is a no-op and subscribers see the channel end.

use std::sync::Arc;

use kasse_printer::DeliveryOutcome;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use super::types::{ContentType, SectionId};

/// Default channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Outcome of one section's print, as shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintNotice {
    /// Empty for test pages
    pub order_id: String,
    pub section: SectionId,
    pub printer_id: String,
    pub content_type: ContentType,
    pub level: NoticeLevel,
    /// "printed", "sent, not confirmed" or "failed: reason"
    pub message: String,
}

impl PrintNotice {
    pub fn from_outcome(
        order_id: &str,
        section: &str,
        printer_id: &str,
        content_type: ContentType,
        outcome: &DeliveryOutcome,
    ) -> Self {
        let level = match outcome {
            DeliveryOutcome::Delivered => NoticeLevel::Info,
            DeliveryOutcome::Unconfirmed => NoticeLevel::Warning,
            DeliveryOutcome::Failed(_) => NoticeLevel::Error,
        };
        Self {
            order_id: order_id.to_string(),
            section: section.to_string(),
            printer_id: printer_id.to_string(),
            content_type,
            level,
            message: outcome.describe(),
        }
    }
}

/// Broadcast bus for print notices
#[derive(Debug, Clone)]
pub struct PrintEvents {
    sender: Arc<Mutex<Option<broadcast::Sender<PrintNotice>>>>,
}

impl PrintEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Subscribe to notices; `None` once the bus is closed
    pub fn subscribe(&self) -> Option<broadcast::Receiver<PrintNotice>> {
        self.sender.lock().as_ref().map(|tx| tx.subscribe())
    }

    /// Publish a notice, returns the number of receivers reached
    pub fn publish(&self, notice: PrintNotice) -> usize {
        match self.sender.lock().as_ref() {
            // Err only means nobody is listening
            Some(tx) => tx.send(notice).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop the sender; receivers drain what is buffered and then end
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            tracing::debug!("Print event bus closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl Default for PrintEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasse_printer::TransportFailure;
    use tokio::sync::broadcast::error::RecvError;

    fn notice(outcome: &DeliveryOutcome) -> PrintNotice {
        PrintNotice::from_outcome("o1", "bar", "p1", ContentType::KitchenTicket, outcome)
    }

    #[test]
    fn test_notice_levels() {
        assert_eq!(notice(&DeliveryOutcome::Delivered).level, NoticeLevel::Info);
        assert_eq!(notice(&DeliveryOutcome::Delivered).message, "printed");

        let n = notice(&DeliveryOutcome::Unconfirmed);
        assert_eq!(n.level, NoticeLevel::Warning);
        assert_eq!(n.message, "sent, not confirmed");

        let n = notice(&DeliveryOutcome::Failed(TransportFailure::Timeout(500)));
        assert_eq!(n.level, NoticeLevel::Error);
        assert!(n.message.starts_with("failed: "));
    }

    #[tokio::test]
    async fn test_publish_and_close() {
        let events = PrintEvents::new(8);
        let mut rx = events.subscribe().unwrap();

        assert_eq!(events.publish(notice(&DeliveryOutcome::Delivered)), 1);
        events.close();
        assert!(events.is_closed());
        assert!(events.subscribe().is_none());
        assert_eq!(events.publish(notice(&DeliveryOutcome::Delivered)), 0);

        assert_eq!(rx.recv().await.unwrap().message, "printed");
        assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let events = PrintEvents::default();
        assert_eq!(events.publish(notice(&DeliveryOutcome::Unconfirmed)), 0);
    }

    #[tokio::test]
    async fn test_clones_share_bus() {
        let events = PrintEvents::new(4);
        let mut rx = events.subscribe().unwrap();
        let other = events.clone();
        other.publish(notice(&DeliveryOutcome::Unconfirmed));
        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Warning);

        other.close();
        assert!(events.is_closed());
    }
}
