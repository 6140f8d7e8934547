/// Best-effort SMS notification of a selected record.
///
/// Submodules:
/// - `twilio` - `MessageSender` backed by the Twilio Messages REST API.
///
/// Each recipient gets its own attempt and its own result. A failure for one
/// recipient is logged and recorded in the `DispatchReport`; it never stops
/// the remaining recipients and never fails the run.

pub mod twilio;

use std::sync::mpsc;
use std::sync::Arc;

use threadpool::ThreadPool;
use tracing::{info, warn};

use crate::error::NotificationError;
use crate::model::Record;

/// Delivers one message body to one address.
pub trait MessageSender: Send + Sync {
    /// Returns the provider's message id on success.
    fn send(&self, to: &str, body: &str) -> Result<String, NotificationError>;
}

/// Renders the fixed message template for a selected record.
///
/// ```text
/// Cook County, Illinois
/// 2024-01-09 - 5.4% - substantial
/// ```
pub fn format_message(record: &Record) -> String {
    format!(
        "{}, {}\n{} - {}% - {}\n",
        record.county_name,
        record.state,
        record.date,
        record.percent_positive,
        record
            .community_transmission_level
            .as_deref()
            .filter(|level| !level.is_empty())
            .unwrap_or("unknown"),
    )
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Outcome for a single recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipient: String,
    pub result: Result<String, NotificationError>,
}

/// Per-recipient results, in recipient order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatchReport {
    pub deliveries: Vec<Delivery>,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.deliveries.iter().filter(|d| d.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.deliveries.len() - self.delivered()
    }
}

/// Sends the formatted record to every configured recipient.
pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    recipients: Vec<String>,
    workers: usize,
}

impl Notifier {
    /// Sequential notifier (one recipient at a time).
    pub fn new(sender: Arc<dyn MessageSender>, recipients: Vec<String>) -> Self {
        Self::with_workers(sender, recipients, 1)
    }

    /// With `workers > 1` recipients are dispatched on a thread pool of that
    /// size. Results are still reported per recipient and in order.
    pub fn with_workers(sender: Arc<dyn MessageSender>, recipients: Vec<String>, workers: usize) -> Self {
        Self {
            sender,
            recipients,
            workers: workers.max(1),
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Attempts delivery to every recipient and reports each outcome.
    pub fn dispatch(&self, record: &Record) -> DispatchReport {
        let body = format_message(record);

        let results = if self.workers > 1 && self.recipients.len() > 1 {
            self.dispatch_pooled(&body)
        } else {
            self.recipients
                .iter()
                .map(|to| self.sender.send(to, &body))
                .collect()
        };

        let deliveries: Vec<Delivery> = self
            .recipients
            .iter()
            .cloned()
            .zip(results)
            .map(|(recipient, result)| Delivery { recipient, result })
            .collect();

        for delivery in &deliveries {
            match &delivery.result {
                Ok(sid) => info!(recipient = %delivery.recipient, %sid, "message sent"),
                Err(e) => warn!(recipient = %delivery.recipient, error = %e, "message failed"),
            }
        }

        DispatchReport { deliveries }
    }

    fn dispatch_pooled(&self, body: &str) -> Vec<Result<String, NotificationError>> {
        let pool = ThreadPool::new(self.workers.min(self.recipients.len()));
        let (tx, rx) = mpsc::channel();

        for (idx, to) in self.recipients.iter().enumerate() {
            let tx = tx.clone();
            let sender = Arc::clone(&self.sender);
            let to = to.clone();
            let body = body.to_string();
            pool.execute(move || {
                let result = sender.send(&to, &body);
                // Receiver outlives the pool; a send error cannot occur.
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        let mut results: Vec<Option<Result<String, NotificationError>>> =
            (0..self.recipients.len()).map(|_| None).collect();
        for (idx, result) in rx {
            results[idx] = Some(result);
        }

        // A worker that panicked never reports back.
        results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(NotificationError::Transport("dispatch worker panicked".to_string()))
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
