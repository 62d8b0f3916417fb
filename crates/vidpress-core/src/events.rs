//! Batch lifecycle events.
//!
//! The orchestrator reports its progress through an [`EventSender`], a thin
//! callback wrapper. The CLI installs a renderer callback; tests install a
//! collector. Events are plain data so they can also be serialized for
//! machine consumption.

use serde::Serialize;

/// Notification emitted by the orchestrator while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// A batch of `total` jobs has been accepted.
    BatchStarted { total: usize },
    /// The external engine is being initialized.
    EngineLoading,
    /// Job `index` has begun; progress resets to 0.
    JobStarted { index: usize, name: String },
    /// Progress for the currently running job, as an integer percentage.
    JobProgress { index: usize, percent: u8 },
    /// Job `index` produced `output_bytes` of compressed data.
    JobCompleted { index: usize, output_bytes: u64 },
    /// Every job finished; all results are available.
    BatchCompleted { total: usize },
    /// The batch aborted; jobs after the failing one were never attempted.
    BatchFailed { error: String },
}

/// Sender for reporting batch events from within the orchestrator.
///
/// Wraps a callback so callers decide how events are rendered (status line,
/// log, test collector) without the orchestrator knowing about terminals.
pub struct EventSender {
    callback: Box<dyn Fn(BatchEvent) + Send + Sync>,
}

impl EventSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(BatchEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all events.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_| {}),
        }
    }

    /// Emit an event.
    pub fn send(&self, event: BatchEvent) {
        (self.callback)(event);
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn sender_invokes_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sender = EventSender::new(move |event| {
            seen_clone.lock().unwrap().push(event);
        });

        sender.send(BatchEvent::BatchStarted { total: 2 });
        sender.send(BatchEvent::JobProgress {
            index: 0,
            percent: 50,
        });

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], BatchEvent::BatchStarted { total: 2 });
    }

    #[test]
    fn noop_sender_does_not_panic() {
        EventSender::noop().send(BatchEvent::EngineLoading);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_string(&BatchEvent::JobProgress {
            index: 1,
            percent: 42,
        })
        .unwrap();
        assert!(json.contains(r#""type":"job_progress""#));
        assert!(json.contains(r#""percent":42"#));
    }
}
