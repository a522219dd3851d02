//! Log capture for asserting on what the cache reports.
//!
//! ```rust,ignore
//! let (subscriber, logs) = capture_logs();
//! let _guard = tracing::subscriber::set_default(subscriber);
//! cache.refresh(&["zosmf"]).await;
//! assert_eq!(logs.count_at(Level::ERROR), 1);
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// A single captured event
#[derive(Debug, Clone)]
pub struct CapturedLog {
    /// Event level
    pub level: Level,
    /// Rendered message
    pub message: String,
    /// Module path that emitted the event
    pub target: String,
    /// Other recorded fields
    pub fields: HashMap<String, String>,
}

/// Shared store of captured events
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
}

impl LogCapture {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, log: CapturedLog) {
        self.logs.lock().push(log);
    }

    /// All captured events
    pub fn logs(&self) -> Vec<CapturedLog> {
        self.logs.lock().clone()
    }

    /// Events at exactly `level`
    pub fn at(&self, level: Level) -> Vec<CapturedLog> {
        self.logs
            .lock()
            .iter()
            .filter(|log| log.level == level)
            .cloned()
            .collect()
    }

    /// Number of events at exactly `level`
    pub fn count_at(&self, level: Level) -> usize {
        self.logs.lock().iter().filter(|log| log.level == level).count()
    }

    /// Whether any event message contains `substring`
    pub fn contains(&self, substring: &str) -> bool {
        self.logs.lock().iter().any(|log| log.message.contains(substring))
    }

    /// Forget everything captured so far
    pub fn clear(&self) {
        self.logs.lock().clear();
    }
}

/// Layer recording every event into a [`LogCapture`]
pub struct LogCaptureLayer {
    capture: LogCapture,
}

impl LogCaptureLayer {
    /// Record into `capture`
    pub fn new(capture: LogCapture) -> Self {
        Self { capture }
    }
}

impl<S: Subscriber> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.capture.push(CapturedLog {
            level: *event.metadata().level(),
            message: visitor.message,
            target: event.metadata().target().to_string(),
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.insert(field.name().to_string(), rendered);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }
}

/// A subscriber capturing every event, for use with
/// [`tracing::subscriber::set_default`].
pub fn capture_logs() -> (impl Subscriber + Send + Sync, LogCapture) {
    let capture = LogCapture::new();
    let subscriber = tracing_subscriber::registry().with(LogCaptureLayer::new(capture.clone()));
    (subscriber, capture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_level_and_message() {
        let (subscriber, logs) = capture_logs();
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(profile = "lpar1", "refresh failed: {}", "boom");
            tracing::debug!("noise");
        });

        assert_eq!(logs.count_at(Level::ERROR), 1);
        let error = &logs.at(Level::ERROR)[0];
        assert_eq!(error.message, "refresh failed: boom");
        assert_eq!(error.fields.get("profile").map(String::as_str), Some("lpar1"));
        assert!(logs.contains("noise"));

        logs.clear();
        assert!(logs.logs().is_empty());
    }
}
