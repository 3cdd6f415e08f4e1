//! Tracing layer that captures log events for on-screen display.
//!
//! Events go into a [`LogBuffer`] with its own mutex, separate from
//! [`QuizState`](super::QuizState); the frontend drains it once per frame.
//! Logging from the driver therefore never waits on the render thread.

use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::Subscriber;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::registry::LookupSpan;

use super::{LOG_TRIM_TO, LogLevel, LogLine, MAX_LOG_LINES, QuizState};

/// A shared buffer of pending log lines.
#[derive(Clone)]
pub struct LogBuffer(Arc<Mutex<Vec<LogLine>>>);

impl LogBuffer {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::with_capacity(128))))
    }

    /// Take all pending log lines.
    pub fn drain(&self) -> Vec<LogLine> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }

    /// Move pending lines into `QuizState::logs`, trimming old ones.
    ///
    /// Locks the quiz state only when there is something to move.
    pub fn flush_into(&self, state: &Arc<Mutex<QuizState>>) {
        let lines = self.drain();
        if lines.is_empty() {
            return;
        }
        if let Ok(mut s) = state.lock() {
            s.logs.extend(lines);
            trim(&mut s.logs);
        }
    }
}

fn trim(logs: &mut Vec<LogLine>) {
    if logs.len() > MAX_LOG_LINES {
        let excess = logs.len() - LOG_TRIM_TO;
        logs.drain(..excess);
    }
}

/// A [`tracing_subscriber::Layer`] writing events into a [`LogBuffer`].
pub struct UiTracingLayer {
    buffer: LogBuffer,
}

impl UiTracingLayer {
    /// Create the layer and the buffer the frontend should drain.
    pub fn new() -> (Self, LogBuffer) {
        let buffer = LogBuffer::new();
        (
            Self {
                buffer: buffer.clone(),
            },
            buffer,
        )
    }
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for UiTracingLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let level = match *event.metadata().level() {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        };

        let line = LogLine {
            time: Local::now().format("%H:%M:%S").to_string(),
            level,
            message: visitor.into_message(),
        };

        if let Ok(mut buf) = self.buffer.0.lock() {
            buf.push(line);
            trim(&mut buf);
        }
    }
}

/// Collects the message and extra fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl MessageVisitor {
    /// `message {k=v, ...}`, or just the fields when there is no message.
    fn into_message(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        let extras: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if self.message.is_empty() {
            extras.join(" ")
        } else {
            format!("{} {{{}}}", self.message, extras.join(", "))
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let raw = format!("{value:?}");
        if field.name() == "message" {
            self.message = raw
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
                .map(str::to_string)
                .unwrap_or(raw);
        } else {
            self.fields.push((field.name().to_string(), raw));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn captures_message_and_fields() {
        let (layer, buffer) = UiTracingLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(count = 3, "batch request failed");
            tracing::info!("plain");
        });

        let lines = buffer.drain();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, LogLevel::Warn);
        assert_eq!(lines[0].message, "batch request failed {count=3}");
        assert_eq!(lines[1].message, "plain");
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn flush_moves_lines_into_state() {
        let (layer, buffer) = UiTracingLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("boom");
        });

        let state = Arc::new(Mutex::new(QuizState::default()));
        buffer.flush_into(&state);
        let s = state.lock().unwrap();
        assert_eq!(s.logs.len(), 1);
        assert_eq!(s.logs[0].level, LogLevel::Error);
    }

    #[test]
    fn trim_caps_history() {
        let mut logs: Vec<LogLine> = (0..MAX_LOG_LINES + 1)
            .map(|i| LogLine {
                time: String::new(),
                level: LogLevel::Info,
                message: i.to_string(),
            })
            .collect();
        trim(&mut logs);
        assert_eq!(logs.len(), LOG_TRIM_TO);
        assert_eq!(logs.last().unwrap().message, MAX_LOG_LINES.to_string());
    }
}
