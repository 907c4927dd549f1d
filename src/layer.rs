//! `tracing` integration.
//!
//! [`FileSinkLayer`] forwards `tracing` events to a [`FileSink`](crate::FileSink):
//! the event target becomes the category, the `message` field the message,
//! and any other fields are appended as ` key=value`. A field recorded as a
//! `dyn Error` (e.g. `error = &err as &dyn std::error::Error`) becomes the
//! event's error chain.

use {
    crate::{
        event::{ErrorInfo, LogEvent},
        level::LogLevel,
        sink::SinkCore,
    },
    std::{error::Error, fmt, fmt::Write as _, sync::Arc},
    tracing::{
        field::{Field, Visit},
        Event, Level, Subscriber,
    },
    tracing_subscriber::{layer::Context, Layer},
};

/// Map a `tracing` level onto the sink's levels.
pub fn level_from_tracing(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warning,
        Level::INFO => LogLevel::Information,
        Level::DEBUG => LogLevel::Debug,
        _ => LogLevel::Trace,
    }
}

/// A [`Layer`] that writes `tracing` events through a file sink.
///
/// Filtering below the sink's minimum level happens inside the layer, so
/// other layers of the same subscriber still see every event.
pub struct FileSinkLayer {
    core: Arc<SinkCore>,
}

impl FileSinkLayer {
    pub(crate) fn new(core: Arc<SinkCore>) -> Self {
        FileSinkLayer { core }
    }
}

impl<S: Subscriber> Layer<S> for FileSinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = level_from_tracing(metadata.level());
        if !self.core.is_enabled(level) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let log_event = LogEvent {
            level,
            category: metadata.target().to_string(),
            message: visitor.finish(),
            error: visitor.error,
        };
        self.core.emit(&log_event);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: String,
    error: Option<ErrorInfo>,
}

impl EventVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        // Fields forwarded from the `log` crate carry call-site metadata only.
        if name.starts_with("log.") {
            return;
        }
        let _ = write!(self.fields, " {name}={value}");
    }

    fn finish(&mut self) -> String {
        let mut message = std::mem::take(&mut self.message);
        if message.is_empty() {
            message.push_str(self.fields.trim_start());
        } else {
            message.push_str(&self.fields);
        }
        message
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if self.error.is_none() {
            self.error = Some(ErrorInfo::from_dyn(value));
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}
