use {
    crate::{
        event::LogEvent,
        options::{FileSinkOptions, TimeZone},
    },
    chrono::{DateTime, FixedOffset},
    std::{fmt::Write as _, sync::Arc},
};

/// A finished log entry waiting to be appended to a file.
///
/// The text has no trailing line terminator; the writer adds it. An entry
/// that carries a stack-trace block spans several physical lines but is
/// always written, and rotated, as a unit.
#[derive(Debug, Clone)]
pub struct FormattedLine {
    /// Options of the sink that produced the line; they name the target file
    /// and the rotation policy to apply after writing.
    pub options: Arc<FileSinkOptions>,
    pub text: String,
}

impl FormattedLine {
    /// Number of bytes this line occupies in the file, terminator included.
    pub fn byte_len(&self) -> usize {
        self.text.len() + 1
    }
}

/// Turns [`LogEvent`]s into log file lines.
///
/// Layout, tab separated. The timestamp is optional; the category field is
/// always present, even when empty:
///
/// ```text
/// [timestamp]\t[LEVEL]:\tcategory\tmessage
/// Stack trace:
/// \t<TypeName>:\t<Message>
/// \t\t<stack text>
/// ```
///
/// The stack-trace block is only present when the event carries an error;
/// one type/message line (and stack line, if any) is written per link of the
/// chain, outermost first.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    include_timestamp: bool,
    timestamp_format: String,
    time_zone: TimeZone,
}

impl LineFormatter {
    pub fn new(options: &FileSinkOptions) -> Self {
        LineFormatter {
            include_timestamp: options.include_timestamp,
            timestamp_format: options.timestamp_format.clone(),
            time_zone: options.time_zone,
        }
    }

    /// Format `event`, stamped with the current time.
    pub fn format(&self, event: &LogEvent) -> String {
        let now = if self.include_timestamp {
            Some(self.time_zone.now())
        } else {
            None
        };
        self.format_at(event, now)
    }

    /// Format `event` with an explicit timestamp. Never fails; a timestamp
    /// that cannot be rendered with the configured format falls back to
    /// RFC 3339.
    pub fn format_at(&self, event: &LogEvent, now: Option<DateTime<FixedOffset>>) -> String {
        let mut line = String::with_capacity(event.message.len() + event.category.len() + 48);

        if let (true, Some(now)) = (self.include_timestamp, now) {
            let start = line.len();
            if write!(line, "{}", now.format(&self.timestamp_format)).is_err() {
                line.truncate(start);
                line.push_str(&now.to_rfc3339());
            }
            line.push('\t');
        }

        line.push('[');
        line.push_str(event.level.as_str());
        line.push_str("]:\t");

        line.push_str(&event.category);
        line.push('\t');

        line.push_str(&event.message);

        if let Some(error) = &event.error {
            line.push_str("\nStack trace:");
            for link in error.chain() {
                line.push_str("\n\t");
                line.push_str(&link.type_name);
                line.push_str(":\t");
                line.push_str(&link.message);
                if let Some(stack) = &link.stack {
                    line.push_str("\n\t\t");
                    line.push_str(stack);
                }
            }
        }

        line
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{event::ErrorInfo, level::LogLevel},
        chrono::TimeZone as _,
    };

    fn formatter(include_timestamp: bool) -> LineFormatter {
        LineFormatter::new(&FileSinkOptions {
            include_timestamp,
            ..FileSinkOptions::default()
        })
    }

    #[test]
    fn plain_line() {
        let event = LogEvent::new(LogLevel::Warning, "app::db", "pool exhausted");
        assert_eq!(formatter(false).format(&event), "[Warning]:\tapp::db\tpool exhausted");
    }

    #[test]
    fn empty_category_keeps_its_field() {
        let event = LogEvent::new(LogLevel::Information, "", "hello");
        assert_eq!(formatter(false).format(&event), "[Information]:\t\thello");
    }

    #[test]
    fn timestamp_uses_configured_format() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = offset.with_ymd_and_hms(2025, 4, 1, 19, 55, 2).unwrap();
        let event = LogEvent::new(LogLevel::Error, "net", "reset");
        assert_eq!(
            formatter(true).format_at(&event, Some(now)),
            "2025-04-01 19:55:02.000 +08:00\t[Error]:\tnet\treset"
        );
    }

    #[test]
    fn unrenderable_timestamp_falls_back() {
        let formatter = LineFormatter {
            include_timestamp: true,
            timestamp_format: "%Q".to_string(),
            time_zone: TimeZone::UTC,
        };
        let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let event = LogEvent::new(LogLevel::Debug, "c", "m");
        assert_eq!(
            formatter.format_at(&event, Some(now)),
            "2025-01-02T03:04:05+00:00\t[Debug]:\tc\tm"
        );
    }

    #[test]
    fn nested_error_chain() {
        let error = ErrorInfo::new("ArgumentError", "bad foo count")
            .with_stack("at compute (foo.rs:12)")
            .with_parent(ErrorInfo::new("DivideByZero", "attempt to divide by zero").with_stack("at div (foo.rs:3)"));
        let event = LogEvent::new(LogLevel::Error, "foo", "An error occurred.").with_error(error);

        assert_eq!(
            formatter(false).format(&event),
            "[Error]:\tfoo\tAn error occurred.\n\
             Stack trace:\n\
             \tArgumentError:\tbad foo count\n\
             \t\tat compute (foo.rs:12)\n\
             \tDivideByZero:\tattempt to divide by zero\n\
             \t\tat div (foo.rs:3)"
        );
    }

    #[test]
    fn error_without_stack_has_no_stack_line() {
        let event = LogEvent::new(LogLevel::Critical, "c", "m").with_error(ErrorInfo::new("E", "x"));
        assert_eq!(formatter(false).format(&event), "[Critical]:\tc\tm\nStack trace:\n\tE:\tx");
    }
}
