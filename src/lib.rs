//! # LogSpool
//!
//! LogSpool is a file log sink that accepts log events from any number of
//! threads, turns them into tab-separated text lines and appends them to a
//! file that is rotated by size. **Emits in buffered mode never wait on file
//! I/O**: lines are queued and a background thread spools them to disk on an
//! interval, or as soon as a configurable number of lines is waiting. Lines
//! always reach the file in the order they were emitted, across threads.
//!
//! When the live file grows past `max_file_size` it is renamed to
//! `<path>.1`, older backups shift up by one (`<path>.1` → `<path>.2`, …)
//! and the backup beyond `max_retained_files` is deleted. With a retention
//! of `0` the overflowing content is discarded.
//!
//! ## Example
//!
//! ```rust
//! use logspool::{ErrorInfo, FileSinkBuilder, LogLevel, RotationSize};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = tempfile::tempdir()?;
//!     let sink = FileSinkBuilder::new(dir.path().join("app.log"))
//!         .max_file_size(RotationSize::MB(5))
//!         .max_retained_files(5)
//!         .min_level(LogLevel::Information)
//!         .timestamp(false)
//!         .build()?;
//!
//!     let logger = sink.create_logger("app::startup");
//!     logger.debug("not written: below the minimum level");
//!     logger.information("listening on :8080");
//!
//!     let err = "eighty".parse::<u16>().unwrap_err();
//!     logger.log_error(LogLevel::Error, "bad port", ErrorInfo::from_error(&err));
//!
//!     // Write out everything still queued and stop the background flush.
//!     sink.flush();
//!
//!     let written = std::fs::read_to_string(dir.path().join("app.log"))?;
//!     assert!(written.starts_with("[Information]:\tapp::startup\tlistening on :8080\n"));
//!     assert!(written.contains("Stack trace:\n\tcore::num::error::ParseIntError:\tinvalid digit found in string\n"));
//!     Ok(())
//! }
//! ```
//!
//! With the `tracing` feature (on by default) a sink can also be attached to
//! a `tracing_subscriber` registry through [`FileSink::layer`].

mod error;
mod event;
mod format;
#[cfg(feature = "tracing")]
mod layer;
mod level;
mod options;
mod rotation;
mod scheduler;
mod sink;
mod writer;

#[cfg(feature = "tracing")]
pub use layer::{level_from_tracing, FileSinkLayer};
pub use {
    error::SinkError,
    event::{ErrorInfo, LogEvent, ERASED_ERROR_TYPE},
    format::{FormattedLine, LineFormatter},
    level::{LogLevel, ParseLevelError},
    options::{
        FileSinkBuilder, FileSinkOptions, FlushMode, RotationSize, TimeZone, DEFAULT_BUFFER_LINES,
        DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_RETAINED_FILES, DEFAULT_TIMESTAMP_FORMAT,
    },
    rotation::{backup_path, RotationPolicy},
    scheduler::{FlushScheduler, SinkState},
    sink::{FileLogger, FileSink},
    writer::AppendWriter,
};
