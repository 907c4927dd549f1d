use {
    crate::{error::SinkError, level::LogLevel, sink::FileSink},
    chrono::{
        format::{Item, StrftimeItems},
        DateTime, FixedOffset, Local, Utc,
    },
    serde::{Deserialize, Serialize},
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
};

/// Default rotation threshold: 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// Default number of numbered backups kept next to the live file.
pub const DEFAULT_MAX_RETAINED_FILES: u32 = 5;
/// Default chrono format for line timestamps, e.g. `2025-04-01 19:55:02.117 +08:00`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";
/// Default cadence of the background flush in buffered mode.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 3000;
/// Default queue length at which a producer wakes the background flush early.
pub const DEFAULT_BUFFER_LINES: usize = 100;

/// Size threshold after which the live log file is rotated.
///
/// * `Bytes` - Direct byte count (e.g., 1048576 bytes)
/// * `KB` - Kilobytes (1 KB = 1024 bytes)
/// * `MB` - Megabytes (1 MB = 1024 KB)
/// * `GB` - Gigabytes (1 GB = 1024 MB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationSize {
    /// Raw byte count
    Bytes(u64),
    /// Kilobytes (1 KB = 1024 bytes)
    KB(u64),
    /// Megabytes (1 MB = 1024 KB = 1,048,576 bytes)
    MB(u64),
    /// Gigabytes (1 GB = 1024 MB = 1,073,741,824 bytes)
    GB(u64),
}

impl RotationSize {
    /// The threshold in bytes.
    pub fn bytes(&self) -> u64 {
        match self {
            RotationSize::Bytes(b) => *b,
            RotationSize::KB(kb) => kb.saturating_mul(1024),
            RotationSize::MB(mb) => mb.saturating_mul(1024 * 1024),
            RotationSize::GB(gb) => gb.saturating_mul(1024 * 1024 * 1024),
        }
    }
}

/// Time zone used when stamping log lines.
///
/// `Local` follows the system zone at the moment each line is formatted, so
/// daylight-saving changes show up in the offset. `UTC` and `Fix` never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZone {
    /// Stamp lines in UTC. Best for distributed deployments.
    UTC,
    /// Stamp lines in the system's local time zone.
    #[default]
    Local,
    /// Stamp lines with a fixed offset regardless of where the process runs.
    Fix(FixedOffset),
}

impl TimeZone {
    /// The current time in this zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            TimeZone::UTC => Utc::now().fixed_offset(),
            TimeZone::Local => Local::now().fixed_offset(),
            TimeZone::Fix(offset) => Utc::now().with_timezone(offset),
        }
    }
}

/// How formatted lines reach the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushMode {
    /// Every emit formats, writes and rolls inline before returning.
    /// Strongest durability; producers serialize on file I/O.
    Synchronous,
    /// Emits only enqueue; a background thread drains the queue on an
    /// interval, or earlier once the queue reaches the buffer watermark.
    #[default]
    Buffered,
}

/// Configuration of a file sink.
///
/// This is the surface a host configuration system binds to; every field
/// has a default so partial documents deserialize:
///
/// ```
/// let options: logspool::FileSinkOptions = toml::from_str(
///     r#"
///     path = "logs/service.log"
///     min_level = "Warning"
///     max_retained_files = 3
///     "#,
/// )
/// .unwrap();
/// assert_eq!(options.max_file_size, logspool::DEFAULT_MAX_FILE_SIZE);
/// ```
///
/// Options are read-only once a sink has been built from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSinkOptions {
    /// Path of the live log file. Backups are written next to it as
    /// `<path>.1` (newest) to `<path>.<max_retained_files>` (oldest).
    pub path: PathBuf,
    /// Rotate once the live file grows beyond this many bytes.
    pub max_file_size: u64,
    /// Number of numbered backups to keep. With `0`, content beyond the
    /// threshold is discarded: the live file is rotated to `<path>.1` and
    /// that backup is deleted straight away.
    pub max_retained_files: u32,
    /// Events below this level are dropped.
    pub min_level: LogLevel,
    /// Prefix every line with a timestamp.
    pub include_timestamp: bool,
    /// chrono strftime format used for the timestamp.
    pub timestamp_format: String,
    /// Zone used for the timestamp. Not part of the serialized surface.
    #[serde(skip)]
    pub time_zone: TimeZone,
    /// Write inline on the emitting thread, or queue for the background flush.
    pub mode: FlushMode,
    /// Background flush cadence in buffered mode.
    pub flush_interval_ms: u64,
    /// Queue length that wakes the background flush before the interval elapses.
    pub buffer_lines: usize,
}

impl Default for FileSinkOptions {
    fn default() -> Self {
        FileSinkOptions {
            path: PathBuf::from("logs/app.log"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_retained_files: DEFAULT_MAX_RETAINED_FILES,
            min_level: LogLevel::Information,
            include_timestamp: true,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            time_zone: TimeZone::Local,
            mode: FlushMode::Buffered,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

impl FileSinkOptions {
    /// Check the options before any file is touched.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.path.as_os_str().is_empty() {
            return Err(SinkError::InvalidPath(self.path.clone(), "path is empty".to_string()));
        }
        if self.path.file_name().is_none() {
            return Err(SinkError::InvalidPath(
                self.path.clone(),
                "path does not name a file".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(SinkError::InvalidMaxFileSize);
        }
        if self.mode == FlushMode::Buffered && self.flush_interval_ms == 0 {
            return Err(SinkError::InvalidFlushInterval);
        }
        if self.buffer_lines == 0 {
            return Err(SinkError::InvalidBufferLines);
        }
        if self.include_timestamp && StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(SinkError::InvalidTimestampFormat(self.timestamp_format.clone()));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Directory holding the live file and its backups.
    pub fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Provides a fluent interface for configuring a [`FileSink`].
///
/// Defaults match [`FileSinkOptions::default`]:
/// * Rotate at 5 MiB, keep 5 backups
/// * Minimum level `Information`
/// * Timestamped lines in the local time zone
/// * Buffered mode, flushed every 3 seconds or every 100 queued lines
///
/// # Examples
///
/// ```rust
/// use logspool::{FileSinkBuilder, FlushMode, LogLevel, RotationSize};
///
/// let dir = tempfile::tempdir().unwrap();
/// let sink = FileSinkBuilder::new(dir.path().join("app.log"))
///     .max_file_size(RotationSize::MB(10))
///     .max_retained_files(3)
///     .min_level(LogLevel::Debug)
///     .mode(FlushMode::Synchronous)
///     .build()
///     .unwrap();
///
/// sink.create_logger("billing").information("invoice sent");
/// sink.dispose();
/// ```
#[derive(Debug, Clone)]
pub struct FileSinkBuilder {
    options: FileSinkOptions,
}

impl FileSinkBuilder {
    /// Start from the default options, writing to `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSinkBuilder {
            options: FileSinkOptions {
                path: path.as_ref().to_path_buf(),
                ..FileSinkOptions::default()
            },
        }
    }

    /// Start from options obtained elsewhere, e.g. a configuration file.
    pub fn from_options(options: FileSinkOptions) -> Self {
        FileSinkBuilder { options }
    }

    /// Set the size after which the live file is rotated.
    pub fn max_file_size(self, size: RotationSize) -> Self {
        Self {
            options: FileSinkOptions {
                max_file_size: size.bytes(),
                ..self.options
            },
        }
    }

    /// Set the number of numbered backups to keep.
    pub fn max_retained_files(self, max_retained_files: u32) -> Self {
        Self {
            options: FileSinkOptions {
                max_retained_files,
                ..self.options
            },
        }
    }

    /// Set the minimum level written to the file.
    pub fn min_level(self, min_level: LogLevel) -> Self {
        Self {
            options: FileSinkOptions {
                min_level,
                ..self.options
            },
        }
    }

    /// Enable or disable the timestamp prefix.
    pub fn timestamp(self, include_timestamp: bool) -> Self {
        Self {
            options: FileSinkOptions {
                include_timestamp,
                ..self.options
            },
        }
    }

    /// Set the chrono strftime format of the timestamp prefix.
    pub fn timestamp_format(self, timestamp_format: impl Into<String>) -> Self {
        Self {
            options: FileSinkOptions {
                timestamp_format: timestamp_format.into(),
                ..self.options
            },
        }
    }

    /// Set the time zone of the timestamp prefix.
    pub fn time_zone(self, time_zone: TimeZone) -> Self {
        Self {
            options: FileSinkOptions {
                time_zone,
                ..self.options
            },
        }
    }

    /// Choose between synchronous and buffered writing.
    pub fn mode(self, mode: FlushMode) -> Self {
        Self {
            options: FileSinkOptions { mode, ..self.options },
        }
    }

    /// Set the background flush cadence used in buffered mode.
    pub fn flush_interval(self, interval: Duration) -> Self {
        Self {
            options: FileSinkOptions {
                flush_interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                ..self.options
            },
        }
    }

    /// Set the queue length that wakes the background flush early.
    pub fn buffer_lines(self, buffer_lines: usize) -> Self {
        Self {
            options: FileSinkOptions {
                buffer_lines,
                ..self.options
            },
        }
    }

    /// The options collected so far.
    pub fn options(&self) -> &FileSinkOptions {
        &self.options
    }

    /// Validate the options and start the sink.
    pub fn build(self) -> Result<FileSink, SinkError> {
        FileSink::from_options(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_size_units() {
        assert_eq!(RotationSize::Bytes(10).bytes(), 10);
        assert_eq!(RotationSize::KB(2).bytes(), 2048);
        assert_eq!(RotationSize::MB(5).bytes(), DEFAULT_MAX_FILE_SIZE);
        assert_eq!(RotationSize::GB(1).bytes(), 1 << 30);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(FileSinkOptions::default().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_options() {
        let cases = [
            FileSinkOptions {
                path: PathBuf::new(),
                ..FileSinkOptions::default()
            },
            FileSinkOptions {
                path: PathBuf::from("/"),
                ..FileSinkOptions::default()
            },
            FileSinkOptions {
                max_file_size: 0,
                ..FileSinkOptions::default()
            },
            FileSinkOptions {
                flush_interval_ms: 0,
                ..FileSinkOptions::default()
            },
            FileSinkOptions {
                buffer_lines: 0,
                ..FileSinkOptions::default()
            },
            FileSinkOptions {
                timestamp_format: "%Q".to_string(),
                ..FileSinkOptions::default()
            },
        ];
        for options in cases {
            let err = options.validate().unwrap_err();
            assert!(err.is_configuration(), "{err} should be a configuration error");
        }
    }

    #[test]
    fn zero_interval_is_fine_when_synchronous() {
        let options = FileSinkOptions {
            mode: FlushMode::Synchronous,
            flush_interval_ms: 0,
            ..FileSinkOptions::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn deserializes_partial_toml() {
        let options: FileSinkOptions = toml::from_str(
            r#"
            path = "var/log/app.log"
            min_level = "warn"
            max_file_size = 1000
            max_retained_files = 0
            include_timestamp = false
            mode = "synchronous"
            "#,
        )
        .unwrap();
        assert_eq!(options.path, PathBuf::from("var/log/app.log"));
        assert_eq!(options.min_level, LogLevel::Warning);
        assert_eq!(options.max_file_size, 1000);
        assert_eq!(options.max_retained_files, 0);
        assert!(!options.include_timestamp);
        assert_eq!(options.mode, FlushMode::Synchronous);
        assert_eq!(options.flush_interval_ms, DEFAULT_FLUSH_INTERVAL_MS);
        assert_eq!(options.directory(), Path::new("var/log"));
    }

    #[test]
    fn negative_retention_does_not_deserialize() {
        assert!(toml::from_str::<FileSinkOptions>("max_retained_files = -1").is_err());
    }

    #[test]
    fn builder_overrides_defaults() {
        let builder = FileSinkBuilder::new("x.log")
            .max_file_size(RotationSize::KB(1))
            .max_retained_files(2)
            .timestamp(false)
            .flush_interval(Duration::from_millis(250))
            .buffer_lines(8);
        let options = builder.options();
        assert_eq!(options.max_file_size, 1024);
        assert_eq!(options.max_retained_files, 2);
        assert!(!options.include_timestamp);
        assert_eq!(options.flush_interval(), Duration::from_millis(250));
        assert_eq!(options.buffer_lines, 8);
        assert_eq!(options.directory(), Path::new("."));
    }
}
