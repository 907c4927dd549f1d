use {
    crate::{
        error::SinkError,
        event::{ErrorInfo, LogEvent},
        format::{FormattedLine, LineFormatter},
        level::LogLevel,
        options::{FileSinkBuilder, FileSinkOptions},
        rotation::RotationPolicy,
        scheduler::{FlushScheduler, SinkState},
        writer::AppendWriter,
    },
    std::{
        fmt,
        path::Path,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    },
};

/// State shared by a sink and every logger handle created from it.
pub(crate) struct SinkCore {
    options: Arc<FileSinkOptions>,
    formatter: LineFormatter,
    scheduler: FlushScheduler,
    disposed: AtomicBool,
}

impl SinkCore {
    pub(crate) fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && level >= self.options.min_level
    }

    pub(crate) fn emit(&self, event: &LogEvent) {
        if !self.is_enabled(event.level) {
            return;
        }
        self.scheduler.submit(|| FormattedLine {
            options: Arc::clone(&self.options),
            text: self.formatter.format(event),
        });
    }

    fn flush(&self) {
        self.scheduler.shutdown();
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.flush();
        }
    }
}

/// A file log sink: accepts events from any thread and persists them to a
/// size-rotated file.
///
/// Create per-category handles with [`create_logger`](Self::create_logger).
/// Call [`flush`](Self::flush) (or [`dispose`](Self::dispose), or just drop
/// the sink) before the process exits so buffered lines reach the file.
pub struct FileSink {
    core: Arc<SinkCore>,
}

impl FileSink {
    /// Start configuring a sink writing to `path`.
    pub fn builder<P: AsRef<Path>>(path: P) -> FileSinkBuilder {
        FileSinkBuilder::new(path)
    }

    /// Validate `options`, prepare the log directory and start the flush
    /// scheduler.
    ///
    /// Fails before touching the file system when the options are invalid.
    pub fn from_options(options: FileSinkOptions) -> Result<FileSink, SinkError> {
        options.validate()?;

        let policy = RotationPolicy::new(options.max_file_size, options.max_retained_files);
        let writer = AppendWriter::shared(&options.path, policy)?;
        let scheduler = FlushScheduler::start(writer, &options)?;

        Ok(FileSink {
            core: Arc::new(SinkCore {
                formatter: LineFormatter::new(&options),
                options: Arc::new(options),
                scheduler,
                disposed: AtomicBool::new(false),
            }),
        })
    }

    /// Create a logger handle for `category`. Handles are cheap and share
    /// this sink's queue, file and level filter.
    pub fn create_logger(&self, category: impl Into<String>) -> FileLogger {
        let category: String = category.into();
        FileLogger {
            category: Arc::from(category),
            core: Arc::clone(&self.core),
        }
    }

    /// Whether events at `level` are written.
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.core.is_enabled(level)
    }

    /// Emit a fully built event. Below the minimum level, or after the sink
    /// has stopped, this does nothing.
    pub fn emit(&self, event: &LogEvent) {
        self.core.emit(event);
    }

    /// Write out everything queued and stop the background flush.
    ///
    /// Blocks until the queue is empty and the background thread has
    /// exited. After this the sink is stopped and later emits are dropped.
    /// Calling it again is a no-op.
    pub fn flush(&self) {
        self.core.flush();
    }

    /// Flush once and stop the sink. Later calls do nothing.
    pub fn dispose(&self) {
        self.core.dispose();
    }

    pub fn state(&self) -> SinkState {
        self.core.scheduler.state()
    }

    pub fn options(&self) -> &FileSinkOptions {
        &self.core.options
    }

    pub fn path(&self) -> &Path {
        &self.core.options.path
    }

    /// A `tracing` layer feeding this sink.
    #[cfg(feature = "tracing")]
    pub fn layer(&self) -> crate::layer::FileSinkLayer {
        crate::layer::FileSinkLayer::new(Arc::clone(&self.core))
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.core.dispose();
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.core.options.path)
            .field("state", &self.state())
            .finish()
    }
}

/// Per-category handle onto a [`FileSink`].
///
/// Holds no file handle or thread of its own. Emits after the sink has
/// stopped are silently dropped.
#[derive(Clone)]
pub struct FileLogger {
    category: Arc<str>,
    core: Arc<SinkCore>,
}

impl FileLogger {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.core.is_enabled(level)
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if self.is_enabled(level) {
            self.core.emit(&LogEvent::new(level, &*self.category, message));
        }
    }

    /// Log `message` with an error chain rendered below it.
    pub fn log_error(&self, level: LogLevel, message: impl Into<String>, error: ErrorInfo) {
        if self.is_enabled(level) {
            self.core
                .emit(&LogEvent::new(level, &*self.category, message).with_error(error));
        }
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn information(&self, message: impl Into<String>) {
        self.log(LogLevel::Information, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(LogLevel::Critical, message);
    }
}

impl fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLogger")
            .field("category", &self.category)
            .field("path", &self.core.options.path)
            .finish()
    }
}
