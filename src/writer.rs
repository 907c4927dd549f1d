use {
    crate::{error::SinkError, format::FormattedLine, rotation::RotationPolicy},
    std::{
        collections::HashMap,
        fs,
        io::Write as _,
        path::{Path, PathBuf},
        sync::{Arc, Mutex, OnceLock, PoisonError, Weak},
    },
};

/// Writers currently alive in this process, keyed by canonical path, so that
/// every sink targeting one file goes through one critical section.
static WRITERS: OnceLock<Mutex<HashMap<PathBuf, Weak<AppendWriter>>>> = OnceLock::new();

/// State guarded by the writer's critical section.
struct WriterState {
    /// Open handle to the live file, dropped after a failure or a rotation
    /// and reopened by the next write.
    file: Option<fs::File>,
    /// Size of the live file in bytes.
    size: u64,
}

/// Appends formatted lines to the live log file and rolls it when it grows
/// past the threshold of the line's sink.
pub struct AppendWriter {
    path: PathBuf,
    state: Mutex<WriterState>,
}

impl AppendWriter {
    /// Get the writer for `path`, creating it if no sink in this process
    /// holds one yet.
    ///
    /// Creating a writer creates the log directory and removes stale
    /// backups beyond `policy.max_retained_files`.
    pub fn shared(path: &Path, policy: RotationPolicy) -> Result<Arc<AppendWriter>, SinkError> {
        create_parent_dir(path)?;
        let key = registry_key(path);
        let mut writers = WRITERS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(writer) = writers.get(&key).and_then(Weak::upgrade) {
            return Ok(writer);
        }

        let writer = Arc::new(AppendWriter::open(path, policy)?);
        writers.retain(|_, w| w.strong_count() > 0);
        writers.insert(key, Arc::downgrade(&writer));
        Ok(writer)
    }

    /// Create a writer that is not shared through the process registry.
    pub fn open(path: &Path, policy: RotationPolicy) -> Result<AppendWriter, SinkError> {
        create_parent_dir(path)?;

        if let Err(err) = policy.prune_stale_backups(path) {
            eprintln!("Failed to remove stale log backups of '{}': {}", path.display(), err);
        }

        Ok(AppendWriter {
            path: path.to_path_buf(),
            state: Mutex::new(WriterState {
                file: None,
                size: fs::metadata(path).map_or(0, |m| m.len()),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the live file as tracked by the writer.
    pub fn current_size(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).size
    }

    /// Append `line` and a line terminator, then roll the file if it crossed
    /// the threshold.
    ///
    /// Never fails: a line that cannot be written is reported on stderr and
    /// dropped, and the handle is reopened on the next call. A failed
    /// rotation is reported the same way and retried after the next write.
    pub fn write(&self, line: &FormattedLine) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(err) = state.append(&self.path, line) {
            eprintln!("Failed to write log line to '{}': {}", self.path.display(), err);
            return;
        }

        let policy = RotationPolicy::new(line.options.max_file_size, line.options.max_retained_files);
        let WriterState { file, size } = &mut *state;
        match policy.maybe_roll_with(*size, &self.path, file) {
            Ok(true) => *size = 0,
            Ok(false) => {}
            Err(err) => eprintln!("Failed to roll log file '{}': {}", self.path.display(), err),
        }
    }
}

impl WriterState {
    fn append(&mut self, path: &Path, line: &FormattedLine) -> Result<(), SinkError> {
        // Taken out so that any failure below leaves the handle closed.
        let mut file = match self.file.take() {
            Some(file) => file,
            None => {
                let file = open_log_file(path)?;
                self.size = file.metadata().map_or(0, |m| m.len());
                file
            }
        };

        let mut buf = Vec::with_capacity(line.byte_len());
        buf.extend_from_slice(line.text.as_bytes());
        buf.push(b'\n');

        file.write_all(&buf)?;
        file.flush()?;
        self.size += buf.len() as u64;
        self.file = Some(file);
        Ok(())
    }
}

fn create_parent_dir(path: &Path) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| SinkError::CreateDirectoryFailed(parent.to_path_buf(), err.to_string()))?;
    }
    Ok(())
}

/// Registry key for `path`: the canonical log directory joined with the file
/// name, so `..` segments and symlinked directories name the same writer.
/// Falls back to the absolute path when the directory cannot be resolved.
fn registry_key(path: &Path) -> PathBuf {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (fs::canonicalize(directory), path.file_name()) {
        (Ok(directory), Some(name)) => directory.join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Open the live file for appending, recreating the directory if it was
/// removed since the writer was created.
fn open_log_file(path: &Path) -> Result<fs::File, SinkError> {
    let mut open_options = fs::OpenOptions::new();
    open_options.append(true).create(true);

    let mut open_res = open_options.open(path);
    if open_res.is_err() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
            fs::create_dir_all(parent)
                .map_err(|err| SinkError::CreateDirectoryFailed(parent.to_path_buf(), err.to_string()))?;
            open_res = open_options.open(path);
        }
    }

    open_res.map_err(|err| SinkError::CreateFileFailed(path.to_path_buf(), err.to_string()))
}
