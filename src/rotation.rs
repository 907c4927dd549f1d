use {
    crate::error::SinkError,
    regex::Regex,
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Path of the numbered backup `index` of `path`, e.g. `app.log.3`.
pub fn backup_path(path: &Path, index: u32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Size-based rotation with a bounded number of numbered backups.
///
/// Backups live next to the live file: `<path>.1` is the most recent and
/// `<path>.<max_retained_files>` the oldest that is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Roll once the live file is larger than this many bytes.
    pub max_file_size: u64,
    /// Number of numbered backups to keep.
    pub max_retained_files: u32,
}

impl RotationPolicy {
    pub fn new(max_file_size: u64, max_retained_files: u32) -> Self {
        RotationPolicy {
            max_file_size,
            max_retained_files,
        }
    }

    /// Whether a live file of `size` bytes has crossed the threshold.
    pub fn should_roll(&self, size: u64) -> bool {
        size > self.max_file_size
    }

    /// Stat the live file and roll it if it has crossed the threshold.
    /// A missing live file is not an error.
    /// # Returns
    /// Whether a rotation happened.
    pub fn maybe_roll(&self, path: &Path) -> Result<bool, SinkError> {
        let size = fs::metadata(path).map_or(0, |m| m.len());
        self.maybe_roll_with(size, path, &mut None)
    }

    /// Roll `path` if a live file of `size` bytes has crossed the threshold.
    ///
    /// `open_handle` is the caller's handle on the live file. It is closed
    /// before any rename and left untouched when no rotation is due.
    /// # Returns
    /// Whether a rotation happened.
    pub fn maybe_roll_with(
        &self,
        size: u64,
        path: &Path,
        open_handle: &mut Option<fs::File>,
    ) -> Result<bool, SinkError> {
        if !self.should_roll(size) {
            return Ok(false);
        }
        // Some platforms refuse to move open files.
        drop(open_handle.take());
        self.roll(path)?;
        Ok(true)
    }

    /// Shift the backups up by one and move the live file to `<path>.1`.
    ///
    /// The oldest retained backup is deleted first, then every existing
    /// backup from the highest index down is renamed to the next index, so a
    /// gap in the numbered sequence is simply skipped. The existing backups
    /// are found with one directory listing, whatever the retention count.
    /// With `max_retained_files == 0` the live file is rotated to `<path>.1`
    /// and that file is removed at once: content beyond the threshold is
    /// discarded instead of accumulating.
    ///
    /// The next append recreates the live file.
    pub fn roll(&self, path: &Path) -> Result<(), SinkError> {
        if !path.exists() {
            return Ok(());
        }

        if self.max_retained_files == 0 {
            let discarded = backup_path(path, 1);
            rename(path, &discarded)?;
            return remove(&discarded);
        }

        let retained = u64::from(self.max_retained_files);
        let mut backups: Vec<(u64, PathBuf)> = numbered_backups(path)?
            .into_iter()
            .filter(|(idx, _)| (1..=retained).contains(idx))
            .collect();
        backups.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        for (idx, source_file) in backups {
            if idx == retained {
                remove(&source_file)?;
            } else {
                rename(&source_file, &backup_path(path, (idx + 1) as u32))?;
            }
        }

        rename(path, &backup_path(path, 1))
    }

    /// Remove numbered backups of `path` whose index exceeds the retention
    /// count, e.g. left over from a run with a larger `max_retained_files`.
    /// # Returns
    /// The number of files removed.
    pub fn prune_stale_backups(&self, path: &Path) -> Result<usize, SinkError> {
        let mut removed = 0;
        for (index, file) in numbered_backups(path)? {
            if index > u64::from(self.max_retained_files) {
                remove(&file)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Every regular file next to `path` named `<file name>.<index>`, in
/// directory order.
fn numbered_backups(path: &Path) -> Result<Vec<(u64, PathBuf)>, SinkError> {
    let Some(filename) = path.file_name().map(|f| f.to_string_lossy().to_string()) else {
        return Ok(Vec::new());
    };
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !directory.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = Regex::new(&format!(r"^{}\.(\d+)$", regex::escape(&filename)))
        .map_err(|err| SinkError::InternalError(err.to_string()))?;

    let mut backups = Vec::new();
    for file in fs::read_dir(directory)?.flatten() {
        let Some(name) = file.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        let Some(index) = pattern
            .captures(&name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
        else {
            continue;
        };
        if file.file_type().is_ok_and(|t| t.is_file()) {
            backups.push((index, file.path()));
        }
    }
    Ok(backups)
}

fn rename(from: &Path, to: &Path) -> Result<(), SinkError> {
    fs::rename(from, to).map_err(|err| SinkError::RenameFileError {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: err.to_string(),
    })
}

fn remove(path: &Path) -> Result<(), SinkError> {
    fs::remove_file(path).map_err(|err| SinkError::RemoveFileError {
        path: path.to_path_buf(),
        error: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        fs::write(path, content).unwrap();
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn backup_path_appends_index() {
        assert_eq!(backup_path(Path::new("logs/app.log"), 3), PathBuf::from("logs/app.log.3"));
    }

    #[test]
    fn threshold_is_exclusive() {
        let policy = RotationPolicy::new(10, 1);
        assert!(!policy.should_roll(10));
        assert!(policy.should_roll(11));
    }

    #[test]
    fn maybe_roll_ignores_small_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new(10, 2);

        assert!(!policy.maybe_roll(&path).unwrap());
        write(&path, "0123456789");
        assert!(!policy.maybe_roll(&path).unwrap());
        assert!(path.exists());

        write(&path, "0123456789a");
        assert!(policy.maybe_roll(&path).unwrap());
        assert!(!path.exists());
        assert_eq!(read(&backup_path(&path, 1)), "0123456789a");
    }

    #[test]
    fn shifts_backups_and_drops_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new(1, 3);

        write(&path, "live");
        write(&backup_path(&path, 1), "one");
        write(&backup_path(&path, 2), "two");
        write(&backup_path(&path, 3), "three");

        policy.roll(&path).unwrap();

        assert!(!path.exists());
        assert_eq!(read(&backup_path(&path, 1)), "live");
        assert_eq!(read(&backup_path(&path, 2)), "one");
        assert_eq!(read(&backup_path(&path, 3)), "two");
        assert!(!backup_path(&path, 4).exists());
    }

    #[test]
    fn tolerates_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let policy = RotationPolicy::new(1, 4);

        write(&path, "live");
        write(&backup_path(&path, 2), "two");

        policy.roll(&path).unwrap();

        assert_eq!(read(&backup_path(&path, 1)), "live");
        assert!(!backup_path(&path, 2).exists());
        assert_eq!(read(&backup_path(&path, 3)), "two");
    }

    #[test]
    fn maybe_roll_with_keeps_handle_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write(&path, "0123456789a");
        let policy = RotationPolicy::new(10, 1);

        let mut handle = Some(fs::File::open(&path).unwrap());
        assert!(!policy.maybe_roll_with(10, &path, &mut handle).unwrap());
        assert!(handle.is_some());

        assert!(policy.maybe_roll_with(11, &path, &mut handle).unwrap());
        assert!(handle.is_none());
        assert_eq!(read(&backup_path(&path, 1)), "0123456789a");
    }

    #[test]
    fn large_retention_rolls_without_probing_every_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write(&path, "live");
        write(&backup_path(&path, 1), "one");

        let started = std::time::Instant::now();
        RotationPolicy::new(1, 5_000_000).roll(&path).unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(read(&backup_path(&path, 1)), "live");
        assert_eq!(read(&backup_path(&path, 2)), "one");
    }

    #[test]
    fn zero_retention_discards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write(&path, "overflow");

        RotationPolicy::new(1, 0).roll(&path).unwrap();

        assert!(!path.exists());
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn prunes_backups_beyond_retention() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        for idx in 1..=6 {
            write(&backup_path(&path, idx), "x");
        }
        write(&dir.path().join("app.log.bak"), "keep");
        write(&dir.path().join("other.log.9"), "keep");

        let removed = RotationPolicy::new(1, 2).prune_stale_backups(&path).unwrap();

        assert_eq!(removed, 4);
        assert!(backup_path(&path, 1).exists());
        assert!(backup_path(&path, 2).exists());
        assert!(!backup_path(&path, 3).exists());
        assert!(dir.path().join("app.log.bak").exists());
        assert!(dir.path().join("other.log.9").exists());
    }
}
