//! Directory removal that tolerates locked files.
//!
//! A dev server watching the component tree, an editor or a virus scanner
//! can hold files open, most visibly on Windows. The default remover retries,
//! then renames the directory aside, then reports failure so the caller can
//! fall back to overwriting files in place.

use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use time::OffsetDateTime;

/// What happened to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Deleted.
    Removed,
    /// Nothing was there.
    Absent,
    /// Could not delete; moved to the given sibling path instead.
    RenamedAside(PathBuf),
    /// Still in place. Callers overwrite its files instead.
    Failed,
}

impl RemovalOutcome {
    /// True when the original path no longer exists.
    pub fn is_cleared(&self) -> bool {
        !matches!(self, RemovalOutcome::Failed)
    }
}

/// Remove a directory tree.
///
/// Lock and permission problems are reported through [`RemovalOutcome`];
/// any other I/O error is returned.
pub trait DirectoryRemover {
    fn remove(&self, path: &Path) -> io::Result<RemovalOutcome>;
}

/// Retry, then rename aside, then give up.
#[derive(Debug, Clone)]
pub struct RetryingRemover {
    max_retries: u32,
    delay: Duration,
    remove_tree: fn(&Path) -> io::Result<()>,
    rename: fn(&Path, &Path) -> io::Result<()>,
}

impl Default for RetryingRemover {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(500),
            remove_tree,
            rename: rename_dir,
        }
    }
}

impl RetryingRemover {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            delay,
            ..Self::default()
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl DirectoryRemover for RetryingRemover {
    fn remove(&self, path: &Path) -> io::Result<RemovalOutcome> {
        if !path.exists() {
            return Ok(RemovalOutcome::Absent);
        }
        for attempt in 1..=self.max_retries {
            match (self.remove_tree)(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "directory removed");
                    return Ok(RemovalOutcome::Removed);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(RemovalOutcome::Absent);
                }
                Err(e) if is_lock_error(&e) => {
                    tracing::debug!(
                        path = %path.display(),
                        attempt,
                        error = %e,
                        "directory locked"
                    );
                    if attempt < self.max_retries {
                        thread::sleep(self.delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let aside = aside_path(path, OffsetDateTime::now_utc().unix_timestamp());
        match (self.rename)(path, &aside) {
            Ok(()) => {
                tracing::warn!(
                    path = %path.display(),
                    renamed_to = %aside.display(),
                    "could not delete directory; renamed it aside"
                );
                Ok(RemovalOutcome::RenamedAside(aside))
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not remove directory; files will be overwritten"
                );
                Ok(RemovalOutcome::Failed)
            }
        }
    }
}

/// `{parent}/{name}_old_{unix_ts}`.
pub fn aside_path(path: &Path, unix_ts: i64) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}_old_{}", name, unix_ts))
}

/// Access denied, or the OS says the file is in use.
pub fn is_lock_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    match err.raw_os_error() {
        // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
        #[cfg(windows)]
        Some(32) | Some(33) => true,
        // EBUSY
        #[cfg(unix)]
        Some(16) => true,
        _ => false,
    }
}

fn remove_tree(path: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            clear_readonly(path);
            std::fs::remove_dir_all(path)
        }
        other => other,
    }
}

fn rename_dir(from: &Path, to: &Path) -> io::Result<()> {
    std::fs::rename(from, to)
}

// Read-only files block deletion on Windows only.
#[cfg(windows)]
fn clear_readonly(path: &Path) {
    let Ok(entries) = std::fs::read_dir(path) else {
        return;
    };
    for entry in entries.flatten() {
        let p = entry.path();
        if p.is_dir() {
            clear_readonly(&p);
        } else if let Ok(meta) = entry.metadata() {
            let mut perms = meta.permissions();
            if perms.readonly() {
                perms.set_readonly(false);
                let _ = std::fs::set_permissions(&p, perms);
            }
        }
    }
}

#[cfg(not(windows))]
fn clear_readonly(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static LOCKED_ATTEMPTS: AtomicU32 = AtomicU32::new(0);

    fn counting_locked(_: &Path) -> io::Result<()> {
        LOCKED_ATTEMPTS.fetch_add(1, Ordering::SeqCst);
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"))
    }

    fn rename_refused(_: &Path, _: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "parent locked"))
    }

    fn always_locked(_: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "in use"))
    }

    fn always_broken(_: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::InvalidData, "disk on fire"))
    }

    fn fast(remove_tree: fn(&Path) -> io::Result<()>) -> RetryingRemover {
        RetryingRemover {
            max_retries: 3,
            delay: Duration::from_millis(1),
            remove_tree,
            ..RetryingRemover::default()
        }
    }

    #[test]
    fn test_defaults() {
        let r = RetryingRemover::default();
        assert_eq!(r.max_retries(), 3);
        assert_eq!(r.delay(), Duration::from_millis(500));
        assert_eq!(RetryingRemover::new(0, Duration::ZERO).max_retries(), 1);
    }

    #[test]
    fn test_removes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("hero-banner");
        std::fs::create_dir_all(target.join("nested")).unwrap();
        std::fs::write(target.join("nested/a.ts"), "x").unwrap();

        let outcome = RetryingRemover::default().remove(&target).unwrap();
        assert_eq!(outcome, RemovalOutcome::Removed);
        assert!(!target.exists());
    }

    #[test]
    fn test_absent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = RetryingRemover::default()
            .remove(&dir.path().join("missing"))
            .unwrap();
        assert_eq!(outcome, RemovalOutcome::Absent);
        assert!(outcome.is_cleared());
    }

    #[test]
    fn test_locked_directory_renamed_aside() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("hero-banner");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("a.html"), "<p></p>").unwrap();

        let outcome = fast(always_locked).remove(&target).unwrap();
        let RemovalOutcome::RenamedAside(aside) = &outcome else {
            panic!("expected rename, got {:?}", outcome);
        };
        assert!(!target.exists());
        assert!(aside.join("a.html").exists());
        let name = aside.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("hero-banner_old_"));
    }

    #[test]
    fn test_retries_three_times_before_renaming() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("hero-banner");
        std::fs::create_dir(&target).unwrap();

        let outcome = fast(counting_locked).remove(&target).unwrap();
        assert_eq!(LOCKED_ATTEMPTS.load(Ordering::SeqCst), 3);
        assert!(matches!(outcome, RemovalOutcome::RenamedAside(_)));
    }

    #[test]
    fn test_failed_rename_leaves_directory_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("hero-banner");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("a.ts"), "x").unwrap();

        let remover = RetryingRemover {
            rename: rename_refused,
            ..fast(always_locked)
        };
        let outcome = remover.remove(&target).unwrap();
        assert_eq!(outcome, RemovalOutcome::Failed);
        assert!(!outcome.is_cleared());
        assert!(target.join("a.ts").exists());
    }

    #[test]
    fn test_absent_directory_never_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let remover = RetryingRemover {
            max_retries: 0,
            rename: rename_refused,
            ..fast(always_locked)
        };
        let outcome = remover.remove(&dir.path().join("missing")).unwrap();
        assert_eq!(outcome, RemovalOutcome::Absent);
    }

    #[test]
    fn test_other_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let err = fast(always_broken).remove(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_aside_path() {
        assert_eq!(
            aside_path(Path::new("/app/components/hero-banner"), 1_700_000_000),
            PathBuf::from("/app/components/hero-banner_old_1700000000")
        );
    }

    #[test]
    fn test_lock_error_classification() {
        assert!(is_lock_error(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!is_lock_error(&io::Error::from(io::ErrorKind::NotFound)));
        #[cfg(unix)]
        assert!(is_lock_error(&io::Error::from_raw_os_error(16)));
    }
}
