//! Temporary changes of the process working directory.
//!
//! The working directory is process-wide state, so every [`ScopedDir`] holds a
//! global lock for its whole lifetime. Only one scope can be active at a time;
//! entering a second scope from the thread that already holds one deadlocks.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use tracing::debug;

use crate::error::VcsResult;

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Guard that restores the previous working directory when dropped.
pub struct ScopedDir {
    previous: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedDir {
    /// Change into `dir` until the returned guard is dropped.
    pub fn enter(dir: &Path) -> VcsResult<Self> {
        // A panic inside another scope still restored its directory on unwind.
        let lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        debug!(from = %previous.display(), to = %dir.display(), "entered directory");
        Ok(Self {
            previous,
            _lock: lock,
        })
    }
}

impl Drop for ScopedDir {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::error!(
                "failed to restore working directory {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}

/// Run `f` with the process working directory set to `dir`.
pub fn in_directory<T>(dir: &Path, f: impl FnOnce() -> T) -> VcsResult<T> {
    let _scope = ScopedDir::enter(dir)?;
    Ok(f())
}
