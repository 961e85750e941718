use std::env;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::Result;

/// Scoped change of the process working directory.
///
/// The previous directory is restored when the guard is dropped, on every exit path.
/// Deck packaging resolves media file names against the working directory, which is the
/// only reason this exists.
#[derive(Debug)]
pub struct WorkingDir {
    previous: PathBuf,
}

impl WorkingDir {
    /// Enter `dir` until the returned guard is dropped.
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(dir)?;
        Ok(Self { previous })
    }

    /// The directory that will be restored.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkingDir {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!(error = %err, dir = %self.previous.display(), "failed to restore working directory");
        }
    }
}

/// Serializes tests that change the process working directory.
#[cfg(test)]
pub(crate) static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_directory_on_drop() -> anyhow::Result<()> {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir()?;
        let before = env::current_dir()?;

        {
            let guard = WorkingDir::enter(dir.path())?;
            assert_eq!(guard.previous(), before.as_path());
            assert_eq!(env::current_dir()?.canonicalize()?, dir.path().canonicalize()?);
        }

        assert_eq!(env::current_dir()?, before);
        Ok(())
    }

    #[test]
    fn restores_directory_on_early_error() -> anyhow::Result<()> {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir()?;
        let before = env::current_dir()?;

        let attempt = || -> Result<()> {
            let _guard = WorkingDir::enter(dir.path())?;
            std::fs::read("does-not-exist.bin")?;
            Ok(())
        };

        assert!(attempt().is_err());
        assert_eq!(env::current_dir()?, before);
        Ok(())
    }

    #[test]
    fn entering_a_missing_directory_leaves_cwd_alone() -> anyhow::Result<()> {
        let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir()?;
        let before = env::current_dir()?;

        assert!(WorkingDir::enter(&dir.path().join("missing")).is_err());
        assert_eq!(env::current_dir()?, before);
        Ok(())
    }
}
