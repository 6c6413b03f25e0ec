//! Best-effort removal of downloaded archives and scratch directories.
//!
//! Nothing here returns an error: failures are logged and summarized in a
//! [`Removal`] so the caller's outcome never depends on cleanup.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use crate::config::CleanupConfig;
use crate::retry::{self, RetryPolicy};

/// How a removal attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// Nothing was there.
    Absent,
    Removed,
    /// Ordinary removal failed; the OS command succeeded.
    RemovedByFallback,
    /// Still present; the message describes the last failure.
    Failed(String),
}

impl Removal {
    pub fn is_gone(&self) -> bool {
        !matches!(self, Removal::Failed(_))
    }
}

/// Directory removal settings.
#[derive(Debug, Clone, Copy)]
pub struct CleanupPolicy {
    pub retry: RetryPolicy,
    pub os_fallback: bool,
}

impl CleanupPolicy {
    pub fn from_config(cfg: &CleanupConfig) -> Self {
        Self {
            retry: cfg.retry.policy(),
            os_fallback: cfg.os_fallback,
        }
    }
}

/// Removes a downloaded archive. A missing file is fine; any other error,
/// typically a handle still open on the file, is logged and tolerated.
pub fn remove_archive(path: &Path) -> Removal {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("archive {} deleted", path.display());
            Removal::Removed
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Removal::Absent,
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::warn!("archive {} still in use, leaving it: {}", path.display(), e);
            Removal::Failed(e.to_string())
        }
        Err(e) => {
            tracing::warn!("could not delete archive {}: {}", path.display(), e);
            Removal::Failed(e.to_string())
        }
    }
}

fn remove_dir_once(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} still exists after removal", path.display()),
        ));
    }
    Ok(())
}

/// Recursively removes `path`, retrying under `policy`, then falling back to the
/// platform's forced-remove command. Idempotent: an absent path is a no-op.
pub fn remove_tree(path: &Path, policy: &CleanupPolicy) -> Removal {
    if !path.exists() {
        return Removal::Absent;
    }

    let err = match retry::run_with_retry(&policy.retry, |_| remove_dir_once(path)) {
        Ok(()) => {
            tracing::info!("temporary folder {} removed", path.display());
            return Removal::Removed;
        }
        Err(e) => e,
    };

    if !policy.os_fallback {
        tracing::error!("could not remove {}: {}", path.display(), err);
        return Removal::Failed(err.to_string());
    }

    match force_remove(path) {
        Ok(()) if !path.exists() => {
            tracing::info!("temporary folder {} removed by OS command", path.display());
            Removal::RemovedByFallback
        }
        Ok(()) => {
            tracing::error!("{} still exists after forced removal", path.display());
            Removal::Failed(format!("{} still exists after forced removal", path.display()))
        }
        Err(e) => {
            tracing::error!("could not remove {}: {}", path.display(), e);
            Removal::Failed(e.to_string())
        }
    }
}

#[cfg(windows)]
fn force_remove_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/c", "rmdir", "/s", "/q"]).arg(path);
    cmd
}

#[cfg(not(windows))]
fn force_remove_command(path: &Path) -> Command {
    let mut cmd = Command::new("rm");
    cmd.arg("-rf").arg("--").arg(path);
    cmd
}

fn force_remove(path: &Path) -> io::Result<()> {
    let status = force_remove_command(path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("forced removal exited with {}", status),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn quick() -> CleanupPolicy {
        CleanupPolicy {
            retry: RetryPolicy {
                max_attempts: 5,
                delay: Duration::ZERO,
            },
            os_fallback: true,
        }
    }

    #[test]
    fn removes_nested_tree_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("censo_superior_2022_temp");
        fs::create_dir_all(root.join("microdados/dados")).unwrap();
        fs::write(root.join("microdados/dados/X.CSV"), b"x").unwrap();

        assert_eq!(remove_tree(&root, &quick()), Removal::Removed);
        assert!(!root.exists());
        assert_eq!(remove_tree(&root, &quick()), Removal::Absent);
    }

    #[test]
    fn archive_removal_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a.zip");
        assert_eq!(remove_archive(&archive), Removal::Absent);
        fs::write(&archive, b"zip").unwrap();
        assert_eq!(remove_archive(&archive), Removal::Removed);
        assert!(!archive.exists());
    }

    #[test]
    fn removal_states() {
        assert!(Removal::Absent.is_gone());
        assert!(Removal::RemovedByFallback.is_gone());
        assert!(!Removal::Failed("busy".into()).is_gone());
    }

    // remove_dir_all always fails on a regular file, so every retry is spent.
    #[cfg(not(windows))]
    #[test]
    fn exhausted_retries_fall_back_to_os_command() {
        let dir = tempfile::tempdir().unwrap();
        let stubborn = dir.path().join("dados_inep_2024_temp");
        fs::write(&stubborn, b"not a directory").unwrap();

        assert_eq!(remove_tree(&stubborn, &quick()), Removal::RemovedByFallback);
        assert!(!stubborn.exists());
    }

    #[test]
    fn exhausted_retries_without_fallback_report_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stubborn = dir.path().join("censo_superior_2022_temp");
        fs::write(&stubborn, b"not a directory").unwrap();
        let policy = CleanupPolicy {
            os_fallback: false,
            ..quick()
        };

        let outcome = remove_tree(&stubborn, &policy);
        assert!(matches!(outcome, Removal::Failed(_)), "got {outcome:?}");
        assert!(!outcome.is_gone());
        assert!(stubborn.exists());
    }

    #[cfg(not(windows))]
    #[test]
    fn fallback_command_targets_path() {
        let cmd = force_remove_command(Path::new("/tmp/x_temp"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(cmd.get_program(), "rm");
        assert_eq!(args, vec!["-rf", "--", "/tmp/x_temp"]);
    }
}
