//! Scratch workspace: a directory owned by one run, removed on every exit path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::cleanup::{self, CleanupPolicy, Removal};

/// Exclusively owned scratch directory. Call [`ScratchWorkspace::release`] to
/// remove it and get the outcome; if the owner returns early, `Drop` removes it.
pub struct ScratchWorkspace {
    root: PathBuf,
    policy: CleanupPolicy,
    released: bool,
}

impl ScratchWorkspace {
    /// Creates `root`, first removing anything a previous interrupted run left there.
    pub fn create(root: PathBuf, policy: CleanupPolicy) -> io::Result<Self> {
        if root.exists() {
            tracing::debug!("removing stale scratch folder {}", root.display());
            cleanup::remove_tree(&root, &policy);
        }
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            policy,
            released: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a downloaded archive inside the workspace.
    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Creates a per-item subdirectory.
    pub fn item_dir(&self, name: &str) -> io::Result<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn policy(&self) -> &CleanupPolicy {
        &self.policy
    }

    /// Removes the whole workspace.
    pub fn release(mut self) -> Removal {
        self.released = true;
        cleanup::remove_tree(&self.root, &self.policy)
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if !self.released {
            cleanup::remove_tree(&self.root, &self.policy);
        }
    }
}
