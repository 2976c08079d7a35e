//! Per-request scratch directories.
//!
//! A [`Workspace`] is created for exactly one request and removed exactly
//! once: either through [`Workspace::release`] or, on any other exit path
//! (early return, panic, task abort), when it is dropped. Removal errors are
//! logged and never propagated.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ExecError;

const INPUT_FILE: &str = "input.txt";

/// An ephemeral, uniquely named directory holding one request's files.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    root: PathBuf,
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a fresh directory under `temp_root` for request `id`.
    pub fn acquire(temp_root: &Path, id: Uuid) -> Result<Self, ExecError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("arena-{id}-"))
            .tempdir_in(temp_root)
            .map_err(|e| ExecError::io("failed to create workspace", temp_root, e))?;
        let root = dir.path().to_path_buf();

        debug!(request_id = %id, workspace = %root.display(), "Workspace acquired");

        Ok(Self {
            id,
            root,
            dir: Some(dir),
        })
    }

    /// Workspace root; every process spawned for the request runs here.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write `contents` to `name` inside the workspace.
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf, ExecError> {
        let path = self.file(name);
        fs::write(&path, contents)
            .map_err(|e| ExecError::io("failed to write workspace file", &path, e))?;
        Ok(path)
    }

    /// Store the request's stdin, if any.
    ///
    /// Absent and empty input both mean "no stdin"; the caller then wires
    /// the null device instead of a file.
    pub fn write_stdin(&self, input: Option<&str>) -> Result<Option<PathBuf>, ExecError> {
        match input {
            Some(text) if !text.is_empty() => self.write_file(INPUT_FILE, text).map(Some),
            _ => Ok(None),
        }
    }

    /// Remove the workspace and everything in it.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(
                request_id = %self.id,
                workspace = %self.root.display(),
                "Workspace released"
            ),
            Err(e) => warn!(
                request_id = %self.id,
                workspace = %self.root.display(),
                error = %e,
                "Failed to remove workspace"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
