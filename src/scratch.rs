//! Scoped ownership of temporary artifacts.
//!
//! Each conversion job creates intermediate files — the staged unpatched
//! GIF, sometimes the copied-in source clip — that must not outlive the
//! job. [`ScratchSpace`] tracks them and removes whatever is still tracked
//! when it goes out of scope, on every exit path. Removal is best-effort:
//! a file that cannot be deleted is logged and forgotten, never an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Tracks temporary files owned by a single conversion job.
///
/// Files stay tracked until [`release`](ScratchSpace::release)d or removed.
/// Dropping the scratch space removes everything still tracked.
#[derive(Debug, Default)]
pub struct ScratchSpace {
    tracked: Vec<PathBuf>,
}

impl ScratchSpace {
    /// Create an empty scratch space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking `path` for removal.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.tracked.push(path.into());
    }

    /// Stop tracking `path`, keeping the file on disk.
    ///
    /// Used for an artifact that graduated from temporary to durable, such
    /// as the final output once it has been fully written.
    pub fn release(&mut self, path: &Path) {
        self.tracked.retain(|tracked| tracked.as_path() != path);
    }

    /// Remove every tracked file now instead of waiting for drop.
    pub fn cleanup(&mut self) {
        for path in self.tracked.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("Removed temporary file {}", path.display()),
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => {
                    log::warn!("Failed to remove temporary file {}: {error}", path.display());
                }
            }
        }
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
