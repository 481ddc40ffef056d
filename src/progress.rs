//! Progress reporting for conversion jobs.
//!
//! This module provides [`ProgressCallback`] for monitoring a conversion as
//! it moves through its stages, and [`ProgressInfo`] for per-update
//! snapshots. There is no cancellation token: a caller cancels a conversion
//! by dropping its future, and any in-flight sampler work drains on its own
//! thread rather than being interrupted mid-decode.
//!
//! # Example
//!
//! ```no_run
//! use gifwrap::{ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage() {
//!             println!("[{:?}] {pct:.1}% complete", info.stage);
//!         }
//!     }
//! }
//! ```

/// The stage a conversion job is currently in.
///
/// Stages always run in declaration order; a job that fails skips the
/// remaining ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineStage {
    /// Pulling decoded frames from the sampler, one timestamp at a time.
    Sampling,
    /// Resizing and recompressing the sampled frames.
    Transforming,
    /// Streaming frames into the GIF container.
    Assembling,
    /// Rewriting the disposal method in the encoded bytes.
    Patching,
    /// Writing the final GIF to its destination.
    Persisting,
}

/// A snapshot of conversion progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The stage the job is in.
    pub stage: PipelineStage,
    /// Items processed so far within the stage.
    pub current: u64,
    /// Total items expected for the stage, if known.
    pub total: Option<u64>,
}

impl ProgressInfo {
    /// Completion percentage (0.0 – 100.0), if the total is known.
    pub fn percentage(&self) -> Option<f32> {
        self.total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32) * 100.0)
    }
}

/// Trait for receiving progress updates during a conversion.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks may be
/// invoked from worker threads. Callbacks observe but cannot halt the
/// conversion.
pub trait ProgressCallback: Send + Sync {
    /// Called at stage transitions and once per frame during sampling.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}
