//! Error types for the `gifwrap` crate.
//!
//! This module defines [`GifWrapError`], the unified error type returned by
//! all fallible operations in the crate. Every failure is terminal for the
//! conversion job it occurred in — the crate never retries on its own, and
//! callers that want retry semantics re-run the whole conversion.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `gifwrap` operations.
///
/// Every public method that can fail returns `Result<T, GifWrapError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GifWrapError {
    /// The source clip could not be opened for sampling.
    #[error("Failed to open media file at {path}: {reason}")]
    MediaOpen {
        /// Path that was passed to the converter.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The duration / frame-rate combination yields zero sample points.
    ///
    /// Raised before any frame is requested from the sampler.
    #[error(
        "Frame rate {frame_rate} over {duration_seconds}s of video yields no frames to sample"
    )]
    InvalidFrameCount {
        /// Duration of the source clip in seconds.
        duration_seconds: f64,
        /// Requested sampling rate in frames per second.
        frame_rate: f64,
    },

    /// A disposal method outside the accepted range [0, 6] was requested.
    #[error("Disposal method {0} is out of range (accepted values are 0-6)")]
    InvalidDisposalMethod(u8),

    /// The destination directory could not be created or written to.
    #[error("Destination {path} is unavailable: {reason}")]
    DestinationUnavailable {
        /// The directory that was being prepared.
        path: PathBuf,
        /// Underlying reason the directory is unusable.
        reason: String,
    },

    /// The frame sampler produced zero usable frames.
    ///
    /// Individual decode failures are tolerated and skipped; this error is
    /// only raised when *every* sample point failed.
    #[error("No frames could be decoded from the source clip")]
    DecodeUnavailable,

    /// The GIF stream could not be created or finalized.
    #[error("GIF encoding error: {0}")]
    GifEncodeFailed(String),

    /// The final patched GIF could not be written to disk.
    #[error("Failed to persist GIF to {path}: {reason}")]
    PersistFailed {
        /// The final output path.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// An I/O error occurred while reading or writing intermediate files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame processing.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "ffmpeg")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

#[cfg(feature = "ffmpeg")]
impl From<ffmpeg_next::Error> for GifWrapError {
    fn from(error: ffmpeg_next::Error) -> Self {
        GifWrapError::FfmpegError(error.to_string())
    }
}
