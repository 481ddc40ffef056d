//! Frame sampling contracts.
//!
//! The converter never decodes video itself — it talks to a [`FrameSampler`]
//! that, given a timestamp, returns a decoded raster image or nothing.
//! [`MediaOpener`] is the factory side of the contract: the converter opens
//! one sampler per job and drops it when the job ends, regardless of
//! outcome.
//!
//! The crate ships a production implementation backed by FFmpeg behind the
//! `ffmpeg` feature (see [`crate::ffmpeg`]); tests and embedders can supply
//! anything else that satisfies the trait.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use gifwrap::{FrameSampler, GifWrapError, MediaOpener};
//! use image::DynamicImage;
//!
//! struct SingleColorSampler;
//!
//! impl FrameSampler for SingleColorSampler {
//!     fn duration(&self) -> Duration {
//!         Duration::from_secs(2)
//!     }
//!
//!     fn dimensions(&self) -> (u32, u32) {
//!         (640, 360)
//!     }
//!
//!     async fn sample_at(&mut self, _timestamp: Duration) -> Option<DynamicImage> {
//!         Some(DynamicImage::new_rgb8(640, 360))
//!     }
//! }
//!
//! struct SingleColorOpener;
//!
//! impl MediaOpener for SingleColorOpener {
//!     type Sampler = SingleColorSampler;
//!
//!     fn open(&self, _source: &Path) -> Result<Self::Sampler, GifWrapError> {
//!         Ok(SingleColorSampler)
//!     }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use image::DynamicImage;

use crate::error::GifWrapError;

/// An opened media source that can decode frames at requested timestamps.
///
/// Sampling is best-effort: a failed decode at one timestamp returns `None`
/// and is never an error for the whole clip. The converter requests
/// timestamps in strictly increasing order and awaits each result before
/// asking for the next, so implementations may decode forward through the
/// stream without seeking.
#[allow(async_fn_in_trait)]
pub trait FrameSampler {
    /// Duration of the opened clip.
    fn duration(&self) -> Duration;

    /// Intrinsic pixel dimensions of the clip, as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Decode the frame at `timestamp`.
    ///
    /// Returns `None` when no frame can be decoded at that point; the
    /// converter skips the sample and moves on.
    async fn sample_at(&mut self, timestamp: Duration) -> Option<DynamicImage>;
}

/// Opens a [`FrameSampler`] for a media file on disk.
///
/// The converter holds the opener for its whole lifetime and calls
/// [`open`](MediaOpener::open) once per conversion job. The returned sampler
/// is dropped when the job finishes, which releases whatever decode
/// resources the implementation holds.
pub trait MediaOpener {
    /// The sampler type produced by this opener.
    type Sampler: FrameSampler;

    /// Open `source` for frame sampling.
    ///
    /// # Errors
    ///
    /// Returns [`GifWrapError::MediaOpen`] when the file cannot be opened
    /// or contains no video.
    fn open(&self, source: &Path) -> Result<Self::Sampler, GifWrapError>;
}
