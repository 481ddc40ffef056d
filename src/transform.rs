//! Frame resizing and recompression.
//!
//! The transform stage sits between the sampler and the assembler: every
//! decoded frame is resampled to the fixed output resolution, then pushed
//! through the lossy still-image codec. Per-frame failures drop the frame,
//! mirroring the sampler's best-effort semantics — the pipeline only treats
//! an *empty* result as fatal.

use image::{DynamicImage, imageops::FilterType};

use crate::codec::StillCodec;

/// Output resolution and recompression quality for the transform stage.
///
/// # Example
///
/// ```
/// use gifwrap::TransformOptions;
///
/// let options = TransformOptions::new()
///     .with_dimensions(480, 270)
///     .with_quality(0.3);
/// assert_eq!(options.width, 480);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TransformOptions {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Recompression quality in `[0.0, 1.0]`; 0.0 is the strongest
    /// compression. Values outside the range are clamped.
    pub quality: f32,
}

impl Default for TransformOptions {
    /// 320×180 at maximum compression: small enough for chat embeds and
    /// widgets while keeping 16:9 footage legible.
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            quality: 0.0,
        }
    }
}

impl TransformOptions {
    /// Create transform options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exact output dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the recompression quality in `[0.0, 1.0]`.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality.clamp(0.0, 1.0);
        self
    }
}

/// Resize and recompress a sequence of frames, preserving order.
///
/// Frames that fail recompression are dropped. The result has the same
/// order as the input and at most the same length; callers decide whether
/// an empty result is fatal.
pub fn recompress_frames<C: StillCodec>(
    frames: &[DynamicImage],
    codec: &C,
    options: &TransformOptions,
) -> Vec<DynamicImage> {
    let transformed: Vec<DynamicImage> = frames
        .iter()
        .filter_map(|frame| recompress_frame(frame, codec, options))
        .collect();
    if transformed.len() < frames.len() {
        log::debug!(
            "Dropped {} of {} frames during recompression",
            frames.len() - transformed.len(),
            frames.len(),
        );
    }
    transformed
}

/// Resize and recompress frames across the rayon thread pool.
///
/// Behaves exactly like [`recompress_frames`], including output ordering;
/// only the execution strategy differs.
#[cfg(feature = "rayon")]
pub fn recompress_frames_parallel<C: StillCodec + Sync>(
    frames: &[DynamicImage],
    codec: &C,
    options: &TransformOptions,
) -> Vec<DynamicImage> {
    use rayon::prelude::*;

    let transformed: Vec<DynamicImage> = frames
        .par_iter()
        .filter_map(|frame| recompress_frame(frame, codec, options))
        .collect();
    if transformed.len() < frames.len() {
        log::debug!(
            "Dropped {} of {} frames during parallel recompression",
            frames.len() - transformed.len(),
            frames.len(),
        );
    }
    transformed
}

/// Transform a single frame: Lanczos resample to the target dimensions
/// (alpha survives the resize), then one trip through the lossy codec.
fn recompress_frame<C: StillCodec>(
    frame: &DynamicImage,
    codec: &C,
    options: &TransformOptions,
) -> Option<DynamicImage> {
    let resized = frame.resize_exact(options.width, options.height, FilterType::Lanczos3);
    codec.recompress(&resized, options.quality.clamp(0.0, 1.0))
}
