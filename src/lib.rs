//! # gifwrap
//!
//! Convert short video clips (MOV/MP4) into optimized animated GIFs.
//!
//! `gifwrap` samples a clip at a fixed frame rate, shrinks and recompresses
//! every frame through a lossy intermediate codec, assembles the result
//! into a GIF89a stream, and then patches the encoded bytes so the first
//! frame carries the disposal method the caller asked for. The two-pass
//! compression (lossy still-image round trip before palette quantization)
//! is what keeps an 11-second 1080p screen recording around a few
//! megabytes.
//!
//! ## Quick Start
//!
//! With the `ffmpeg` feature enabled, conversion is two lines:
//!
//! ```no_run
//! # #[cfg(feature = "ffmpeg")]
//! # async fn example() -> Result<(), gifwrap::GifWrapError> {
//! use std::path::Path;
//!
//! use gifwrap::GifConverter;
//! use gifwrap::ffmpeg::FfmpegOpener;
//!
//! let converter = GifConverter::new(FfmpegOpener::new());
//! let report = converter
//!     .convert(Path::new("screen-recording.mov"), Path::new("gifs"))
//!     .await?;
//! println!("Wrote {}", report.output_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! Without it, supply your own [`MediaOpener`] / [`FrameSampler`] pair —
//! anything that can report a clip's duration and decode a frame at a
//! timestamp. See the [`sampler`] module for a minimal implementation.
//!
//! ## Tuning
//!
//! ```no_run
//! use gifwrap::{ConvertOptions, DisposalMethod};
//!
//! let options = ConvertOptions::new()
//!     .with_frame_rate(10.0)
//!     .with_dimensions(480, 270)
//!     .with_quality(0.2)
//!     .with_disposal(DisposalMethod::BACKGROUND)
//!     .with_remove_source(false);
//! ```
//!
//! ## Pieces
//!
//! Every stage of the pipeline is usable on its own:
//!
//! - [`SampleSchedule`] — timestamps from duration × frame rate
//! - [`recompress_frames`] — resize + lossy recompression, best-effort
//! - [`assemble`] — frames → GIF89a bytes with loop count and delays
//! - [`patch_first_disposal`] — rewrite disposal bits in encoded bytes
//! - [`GifConverter`] — the whole pipeline with temp-file lifecycle
//!
//! The assembler and patcher are pure transforms over byte sequences; only
//! the converter touches the file system.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ffmpeg` | `ffmpeg::FfmpegOpener`, a production sampler via FFmpeg, plus the `gifwrap` CLI |
//! | `rayon` | `recompress_frames_parallel` distributes the transform across rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The `ffmpeg` feature needs the FFmpeg development libraries installed on
//! your system; the default feature set is pure Rust.

pub mod assembler;
pub mod codec;
pub mod disposal;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod pipeline;
pub mod progress;
pub mod sampler;
pub mod schedule;
pub mod scratch;
pub mod transform;

pub use assembler::{AssemblyOptions, assemble};
pub use codec::{JpegCodec, StillCodec};
pub use disposal::{
    DisposalMethod, EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, GraphicControlFlags,
    find_graphic_control, patch_first_disposal,
};
pub use error::GifWrapError;
pub use pipeline::{ConversionReport, ConvertOptions, GifConverter};
pub use progress::{PipelineStage, ProgressCallback, ProgressInfo};
pub use sampler::{FrameSampler, MediaOpener};
pub use schedule::SampleSchedule;
pub use scratch::ScratchSpace;
#[cfg(feature = "rayon")]
pub use transform::recompress_frames_parallel;
pub use transform::{TransformOptions, recompress_frames};
