//! The conversion pipeline.
//!
//! [`GifConverter`] drives one clip through the full pipeline: sample
//! frames on a fixed schedule, resize and recompress them, assemble the
//! GIF, patch the disposal method into the encoded bytes, and persist the
//! result as `<destination>/<source-stem>.gif`.
//!
//! A conversion is a single logical job. Within the job, samples are
//! awaited strictly in schedule order; across jobs, any number may run
//! concurrently — the only shared state is the destination directory,
//! which is created with idempotent semantics. Cancelling a job is done by
//! dropping its future; temporary artifacts are cleaned up on every exit
//! path, including that one.
//!
//! # Example
//!
//! ```no_run
//! use gifwrap::{ConvertOptions, DisposalMethod, GifConverter};
//! # use std::{path::Path, time::Duration};
//! # use gifwrap::{FrameSampler, GifWrapError, MediaOpener};
//! # use image::DynamicImage;
//! # struct MySampler;
//! # impl FrameSampler for MySampler {
//! #     fn duration(&self) -> Duration { Duration::from_secs(3) }
//! #     fn dimensions(&self) -> (u32, u32) { (1920, 1080) }
//! #     async fn sample_at(&mut self, _t: Duration) -> Option<DynamicImage> { None }
//! # }
//! # struct MyOpener;
//! # impl MediaOpener for MyOpener {
//! #     type Sampler = MySampler;
//! #     fn open(&self, _s: &Path) -> Result<MySampler, GifWrapError> { Ok(MySampler) }
//! # }
//!
//! # async fn example() -> Result<(), GifWrapError> {
//! let converter = GifConverter::new(MyOpener).with_options(
//!     ConvertOptions::new()
//!         .with_frame_rate(15.0)
//!         .with_disposal(DisposalMethod::BACKGROUND),
//! );
//!
//! let report = converter
//!     .convert(Path::new("clip.mov"), Path::new("gifs"))
//!     .await?;
//! println!("Wrote {}", report.output_path.display());
//! # Ok(())
//! # }
//! ```

use std::ffi::OsStr;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assembler::{AssemblyOptions, assemble};
use crate::codec::{JpegCodec, StillCodec};
use crate::disposal::{DisposalMethod, patch_first_disposal};
use crate::error::GifWrapError;
use crate::progress::{NoOpProgress, PipelineStage, ProgressCallback, ProgressInfo};
use crate::sampler::{FrameSampler, MediaOpener};
use crate::schedule::SampleSchedule;
use crate::scratch::ScratchSpace;
use crate::transform::{TransformOptions, recompress_frames};

/// Configuration for a conversion job.
///
/// Defaults: 15 fps, restore-to-background disposal, 320×180 output at
/// maximum compression, looping forever, and removal of the source clip
/// once the GIF is durable.
#[derive(Clone)]
#[must_use]
pub struct ConvertOptions {
    /// Sampling rate in frames per second.
    pub frame_rate: f64,
    /// Disposal method patched into the finished GIF.
    pub disposal: DisposalMethod,
    /// Output resolution and recompression quality.
    pub transform: TransformOptions,
    /// How many times the GIF repeats. `0` means loop forever.
    pub loop_count: u16,
    /// Remove the source clip during cleanup. The pipeline treats the
    /// source as a copied-in temporary it owns; callers converting files
    /// they do not own should turn this off.
    pub remove_source: bool,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
}

impl Debug for ConvertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertOptions")
            .field("frame_rate", &self.frame_rate)
            .field("disposal", &self.disposal)
            .field("transform", &self.transform)
            .field("loop_count", &self.loop_count)
            .field("remove_source", &self.remove_source)
            .finish_non_exhaustive()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            frame_rate: 15.0,
            disposal: DisposalMethod::default(),
            transform: TransformOptions::default(),
            loop_count: 0,
            remove_source: true,
            progress: Arc::new(NoOpProgress),
        }
    }
}

impl ConvertOptions {
    /// Create conversion options with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling rate in frames per second.
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the disposal method written into the finished GIF.
    pub fn with_disposal(mut self, disposal: DisposalMethod) -> Self {
        self.disposal = disposal;
        self
    }

    /// Set the exact output dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.transform = self.transform.with_dimensions(width, height);
        self
    }

    /// Set the recompression quality in `[0.0, 1.0]`.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.transform = self.transform.with_quality(quality);
        self
    }

    /// Set the repeat count. `0` loops forever.
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Control whether the source clip is removed during cleanup.
    pub fn with_remove_source(mut self, remove_source: bool) -> Self {
        self.remove_source = remove_source;
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }
}

/// Terminal state of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Where the finished GIF was written.
    pub output_path: PathBuf,
    /// How many frames the schedule requested.
    pub frames_requested: u64,
    /// How many frames the sampler actually decoded.
    pub frames_sampled: usize,
    /// How many frames survived recompression and were encoded.
    pub frames_encoded: usize,
}

/// Converts video clips into animated GIFs.
///
/// Generic over the [`MediaOpener`] that provides frame sampling and the
/// [`StillCodec`] used for the lossy intermediate step. The same converter
/// can run any number of jobs, sequentially or concurrently.
pub struct GifConverter<O, C = JpegCodec> {
    opener: O,
    codec: C,
    options: ConvertOptions,
}

impl<O: MediaOpener> GifConverter<O> {
    /// Create a converter with default options and the JPEG intermediate
    /// codec.
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            codec: JpegCodec,
            options: ConvertOptions::default(),
        }
    }
}

impl<O: MediaOpener, C: StillCodec> GifConverter<O, C> {
    /// Replace the conversion options.
    #[must_use]
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the lossy intermediate codec.
    #[must_use]
    pub fn with_codec<C2: StillCodec>(self, codec: C2) -> GifConverter<O, C2> {
        GifConverter {
            opener: self.opener,
            codec,
            options: self.options,
        }
    }

    /// The options this converter runs with.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `source` into `<destination>/<source-stem>.gif`.
    ///
    /// The destination directory is created if it does not exist. On
    /// success the finished GIF is the only durable artifact; the staged
    /// unpatched GIF, and the source clip when
    /// [`remove_source`](ConvertOptions::remove_source) is set, are
    /// removed. On failure the same cleanup runs and no output file is
    /// left behind.
    ///
    /// # Errors
    ///
    /// - [`GifWrapError::MediaOpen`] when the clip cannot be opened.
    /// - [`GifWrapError::InvalidFrameCount`] when the schedule is empty,
    ///   before any frame is sampled.
    /// - [`GifWrapError::DestinationUnavailable`] when the destination
    ///   directory cannot be created.
    /// - [`GifWrapError::DecodeUnavailable`] when the sampler decodes
    ///   nothing at all.
    /// - [`GifWrapError::GifEncodeFailed`] when recompression drops every
    ///   frame or the GIF stream cannot be finalized.
    /// - [`GifWrapError::PersistFailed`] when the final write fails.
    pub async fn convert(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<ConversionReport, GifWrapError> {
        log::debug!(
            "Converting {} -> {} ({:?})",
            source.display(),
            destination.display(),
            self.options,
        );

        let mut scratch = ScratchSpace::new();
        if self.options.remove_source {
            scratch.track(source);
        }

        // `scratch` drops on every exit path below, removing whatever is
        // still tracked.
        self.convert_inner(source, destination, &mut scratch).await
    }

    async fn convert_inner(
        &self,
        source: &Path,
        destination: &Path,
        scratch: &mut ScratchSpace,
    ) -> Result<ConversionReport, GifWrapError> {
        let mut sampler = self.opener.open(source)?;

        let schedule = SampleSchedule::new(sampler.duration(), self.options.frame_rate)?;
        let frames_requested = schedule.total_frames();
        let (source_width, source_height) = sampler.dimensions();
        log::debug!(
            "Sampling {frames_requested} frames at {} fps from {} ({source_width}x{source_height})",
            schedule.frame_rate(),
            source.display(),
        );

        fs::create_dir_all(destination).map_err(|error| GifWrapError::DestinationUnavailable {
            path: destination.to_path_buf(),
            reason: error.to_string(),
        })?;

        // Await each sample before requesting the next; later stages rely
        // on frame order matching timestamp order.
        let mut raw_frames = Vec::with_capacity(frames_requested as usize);
        for (index, timestamp) in schedule.timestamps().enumerate() {
            match sampler.sample_at(timestamp).await {
                Some(frame) => raw_frames.push(frame),
                None => log::debug!("No frame decoded at {timestamp:?} (index {index}); skipping"),
            }
            self.report(PipelineStage::Sampling, index as u64 + 1, Some(frames_requested));
        }
        // Release the media handle before any file shuffling.
        drop(sampler);

        let frames_sampled = raw_frames.len();
        if frames_sampled == 0 {
            return Err(GifWrapError::DecodeUnavailable);
        }

        self.report(PipelineStage::Transforming, 0, Some(frames_sampled as u64));
        let encoded = recompress_frames(&raw_frames, &self.codec, &self.options.transform);
        drop(raw_frames);

        let frames_encoded = encoded.len();
        if frames_encoded == 0 {
            return Err(GifWrapError::GifEncodeFailed(
                "every frame failed lossy recompression".to_string(),
            ));
        }

        self.report(PipelineStage::Assembling, 0, Some(frames_encoded as u64));
        let assembly = AssemblyOptions::new()
            .with_loop_count(self.options.loop_count)
            .with_frame_delay_cs(schedule.frame_delay_centiseconds());
        let unpatched = assemble(&encoded, &assembly)?;

        let stem = source
            .file_stem()
            .unwrap_or(OsStr::new("clip"))
            .to_string_lossy()
            .into_owned();

        // Stage the unpatched bytes next to the final path; the staged
        // file never survives the job.
        let staged_path = destination.join(format!("{stem}.gif.part"));
        scratch.track(&staged_path);
        fs::write(&staged_path, &unpatched)?;

        self.report(PipelineStage::Patching, 0, None);
        let patched = patch_first_disposal(&unpatched, self.options.disposal);

        self.report(PipelineStage::Persisting, 0, None);
        let output_path = destination.join(format!("{stem}.gif"));
        // Track the output until the write completes so a failed write
        // never leaves a partial GIF at the final path.
        scratch.track(&output_path);
        fs::write(&output_path, &patched).map_err(|error| GifWrapError::PersistFailed {
            path: output_path.clone(),
            reason: error.to_string(),
        })?;
        scratch.release(&output_path);

        log::debug!("Conversion finished: {}", output_path.display());
        Ok(ConversionReport {
            output_path,
            frames_requested,
            frames_sampled,
            frames_encoded,
        })
    }

    fn report(&self, stage: PipelineStage, current: u64, total: Option<u64>) {
        self.options.progress.on_progress(&ProgressInfo {
            stage,
            current,
            total,
        });
    }
}
