//! FFmpeg-backed frame sampling.
//!
//! [`FfmpegOpener`] produces a [`FrameSampler`] that decodes the source
//! clip with FFmpeg. Decoding runs on a dedicated blocking thread spawned
//! via `tokio::task::spawn_blocking`; frames travel back through a bounded
//! channel so the async pipeline is never starved by CPU-heavy decode
//! work, and at most a handful of decoded frames are buffered at a time.
//!
//! Because the converter requests timestamps in strictly increasing order,
//! the sampler never seeks: it walks the stream once, holding on to the
//! most recent frame so each requested timestamp resolves to the frame
//! that would be on screen at that moment.
//!
//! Only available with the `ffmpeg` cargo feature.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use gifwrap::GifConverter;
//! use gifwrap::ffmpeg::FfmpegOpener;
//!
//! # async fn example() -> Result<(), gifwrap::GifWrapError> {
//! let converter = GifConverter::new(FfmpegOpener::new());
//! let report = converter
//!     .convert(Path::new("clip.mov"), Path::new("gifs"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::error::GifWrapError;
use crate::sampler::{FrameSampler, MediaOpener};

/// Default bounded-channel capacity between the decode thread and the
/// sampler. Kept small to avoid buffering too many decoded frames.
const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Slack when comparing presentation timestamps against requested sample
/// times, to absorb floating-point jitter in time-base conversion.
const PTS_EPSILON: f64 = 1e-6;

/// Opens clips for sampling through FFmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    channel_capacity: usize,
}

impl Default for FfmpegOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegOpener {
    /// Create an opener with the default channel capacity.
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set how many decoded frames may queue between the decode thread and
    /// the sampler. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

impl MediaOpener for FfmpegOpener {
    type Sampler = FfmpegSampler;

    fn open(&self, source: &Path) -> Result<Self::Sampler, GifWrapError> {
        let source_path = source.to_path_buf();
        log::debug!("Opening media file: {}", source_path.display());

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init().map_err(|error| GifWrapError::MediaOpen {
            path: source_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        // Probe the container for duration and dimensions, then let the
        // decode thread reopen it for itself.
        let input_context =
            ffmpeg_next::format::input(&source_path).map_err(|error| GifWrapError::MediaOpen {
                path: source_path.clone(),
                reason: error.to_string(),
            })?;

        let video_stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| GifWrapError::MediaOpen {
                path: source_path.clone(),
                reason: "no video stream".to_string(),
            })?;

        let decoder = CodecContext::from_parameters(video_stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| GifWrapError::MediaOpen {
                path: source_path.clone(),
                reason: error.to_string(),
            })?;
        let width = decoder.width();
        let height = decoder.height();

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };
        drop(input_context);

        let (sender, receiver) = tokio::sync::mpsc::channel(self.channel_capacity);
        let handle = tokio::task::spawn_blocking(move || {
            if let Err(error) = decode_frames_blocking(&source_path, &sender) {
                log::warn!("Frame decoding stopped early: {error}");
            }
        });

        Ok(FfmpegSampler {
            duration,
            width,
            height,
            receiver,
            current: None,
            pending: None,
            handle,
        })
    }
}

/// A [`FrameSampler`] fed by a background FFmpeg decode thread.
///
/// Dropping the sampler closes the channel; the decode thread notices at
/// the next frame boundary and drains on its own.
pub struct FfmpegSampler {
    duration: Duration,
    width: u32,
    height: u32,
    receiver: Receiver<(f64, DynamicImage)>,
    /// Most recent frame whose presentation time is at or before the last
    /// requested timestamp.
    current: Option<(f64, DynamicImage)>,
    /// First decoded frame beyond the last requested timestamp.
    pending: Option<(f64, DynamicImage)>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl FrameSampler for FfmpegSampler {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    async fn sample_at(&mut self, timestamp: Duration) -> Option<DynamicImage> {
        let target = timestamp.as_secs_f64() + PTS_EPSILON;

        // Pull decoded frames forward until the next one starts after the
        // target time or the stream runs out.
        loop {
            match self.pending.take() {
                Some((pts, image)) => {
                    if pts <= target {
                        self.current = Some((pts, image));
                    } else {
                        self.pending = Some((pts, image));
                        break;
                    }
                }
                None => match self.receiver.recv().await {
                    Some(pair) => self.pending = Some(pair),
                    None => break,
                },
            }
        }

        if let Some((_, image)) = &self.current {
            return Some(image.clone());
        }
        // Nothing decoded at or before the target; fall back to the next
        // frame so clips whose first packet starts late still sample.
        self.pending.as_ref().map(|(_, image)| image.clone())
    }
}

/// Background decode loop — runs on a blocking thread.
///
/// Decodes the whole video stream in presentation order, converting each
/// frame to RGB at the source resolution and sending it through the
/// channel. A dropped receiver ends the loop at the next frame boundary.
fn decode_frames_blocking(
    source: &PathBuf,
    sender: &Sender<(f64, DynamicImage)>,
) -> Result<(), GifWrapError> {
    let mut input_context = ffmpeg_next::format::input(source)?;

    let (stream_index, time_base, parameters) = {
        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| GifWrapError::MediaOpen {
                path: source.clone(),
                reason: "no video stream".to_string(),
            })?;
        (stream.index(), stream.time_base(), stream.parameters())
    };

    let mut decoder = CodecContext::from_parameters(parameters)?.decoder().video()?;

    let width = decoder.width();
    let height = decoder.height();
    let mut scaler = ScalingContext::get(
        decoder.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;

    let seconds_per_unit = time_base.numerator() as f64 / time_base.denominator() as f64;
    let mut decoded_frame = VideoFrame::empty();
    let mut rgb_frame = VideoFrame::empty();

    for (stream, packet) in input_context.packets() {
        if stream.index() != stream_index {
            continue;
        }

        decoder.send_packet(&packet)?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let seconds = decoded_frame.pts().unwrap_or(0) as f64 * seconds_per_unit;
            scaler.run(&decoded_frame, &mut rgb_frame)?;
            let image = rgb_frame_to_image(&rgb_frame, width, height)?;
            if sender.blocking_send((seconds, image)).is_err() {
                // Receiver dropped: the sampler is gone, stop decoding.
                return Ok(());
            }
        }
    }

    // Flush the decoder.
    decoder.send_eof()?;
    while decoder.receive_frame(&mut decoded_frame).is_ok() {
        let seconds = decoded_frame.pts().unwrap_or(0) as f64 * seconds_per_unit;
        scaler.run(&decoded_frame, &mut rgb_frame)?;
        let image = rgb_frame_to_image(&rgb_frame, width, height)?;
        if sender.blocking_send((seconds, image)).is_err() {
            return Ok(());
        }
    }

    Ok(())
}

/// Convert a scaled RGB24 FFmpeg frame into a [`DynamicImage`].
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3);
/// the padding is stripped so the buffer can be handed to
/// [`RgbImage::from_raw`].
fn rgb_frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, GifWrapError> {
    let stride = rgb_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = rgb_frame.data(0);

    let buffer = if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    };

    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        GifWrapError::FfmpegError("Decoded frame buffer has unexpected size".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}
