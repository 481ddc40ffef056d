//! Sampling schedules.
//!
//! A [`SampleSchedule`] turns a clip duration and a target frame rate into
//! the ordered list of timestamps at which frames are pulled from the
//! sampler. The schedule also knows the matching per-frame GIF delay, so the
//! output animation plays back at the speed the clip was sampled at.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use gifwrap::SampleSchedule;
//!
//! let schedule = SampleSchedule::new(Duration::from_secs(3), 15.0).unwrap();
//! assert_eq!(schedule.total_frames(), 45);
//! assert_eq!(schedule.timestamps().next(), Some(Duration::ZERO));
//! ```

use std::time::Duration;

use crate::error::GifWrapError;

/// The ordered set of timestamps to sample from a source clip.
///
/// The schedule contains `floor(duration × frame_rate)` entries, with
/// `timestamp[i] = i / frame_rate`. Entries are strictly increasing and
/// start at zero; their order is the output frame order. Once constructed a
/// schedule is immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSchedule {
    frame_rate: f64,
    total_frames: u64,
}

impl SampleSchedule {
    /// Compute the schedule for a clip of the given duration.
    ///
    /// # Errors
    ///
    /// Returns [`GifWrapError::InvalidFrameCount`] when the frame rate is
    /// not a positive finite number, or when `duration × frame_rate`
    /// truncates to zero — in both cases no sampling is worth attempting.
    pub fn new(duration: Duration, frame_rate: f64) -> Result<Self, GifWrapError> {
        let duration_seconds = duration.as_secs_f64();
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(GifWrapError::InvalidFrameCount {
                duration_seconds,
                frame_rate,
            });
        }

        let total_frames = (duration_seconds * frame_rate).floor() as u64;
        if total_frames == 0 {
            return Err(GifWrapError::InvalidFrameCount {
                duration_seconds,
                frame_rate,
            });
        }

        Ok(Self {
            frame_rate,
            total_frames,
        })
    }

    /// The sampling rate in frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Number of frames this schedule will request.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Iterate over the sample timestamps in output-frame order.
    pub fn timestamps(&self) -> impl Iterator<Item = Duration> + '_ {
        let frame_rate = self.frame_rate;
        (0..self.total_frames).map(move |index| Duration::from_secs_f64(index as f64 / frame_rate))
    }

    /// Time between two consecutive frames.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate)
    }

    /// The per-frame delay in hundredths of a second, as stored in a GIF's
    /// Graphic Control Extension. Rounded to the nearest centisecond, with a
    /// floor of 1 so the delay never degenerates to "unspecified".
    pub fn frame_delay_centiseconds(&self) -> u16 {
        let centiseconds = (100.0 / self.frame_rate).round();
        (centiseconds as u16).max(1)
    }
}
