//! GIF assembly from encoded frames.
//!
//! Takes the frames produced by the transform stage and streams them into a
//! GIF89a container in memory: global loop count first, then one image per
//! frame with a shared delay. Each frame is quantized to a 256-color
//! palette by the `gif` crate's built-in quantizer.
//!
//! The assembler leaves every frame's disposal method at the encoder
//! default. Setting the caller's disposal method is a separate byte-level
//! pass over the finished stream — see [`crate::disposal`].

use gif::{Encoder, Frame, Repeat};
use image::DynamicImage;

use crate::error::GifWrapError;

/// Palette-quantization speed passed to the `gif` crate.
/// 10 trades a little color fidelity for much faster assembly.
const QUANTIZATION_SPEED: i32 = 10;

/// Global and per-frame options for GIF assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct AssemblyOptions {
    /// How many times the animation repeats. `0` means loop forever.
    pub loop_count: u16,
    /// Delay between frames in hundredths of a second, applied to every
    /// frame.
    pub frame_delay_cs: u16,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            loop_count: 0,
            frame_delay_cs: 10,
        }
    }
}

impl AssemblyOptions {
    /// Create assembly options with the defaults: infinite loop, 100 ms
    /// between frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the repeat count. `0` loops forever.
    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Set the delay between frames in hundredths of a second.
    pub fn with_frame_delay_cs(mut self, delay: u16) -> Self {
        self.frame_delay_cs = delay;
        self
    }
}

/// Encode a sequence of frames as an animated GIF in memory.
///
/// All frames must share the dimensions of the first; the transform stage
/// guarantees this for pipeline callers. Returns the raw GIF89a bytes.
///
/// # Errors
///
/// Returns [`GifWrapError::GifEncodeFailed`] when the frame list is empty,
/// when a frame's dimensions disagree with the first frame, or when the
/// underlying encoder rejects the stream.
pub fn assemble(frames: &[DynamicImage], options: &AssemblyOptions) -> Result<Vec<u8>, GifWrapError> {
    log::debug!(
        "Assembling {} frames into GIF (loop_count={}, delay={}cs)",
        frames.len(),
        options.loop_count,
        options.frame_delay_cs,
    );

    let Some(first) = frames.first() else {
        return Err(GifWrapError::GifEncodeFailed(
            "no frames to assemble".to_string(),
        ));
    };
    let width = first.width() as u16;
    let height = first.height() as u16;

    let mut buffer = Vec::new();

    {
        let mut encoder = Encoder::new(&mut buffer, width, height, &[]).map_err(|error| {
            GifWrapError::GifEncodeFailed(format!("Failed to create GIF encoder: {error}"))
        })?;

        let repeat = match options.loop_count {
            0 => Repeat::Infinite,
            count => Repeat::Finite(count),
        };
        encoder.set_repeat(repeat).map_err(|error| {
            GifWrapError::GifEncodeFailed(format!("Failed to set GIF repeat: {error}"))
        })?;

        for (index, image) in frames.iter().enumerate() {
            if (image.width() as u16, image.height() as u16) != (width, height) {
                return Err(GifWrapError::GifEncodeFailed(format!(
                    "Frame {index} is {}x{} but the stream is {width}x{height}",
                    image.width(),
                    image.height(),
                )));
            }

            let rgba = image.to_rgba8();
            let mut pixels = rgba.into_raw();

            let mut gif_frame =
                Frame::from_rgba_speed(width, height, &mut pixels, QUANTIZATION_SPEED);
            gif_frame.delay = options.frame_delay_cs;

            encoder.write_frame(&gif_frame).map_err(|error| {
                GifWrapError::GifEncodeFailed(format!("Failed to write GIF frame {index}: {error}"))
            })?;
        }
    }

    Ok(buffer)
}
