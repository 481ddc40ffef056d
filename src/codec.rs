//! Lossy still-image recompression.
//!
//! Every sampled frame takes a round trip through a lossy still-image codec
//! before GIF assembly. Running frames through an intermediate lossy format
//! strips high-frequency detail the GIF palette quantizer would otherwise
//! spend colors on, which is what keeps the output small. The codec is a
//! trait so embedders can swap in a different intermediate format.

use std::io::Cursor;

use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, codecs::jpeg::JpegEncoder,
};

/// A lossy encode-then-decode round trip for a single frame.
///
/// Implementations are best-effort: a frame that fails to survive the round
/// trip returns `None` and is dropped from the output sequence rather than
/// failing the conversion.
pub trait StillCodec {
    /// Recompress `image` at `quality` in `[0.0, 1.0]`, where 0.0 is the
    /// strongest compression, and decode it back to a raster.
    fn recompress(&self, image: &DynamicImage, quality: f32) -> Option<DynamicImage>;
}

/// The default [`StillCodec`], backed by the `image` crate's JPEG encoder.
///
/// JPEG carries no alpha channel, so frames are flattened to RGB before
/// encoding. Callers that need transparency through the intermediate step
/// should supply their own codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl StillCodec for JpegCodec {
    fn recompress(&self, image: &DynamicImage, quality: f32) -> Option<DynamicImage> {
        let jpeg_quality = (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8;
        let rgb = image.to_rgb8();

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), jpeg_quality);
        if let Err(error) =
            encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        {
            log::debug!("Dropping frame that failed JPEG recompression: {error}");
            return None;
        }

        match image::load_from_memory_with_format(&buffer, ImageFormat::Jpeg) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                log::debug!("Dropping frame that failed JPEG re-decode: {error}");
                None
            }
        }
    }
}
