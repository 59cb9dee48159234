//! Watermark codecs: the capability that actually hides a string in pixels.
//!
//! The payload protocol does not care how bits are hidden. Anything that can
//! `embed` a string into a frame and later `extract` a string of a known
//! length plugs in through [`WatermarkCodec`].

use std::sync::Arc;

use crate::error::CodecError;
use crate::frame::{Frame, CHANNELS};

/// Hide and recover text inside frame pixels.
///
/// Implementations must be thread-safe (`Send + Sync`); embedding may run
/// frames of one batch on several threads.
pub trait WatermarkCodec: Send + Sync {
    /// Return a copy of `frame` carrying `text`. `strength` is the embedding
    /// intensity; its scale is codec specific.
    fn embed(&self, frame: &Frame, text: &str, strength: f32) -> Result<Frame, CodecError>;

    /// Recover `len` bytes of text from `frame`.
    fn extract(&self, frame: &Frame, len: usize) -> Result<String, CodecError>;
}

impl<C: WatermarkCodec + ?Sized> WatermarkCodec for &C {
    fn embed(&self, frame: &Frame, text: &str, strength: f32) -> Result<Frame, CodecError> {
        (**self).embed(frame, text, strength)
    }

    fn extract(&self, frame: &Frame, len: usize) -> Result<String, CodecError> {
        (**self).extract(frame, len)
    }
}

impl<C: WatermarkCodec + ?Sized> WatermarkCodec for Box<C> {
    fn embed(&self, frame: &Frame, text: &str, strength: f32) -> Result<Frame, CodecError> {
        (**self).embed(frame, text, strength)
    }

    fn extract(&self, frame: &Frame, len: usize) -> Result<String, CodecError> {
        (**self).extract(frame, len)
    }
}

impl<C: WatermarkCodec + ?Sized> WatermarkCodec for Arc<C> {
    fn embed(&self, frame: &Frame, text: &str, strength: f32) -> Result<Frame, CodecError> {
        (**self).embed(frame, text, strength)
    }

    fn extract(&self, frame: &Frame, len: usize) -> Result<String, CodecError> {
        (**self).extract(frame, len)
    }
}

/// Offset of the blue channel inside an RGB pixel.
const BLUE: usize = 2;

/// Spatial least-significant-bit codec.
///
/// Text bytes are written MSB first, one bit per pixel, into the least
/// significant bit of the blue channel, in raster order from pixel (0, 0).
/// A frame holds `width * height / 8` bytes.
///
/// The marks are only as durable as the container: lossless frames (PNG)
/// keep them, lossy re-encoding destroys them, which verification then
/// reports as tampering. LSB embedding has a single intensity, so `strength`
/// is only checked for being a positive finite number.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsbCodec;

impl LsbCodec {
    pub fn new() -> Self {
        Self
    }

    /// Bytes of text a frame can carry.
    pub fn capacity(frame: &Frame) -> usize {
        frame.pixel_count() / 8
    }
}

impl WatermarkCodec for LsbCodec {
    fn embed(&self, frame: &Frame, text: &str, strength: f32) -> Result<Frame, CodecError> {
        if !strength.is_finite() || strength <= 0.0 {
            return Err(CodecError::Other(format!(
                "strength must be a positive finite number, got {strength}"
            )));
        }

        let bytes = text.as_bytes();
        let capacity = Self::capacity(frame);
        if bytes.len() > capacity {
            return Err(CodecError::Capacity {
                needed: bytes.len(),
                capacity,
            });
        }

        let mut pixels = frame.pixels().to_vec();
        let bits = bytes
            .iter()
            .flat_map(|&byte| (0..8u32).rev().map(move |shift| (byte >> shift) & 1));
        for (pixel, bit) in pixels.chunks_exact_mut(CHANNELS).zip(bits) {
            pixel[BLUE] = (pixel[BLUE] & !1) | bit;
        }

        Ok(frame.with_pixels(pixels)?)
    }

    fn extract(&self, frame: &Frame, len: usize) -> Result<String, CodecError> {
        let capacity = Self::capacity(frame);
        if len > capacity {
            return Err(CodecError::Capacity {
                needed: len,
                capacity,
            });
        }

        let bytes: Vec<u8> = frame
            .pixels()
            .chunks_exact(CHANNELS)
            .take(len * 8)
            .map(|pixel| pixel[BLUE] & 1)
            .collect::<Vec<u8>>()
            .chunks_exact(8)
            .map(|bits| bits.iter().fold(0u8, |byte, bit| (byte << 1) | bit))
            .collect();

        String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
    }
}
