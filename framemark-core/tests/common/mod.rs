//! Shared fixtures for framemark-core integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use framemark_core::{CodecError, Frame, LsbCodec, SecretKey, WatermarkCodec};
use image::{Rgb, RgbImage};

pub const TEXT: &str = "MyWatermark";

pub fn key() -> SecretKey {
    SecretKey::new(b"secret".to_vec()).unwrap()
}

/// A synthetic frame: colour gradient, a block pattern in blue and a white
/// rectangle that moves with the frame index.
pub fn synthetic_frame(index: u64, width: u32, height: u32) -> Frame {
    let rect_x = (index as u32 * 4) % (width / 2);
    let image = RgbImage::from_fn(width, height, |x, y| {
        if x >= rect_x && x < rect_x + width / 4 && y >= height / 3 && y < height / 2 {
            return Rgb([255, 255, 255]);
        }
        let r = (x * 255 / width) as u8;
        let g = (y * 255 / height) as u8;
        let b = if (x / 8 + y / 8) % 2 == 0 { 180 } else { 60 };
        Rgb([r, g, b])
    });
    Frame::from_rgb_image(index, image)
}

pub fn synthetic_video(count: u64) -> Vec<Frame> {
    (0..count).map(|i| synthetic_frame(i, 64, 48)).collect()
}

/// Invert every channel; the blue least significant bit is kept so an LSB
/// watermark survives the edit.
pub fn invert_keeping_watermark(frame: &Frame) -> Frame {
    let pixels = frame
        .pixels()
        .chunks_exact(3)
        .flat_map(|p| [255 - p[0], 255 - p[1], ((255 - p[2]) & 0xFE) | (p[2] & 1)])
        .collect();
    frame.with_pixels(pixels).unwrap()
}

/// Codec whose extractions are scripted per frame index. Unscripted frames
/// fail to extract. Embedding delegates to the LSB codec.
pub struct ScriptedCodec {
    outputs: HashMap<u64, String>,
}

impl ScriptedCodec {
    pub fn new(outputs: impl IntoIterator<Item = (u64, String)>) -> Self {
        Self {
            outputs: outputs.into_iter().collect(),
        }
    }
}

impl WatermarkCodec for ScriptedCodec {
    fn embed(&self, frame: &Frame, text: &str, strength: f32) -> Result<Frame, CodecError> {
        LsbCodec.embed(frame, text, strength)
    }

    fn extract(&self, frame: &Frame, _len: usize) -> Result<String, CodecError> {
        self.outputs
            .get(&frame.index())
            .cloned()
            .ok_or_else(|| CodecError::Other(format!("no signal in frame {}", frame.index())))
    }
}
