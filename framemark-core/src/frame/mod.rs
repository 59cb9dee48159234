//! Decoded video frames and the sequential source/sink seams around them.
//!
//! Pipelines never decode containers themselves. They consume a
//! [`FrameSource`], which yields a lazy, finite, non-restartable sequence of
//! frames, and write into a [`FrameSink`], which must preserve the order it
//! receives frames in.
//!
//! Two implementations ship with the crate:
//!
//! - [`ImageSequenceSource`] / [`ImageSequenceSink`]: one image file per frame
//!   in a directory, ordered by file name.
//! - [`MemorySource`] / [`MemorySink`]: in-memory frame vectors.

mod memory;
mod sequence;

pub use memory::{MemorySink, MemorySource};
pub use sequence::{probe, ImageSequenceSink, ImageSequenceSource, SequenceInfo};

use image::{DynamicImage, RgbImage};

use crate::error::{FramemarkError, Result};

/// Number of interleaved channels per pixel (RGB8).
pub const CHANNELS: usize = 3;

/// An immutable decoded RGB8 frame and its zero-based position in the sequence.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    index: u64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame from an interleaved RGB8 buffer.
    ///
    /// The buffer must hold exactly `width * height * 3` bytes. A zero-sized
    /// frame with an empty buffer is accepted here; fingerprinting rejects it.
    pub fn new(index: u64, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if pixels.len() != expected {
            return Err(FramemarkError::InvalidFrame(format!(
                "frame {index}: expected {expected} bytes for {width}x{height} RGB, got {}",
                pixels.len()
            )));
        }

        Ok(Self {
            index,
            width,
            height,
            pixels,
        })
    }

    /// Wrap a decoded RGB image.
    pub fn from_rgb_image(index: u64, image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            index,
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Convert any decoded image to RGB8 and wrap it.
    pub fn from_dynamic_image(index: u64, image: &DynamicImage) -> Self {
        Self::from_rgb_image(index, image.to_rgb8())
    }

    /// Build a frame at the same index and size with replacement pixels.
    ///
    /// Codecs use this to return the watermarked version of a frame.
    pub fn with_pixels(&self, pixels: Vec<u8>) -> Result<Self> {
        Self::new(self.index, self.width, self.height, pixels)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Total pixel count (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` when the frame carries no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Copy the frame into an `image` buffer for encoding or hashing.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(|| {
            FramemarkError::InvalidFrame(format!(
                "frame {}: pixel buffer does not match {}x{}",
                self.index, self.width, self.height
            ))
        })
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// A sequential source of decoded frames.
///
/// `open` failing means the source is unusable as a whole (missing file,
/// unreadable directory). Once open, the iterator yields one item per frame
/// position; an `Err` item is a frame that could not be decoded and does not
/// end the stream. `None` is end of stream.
pub trait FrameSource {
    type Frames: Iterator<Item = Result<Frame>>;

    fn open(self) -> Result<Self::Frames>;
}

/// A sequential sink for frames. Frames must be persisted in call order.
pub trait FrameSink {
    /// Prepare the sink for writing. Called once before the first frame.
    fn open(&mut self) -> Result<()>;

    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close. Called once, including after an aborted run.
    fn finish(&mut self) -> Result<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
