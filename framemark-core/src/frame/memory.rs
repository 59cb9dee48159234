//! In-memory frame source and sink.

use super::{Frame, FrameSink, FrameSource};
use crate::error::Result;

/// Frame source backed by a vector of already-decoded frames.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: Vec<Frame>,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl From<Vec<Frame>> for MemorySource {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

type MemoryFrames = std::iter::Map<std::vec::IntoIter<Frame>, fn(Frame) -> Result<Frame>>;

impl FrameSource for MemorySource {
    type Frames = MemoryFrames;

    fn open(self) -> Result<Self::Frames> {
        let wrap: fn(Frame) -> Result<Frame> = Ok;
        Ok(self.frames.into_iter().map(wrap))
    }
}

/// Frame sink that keeps every written frame in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<Frame>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Whether `finish` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Turn the written frames into a source for a later verification run.
    pub fn into_source(self) -> MemorySource {
        MemorySource::new(self.frames)
    }
}

impl FrameSink for MemorySink {
    fn open(&mut self) -> Result<()> {
        self.finished = false;
        self.frames.clear();
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: u64) -> Frame {
        Frame::new(index, 1, 1, vec![index as u8; 3]).unwrap()
    }

    #[test]
    fn test_memory_source_yields_frames_in_order() {
        let source = MemorySource::new(vec![frame(0), frame(1), frame(2)]);
        let indices: Vec<u64> = source
            .open()
            .unwrap()
            .map(|f| f.unwrap().index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_memory_sink_collects_and_finishes() {
        let mut sink = MemorySink::new();
        sink.open().unwrap();
        sink.write_frame(&frame(0)).unwrap();
        sink.write_frame(&frame(1)).unwrap();
        assert!(!sink.is_finished());
        sink.finish().unwrap();

        assert!(sink.is_finished());
        assert_eq!(sink.frames().len(), 2);
        assert_eq!(sink.into_source().len(), 2);
    }
}
