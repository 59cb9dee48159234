//! Image-sequence directories: one image file per frame.
//!
//! The source reads every `png`, `jpg` and `jpeg` file in a directory in
//! natural file name order, so unpadded dumps (`1.png`, `2.png`, `10.png`)
//! play back numerically. The sink writes lossless `frame_NNNNNN.png` files
//! named after the frame index, so a sink directory reads back in the same
//! order.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Frame, FrameSink, FrameSource};
use crate::error::{FramemarkError, Result};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Basic facts about an image sequence, gathered without decoding every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceInfo {
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
}

/// List frame files of a directory in playback order.
fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
        if is_frame {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)).then_with(|| a.cmp(b)));
    Ok(paths)
}

fn file_name(path: &Path) -> Cow<'_, str> {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
}

/// Compare names run by run, with runs of ASCII digits compared by value.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    while !a.is_empty() && !b.is_empty() {
        let (run_a, rest_a) = split_run(a);
        let (run_b, rest_b) = split_run(b);
        let ordering = match (is_digits(run_a), is_digits(run_b)) {
            (true, true) => {
                let value_a = run_a.trim_start_matches('0');
                let value_b = run_b.trim_start_matches('0');
                value_a
                    .len()
                    .cmp(&value_b.len())
                    .then_with(|| value_a.cmp(value_b))
            }
            _ => run_a.cmp(run_b),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
        a = rest_a;
        b = rest_b;
    }
    a.len().cmp(&b.len())
}

/// Split off the leading run of digits or non-digits.
fn split_run(s: &str) -> (&str, &str) {
    let digits = s.starts_with(|c: char| c.is_ascii_digit());
    let end = s
        .find(|c: char| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn is_digits(run: &str) -> bool {
    run.starts_with(|c: char| c.is_ascii_digit())
}

/// True for names the sink writes, `frame_` followed by digits and `.png`.
fn is_sink_frame_name(name: &str) -> bool {
    name.strip_prefix("frame_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .map(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Probe a sequence directory: frame count and the first frame's dimensions.
pub fn probe(dir: impl AsRef<Path>) -> Result<SequenceInfo> {
    let dir = dir.as_ref();
    let paths = list_frame_files(dir)?;
    let first = paths.first().ok_or_else(|| {
        FramemarkError::InvalidFrame(format!("no frame images found in {}", dir.display()))
    })?;
    let (width, height) = image::image_dimensions(first)?;

    let info = SequenceInfo {
        frame_count: paths.len(),
        width,
        height,
    };
    debug!(path = %dir.display(), ?info, "Probed image sequence");
    Ok(info)
}

/// Frame source reading an image-sequence directory.
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    dir: PathBuf,
}

impl ImageSequenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSource for ImageSequenceSource {
    type Frames = ImageSequenceFrames;

    fn open(self) -> Result<Self::Frames> {
        let paths = list_frame_files(&self.dir)?;
        debug!(path = %self.dir.display(), frames = paths.len(), "Opened image sequence");
        Ok(ImageSequenceFrames {
            paths: paths.into_iter(),
            next_index: 0,
        })
    }
}

/// Lazily decodes one frame file per `next` call.
#[derive(Debug)]
pub struct ImageSequenceFrames {
    paths: std::vec::IntoIter<PathBuf>,
    next_index: u64,
}

impl Iterator for ImageSequenceFrames {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        let index = self.next_index;
        self.next_index += 1;

        Some(
            image::open(&path)
                .map(|image| Frame::from_dynamic_image(index, &image))
                .map_err(FramemarkError::from),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

/// Frame sink writing lossless PNG files into a directory.
#[derive(Debug, Clone)]
pub struct ImageSequenceSink {
    dir: PathBuf,
    written: u64,
}

impl ImageSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// File path used for a given frame index.
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameSink for ImageSequenceSink {
    fn open(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let metadata = std::fs::metadata(&self.dir)?;
        if metadata.permissions().readonly() {
            return Err(FramemarkError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("output directory is read-only: {}", self.dir.display()),
            )));
        }
        let mut removed = 0usize;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && is_sink_frame_name(&file_name(&path)) {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(path = %self.dir.display(), removed, "Removed frames of an earlier run");
        }

        self.written = 0;
        Ok(())
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let path = self.frame_path(frame.index());
        frame.to_rgb_image()?.save(&path)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!(path = %self.dir.display(), frames = self.written, "Image sequence written");
        Ok(())
    }
}
