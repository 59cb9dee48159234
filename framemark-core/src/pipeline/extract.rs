//! Majority-vote watermark recovery.
//!
//! Full payload strings are voted on as extracted, auth code included, so
//! frames carrying different auth codes count as different values.

use tracing::{debug, info, warn};

use crate::codec::WatermarkCodec;
use crate::config::PipelineConfig;
use crate::error::VerifyError;
use crate::frame::FrameSource;

/// Ballots collected by an extraction run, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    /// Frames pulled from the source before voting stopped
    pub frames_read: u64,
    /// Successful extractions
    pub ballots: usize,
    counts: Vec<(String, usize)>,
}

impl VoteTally {
    pub fn record(&mut self, value: String) {
        self.ballots += 1;
        match self.counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((value, 1)),
        }
    }

    /// Distinct values with their vote counts, in order of first appearance.
    pub fn counts(&self) -> &[(String, usize)] {
        &self.counts
    }

    /// The most voted value; ties go to the value seen first.
    pub fn winner(&self) -> Option<(&str, usize)> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.counts {
            if best.map(|b| entry.1 > b.1).unwrap_or(true) {
                best = Some(entry);
            }
        }
        best.map(|(value, count)| (value.as_str(), *count))
    }

    pub fn into_winner(self) -> Option<String> {
        let (value, _) = self.winner()?;
        Some(value.to_string())
    }
}

/// Recovers the most common payload from sampled frames.
pub struct ExtractionPipeline<C> {
    codec: C,
    config: PipelineConfig,
}

impl<C: WatermarkCodec> ExtractionPipeline<C> {
    pub fn new(codec: C, config: PipelineConfig) -> Self {
        Self { codec, config }
    }

    /// Collect up to `max_votes` successful extractions from sampled frames.
    ///
    /// Reading stops as soon as enough ballots are in.
    pub fn tally<S: FrameSource>(
        &self,
        source: S,
        payload_len: usize,
    ) -> Result<VoteTally, VerifyError> {
        self.config
            .validate()
            .map_err(|e| VerifyError::InvalidConfig(e.to_string()))?;
        let frames = source.open().map_err(VerifyError::SourceUnreadable)?;

        let mut tally = VoteTally::default();
        let mut frames_read = 0u64;
        let sampled = frames
            .inspect(|_| frames_read += 1)
            .zip(0u64..)
            .filter(|(_, index)| self.config.is_sampled(*index));

        for (item, index) in sampled {
            let extracted = item
                .map_err(|e| e.to_string())
                .and_then(|frame| {
                    self.codec
                        .extract(&frame, payload_len)
                        .map_err(|e| e.to_string())
                });

            match extracted {
                Ok(text) if !text.is_empty() => {
                    debug!(frame = index, "Collected ballot");
                    tally.record(text);
                }
                Ok(_) => debug!(frame = index, "Empty extraction ignored"),
                Err(e) => warn!(frame = index, error = %e, "Extraction failed"),
            }

            if tally.ballots >= self.config.max_votes {
                break;
            }
        }
        if frames_read == 0 {
            return Err(VerifyError::NoFrames);
        }
        tally.frames_read = frames_read;

        info!(
            frames_read = tally.frames_read,
            ballots = tally.ballots,
            distinct = tally.counts().len(),
            "Majority vote completed"
        );
        Ok(tally)
    }

    /// The most frequent payload string among sampled frames, or `None` when no
    /// extraction succeeded.
    pub fn extract_text<S: FrameSource>(
        &self,
        source: S,
        payload_len: usize,
    ) -> Result<Option<String>, VerifyError> {
        Ok(self.tally(source, payload_len)?.into_winner())
    }
}
