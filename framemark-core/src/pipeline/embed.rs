//! Frame-by-frame payload embedding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{AuthCodeGenerator, SecretKey};
use crate::codec::WatermarkCodec;
use crate::config::PipelineConfig;
use crate::error::{CodecError, EmbedError, FramemarkError, PayloadError};
use crate::frame::{Frame, FrameSink, FrameSource};
use crate::payload;

/// Why a single frame was written without a watermark.
#[derive(Error, Debug)]
pub enum FrameFailure {
    #[error("auth code: {0}")]
    AuthCode(#[from] FramemarkError),

    #[error("payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

/// A frame that was passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFrame {
    pub index: u64,
    pub reason: String,
}

/// Outcome of an embedding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedReport {
    /// Frames written to the sink, marked or not
    pub frames_written: u64,
    /// Frames written with a payload
    pub frames_watermarked: u64,
    /// Frames written unmodified because marking failed
    pub skipped: Vec<SkippedFrame>,
    /// The run was stopped through the abort flag
    pub aborted: bool,
}

impl EmbedReport {
    /// Every frame of the source was read and marked.
    pub fn is_complete(&self) -> bool {
        !self.aborted && self.skipped.is_empty() && self.frames_written > 0
    }
}

type ProgressCallback = Box<dyn Fn(u64) + Send + Sync>;

/// Embeds `text|auth_code` into every frame of a source.
pub struct EmbeddingPipeline<C> {
    codec: C,
    generator: AuthCodeGenerator,
    config: PipelineConfig,
    progress: Option<ProgressCallback>,
    abort: Option<Arc<AtomicBool>>,
}

impl<C: WatermarkCodec> EmbeddingPipeline<C> {
    pub fn new(codec: C, key: SecretKey, config: PipelineConfig) -> Self {
        Self::with_generator(codec, AuthCodeGenerator::new(key), config)
    }

    /// Use a preconfigured generator, e.g. one with a non-default hash algorithm.
    pub fn with_generator(codec: C, generator: AuthCodeGenerator, config: PipelineConfig) -> Self {
        Self {
            codec,
            generator,
            config,
            progress: None,
            abort: None,
        }
    }

    /// Called with the number of frames written so far after every frame.
    pub fn on_progress(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Stop between batches once `flag` is set. The sink is still finished.
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Derive the auth code for `frame`, frame the payload and embed it.
    pub fn watermark_frame(&self, frame: &Frame, text: &str) -> Result<Frame, FrameFailure> {
        let auth_code = self.generator.generate(frame, self.config.auth_len)?;
        let payload = payload::encode(text, &auth_code)?;
        let marked = self.codec.embed(frame, &payload, self.config.strength)?;
        debug!(frame = frame.index(), auth_code = %auth_code, "Embedded payload");
        Ok(marked)
    }

    /// Watermark every frame of `source` with `text` and write it to `sink`.
    ///
    /// Frames that cannot be marked are written unmodified and listed in the
    /// report. Only an unusable source or sink, a write failure, or an empty
    /// source fail the run.
    pub fn embed<S, K>(&self, source: S, sink: &mut K, text: &str) -> Result<EmbedReport, EmbedError>
    where
        S: FrameSource,
        K: FrameSink + ?Sized,
    {
        self.config
            .validate()
            .map_err(|e| EmbedError::InvalidConfig(e.to_string()))?;
        if text.is_empty() {
            return Err(PayloadError::EmptyText.into());
        }
        payload::validate_text(text)?;
        if text.len() > self.config.max_text_len {
            return Err(PayloadError::TextTooLong {
                len: text.len(),
                max: self.config.max_text_len,
            }
            .into());
        }

        let frames = source.open().map_err(EmbedError::SourceUnreadable)?;
        sink.open().map_err(EmbedError::SinkUnwritable)?;

        let result = self.run(frames, sink, text);
        let finished = sink.finish();

        let report = result?;
        finished.map_err(|source| EmbedError::SinkWrite {
            index: report.frames_written,
            source,
        })?;

        if report.frames_written == 0 && !report.aborted {
            return Err(EmbedError::NoFramesProcessed);
        }

        info!(
            written = report.frames_written,
            watermarked = report.frames_watermarked,
            skipped = report.skipped.len(),
            aborted = report.aborted,
            "Embedding completed"
        );
        Ok(report)
    }

    fn run<I, K>(&self, mut frames: I, sink: &mut K, text: &str) -> Result<EmbedReport, EmbedError>
    where
        I: Iterator<Item = crate::error::Result<Frame>>,
        K: FrameSink + ?Sized,
    {
        let mut report = EmbedReport::default();
        let mut position = 0u64;

        loop {
            if self.abort_requested() {
                info!(written = report.frames_written, "Embedding aborted");
                report.aborted = true;
                break;
            }

            let mut batch = Vec::with_capacity(self.config.batch_size);
            for item in frames.by_ref().take(self.config.batch_size) {
                let frame = item.map_err(|source| EmbedError::SourceRead {
                    index: position,
                    source,
                })?;
                position += 1;
                batch.push(frame);
            }
            if batch.is_empty() {
                break;
            }

            let outcomes = self.process_batch(&batch, text);
            for (frame, outcome) in batch.iter().zip(outcomes) {
                let written = match outcome {
                    Ok(marked) => {
                        report.frames_watermarked += 1;
                        sink.write_frame(&marked)
                    }
                    Err(failure) => {
                        warn!(frame = frame.index(), error = %failure, "Writing frame without watermark");
                        report.skipped.push(SkippedFrame {
                            index: frame.index(),
                            reason: failure.to_string(),
                        });
                        sink.write_frame(frame)
                    }
                };
                written.map_err(|source| EmbedError::SinkWrite {
                    index: frame.index(),
                    source,
                })?;

                report.frames_written += 1;
                if let Some(progress) = &self.progress {
                    progress(report.frames_written);
                }
            }
        }

        Ok(report)
    }

    /// Mark one batch. Results come back in the batch's order.
    #[cfg(feature = "parallel")]
    fn process_batch(&self, batch: &[Frame], text: &str) -> Vec<Result<Frame, FrameFailure>> {
        use rayon::prelude::*;

        batch
            .par_iter()
            .map(|frame| self.watermark_frame(frame, text))
            .collect()
    }

    /// Mark one batch. Results come back in the batch's order.
    #[cfg(not(feature = "parallel"))]
    fn process_batch(&self, batch: &[Frame], text: &str) -> Vec<Result<Frame, FrameFailure>> {
        batch
            .iter()
            .map(|frame| self.watermark_frame(frame, text))
            .collect()
    }

    fn abort_requested(&self) -> bool {
        self.abort
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}
