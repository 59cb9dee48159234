//! Sampling tamper verification.
//!
//! Every `sample_stride`-th frame (starting at 0) has its payload extracted
//! and its auth code recomputed from the pixels as they are now. A frame is
//! reported when the codes disagree, or when there is nothing trustworthy to
//! compare against: an unreadable frame, a failed extraction, or (by
//! default) a payload that cannot be split.
//!
//! An empty report only speaks for the sampled frames.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::{AuthCodeGenerator, SecretKey};
use crate::codec::WatermarkCodec;
use crate::config::PipelineConfig;
use crate::error::VerifyError;
use crate::frame::{Frame, FrameSource};
use crate::payload;

/// Why a sampled frame was judged tampered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperReason {
    /// The source could not decode the frame.
    FrameUnreadable,
    /// The codec failed to extract a payload.
    ExtractionFailed,
    /// The codec returned an empty payload.
    EmptyPayload,
    /// The payload does not contain exactly one delimiter.
    MalformedPayload,
    /// The frame could not be fingerprinted.
    FingerprintFailed,
    /// The embedded auth code differs from the recomputed one.
    AuthCodeMismatch,
}

impl std::fmt::Display for TamperReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::FrameUnreadable => "frame unreadable",
            Self::ExtractionFailed => "watermark extraction failed",
            Self::EmptyPayload => "empty payload",
            Self::MalformedPayload => "malformed payload",
            Self::FingerprintFailed => "fingerprint failed",
            Self::AuthCodeMismatch => "auth code mismatch",
        };
        f.write_str(text)
    }
}

/// A sampled frame judged tampered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TamperedFrame {
    pub index: u64,
    pub reason: TamperReason,
}

/// Result of a verification run. `tampered` is in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TamperReport {
    pub frames_read: u64,
    pub frames_sampled: u64,
    pub tampered: Vec<TamperedFrame>,
}

impl TamperReport {
    /// Indices of tampered frames, ascending.
    pub fn indices(&self) -> Vec<u64> {
        self.tampered.iter().map(|t| t.index).collect()
    }

    /// No sampled frame was flagged.
    pub fn is_authentic(&self) -> bool {
        self.tampered.is_empty()
    }
}

/// Recomputes auth codes of sampled frames and compares them to the embedded ones.
pub struct VerificationPipeline<C> {
    codec: C,
    generator: AuthCodeGenerator,
    config: PipelineConfig,
}

impl<C: WatermarkCodec> VerificationPipeline<C> {
    pub fn new(codec: C, key: SecretKey, config: PipelineConfig) -> Self {
        Self::with_generator(codec, AuthCodeGenerator::new(key), config)
    }

    pub fn with_generator(codec: C, generator: AuthCodeGenerator, config: PipelineConfig) -> Self {
        Self {
            codec,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Verify the sampled frames of `source`.
    ///
    /// `payload_len` is the byte length to extract from each frame, normally
    /// [`payload::payload_len`] of the watermark text and `auth_len`.
    pub fn verify<S: FrameSource>(
        &self,
        source: S,
        payload_len: usize,
    ) -> Result<TamperReport, VerifyError> {
        self.config
            .validate()
            .map_err(|e| VerifyError::InvalidConfig(e.to_string()))?;
        let frames = source.open().map_err(VerifyError::SourceUnreadable)?;

        let mut frames_read = 0u64;
        let mut frames_sampled = 0u64;
        let tampered: Vec<TamperedFrame> = frames
            .inspect(|_| frames_read += 1)
            .zip(0u64..)
            .filter(|(_, index)| self.config.is_sampled(*index))
            .inspect(|_| frames_sampled += 1)
            .filter_map(|(item, index)| {
                let reason = match item {
                    Ok(frame) => self.check_frame(&frame, payload_len),
                    Err(e) => {
                        warn!(frame = index, error = %e, "Sampled frame unreadable");
                        Some(TamperReason::FrameUnreadable)
                    }
                };
                reason.map(|reason| TamperedFrame { index, reason })
            })
            .collect();

        if frames_read == 0 {
            return Err(VerifyError::NoFrames);
        }

        let report = TamperReport {
            frames_read,
            frames_sampled,
            tampered,
        };
        info!(
            frames_read = report.frames_read,
            frames_sampled = report.frames_sampled,
            tampered = ?report.indices(),
            "Tamper verification completed"
        );
        Ok(report)
    }

    /// Check one decoded frame. `None` means the frame verified.
    pub fn check_frame(&self, frame: &Frame, payload_len: usize) -> Option<TamperReason> {
        let index = frame.index();

        let extracted = match self.codec.extract(frame, payload_len) {
            Ok(text) => text,
            Err(e) => {
                warn!(frame = index, error = %e, "Watermark extraction failed");
                return Some(TamperReason::ExtractionFailed);
            }
        };
        if extracted.is_empty() {
            warn!(frame = index, "Extracted payload is empty");
            return Some(TamperReason::EmptyPayload);
        }

        let payload = match payload::decode(&extracted) {
            Ok(payload) => payload,
            Err(e) if self.config.flag_malformed_payloads => {
                warn!(frame = index, error = %e, "Malformed payload");
                return Some(TamperReason::MalformedPayload);
            }
            Err(e) => {
                debug!(frame = index, error = %e, "Ignoring malformed payload");
                return None;
            }
        };

        let expected = match self.generator.generate(frame, self.config.auth_len) {
            Ok(code) => code,
            Err(e) => {
                warn!(frame = index, error = %e, "Could not recompute auth code");
                return Some(TamperReason::FingerprintFailed);
            }
        };

        if expected != payload.auth_code.as_str() {
            warn!(
                frame = index,
                embedded = %payload.auth_code,
                expected = %expected,
                "Auth code mismatch"
            );
            return Some(TamperReason::AuthCodeMismatch);
        }

        debug!(frame = index, "Frame verified");
        None
    }
}
