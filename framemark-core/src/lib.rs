//! Framemark Core - tamper-evident per-frame video watermark payloads
//!
//! This crate provides the payload protocol for marking every frame of a video
//! with a watermark text plus a keyed authentication code, and for detecting
//! frames whose content no longer matches their code.
//!
//! # Features
//!
//! - Perceptual frame fingerprints (DCT pHash and friends)
//! - HMAC-SHA256 auth codes truncated to a configured hex length
//! - `text|code` payload framing with strict delimiter rules
//! - Pluggable watermark codecs, with a lossless LSB codec included
//! - Embedding with per-frame fallback, sampling verification and
//!   majority-vote extraction
//! - Secret key zeroization on drop
//!
//! # Example
//!
//! ```no_run
//! use framemark_core::{
//!     payload_len, EmbeddingPipeline, ImageSequenceSink, ImageSequenceSource, LsbCodec,
//!     PipelineConfig, SecretKey, VerificationPipeline,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//!
//! // Embed "MyWatermark" into every frame of a PNG sequence
//! let embedder = EmbeddingPipeline::new(LsbCodec, SecretKey::new(b"secret".to_vec())?, config.clone());
//! let mut sink = ImageSequenceSink::new("marked/");
//! let report = embedder.embed(ImageSequenceSource::new("frames/"), &mut sink, "MyWatermark")?;
//! println!("{} frames written", report.frames_written);
//!
//! // Later: verify with the same key and auth code length
//! let verifier = VerificationPipeline::new(LsbCodec, SecretKey::new(b"secret".to_vec())?, config.clone());
//! let len = payload_len("MyWatermark".len(), config.auth_len);
//! let tamper = verifier.verify(ImageSequenceSource::new("marked/"), len)?;
//! assert!(tamper.is_authentic());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod payload;
pub mod pipeline;

// Re-export main types for convenience
pub use auth::{AuthCode, AuthCodeGenerator, SecretKey, DEFAULT_AUTH_LEN, MAX_AUTH_LEN};
pub use codec::{LsbCodec, WatermarkCodec};
pub use config::PipelineConfig;
pub use error::{
    CodecError, EmbedError, FramemarkError, ParseError, PayloadError, Result, VerifyError,
};
pub use fingerprint::{
    fingerprint, hamming_distance, Fingerprint, HashAlgorithm, PerceptualHasher,
};
pub use frame::{
    Frame, FrameSink, FrameSource, ImageSequenceSink, ImageSequenceSource, MemorySink,
    MemorySource, SequenceInfo,
};
pub use payload::{payload_len, Payload, DELIMITER};
pub use pipeline::{
    EmbedReport, EmbeddingPipeline, ExtractionPipeline, SkippedFrame, TamperReason, TamperReport,
    TamperedFrame, VerificationPipeline, VoteTally,
};
