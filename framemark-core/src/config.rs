//! Pipeline configuration.
//!
//! Both sides of the protocol read the same [`PipelineConfig`]; in particular
//! `auth_len` must match between embedding and verification. The secret key
//! is deliberately not part of it and is passed to pipeline constructors
//! separately.

use serde::{Deserialize, Serialize};

use crate::auth::{DEFAULT_AUTH_LEN, MAX_AUTH_LEN};
use crate::error::{FramemarkError, Result};

/// Default embedding strength handed to the codec.
pub const DEFAULT_STRENGTH: f32 = 0.1;

/// Default frame sampling interval for verification and extraction.
pub const DEFAULT_SAMPLE_STRIDE: u64 = 30;

/// Default number of successful extractions before majority voting stops.
pub const DEFAULT_MAX_VOTES: usize = 10;

/// Default upper bound on watermark text length in bytes.
pub const DEFAULT_MAX_TEXT_LEN: usize = 50;

/// Default number of frames processed per embedding batch.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Settings shared by the embedding, verification and extraction pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Embedding intensity passed through to the codec (default: 0.1)
    pub strength: f32,
    /// Auth code length in hex characters (default: 16)
    pub auth_len: usize,
    /// Inspect every `sample_stride`-th frame, starting at frame 0 (default: 30)
    pub sample_stride: u64,
    /// Stop majority voting after this many successful extractions (default: 10)
    pub max_votes: usize,
    /// Longest accepted watermark text in bytes (default: 50)
    pub max_text_len: usize,
    /// Frames per embedding batch; batches run in parallel with the
    /// `parallel` feature (default: 16)
    pub batch_size: usize,
    /// Count payloads that cannot be split as tampered (default: true)
    pub flag_malformed_payloads: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            auth_len: DEFAULT_AUTH_LEN,
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            max_votes: DEFAULT_MAX_VOTES,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
            batch_size: DEFAULT_BATCH_SIZE,
            flag_malformed_payloads: true,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            strength: env_parse("FRAMEMARK_STRENGTH").unwrap_or(defaults.strength),
            auth_len: env_parse("FRAMEMARK_AUTH_LEN").unwrap_or(defaults.auth_len),
            sample_stride: env_parse("FRAMEMARK_SAMPLE_STRIDE").unwrap_or(defaults.sample_stride),
            max_votes: env_parse("FRAMEMARK_MAX_VOTES").unwrap_or(defaults.max_votes),
            max_text_len: env_parse("FRAMEMARK_MAX_TEXT_LEN").unwrap_or(defaults.max_text_len),
            batch_size: env_parse("FRAMEMARK_BATCH_SIZE").unwrap_or(defaults.batch_size),
            flag_malformed_payloads: std::env::var("FRAMEMARK_FLAG_MALFORMED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.flag_malformed_payloads),
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_auth_len(mut self, auth_len: usize) -> Self {
        self.auth_len = auth_len;
        self
    }

    pub fn with_sample_stride(mut self, sample_stride: u64) -> Self {
        self.sample_stride = sample_stride;
        self
    }

    pub fn with_max_votes(mut self, max_votes: usize) -> Self {
        self.max_votes = max_votes;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_flag_malformed_payloads(mut self, flag: bool) -> Self {
        self.flag_malformed_payloads = flag;
        self
    }

    /// Reject settings no pipeline can run with.
    pub fn validate(&self) -> Result<()> {
        if !self.strength.is_finite() || self.strength <= 0.0 {
            return Err(FramemarkError::InvalidConfig(format!(
                "strength must be a positive finite number, got {}",
                self.strength
            )));
        }
        if self.auth_len == 0 || self.auth_len > MAX_AUTH_LEN {
            return Err(FramemarkError::InvalidConfig(format!(
                "auth_len must be between 1 and {MAX_AUTH_LEN}, got {}",
                self.auth_len
            )));
        }
        if self.sample_stride == 0 {
            return Err(FramemarkError::InvalidConfig(
                "sample_stride must be at least 1".into(),
            ));
        }
        if self.max_votes == 0 {
            return Err(FramemarkError::InvalidConfig(
                "max_votes must be at least 1".into(),
            ));
        }
        if self.max_text_len == 0 {
            return Err(FramemarkError::InvalidConfig(
                "max_text_len must be at least 1".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(FramemarkError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Whether frame `index` is inspected by verification and extraction.
    pub fn is_sampled(&self, index: u64) -> bool {
        index % self.sample_stride == 0
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
