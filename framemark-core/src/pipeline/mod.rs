//! The three frame loops: embedding, tamper verification and majority-vote
//! extraction.
//!
//! Each run makes a single sequential pass over a [`FrameSource`](crate::frame::FrameSource).
//! Only failing to open the source or sink is fatal; per-frame failures are
//! handled inside the loop.

pub mod embed;
pub mod extract;
pub mod verify;

pub use embed::{EmbedReport, EmbeddingPipeline, FrameFailure, SkippedFrame};
pub use extract::{ExtractionPipeline, VoteTally};
pub use verify::{TamperReason, TamperReport, TamperedFrame, VerificationPipeline};
