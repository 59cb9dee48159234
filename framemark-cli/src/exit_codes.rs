//! Exit codes following sysexits.h conventions.
//!
//! Scripts can tell a tampered video (65) apart from a missing input (66) or
//! a full disk (74) without parsing output.

use framemark_core::{EmbedError, VerifyError};

/// Successful execution, and for `verify`, no tampered frames.
pub const SUCCESS: i32 = 0;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (invalid arguments, bad configuration, no key).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (tampered frames found, no watermark recovered).
/// Maps to EX_DATAERR from sysexits.h.
pub const VERIFICATION_FAILED: i32 = 65;

/// Cannot open or read input frames.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// I/O error (cannot write output frames).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let code = classify_typed(err).unwrap_or_else(|| classify_message(&message));

        Self {
            code,
            message: Some(message),
        }
    }
}

/// Map library errors anywhere in the chain to an exit code.
fn classify_typed(err: &anyhow::Error) -> Option<i32> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<EmbedError>() {
            return Some(match e {
                EmbedError::InvalidText(_) | EmbedError::InvalidConfig(_) => USAGE_ERROR,
                EmbedError::SourceUnreadable(_)
                | EmbedError::SourceRead { .. }
                | EmbedError::NoFramesProcessed => INPUT_ERROR,
                EmbedError::SinkUnwritable(_) | EmbedError::SinkWrite { .. } => IO_ERROR,
            });
        }
        cause.downcast_ref::<VerifyError>().map(|e| match e {
            VerifyError::InvalidConfig(_) => USAGE_ERROR,
            VerifyError::SourceUnreadable(_) | VerifyError::NoFrames => INPUT_ERROR,
        })
    })
}

/// Fallback classification for errors raised by the CLI itself.
fn classify_message(message: &str) -> i32 {
    if message.contains("Failed to read") {
        INPUT_ERROR
    } else if message.contains("Verification failed")
        || message.contains("TAMPERED")
        || message.contains("No watermark")
    {
        VERIFICATION_FAILED
    } else if message.contains("No secret key") || message.contains("Invalid argument") {
        USAGE_ERROR
    } else if message.contains("Failed to write") || message.contains("serialize") {
        IO_ERROR
    } else {
        GENERAL_ERROR
    }
}
