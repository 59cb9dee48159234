use thiserror::Error;

/// Errors raised by the building blocks (frames, fingerprints, auth codes, config).
#[derive(Error, Debug)]
pub enum FramemarkError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid auth code length {requested}: must be between 1 and {max}")]
    InvalidLength { requested: usize, max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid secret key: {0}")]
    InvalidKey(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FramemarkError>;

/// Errors raised while building a payload for embedding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Watermark text must not contain the '{delimiter}' delimiter")]
    DelimiterInText { delimiter: char },

    #[error("Watermark text must not be empty")]
    EmptyText,

    #[error("Watermark text is {len} bytes, maximum is {max}")]
    TextTooLong { len: usize, max: usize },
}

/// Errors raised while splitting an extracted payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed payload: {reason}")]
    Malformed { reason: &'static str },
}

/// Errors reported by a watermark codec for a single frame.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Payload of {needed} bytes exceeds frame capacity of {capacity} bytes")]
    Capacity { needed: usize, capacity: usize },

    #[error("Extracted payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Codec error: {0}")]
    Other(String),

    #[error(transparent)]
    Frame(#[from] FramemarkError),
}

/// Fatal errors of an embedding run.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("Invalid watermark text: {0}")]
    InvalidText(#[from] PayloadError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Frame source could not be opened: {0}")]
    SourceUnreadable(#[source] FramemarkError),

    #[error("Frame sink could not be opened: {0}")]
    SinkUnwritable(#[source] FramemarkError),

    #[error("Failed to write frame {index}: {source}")]
    SinkWrite {
        index: u64,
        #[source]
        source: FramemarkError,
    },

    #[error("Failed to read frame {index}: {source}")]
    SourceRead {
        index: u64,
        #[source]
        source: FramemarkError,
    },

    #[error("Frame source yielded no frames")]
    NoFramesProcessed,
}

/// Fatal errors of a verification or extraction run.
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Frame source could not be opened: {0}")]
    SourceUnreadable(#[source] FramemarkError),

    #[error("Frame source yielded no frames")]
    NoFrames,
}
