//! Error types for the normalization engine

use std::fmt;
use thiserror::Error;

/// Result type for normalization operations
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// External transcoding step a collaborator failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscodeStage {
    /// Source container -> raw PCM
    Decode,
    /// Raw PCM -> source container
    Encode,
}

impl fmt::Display for TranscodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => write!(f, "decode"),
            Self::Encode => write!(f, "encode"),
        }
    }
}

/// Errors that can occur while normalizing a file or running a batch
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The raw PCM file does not have the expected layout
    #[error("Invalid sample stream: {0}")]
    Format(String),

    /// The external transcoder exited unsuccessfully
    ///
    /// `diagnostic` is the subprocess's stderr, unmodified.
    #[error("{stage} failed: {diagnostic}")]
    Collaborator {
        stage: TranscodeStage,
        diagnostic: String,
    },

    /// The external transcoder did not finish in time and was killed
    #[error("{stage} timed out after {seconds} s")]
    Timeout { stage: TranscodeStage, seconds: u64 },

    /// Invalid engine configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Task(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NormalizeError {
    pub(crate) fn odd_sample_bytes(len: u64) -> Self {
        Self::Format(format!(
            "odd number of bytes ({}) in int16 sample stream",
            len
        ))
    }

    /// Whether this error is scoped to a single file's data layout
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}

impl From<tokio::task::JoinError> for NormalizeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
