use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitterError {
    /// Source image unreadable or has zero area.
    #[error("Decode error: {0}")]
    Decode(String),
    /// A pixel buffer could not be resized or serialized to the output format.
    #[error("Encoding error: {0}")]
    Encode(String),
    /// Archive assembly failed; no partial archive is returned.
    #[error("Packaging error: {0}")]
    Packaging(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse classification of [`SplitterError`] for callers that only need to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    Encode,
    Packaging,
    InvalidInput,
}

impl SplitterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Packaging(_) => ErrorKind::Packaging,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitterError>;
