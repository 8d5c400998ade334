use thiserror::Error;

/// Failures that are fatal to a single save container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Invalid save signature: expected {expected}, found {found}")]
    InvalidSignature { expected: String, found: String },

    #[error("Truncated header: expected {expected} bytes, file has {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("No compressed frames found after header")]
    NoFramesFound,

    #[error("Failed to decompress frame {frame_index}: {message}")]
    DecompressionFailure { frame_index: u32, message: String },

    #[error("Frame index {index} out of range ({count} frames)")]
    FrameIndexOutOfRange { index: u32, count: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("Anchor not found: {key:?}")]
    AnchorNotFound { key: String },

    #[error("Invalid expectations: {0}")]
    InvalidExpectations(String),

    #[error("Config parse error: {0}")]
    InvalidConfig(String),

    #[error("Read out of bounds at offset {offset:#x}: {message}")]
    ReadOutOfBounds { offset: usize, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn anchor_not_found(key: impl Into<String>) -> Self {
        Error::AnchorNotFound { key: key.into() }
    }

    pub fn decompression_failure(frame_index: u32, message: impl ToString) -> Self {
        Error::Container(ContainerError::DecompressionFailure {
            frame_index,
            message: message.to_string(),
        })
    }

    /// Process exit code for this error.
    ///
    /// Container failures get one code each so scripts can tell a foreign
    /// file from a corrupt one.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Io(_) => 2,
            Error::Container(ContainerError::InvalidSignature { .. }) => 3,
            Error::Container(ContainerError::TruncatedHeader { .. }) => 4,
            Error::Container(ContainerError::NoFramesFound) => 5,
            Error::Container(ContainerError::DecompressionFailure { .. })
            | Error::Container(ContainerError::FrameIndexOutOfRange { .. }) => 6,
            Error::AnchorNotFound { .. } => 7,
            Error::InvalidExpectations(_) | Error::InvalidConfig(_) | Error::Json(_) => 8,
            Error::Cancelled => 130,
            Error::ReadOutOfBounds { .. } => 1,
        }
    }

    /// Whether a batch run may skip the failing probe and continue.
    ///
    /// Everything tied to one input file qualifies: it could not be read,
    /// it is not a valid container, or it lacks the anchor.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::AnchorNotFound { .. }
                | Error::Container(_)
                | Error::ReadOutOfBounds { .. }
                | Error::Io(_)
        )
    }
}
