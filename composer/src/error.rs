use thiserror::Error;

/// Why a selected file did not make it into the draft.
///
/// These never escape the attachment store as faults: each one becomes a single notification
/// while the valid remainder of the selection is still committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported file type: {name}")]
    UnsupportedType { name: String, mime_type: String },

    #[error("File too large (max 10MB): {name}")]
    TooLarge { name: String, byte_size: u64 },

    /// Emitted once per `add` call, however many candidates were dropped.
    #[error("Up to {max} images allowed")]
    TooMany { max: usize, dropped: usize },
}

/// Failure reported by a streaming handler for a submitted draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Transport(String),

    #[error("server responded with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("failed to read attachment {name}: {reason}")]
    ReadAttachment { name: String, reason: String },

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("invalid {kind} id: {id:?}")]
    InvalidTarget { kind: &'static str, id: String },

    /// The send task died without producing a result.
    #[error("the send was interrupted")]
    Interrupted,
}
