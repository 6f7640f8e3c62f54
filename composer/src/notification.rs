use std::fmt;

use crate::error::SubmissionError;
use crate::error::ValidationError;

/// A user-facing error surfaced by the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Validation(ValidationError),
    Submission(SubmissionError),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Validation(err) => write!(f, "{err}"),
            Notification::Submission(err) => write!(f, "Failed to send message: {err}"),
        }
    }
}

/// Receives one notification per distinct error event. Fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages_name_the_offending_file() {
        let unsupported = Notification::Validation(ValidationError::UnsupportedType {
            name: "doc.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        });
        let too_large = Notification::Validation(ValidationError::TooLarge {
            name: "huge.png".to_string(),
            byte_size: 11 * 1024 * 1024,
        });
        let too_many = Notification::Validation(ValidationError::TooMany { max: 5, dropped: 2 });

        assert_eq!(unsupported.to_string(), "Unsupported file type: doc.pdf");
        assert_eq!(too_large.to_string(), "File too large (max 10MB): huge.png");
        assert_eq!(too_many.to_string(), "Up to 5 images allowed");
    }

    #[test]
    fn submission_failures_carry_the_reason() {
        let rejected = Notification::Submission(SubmissionError::Rejected {
            status: 503,
            reason: "overloaded".to_string(),
        });
        assert_eq!(
            rejected.to_string(),
            "Failed to send message: server responded with status 503: overloaded"
        );

        let transport = Notification::Submission(SubmissionError::Transport(
            "connection refused".to_string(),
        ));
        assert_eq!(
            transport.to_string(),
            "Failed to send message: connection refused"
        );
    }
}
