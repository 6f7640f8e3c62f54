//! Application-level events used to coordinate the composer with its front end.

use crate::notification::Notification;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Show a user-facing error.
    Notify(Notification),

    /// A piece of the streamed response for the submission in flight.
    ResponseChunk(String),

    /// The submission in flight settled. The front end clears its busy flag on this event so the
    /// submit affordance becomes available again.
    SubmissionFinished { succeeded: bool },
}
