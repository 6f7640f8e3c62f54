//! Value types shared between the chat composer core and its front ends.
//!
//! Nothing in this crate performs network I/O; it only describes the files a user can stage, the
//! attachments the composer accepts, where a submission is addressed, and the payload handed to a
//! streaming handler.

pub mod attachment;
pub mod payload;
pub mod selection;

pub use attachment::Attachment;
pub use attachment::AttachmentId;
pub use attachment::FileCandidate;
pub use attachment::ImageMimeType;
pub use attachment::MAX_ATTACHMENTS;
pub use attachment::MAX_ATTACHMENT_BYTES;
pub use payload::FILES_FIELD;
pub use payload::MESSAGE_FIELD;
pub use payload::TransferPayload;
pub use selection::RunTarget;
pub use selection::Selection;
