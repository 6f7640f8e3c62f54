// Forbid accidental stdout/stderr writes in the library portion of the composer.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod app_event_sender;
mod attachment_store;
mod chat_composer;
mod draft;
mod error;
mod notification;
mod paste_path;
mod preview;
mod streaming;
mod submission;

pub use app_event::AppEvent;
pub use app_event_sender::AppEventSender;
pub use attachment_store::AddOutcome;
pub use attachment_store::AttachmentStore;
pub use chat_composer::ChatComposer;
pub use chat_composer::ChatComposerParams;
pub use draft::Draft;
pub use draft::DraftState;
pub use error::SubmissionError;
pub use error::ValidationError;
pub use notification::Notification;
pub use notification::NotificationSink;
pub use paste_path::normalize_pasted_path;
pub use paste_path::split_selected_paths;
pub use preview::BlobUrlRegistry;
pub use preview::PreviewHandle;
pub use preview::PreviewRegistry;
pub use preview::PreviewResourceManager;
pub use preview::PreviewUrl;
pub use streaming::StreamHandler;
pub use streaming::http::HttpHandlerConfig;
pub use streaming::http::HttpStreamHandler;
pub use submission::PendingSubmission;
pub use submission::SubmissionCoordinator;

pub use chat_composer_protocol as protocol;
