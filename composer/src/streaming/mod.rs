//! Boundary between the composer and whatever transmits a submitted draft.

use async_trait::async_trait;
use chat_composer_protocol::RunTarget;
use chat_composer_protocol::TransferPayload;

use crate::error::SubmissionError;

pub mod http;

/// Transmits a packaged draft and streams back the response.
///
/// Cancellation and timeouts are the handler's business; the composer awaits whatever outcome it
/// reports and treats every error the same way.
#[async_trait]
pub trait StreamHandler: Send + Sync {
    async fn send_payload(
        &self,
        target: &RunTarget,
        payload: TransferPayload,
    ) -> Result<(), SubmissionError>;
}
