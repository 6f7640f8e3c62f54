//! Turning a draft into an in-flight send.
//!
//! [`SubmissionCoordinator::submit`] is the only place a draft is consumed. It snapshots and
//! clears the draft synchronously and only then hands back a [`PendingSubmission`]; the pending
//! send owns its snapshot, so nothing the user does to the (already empty) draft afterwards can
//! reach the payload. A failed send is reported once and never restores the draft.

use std::sync::Arc;

use chat_composer_protocol::RunTarget;
use chat_composer_protocol::TransferPayload;
use tokio::task::JoinHandle;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::draft::Draft;
use crate::error::SubmissionError;
use crate::notification::Notification;
use crate::notification::NotificationSink;
use crate::streaming::StreamHandler;

#[derive(Clone)]
pub struct SubmissionCoordinator {
    handler: Arc<dyn StreamHandler>,
    notifier: Arc<dyn NotificationSink>,
}

impl SubmissionCoordinator {
    pub fn new(handler: Arc<dyn StreamHandler>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self { handler, notifier }
    }

    /// Snapshot and clear `draft`, returning the send to perform.
    ///
    /// Returns `None` without touching the draft when it is blank.
    pub fn submit(&self, draft: &mut Draft, target: RunTarget) -> Option<PendingSubmission> {
        if draft.is_blank() {
            return None;
        }
        let (message, files) = draft.take();
        tracing::debug!(
            "submitting {} char(s) and {} attachment(s) to {target:?}",
            message.chars().count(),
            files.len()
        );
        Some(PendingSubmission {
            target,
            payload: TransferPayload::new(message, files),
            handler: Arc::clone(&self.handler),
            notifier: Arc::clone(&self.notifier),
        })
    }
}

/// A submitted draft that has not been sent yet.
pub struct PendingSubmission {
    target: RunTarget,
    payload: TransferPayload,
    handler: Arc<dyn StreamHandler>,
    notifier: Arc<dyn NotificationSink>,
}

impl PendingSubmission {
    pub fn target(&self) -> &RunTarget {
        &self.target
    }

    pub fn payload(&self) -> &TransferPayload {
        &self.payload
    }

    /// Deliver the payload. On failure exactly one notification is emitted; there is no retry.
    pub async fn send(self) -> Result<(), SubmissionError> {
        let Self {
            target,
            payload,
            handler,
            notifier,
        } = self;
        match handler.send_payload(&target, payload).await {
            Ok(()) => {
                tracing::debug!("submission to {target:?} completed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!("submission to {target:?} failed: {err}");
                notifier.notify(Notification::Submission(err.clone()));
                Err(err)
            }
        }
    }

    /// Run [`send`](Self::send) on its own task and post
    /// [`AppEvent::SubmissionFinished`] when it settles.
    ///
    /// `SubmissionFinished` is posted even if the handler panics; that case is reported as a
    /// single [`SubmissionError::Interrupted`] notification.
    pub fn spawn(self, app_event_tx: AppEventSender) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let succeeded = match tokio::spawn(self.send()).await {
                Ok(result) => result.is_ok(),
                Err(err) => {
                    tracing::error!("submission task failed: {err}");
                    notifier.notify(Notification::Submission(SubmissionError::Interrupted));
                    false
                }
            };
            app_event_tx.send(AppEvent::SubmissionFinished { succeeded });
        })
    }
}

impl std::fmt::Debug for PendingSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSubmission")
            .field("target", &self.target)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}
