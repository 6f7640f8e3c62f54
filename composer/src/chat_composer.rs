//! The chat composer owns the live draft and is the boundary every user action goes through.
//!
//! It is responsible for:
//!
//! - Gating mutations on the current agent/team [`Selection`]: with neither selected, typing,
//!   attaching, removing and submitting are all ignored.
//! - Routing attachment rejections and failed sends to the [`NotificationSink`], one
//!   notification per event.
//! - Exposing whether the submit affordance is enabled. The busy flag is owned by the caller; the
//!   composer never serializes submissions on its own.
//!
//! # Submission ordering
//!
//! [`ChatComposer::submit`] clears the draft before it returns. Typing and attaching while a send
//! is in flight operate on the new, empty draft.

use std::sync::Arc;

use chat_composer_protocol::Attachment;
use chat_composer_protocol::FileCandidate;
use chat_composer_protocol::Selection;

use crate::attachment_store::AddOutcome;
use crate::draft::Draft;
use crate::draft::DraftState;
use crate::notification::Notification;
use crate::notification::NotificationSink;
use crate::preview::PreviewHandle;
use crate::preview::PreviewRegistry;
use crate::streaming::StreamHandler;
use crate::submission::PendingSubmission;
use crate::submission::SubmissionCoordinator;

pub struct ChatComposerParams {
    pub notifier: Arc<dyn NotificationSink>,
    pub handler: Arc<dyn StreamHandler>,
    pub preview_registry: Box<dyn PreviewRegistry>,
    pub selection: Selection,
}

pub struct ChatComposer {
    draft: Draft,
    selection: Selection,
    is_busy: bool,
    coordinator: SubmissionCoordinator,
    notifier: Arc<dyn NotificationSink>,
}

impl ChatComposer {
    pub fn new(params: ChatComposerParams) -> Self {
        let ChatComposerParams {
            notifier,
            handler,
            preview_registry,
            selection,
        } = params;
        Self {
            draft: Draft::new(preview_registry),
            selection,
            is_busy: false,
            coordinator: SubmissionCoordinator::new(handler, Arc::clone(&notifier)),
            notifier,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Whether the user can edit the draft at all.
    pub fn input_enabled(&self) -> bool {
        self.selection.is_active()
    }

    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    /// Mark whether a send is outstanding. While busy, only submission is disabled.
    pub fn set_busy(&mut self, busy: bool) {
        self.is_busy = busy;
    }

    pub fn can_submit(&self) -> bool {
        self.input_enabled() && !self.is_busy && !self.draft.is_blank()
    }

    pub fn text(&self) -> &str {
        self.draft.text()
    }

    pub fn draft_state(&self) -> DraftState {
        self.draft.state()
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.draft.attachments().attachments()
    }

    pub fn previews(&self) -> &[PreviewHandle] {
        self.draft.attachments().previews()
    }

    pub fn preview_registry(&self) -> &dyn PreviewRegistry {
        self.draft.attachments().preview_registry()
    }

    pub fn insert_str(&mut self, text: &str) -> bool {
        if !self.input_enabled() {
            tracing::debug!("ignoring input without an agent or team selected");
            return false;
        }
        self.draft.push_str(text);
        true
    }

    /// Replace the draft text.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        if !self.input_enabled() {
            tracing::debug!("ignoring input without an agent or team selected");
            return false;
        }
        self.draft.set_text(text);
        true
    }

    /// Stage the selected files. Each rejection, and an overflow past the attachment limit,
    /// produces one notification.
    pub fn attach(&mut self, candidates: impl IntoIterator<Item = FileCandidate>) -> AddOutcome {
        if !self.input_enabled() {
            tracing::debug!("ignoring attachments without an agent or team selected");
            return AddOutcome::default();
        }
        let outcome = self.draft.attachments_mut().add(candidates);
        for err in &outcome.errors {
            self.notifier.notify(Notification::Validation(err.clone()));
        }
        outcome
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        if !self.input_enabled() {
            return None;
        }
        self.draft.attachments_mut().remove(index)
    }

    pub fn clear_attachments(&mut self) -> bool {
        if !self.input_enabled() {
            return false;
        }
        self.draft.attachments_mut().clear();
        true
    }

    /// Submit the draft if the submit affordance is enabled.
    ///
    /// On success the draft is already empty when this returns; the caller drives the returned
    /// send and is expected to mark the composer busy until it settles.
    pub fn submit(&mut self) -> Option<PendingSubmission> {
        if self.is_busy {
            tracing::debug!("submit ignored while a send is outstanding");
            return None;
        }
        let target = self.selection.target()?;
        self.coordinator.submit(&mut self.draft, target)
    }
}
