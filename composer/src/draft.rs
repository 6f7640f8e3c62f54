use chat_composer_protocol::Attachment;

use crate::attachment_store::AttachmentStore;
use crate::preview::PreviewRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Empty,
    Composing,
}

/// The composer's unsent text plus its staged attachments.
#[derive(Debug)]
pub struct Draft {
    text: String,
    attachments: AttachmentStore,
}

impl Draft {
    pub fn new(registry: Box<dyn PreviewRegistry>) -> Self {
        Self {
            text: String::new(),
            attachments: AttachmentStore::new(registry),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut AttachmentStore {
        &mut self.attachments
    }

    pub fn state(&self) -> DraftState {
        if self.text.is_empty() && self.attachments.is_empty() {
            DraftState::Empty
        } else {
            DraftState::Composing
        }
    }

    /// True when there is nothing worth sending: whitespace-only text and no attachments.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    /// Reset to empty, returning the previous text and attachments.
    pub(crate) fn take(&mut self) -> (String, Vec<Attachment>) {
        let text = std::mem::take(&mut self.text);
        let attachments = self.attachments.take();
        (text, attachments)
    }
}
