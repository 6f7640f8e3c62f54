//! Ordered, capacity-limited list of validated attachments.

use chat_composer_protocol::Attachment;
use chat_composer_protocol::AttachmentId;
use chat_composer_protocol::FileCandidate;
use chat_composer_protocol::ImageMimeType;
use chat_composer_protocol::MAX_ATTACHMENT_BYTES;
use chat_composer_protocol::MAX_ATTACHMENTS;

use crate::error::ValidationError;
use crate::preview::PreviewHandle;
use crate::preview::PreviewRegistry;
use crate::preview::PreviewResourceManager;

/// Result of [`AttachmentStore::add`]. Rejections are listed in the order they occurred, with at
/// most one trailing [`ValidationError::TooMany`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub accepted: usize,
    pub errors: Vec<ValidationError>,
}

#[derive(Debug)]
pub struct AttachmentStore {
    attachments: Vec<Attachment>,
    previews: PreviewResourceManager,
    next_id: u64,
}

impl AttachmentStore {
    pub fn new(registry: Box<dyn PreviewRegistry>) -> Self {
        Self {
            attachments: Vec::new(),
            previews: PreviewResourceManager::new(registry),
            next_id: 0,
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Preview handles, positionally aligned with [`attachments`](Self::attachments).
    pub fn previews(&self) -> &[PreviewHandle] {
        self.previews.handles()
    }

    pub fn preview_registry(&self) -> &dyn PreviewRegistry {
        self.previews.registry()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    /// Validate `candidates` in order and append the accepted ones.
    ///
    /// When the combined list would exceed [`MAX_ATTACHMENTS`], the earliest attachments win and
    /// the surplus is dropped.
    pub fn add(&mut self, candidates: impl IntoIterator<Item = FileCandidate>) -> AddOutcome {
        let mut outcome = AddOutcome::default();
        let mut accepted = Vec::new();

        for candidate in candidates {
            match validate(&candidate) {
                Ok(mime_type) => accepted.push(self.accept(candidate, mime_type)),
                Err(err) => {
                    tracing::warn!("rejected attachment: {err}");
                    outcome.errors.push(err);
                }
            }
        }

        if accepted.is_empty() {
            return outcome;
        }

        let room = MAX_ATTACHMENTS.saturating_sub(self.attachments.len());
        if accepted.len() > room {
            let dropped = accepted.len() - room;
            accepted.truncate(room);
            tracing::warn!("dropped {dropped} attachment(s) over the limit of {MAX_ATTACHMENTS}");
            outcome.errors.push(ValidationError::TooMany {
                max: MAX_ATTACHMENTS,
                dropped,
            });
        }

        outcome.accepted = accepted.len();
        if !accepted.is_empty() {
            for attachment in &accepted {
                tracing::debug!("attached {} ({})", attachment.name, attachment.id);
            }
            self.attachments.extend(accepted);
            self.previews.sync(&self.attachments);
        }
        outcome
    }

    /// Remove the attachment at `index`; later attachments shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        if index >= self.attachments.len() {
            return None;
        }
        let removed = self.attachments.remove(index);
        tracing::debug!("removed {} ({})", removed.name, removed.id);
        self.previews.sync(&self.attachments);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.take();
    }

    /// Empty the store, returning what it held. Previews of the returned attachments are revoked.
    pub fn take(&mut self) -> Vec<Attachment> {
        if self.attachments.is_empty() {
            return Vec::new();
        }
        let taken = std::mem::take(&mut self.attachments);
        self.previews.sync(&self.attachments);
        taken
    }

    fn accept(&mut self, candidate: FileCandidate, mime_type: ImageMimeType) -> Attachment {
        let id = AttachmentId::new(self.next_id);
        self.next_id += 1;
        Attachment {
            id,
            name: candidate.name,
            mime_type,
            byte_size: candidate.byte_size,
            path: candidate.path,
        }
    }
}

fn validate(candidate: &FileCandidate) -> Result<ImageMimeType, ValidationError> {
    let Some(mime_type) = ImageMimeType::from_mime(&candidate.mime_type) else {
        return Err(ValidationError::UnsupportedType {
            name: candidate.name.clone(),
            mime_type: candidate.mime_type.clone(),
        });
    };
    if candidate.byte_size > MAX_ATTACHMENT_BYTES {
        return Err(ValidationError::TooLarge {
            name: candidate.name.clone(),
            byte_size: candidate.byte_size,
        });
    }
    Ok(mime_type)
}
