//! Ephemeral preview resources for staged attachments.
//!
//! A [`PreviewResourceManager`] holds exactly one [`PreviewHandle`] per attachment in the draft,
//! in the same order. Handles are keyed by [`AttachmentId`], so an attachment that merely shifts
//! position keeps its handle; a handle is revoked exactly once, when its attachment leaves the
//! draft or when the manager is dropped.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use chat_composer_protocol::Attachment;
use chat_composer_protocol::AttachmentId;
use uuid::Uuid;

/// Revocable reference a renderer can use to display an attachment's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints and revokes preview URLs.
pub trait PreviewRegistry {
    fn create(&mut self, attachment: &Attachment) -> PreviewUrl;

    fn revoke(&mut self, url: &PreviewUrl);

    /// Location of the bytes behind a live URL. Revoked URLs resolve to `None`.
    fn resolve(&self, url: &PreviewUrl) -> Option<&Path>;
}

/// In-memory registry issuing `blob:` URLs, in the spirit of browser object URLs.
#[derive(Debug, Default)]
pub struct BlobUrlRegistry {
    live: HashMap<PreviewUrl, PathBuf>,
}

const BLOB_URL_PREFIX: &str = "blob:chat-composer/";

impl BlobUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl PreviewRegistry for BlobUrlRegistry {
    fn create(&mut self, attachment: &Attachment) -> PreviewUrl {
        let url = PreviewUrl::new(format!("{BLOB_URL_PREFIX}{}", Uuid::new_v4()));
        self.live.insert(url.clone(), attachment.path.clone());
        url
    }

    fn revoke(&mut self, url: &PreviewUrl) {
        if self.live.remove(url).is_none() {
            tracing::warn!("revoked unknown preview url {url}");
        }
    }

    fn resolve(&self, url: &PreviewUrl) -> Option<&Path> {
        self.live.get(url).map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub attachment_id: AttachmentId,
    pub url: PreviewUrl,
}

pub struct PreviewResourceManager {
    registry: Box<dyn PreviewRegistry>,
    handles: Vec<PreviewHandle>,
}

impl PreviewResourceManager {
    pub fn new(registry: Box<dyn PreviewRegistry>) -> Self {
        Self {
            registry,
            handles: Vec::new(),
        }
    }

    /// Handles aligned with the attachments passed to the last [`sync`](Self::sync).
    pub fn handles(&self) -> &[PreviewHandle] {
        &self.handles
    }

    pub fn registry(&self) -> &dyn PreviewRegistry {
        self.registry.as_ref()
    }

    /// Reconcile held handles with `attachments`.
    ///
    /// Attachments that already own a handle keep it, new attachments get a fresh one, and every
    /// handle whose attachment is gone is revoked.
    pub fn sync(&mut self, attachments: &[Attachment]) {
        let mut previous = std::mem::take(&mut self.handles);
        let mut next = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            match previous
                .iter()
                .position(|handle| handle.attachment_id == attachment.id)
            {
                Some(pos) => next.push(previous.swap_remove(pos)),
                None => {
                    let url = self.registry.create(attachment);
                    tracing::trace!("created preview {url} for {}", attachment.id);
                    next.push(PreviewHandle {
                        attachment_id: attachment.id,
                        url,
                    });
                }
            }
        }

        self.handles = next;
        for retired in previous {
            self.revoke(retired);
        }
    }

    /// Revoke every outstanding handle.
    pub fn release_all(&mut self) {
        for handle in std::mem::take(&mut self.handles) {
            self.revoke(handle);
        }
    }

    fn revoke(&mut self, handle: PreviewHandle) {
        tracing::trace!("revoking preview {} for {}", handle.url, handle.attachment_id);
        self.registry.revoke(&handle.url);
    }
}

impl Drop for PreviewResourceManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for PreviewResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewResourceManager")
            .field("handles", &self.handles)
            .finish_non_exhaustive()
    }
}
