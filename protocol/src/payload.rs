use serde::Deserialize;
use serde::Serialize;

use crate::attachment::Attachment;

/// Multipart field carrying the UTF-8 message text.
pub const MESSAGE_FIELD: &str = "message";

/// Repeated multipart field carrying one binary entry per attachment.
pub const FILES_FIELD: &str = "files";

/// Snapshot of a draft packaged for transfer.
///
/// On the wire this is a multipart body with one `message` text part followed by one `files`
/// part per attachment, in the order the attachments appeared in the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub message: String,
    pub files: Vec<Attachment>,
}

/// One multipart entry of a [`TransferPayload`], borrowed from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadPart<'a> {
    Text {
        field: &'static str,
        value: &'a str,
    },
    File {
        field: &'static str,
        attachment: &'a Attachment,
    },
}

impl TransferPayload {
    pub fn new(message: String, files: Vec<Attachment>) -> Self {
        Self { message, files }
    }

    /// Multipart entries in wire order.
    pub fn parts(&self) -> impl Iterator<Item = PayloadPart<'_>> {
        std::iter::once(PayloadPart::Text {
            field: MESSAGE_FIELD,
            value: self.message.as_str(),
        })
        .chain(self.files.iter().map(|attachment| PayloadPart::File {
            field: FILES_FIELD,
            attachment,
        }))
    }

    /// Sum of all attachment sizes, in bytes.
    pub fn total_file_bytes(&self) -> u64 {
        self.files.iter().map(|file| file.byte_size).sum()
    }
}
