use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use path_absolutize::Absolutize;
use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

/// Maximum number of attachments a single draft may hold.
pub const MAX_ATTACHMENTS: usize = 5;

/// Largest accepted attachment, in bytes (10 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Mime type reported for files whose extension does not map to a known image format.
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Image formats the composer accepts as attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ImageMimeType {
    #[strum(serialize = "image/jpeg")]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[strum(serialize = "image/png")]
    #[serde(rename = "image/png")]
    Png,
    #[strum(serialize = "image/gif")]
    #[serde(rename = "image/gif")]
    Gif,
    #[strum(serialize = "image/webp")]
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMimeType {
    /// Parse an exact mime type string. Parameters (`;charset=...`) and case variations are not
    /// accepted, matching how browsers report `File.type`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Infer an image format from the file extension of `path`.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => Some(Self::Jpeg),
            Some("png") => Some(Self::Png),
            Some("gif") => Some(Self::Gif),
            Some("webp") => Some(Self::Webp),
            _ => None,
        }
    }
}

/// A file the user selected but which has not been validated yet.
///
/// The composer only looks at `name`, `mime_type` and `byte_size`; `path` is carried through so
/// the streaming handler can read the bytes when the draft is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub byte_size: u64,
    pub path: PathBuf,
}

impl FileCandidate {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        byte_size: u64,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            byte_size,
            path: path.into(),
        }
    }

    /// Describe a file on disk. The mime type comes from the extension, the size from metadata.
    ///
    /// Fails when the path does not exist or is not a regular file.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let path = path.absolutize()?.into_owned();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = ImageMimeType::from_extension(&path)
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| UNKNOWN_MIME_TYPE.to_string());
        Ok(Self {
            name,
            mime_type,
            byte_size: metadata.len(),
            path,
        })
    }
}

/// Stable identity of an accepted attachment.
///
/// Positions inside a draft shift when attachments are removed; ids never do and are never reused
/// by the store that minted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttachmentId(u64);

impl AttachmentId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "att-{}", self.0)
    }
}

/// A validated file staged in a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub mime_type: ImageMimeType,
    pub byte_size: u64,
    pub path: PathBuf,
}
