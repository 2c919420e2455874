//! Attachments linked to a client-details record.

use std::fmt::{Display, Formatter};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{AttachmentId, AttachmentName, ClientDetailId, TypeConstraintError};

pub const PDF: &str = "application/pdf";
pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";
pub const MS_WORD: &str = "application/msword";
pub const OOXML_WORD: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lower-cased extension after the last dot, if any.
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Content type inferred from the filename extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("pdf") => PDF,
        Some("jpg") | Some("jpeg") => JPEG,
        Some("png") => PNG,
        Some("doc") => MS_WORD,
        Some("docx") => OOXML_WORD,
        _ => OCTET_STREAM,
    }
}

/// Stable in-memory identity of an attachment, independent of persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentKey(Uuid);

impl AttachmentKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, TypeConstraintError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| TypeConstraintError::InvalidValue(value.to_string()))
    }
}

impl Default for AttachmentKey {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AttachmentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary content of an attachment together with its content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentBlob {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl AttachmentBlob {
    /// Wraps raw bytes, tagging them with the type implied by `filename`.
    pub fn from_bytes(filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type_for(filename),
            bytes,
        }
    }

    /// Decodes a base64 payload as stored by the backend.
    pub fn from_base64(filename: &str, payload: &str) -> Result<Self, TypeConstraintError> {
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| TypeConstraintError::InvalidPayload(filename.to_string()))?;
        Ok(Self::from_bytes(filename, bytes))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// File metadata as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: AttachmentId,
    pub filename: AttachmentName,
    /// Base64 content; only present when the backend inlines it.
    pub filedata: Option<String>,
    pub client_details_id: Option<ClientDetailId>,
}

/// An attachment as tracked by the details form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub key: AttachmentKey,
    /// Present once the backend has stored the file.
    pub id: Option<AttachmentId>,
    pub filename: AttachmentName,
    pub client_details_id: Option<ClientDetailId>,
    /// Declared size for pending uploads; blob length otherwise.
    pub size: u64,
    /// In-memory content used for preview and upload.
    pub blob: Option<AttachmentBlob>,
}

impl Attachment {
    /// A freshly selected file whose content may still be loading.
    pub fn pending(filename: AttachmentName, size: u64) -> Self {
        Self {
            key: AttachmentKey::new(),
            id: None,
            filename,
            client_details_id: None,
            size,
            blob: None,
        }
    }

    /// Rebuilds a previewable attachment from a stored file.
    pub fn hydrate(file: StoredFile) -> Result<Self, TypeConstraintError> {
        let blob = file
            .filedata
            .as_deref()
            .filter(|payload| !payload.trim().is_empty())
            .map(|payload| AttachmentBlob::from_base64(file.filename.as_str(), payload))
            .transpose()?;

        Ok(Self {
            key: AttachmentKey::new(),
            id: Some(file.id),
            size: blob.as_ref().map_or(0, |b| b.len() as u64),
            filename: file.filename,
            client_details_id: file.client_details_id,
            blob,
        })
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for(self.filename.as_str())
    }
}
