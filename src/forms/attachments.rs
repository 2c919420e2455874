//! Attachment bookkeeping for the details form.
//!
//! [`AttachmentSet`] keeps two views in sync: the preview list shown to the
//! user (persisted and pending attachments) and the form's file list, i.e.
//! the pending uploads that go out with the next submission.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::domain::attachment::{Attachment, AttachmentBlob, AttachmentKey, StoredFile, extension};
use crate::domain::types::{AttachmentId, AttachmentName, TypeConstraintError};

/// Largest accepted attachment (5 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Extensions the backend accepts, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Metadata of a file picked by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
        }
    }
}

/// Why a selected file was not attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileRejection {
    InvalidType(String),
    TooLarge(String),
    Duplicate(String),
}

impl Display for FileRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FileRejection::InvalidType(name) => {
                write!(f, "File \"{name}\" is invalid: Invalid file type.")
            }
            FileRejection::TooLarge(name) => write!(
                f,
                "File \"{name}\" is invalid: File size exceeds the maximum limit of 5 MB."
            ),
            FileRejection::Duplicate(name) => write!(
                f,
                "File \"{name}\" is already present. Cannot upload again with the same name."
            ),
        }
    }
}

/// Result of one selection event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// Keys of the accepted files, in selection order.
    pub accepted: Vec<(AttachmentKey, String)>,
    pub rejections: Vec<FileRejection>,
}

impl SelectionOutcome {
    /// All rejections of the event folded into one user-facing message.
    pub fn combined_message(&self) -> Option<String> {
        if self.rejections.is_empty() {
            return None;
        }
        let lines = self
            .rejections
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!("The following files are not acceptable:\n{lines}"))
    }
}

/// What removing an attachment requires from the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// Nothing was stored remotely.
    LocalOnly,
    /// The stored file must be deleted as well.
    Remote(AttachmentId),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttachmentSet {
    items: Vec<Attachment>,
    pending: Vec<AttachmentKey>,
    added_this_session: HashSet<AttachmentKey>,
}

impl AttachmentSet {
    /// Builds the set for an existing record, decoding inline payloads.
    pub fn hydrate(files: Vec<StoredFile>) -> Result<Self, TypeConstraintError> {
        let items = files
            .into_iter()
            .map(Attachment::hydrate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            items,
            ..Self::default()
        })
    }

    fn check(&self, file: &SelectedFile) -> Result<AttachmentName, FileRejection> {
        let allowed = extension(&file.filename)
            .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
        if !allowed {
            return Err(FileRejection::InvalidType(file.filename.clone()));
        }
        if file.size > MAX_ATTACHMENT_BYTES {
            return Err(FileRejection::TooLarge(file.filename.clone()));
        }
        if self
            .items
            .iter()
            .any(|item| item.filename.as_str() == file.filename.trim())
        {
            return Err(FileRejection::Duplicate(file.filename.clone()));
        }
        AttachmentName::new(file.filename.as_str())
            .map_err(|_| FileRejection::InvalidType(file.filename.clone()))
    }

    /// Applies one selection event, accepting or rejecting each file on its own.
    pub fn select(&mut self, files: Vec<SelectedFile>) -> SelectionOutcome {
        let mut outcome = SelectionOutcome::default();

        for file in files {
            match self.check(&file) {
                Ok(name) => {
                    let attachment = Attachment::pending(name, file.size);
                    let key = attachment.key;
                    self.items.push(attachment);
                    self.pending.push(key);
                    self.added_this_session.insert(key);
                    outcome.accepted.push((key, file.filename));
                }
                Err(rejection) => outcome.rejections.push(rejection),
            }
        }

        outcome
    }

    /// Stores the content read for a pending attachment.
    ///
    /// Returns `false` when the attachment was removed in the meantime.
    pub fn attach_content(&mut self, key: AttachmentKey, blob: AttachmentBlob) -> bool {
        match self.items.iter_mut().find(|item| item.key == key) {
            Some(item) => {
                item.size = blob.len() as u64;
                item.blob = Some(blob);
                true
            }
            None => false,
        }
    }

    /// What removing `key` would require, without removing it.
    ///
    /// Persisted attachments that were not added in this session need a
    /// remote delete; everything else is local.
    pub fn removal_for(&self, key: AttachmentKey) -> Option<Removal> {
        let item = self.get(key)?;
        Some(match item.id {
            Some(id) if !self.is_session_new(key) => Removal::Remote(id),
            _ => Removal::LocalOnly,
        })
    }

    /// Drops the attachment from both views.
    pub fn remove(&mut self, key: AttachmentKey) -> Option<Removal> {
        let removal = self.removal_for(key)?;
        self.items.retain(|item| item.key != key);
        self.pending.retain(|pending| *pending != key);
        self.added_this_session.remove(&key);
        Some(removal)
    }

    /// Forgets which files were added in this session.
    pub fn end_session(&mut self) {
        self.added_this_session.clear();
        self.pending.clear();
    }

    /// Drops every upload not yet sent to the backend. Persisted files stay.
    pub fn discard_pending(&mut self) {
        for key in std::mem::take(&mut self.pending) {
            self.items.retain(|item| item.key != key);
            self.added_this_session.remove(&key);
        }
    }

    pub fn get(&self, key: AttachmentKey) -> Option<&Attachment> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn find_persisted(&self, id: AttachmentId) -> Option<&Attachment> {
        self.items.iter().find(|item| item.id == Some(id))
    }

    /// Preview list in display order.
    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    /// Pending uploads in selection order.
    pub fn pending_uploads(&self) -> impl Iterator<Item = &Attachment> {
        self.pending.iter().filter_map(|key| self.get(*key))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_session_new(&self, key: AttachmentKey) -> bool {
        self.added_this_session.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ClientDetailId;

    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;

    fn stored(id: i32, name: &str) -> StoredFile {
        StoredFile {
            id: AttachmentId::new(id).expect("valid id"),
            filename: AttachmentName::new(name).expect("valid name"),
            filedata: None,
            client_details_id: ClientDetailId::new(1).ok(),
        }
    }

    #[test]
    fn oversized_pdf_is_rejected() {
        let mut set = AttachmentSet::default();

        let outcome = set.select(vec![SelectedFile::new("big.pdf", 6 * MIB)]);

        assert!(outcome.accepted.is_empty());
        assert_eq!(
            outcome.rejections,
            vec![FileRejection::TooLarge("big.pdf".to_string())]
        );
        assert!(set.items().is_empty());
    }

    #[test]
    fn small_png_is_accepted_into_both_views() {
        let mut set = AttachmentSet::default();

        let outcome = set.select(vec![SelectedFile::new("logo.png", KIB)]);

        assert_eq!(outcome.accepted.len(), 1);
        assert!(outcome.rejections.is_empty());
        assert_eq!(set.items().len(), 1);
        assert_eq!(set.pending_count(), 1);
        assert!(set.is_session_new(outcome.accepted[0].0));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut set = AttachmentSet::hydrate(vec![stored(3, "cv.pdf")]).expect("valid files");

        let outcome = set.select(vec![
            SelectedFile::new("cv.pdf", KIB),
            SelectedFile::new("photo.jpg", KIB),
            SelectedFile::new("photo.jpg", KIB),
        ]);

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(
            outcome.rejections,
            vec![
                FileRejection::Duplicate("cv.pdf".to_string()),
                FileRejection::Duplicate("photo.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let mut set = AttachmentSet::default();

        let outcome = set.select(vec![
            SelectedFile::new("SCAN.JPEG", KIB),
            SelectedFile::new("script.exe", KIB),
            SelectedFile::new("noextension", KIB),
        ]);

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejections.len(), 2);
    }

    #[test]
    fn rejections_are_combined_into_one_message() {
        let mut set = AttachmentSet::default();

        let outcome = set.select(vec![
            SelectedFile::new("a.exe", KIB),
            SelectedFile::new("b.pdf", 6 * MIB),
        ]);

        assert_eq!(
            outcome.combined_message().as_deref(),
            Some(
                "The following files are not acceptable:\n\
                 File \"a.exe\" is invalid: Invalid file type.\n\
                 File \"b.pdf\" is invalid: File size exceeds the maximum limit of 5 MB."
            )
        );
    }

    #[test]
    fn exactly_five_mebibytes_is_allowed() {
        let mut set = AttachmentSet::default();

        let outcome = set.select(vec![SelectedFile::new("edge.pdf", 5 * MIB)]);

        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn removing_a_persisted_file_needs_remote_delete() {
        let mut set = AttachmentSet::hydrate(vec![stored(3, "cv.pdf")]).expect("valid files");
        let key = set.items()[0].key;

        assert_eq!(
            set.remove(key),
            Some(Removal::Remote(AttachmentId::new(3).expect("valid id")))
        );
        assert!(set.items().is_empty());
        assert_eq!(set.remove(key), None);
    }

    #[test]
    fn removing_a_pending_file_is_local() {
        let mut set = AttachmentSet::default();
        let outcome = set.select(vec![SelectedFile::new("logo.png", KIB)]);
        let key = outcome.accepted[0].0;

        assert_eq!(set.remove(key), Some(Removal::LocalOnly));
        assert_eq!(set.pending_count(), 0);
    }

    #[test]
    fn content_for_removed_attachment_is_dropped() {
        let mut set = AttachmentSet::default();
        let key = set.select(vec![SelectedFile::new("logo.png", KIB)]).accepted[0].0;
        set.remove(key);

        let attached = set.attach_content(key, AttachmentBlob::from_bytes("logo.png", vec![1]));

        assert!(!attached);
    }

    #[test]
    fn discarding_pending_keeps_persisted_files() {
        let mut set = AttachmentSet::hydrate(vec![stored(3, "cv.pdf")]).expect("valid files");
        let key = set.select(vec![SelectedFile::new("logo.png", KIB)]).accepted[0].0;

        set.discard_pending();

        assert_eq!(set.items().len(), 1);
        assert_eq!(set.items()[0].filename.as_str(), "cv.pdf");
        assert_eq!(set.pending_count(), 0);
        assert!(!set.is_session_new(key));
    }
}
