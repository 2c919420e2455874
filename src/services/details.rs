//! Details form controller: wires the form reducer to the backend.

use chrono::NaiveDate;
use futures::future::join_all;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::attachment::{AttachmentBlob, AttachmentKey};
use crate::domain::client_detail::ClientDetail;
use crate::domain::reference::{Client, State};
use crate::domain::types::{AttachmentId, ClientDetailId};
use crate::forms::attachments::{Removal, SelectedFile};
use crate::forms::details::{DetailsEvent, DetailsFormState, FormMode, apply_event};
use crate::forms::upload::PendingFile;
use crate::repository::{ClientDetailsWriter, FileReader, FileWriter, ReferenceReader};
use crate::services::preview::PreviewRegistry;
use crate::services::{ServiceError, ServiceResult};

pub const UPDATED_MESSAGE: &str = "Details updated successfully.";
pub const CREATED_MESSAGE: &str = "Details and files added successfully.";

/// Choices offered by the client and state selects.
#[derive(Debug, Default)]
pub struct ReferenceData {
    pub clients: Vec<Client>,
    pub states: Vec<State>,
}

/// Background read of one selected file.
struct ContentRead {
    key: AttachmentKey,
    filename: String,
    handle: JoinHandle<std::io::Result<Vec<u8>>>,
}

pub struct DetailsController<'a, R: ?Sized> {
    repo: &'a R,
    state: DetailsFormState,
    reads: Vec<ContentRead>,
}

impl<'a, R: ?Sized> DetailsController<'a, R> {
    /// Blank form for a new record.
    pub fn create(repo: &'a R, reference_date: NaiveDate) -> Self {
        Self::with_state(repo, DetailsFormState::create(reference_date))
    }

    /// Form pre-filled from `record`.
    pub fn edit(repo: &'a R, record: &ClientDetail, reference_date: NaiveDate) -> ServiceResult<Self> {
        let state = DetailsFormState::edit(record, reference_date).map_err(|err| {
            log::error!("Failed to hydrate attachments of {}: {err}", record.id);
            err
        })?;
        Ok(Self::with_state(repo, state))
    }

    fn with_state(repo: &'a R, state: DetailsFormState) -> Self {
        Self {
            repo,
            state,
            reads: Vec::new(),
        }
    }

    pub fn state(&self) -> &DetailsFormState {
        &self.state
    }

    pub fn dispatch(&mut self, event: DetailsEvent) {
        let reference_date = self.state.reference_date;
        let state = std::mem::replace(&mut self.state, DetailsFormState::create(reference_date));
        self.state = apply_event(state, event);
    }

    /// Applies a file selection and starts reading every accepted file.
    ///
    /// Returns the combined rejection notice, if any file was refused.
    pub fn select_files(&mut self, files: Vec<PendingFile>) -> Option<String> {
        let selected = files
            .iter()
            .map(|file| SelectedFile::new(file.filename.clone(), file.size))
            .collect();
        self.dispatch(DetailsEvent::FilesSelected(selected));

        let mut remaining = files;
        for (key, filename) in self.state.last_selection.accepted.clone() {
            let Some(position) = remaining.iter().position(|file| file.filename == filename) else {
                continue;
            };
            let file = remaining.swap_remove(position);
            let path = file.path;
            self.reads.push(ContentRead {
                key,
                filename: file.filename,
                handle: tokio::spawn(async move { tokio::fs::read(path).await }),
            });
        }

        self.state.file_notice.clone()
    }

    /// Waits for outstanding reads and attaches their content.
    ///
    /// Files that could not be read are removed from the form; their names
    /// are returned.
    pub async fn settle_reads(&mut self) -> Vec<String> {
        let (files, handles): (Vec<_>, Vec<_>) = std::mem::take(&mut self.reads)
            .into_iter()
            .map(|read| ((read.key, read.filename), read.handle))
            .unzip();

        let mut unreadable = Vec::new();
        for ((key, filename), joined) in files.into_iter().zip(join_all(handles).await) {
            match joined
                .map_err(|err| std::io::Error::other(err.to_string()))
                .and_then(|read| read)
            {
                Ok(bytes) => self.dispatch(DetailsEvent::AttachmentContentLoaded {
                    key,
                    blob: AttachmentBlob::from_bytes(&filename, bytes),
                }),
                Err(err) => {
                    log::error!("Failed to read attachment {filename}: {err}");
                    self.dispatch(DetailsEvent::AttachmentRemoved(key));
                    unreadable.push(filename);
                }
            }
        }
        unreadable
    }

    /// Drops uploads that were not saved, since a re-rendered form cannot
    /// carry them. Returns a notice asking to select them again.
    pub fn discard_pending_uploads(&mut self) -> Option<String> {
        let names: Vec<String> = self
            .state
            .attachments
            .pending_uploads()
            .map(|attachment| attachment.filename.to_string())
            .collect();
        self.dispatch(DetailsEvent::PendingUploadsDiscarded);

        (!names.is_empty())
            .then(|| format!("Please select these files again: {}.", names.join(", ")))
    }

    /// Registers a preview link for the attachment's content.
    pub fn preview(&self, key: AttachmentKey, registry: &PreviewRegistry) -> ServiceResult<Uuid> {
        let blob = self
            .state
            .attachments
            .get(key)
            .and_then(|attachment| attachment.blob.clone())
            .ok_or_else(|| {
                log::error!("No content to preview for attachment {key}");
                ServiceError::NotFound
            })?;
        Ok(registry.register(blob))
    }

    /// Key of the persisted attachment with `id`.
    pub fn attachment_key(&self, id: AttachmentId) -> ServiceResult<AttachmentKey> {
        self.state
            .attachments
            .find_persisted(id)
            .map(|attachment| attachment.key)
            .ok_or(ServiceError::NotFound)
    }
}

impl<'a, R> DetailsController<'a, R>
where
    R: FileReader + ?Sized,
{
    /// Edit form for `id` with its stored files and blank fields, to be
    /// filled from posted values.
    pub async fn resume_edit(
        repo: &'a R,
        id: ClientDetailId,
        reference_date: NaiveDate,
    ) -> ServiceResult<Self> {
        let files = repo.list_files(id).await.map_err(|err| {
            log::error!("Failed to fetch files of {id}: {err}");
            err
        })?;
        let state = DetailsFormState::resume_edit(id, files, reference_date)?;
        Ok(Self::with_state(repo, state))
    }
}

impl<'a, R> DetailsController<'a, R>
where
    R: ReferenceReader + ?Sized,
{
    /// Fetches the select choices; clients also preselect in create mode.
    pub async fn load_reference_data(&mut self) -> ServiceResult<ReferenceData> {
        let clients = self.repo.list_clients().await.map_err(|err| {
            log::error!("Error fetching clients: {err}");
            err
        })?;
        let states = self.repo.list_states().await.map_err(|err| {
            log::error!("Error fetching states: {err}");
            err
        })?;

        self.dispatch(DetailsEvent::ClientsLoaded(
            clients.iter().map(|client| client.id).collect(),
        ));

        Ok(ReferenceData { clients, states })
    }
}

impl<'a, R> DetailsController<'a, R>
where
    R: FileWriter + ?Sized,
{
    /// Removes the attachment locally, then remotely when it is stored.
    ///
    /// The local removal stands even when the remote delete fails.
    pub async fn delete_attachment(&mut self, key: AttachmentKey) -> ServiceResult<Removal> {
        let removal = self
            .state
            .attachments
            .removal_for(key)
            .ok_or(ServiceError::NotFound)?;
        self.dispatch(DetailsEvent::AttachmentRemoved(key));

        if let Removal::Remote(id) = removal {
            self.repo.delete_file(id).await.map_err(|err| {
                log::error!("Error deleting file {id}: {err}");
                ServiceError::from(err)
            })?;
        }

        Ok(removal)
    }
}

impl<'a, R> DetailsController<'a, R>
where
    R: ClientDetailsWriter + ?Sized,
{
    /// Validates and sends the form; returns the success message.
    pub async fn submit(&mut self) -> ServiceResult<&'static str> {
        let unreadable = self.settle_reads().await;
        if !unreadable.is_empty() {
            return Err(ServiceError::Form(format!(
                "Could not read {}. Please select the files again.",
                unreadable.join(", ")
            )));
        }

        let payload = self.state.multipart().map_err(|err| {
            log::error!("Form is invalid: {err}");
            ServiceError::from(err)
        })?;

        let message = match self.state.mode {
            FormMode::Edit => {
                let id = self.state.edit_id.ok_or_else(|| {
                    ServiceError::Form("This record was already saved.".to_string())
                })?;
                self.repo
                    .update_client_details(id, payload)
                    .await
                    .map_err(|err| {
                        log::error!("Error updating client details {id}: {err}");
                        ServiceError::from(err)
                    })?;
                UPDATED_MESSAGE
            }
            FormMode::Create => {
                self.repo
                    .create_client_details(payload)
                    .await
                    .map_err(|err| {
                        log::error!("Error creating client details: {err}");
                        ServiceError::from(err)
                    })?;
                CREATED_MESSAGE
            }
        };

        self.dispatch(DetailsEvent::Submitted);
        Ok(message)
    }
}

/// Deletes one stored file of record `id`.
pub async fn delete_stored_file<R>(
    repo: &R,
    id: ClientDetailId,
    file_id: AttachmentId,
    reference_date: NaiveDate,
) -> ServiceResult<Removal>
where
    R: FileReader + FileWriter + ?Sized,
{
    let mut controller = DetailsController::resume_edit(repo, id, reference_date).await?;
    let key = controller.attachment_key(file_id)?;
    controller.delete_attachment(key).await
}

/// Preview token for one stored file of record `id`.
pub async fn preview_stored_file<R>(
    repo: &R,
    registry: &PreviewRegistry,
    id: ClientDetailId,
    file_id: AttachmentId,
    reference_date: NaiveDate,
) -> ServiceResult<Uuid>
where
    R: FileReader + ?Sized,
{
    let controller = DetailsController::resume_edit(repo, id, reference_date).await?;
    let key = controller.attachment_key(file_id)?;
    controller.preview(key, registry)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::attachment::StoredFile;
    use crate::domain::types::{AttachmentName, ClientId, ReferenceName, StateId};
    use crate::dto::api::MultipartPayload;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockBackend;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date")
    }

    fn fill(controller: &mut DetailsController<'_, MockBackend>) {
        for event in [
            DetailsEvent::NameChanged("Ada".into()),
            DetailsEvent::EmailChanged("ada@example.com".into()),
            DetailsEvent::ClientSelected(ClientId::new(2).ok()),
            DetailsEvent::StatesSelected(vec![StateId::new(1).expect("valid id")]),
            DetailsEvent::DobChanged(NaiveDate::from_ymd_opt(1990, 1, 1)),
            DetailsEvent::ExpStartChanged(NaiveDate::from_ymd_opt(2015, 1, 1)),
            DetailsEvent::ExpEndChanged(NaiveDate::from_ymd_opt(2020, 1, 1)),
            DetailsEvent::HourlyRateChanged(Some(30.0)),
            DetailsEvent::GenderChanged("Female".into()),
        ] {
            controller.dispatch(event);
        }
    }

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents).expect("write temp file");
        file
    }

    fn pending(name: &str, file: &tempfile::NamedTempFile) -> PendingFile {
        PendingFile {
            filename: name.to_string(),
            size: file.as_file().metadata().expect("metadata").len(),
            path: file.path().to_path_buf(),
        }
    }

    fn stored(id: i32, name: &str) -> StoredFile {
        StoredFile {
            id: AttachmentId::new(id).expect("valid id"),
            filename: AttachmentName::new(name).expect("valid name"),
            filedata: Some("aGk=".into()),
            client_details_id: ClientDetailId::new(9).ok(),
        }
    }

    #[tokio::test]
    async fn create_submits_scalars_and_two_files() {
        let mut repo = MockBackend::new();
        repo.expect_create_client_details()
            .withf(|payload: &MultipartPayload| {
                payload.files().count() == 2
                    && payload.field("dob") == Some("1990-01-01T00:00:00.000Z")
                    && payload.field("payType") == Some("hourly")
                    && payload.field("id").is_none()
            })
            .times(1)
            .returning(|_| Ok(()));
        let pdf = temp_file(b"%PDF");
        let png = temp_file(b"PNG");

        let mut controller = DetailsController::create(&repo, reference());
        fill(&mut controller);
        let notice = controller.select_files(vec![pending("cv.pdf", &pdf), pending("me.png", &png)]);
        let message = controller.submit().await.expect("submitted");

        assert_eq!(notice, None);
        assert_eq!(message, CREATED_MESSAGE);
    }

    #[tokio::test]
    async fn invalid_form_makes_no_backend_call() {
        let mut repo = MockBackend::new();
        repo.expect_create_client_details().times(0);

        let mut controller = DetailsController::create(&repo, reference());
        let result = controller.submit().await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn backend_failure_keeps_form_state() {
        let mut repo = MockBackend::new();
        repo.expect_create_client_details().returning(|_| {
            Err(RepositoryError::Backend {
                status: 400,
                message: "Email already exists".into(),
            })
        });

        let mut controller = DetailsController::create(&repo, reference());
        fill(&mut controller);
        let result = controller.submit().await;

        assert!(matches!(result, Err(ServiceError::Backend(ref message)) if message == "Email already exists"));
        assert_eq!(controller.state().name, "Ada");
    }

    #[tokio::test]
    async fn update_sends_id_and_ends_session() {
        let mut repo = MockBackend::new();
        repo.expect_list_files()
            .returning(|_| Ok(vec![stored(5, "old.pdf")]));
        repo.expect_update_client_details()
            .withf(|id, payload| id.get() == 9 && payload.field("id") == Some("9"))
            .times(1)
            .returning(|_, _| Ok(()));

        let id = ClientDetailId::new(9).expect("valid id");
        let mut controller = DetailsController::resume_edit(&repo, id, reference())
            .await
            .expect("files load");
        fill(&mut controller);
        let message = controller.submit().await.expect("submitted");

        assert_eq!(message, UPDATED_MESSAGE);
        assert_eq!(controller.state().edit_id, None);
        assert_eq!(controller.state().attachments.items().len(), 1);
    }

    #[tokio::test]
    async fn rejected_files_are_reported_and_valid_ones_kept() {
        let repo = MockBackend::new();
        let ok = temp_file(b"data");
        let bad = temp_file(b"MZ");

        let mut controller = DetailsController::create(&repo, reference());
        let notice = controller.select_files(vec![pending("ok.docx", &ok), pending("run.exe", &bad)]);
        controller.settle_reads().await;

        assert!(notice.is_some_and(|text| text.contains("run.exe")));
        let items = controller.state().attachments.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].blob.as_ref().map(|blob| blob.bytes.clone()), Some(b"data".to_vec()));
    }

    #[tokio::test]
    async fn unreadable_file_fails_submit_without_backend_call() {
        let mut repo = MockBackend::new();
        repo.expect_create_client_details().times(0);

        let mut controller = DetailsController::create(&repo, reference());
        fill(&mut controller);
        controller.select_files(vec![PendingFile {
            filename: "cv.pdf".into(),
            size: 4,
            path: "/nonexistent/uploads/cv.pdf".into(),
        }]);
        let result = controller.submit().await;

        assert!(matches!(result, Err(ServiceError::Form(ref message)) if message.contains("cv.pdf")));
        assert!(controller.state().attachments.items().is_empty());
    }

    #[tokio::test]
    async fn failed_submit_asks_to_select_files_again() {
        let mut repo = MockBackend::new();
        repo.expect_list_files()
            .returning(|_| Ok(vec![stored(5, "old.pdf")]));
        repo.expect_update_client_details().returning(|_, _| {
            Err(RepositoryError::Backend {
                status: 500,
                message: "Server error".into(),
            })
        });
        let png = temp_file(b"PNG");

        let id = ClientDetailId::new(9).expect("valid id");
        let mut controller = DetailsController::resume_edit(&repo, id, reference())
            .await
            .expect("files load");
        fill(&mut controller);
        controller.select_files(vec![pending("me.png", &png)]);
        let result = controller.submit().await;
        let notice = controller.discard_pending_uploads();

        assert!(matches!(result, Err(ServiceError::Backend(_))));
        assert_eq!(
            notice.as_deref(),
            Some("Please select these files again: me.png.")
        );
        let items = controller.state().attachments.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].filename.as_str(), "old.pdf");
        assert_eq!(controller.discard_pending_uploads(), None);
    }

    #[tokio::test]
    async fn deleting_stored_attachment_calls_backend() {
        let mut repo = MockBackend::new();
        repo.expect_list_files()
            .returning(|_| Ok(vec![stored(5, "old.pdf")]));
        repo.expect_delete_file()
            .withf(|id| id.get() == 5)
            .times(1)
            .returning(|_| Ok(()));

        let id = ClientDetailId::new(9).expect("valid id");
        let mut controller = DetailsController::resume_edit(&repo, id, reference())
            .await
            .expect("files load");
        let key = controller
            .attachment_key(AttachmentId::new(5).expect("valid id"))
            .expect("attachment present");

        let removal = controller.delete_attachment(key).await.expect("deleted");

        assert_eq!(removal, Removal::Remote(AttachmentId::new(5).expect("valid id")));
        assert!(controller.state().attachments.items().is_empty());
    }

    #[tokio::test]
    async fn session_new_attachment_is_removed_locally() {
        let mut repo = MockBackend::new();
        repo.expect_list_files().returning(|_| Ok(vec![]));
        repo.expect_delete_file().times(0);
        let file = temp_file(b"x");

        let id = ClientDetailId::new(9).expect("valid id");
        let mut controller = DetailsController::resume_edit(&repo, id, reference())
            .await
            .expect("files load");
        controller.select_files(vec![pending("new.png", &file)]);
        let key = controller.state().last_selection.accepted[0].0;

        let removal = controller.delete_attachment(key).await.expect("removed");

        assert_eq!(removal, Removal::LocalOnly);
        assert_eq!(controller.state().attachments.pending_count(), 0);
    }

    #[tokio::test]
    async fn failed_remote_delete_keeps_local_removal() {
        let mut repo = MockBackend::new();
        repo.expect_list_files()
            .returning(|_| Ok(vec![stored(5, "old.pdf")]));
        repo.expect_delete_file().returning(|_| {
            Err(RepositoryError::Backend {
                status: 500,
                message: "boom".into(),
            })
        });

        let id = ClientDetailId::new(9).expect("valid id");
        let mut controller = DetailsController::resume_edit(&repo, id, reference())
            .await
            .expect("files load");
        let key = controller.state().attachments.items()[0].key;

        let result = controller.delete_attachment(key).await;

        assert!(matches!(result, Err(ServiceError::Backend(_))));
        assert!(controller.state().attachments.items().is_empty());
    }

    #[tokio::test]
    async fn reference_data_preselects_first_client() {
        let mut repo = MockBackend::new();
        repo.expect_list_clients().returning(|| {
            Ok(vec![Client {
                id: ClientId::new(4).expect("valid id"),
                name: ReferenceName::new("Acme").expect("valid name"),
            }])
        });
        repo.expect_list_states().returning(|| Ok(vec![]));

        let mut controller = DetailsController::create(&repo, reference());
        let data = controller.load_reference_data().await.expect("loaded");

        assert_eq!(data.clients.len(), 1);
        assert_eq!(controller.state().client, ClientId::new(4).ok());
    }

    #[tokio::test]
    async fn preview_needs_content() {
        let mut repo = MockBackend::new();
        repo.expect_list_files().returning(|_| {
            Ok(vec![
                stored(5, "old.pdf"),
                StoredFile {
                    filedata: None,
                    ..stored(6, "bare.pdf")
                },
            ])
        });
        let registry = PreviewRegistry::default();

        let id = ClientDetailId::new(9).expect("valid id");
        let controller = DetailsController::resume_edit(&repo, id, reference())
            .await
            .expect("files load");
        let with_content = controller
            .attachment_key(AttachmentId::new(5).expect("valid id"))
            .expect("present");
        let without_content = controller
            .attachment_key(AttachmentId::new(6).expect("valid id"))
            .expect("present");

        let token = controller.preview(with_content, &registry).expect("previewable");
        assert_eq!(registry.get(token).map(|blob| blob.bytes), Some(b"hi".to_vec()));
        assert!(matches!(
            controller.preview(without_content, &registry),
            Err(ServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn stored_file_helpers_report_unknown_files() {
        let mut repo = MockBackend::new();
        repo.expect_list_files()
            .returning(|_| Ok(vec![stored(5, "old.pdf")]));
        repo.expect_delete_file().times(0);
        let registry = PreviewRegistry::default();
        let id = ClientDetailId::new(9).expect("valid id");
        let unknown = AttachmentId::new(77).expect("valid id");

        let deleted = delete_stored_file(&repo, id, unknown, reference()).await;
        let preview = preview_stored_file(
            &repo,
            &registry,
            id,
            AttachmentId::new(5).expect("valid id"),
            reference(),
        )
        .await;

        assert!(matches!(deleted, Err(ServiceError::NotFound)));
        assert!(preview.is_ok());
        assert_eq!(registry.len(), 1);
    }
}
