//! reqwest implementation of the backend gateway traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::domain::attachment::StoredFile;
use crate::domain::client_detail::ClientDetailsPage;
use crate::domain::reference::{Client, State};
use crate::domain::types::{AttachmentId, ClientDetailId};
use crate::dto::api::{
    ClientDetailsPageDto, ClientDto, FileDto, FilePart, MultipartPart, MultipartPayload, StateDto,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    ClientDetailsQuery, ClientDetailsReader, ClientDetailsWriter, FileReader, FileWriter,
    ReferenceReader,
};

/// HTTP client for one client records backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Builds a client for `base_url`, e.g. `https://localhost:7179/api`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RepositoryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RepositoryError::Transport(err.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuses an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Passes successful responses through; anything else becomes an error
    /// carrying the response body as its message.
    async fn ensure_success(response: reqwest::Response) -> RepositoryResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RepositoryError::NotFound);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => status
                .canonical_reason()
                .unwrap_or("Unexpected backend response")
                .to_string(),
            text => text.to_string(),
        };
        Err(RepositoryError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> RepositoryResult<T> {
        let bytes = Self::ensure_success(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn file_part(file: FilePart) -> RepositoryResult<Part> {
        Ok(Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(file.content_type)?)
    }

    fn form(payload: MultipartPayload) -> RepositoryResult<Form> {
        payload
            .parts
            .into_iter()
            .try_fold(Form::new(), |form, part| match part {
                MultipartPart::Text { name, value } => Ok(form.text(name, value)),
                MultipartPart::File(file) => Ok(form.part(
                    MultipartPayload::FILES_FIELD,
                    Self::file_part(file)?,
                )),
            })
    }
}

#[async_trait]
impl ClientDetailsReader for HttpBackend {
    async fn list_client_details(
        &self,
        query: &ClientDetailsQuery,
    ) -> RepositoryResult<ClientDetailsPage> {
        let response = self
            .client
            .get(self.url("ClientDetails"))
            .query(&query.params())
            .send()
            .await?;

        let dto: ClientDetailsPageDto = Self::parse_response(response).await?;
        Ok(ClientDetailsPage::from(dto))
    }
}

#[async_trait]
impl ClientDetailsWriter for HttpBackend {
    async fn create_client_details(&self, payload: MultipartPayload) -> RepositoryResult<()> {
        let response = self
            .client
            .post(self.url("ClientDetails"))
            .multipart(Self::form(payload)?)
            .send()
            .await?;

        Self::ensure_success(response).await.map(|_| ())
    }

    async fn update_client_details(
        &self,
        id: ClientDetailId,
        payload: MultipartPayload,
    ) -> RepositoryResult<()> {
        let response = self
            .client
            .put(self.url(&format!("ClientDetails/{id}")))
            .multipart(Self::form(payload)?)
            .send()
            .await?;

        Self::ensure_success(response).await.map(|_| ())
    }

    async fn delete_client_details(&self, id: ClientDetailId) -> RepositoryResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("ClientDetails/{id}")))
            .send()
            .await?;

        Self::ensure_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl ReferenceReader for HttpBackend {
    async fn list_clients(&self) -> RepositoryResult<Vec<Client>> {
        let response = self.client.get(self.url("Client")).send().await?;

        let dtos: Vec<ClientDto> = Self::parse_response(response).await?;
        Ok(dtos
            .into_iter()
            .map(Client::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_states(&self) -> RepositoryResult<Vec<State>> {
        let response = self.client.get(self.url("State")).send().await?;

        let dtos: Vec<StateDto> = Self::parse_response(response).await?;
        Ok(dtos
            .into_iter()
            .map(State::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl FileReader for HttpBackend {
    async fn list_files(
        &self,
        client_details_id: ClientDetailId,
    ) -> RepositoryResult<Vec<StoredFile>> {
        let response = self
            .client
            .get(self.url(&format!("File/clientDetails/{client_details_id}")))
            .send()
            .await?;

        let dtos: Vec<FileDto> = Self::parse_response(response).await?;
        Ok(dtos
            .into_iter()
            .map(StoredFile::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl FileWriter for HttpBackend {
    async fn upload_files(
        &self,
        client_details_id: ClientDetailId,
        files: Vec<FilePart>,
    ) -> RepositoryResult<()> {
        let payload = files
            .into_iter()
            .fold(MultipartPayload::default(), MultipartPayload::file)
            .text("clientDetailsId", client_details_id.to_string());

        let response = self
            .client
            .post(self.url("File/upload"))
            .multipart(Self::form(payload)?)
            .send()
            .await?;

        Self::ensure_success(response).await.map(|_| ())
    }

    async fn delete_file(&self, id: AttachmentId) -> RepositoryResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("File/{id}")))
            .send()
            .await?;

        Self::ensure_success(response).await.map(|_| ())
    }
}
