//! Gateway traits over the client records REST backend.

use async_trait::async_trait;

use crate::domain::attachment::StoredFile;
use crate::domain::client_detail::ClientDetailsPage;
use crate::domain::reference::{Client, State};
use crate::domain::types::{AttachmentId, ClientDetailId, SortColumn, SortDirection};
use crate::dto::api::{FilePart, MultipartPayload};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::repository::errors::RepositoryResult;

pub mod errors;
pub mod http;
#[cfg(feature = "test-mocks")]
pub mod mock;

pub use http::HttpBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDetailsQuery {
    pub search_term: String,
    pub page_number: usize,
    pub page_size: usize,
    /// `None` leaves the column to the backend default.
    pub sort_column: Option<SortColumn>,
    pub sort_direction: SortDirection,
}

impl Default for ClientDetailsQuery {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_column: Some(SortColumn::Name),
            sort_direction: SortDirection::Asc,
        }
    }
}

impl ClientDetailsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into().trim().to_string();
        self
    }

    pub fn paginate(mut self, page_number: usize, page_size: usize) -> Self {
        self.page_number = page_number.max(1);
        self.page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        self
    }

    pub fn sort(mut self, column: Option<SortColumn>, direction: SortDirection) -> Self {
        self.sort_column = column;
        self.sort_direction = direction;
        self
    }

    /// Query string pairs in the order the backend documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("searchTerm", self.search_term.clone()),
            ("pageSize", self.page_size.to_string()),
            ("pageNumber", self.page_number.to_string()),
        ];
        if let Some(column) = self.sort_column {
            params.push(("sortColumn", column.as_str().to_string()));
        }
        params.push(("sortDirection", self.sort_direction.as_str().to_string()));
        params
    }
}

#[async_trait]
pub trait ClientDetailsReader: Send + Sync {
    async fn list_client_details(
        &self,
        query: &ClientDetailsQuery,
    ) -> RepositoryResult<ClientDetailsPage>;
}

#[async_trait]
pub trait ClientDetailsWriter: Send + Sync {
    async fn create_client_details(&self, payload: MultipartPayload) -> RepositoryResult<()>;
    async fn update_client_details(
        &self,
        id: ClientDetailId,
        payload: MultipartPayload,
    ) -> RepositoryResult<()>;
    async fn delete_client_details(&self, id: ClientDetailId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ReferenceReader: Send + Sync {
    async fn list_clients(&self) -> RepositoryResult<Vec<Client>>;
    async fn list_states(&self) -> RepositoryResult<Vec<State>>;
}

#[async_trait]
pub trait FileReader: Send + Sync {
    async fn list_files(&self, client_details_id: ClientDetailId)
    -> RepositoryResult<Vec<StoredFile>>;
}

#[async_trait]
pub trait FileWriter: Send + Sync {
    async fn upload_files(
        &self,
        client_details_id: ClientDetailId,
        files: Vec<FilePart>,
    ) -> RepositoryResult<()>;
    async fn delete_file(&self, id: AttachmentId) -> RepositoryResult<()>;
}
