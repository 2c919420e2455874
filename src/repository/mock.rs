//! Mock backend implementations for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;

use crate::domain::attachment::StoredFile;
use crate::domain::client_detail::ClientDetailsPage;
use crate::domain::reference::{Client, State};
use crate::domain::types::{AttachmentId, ClientDetailId};
use crate::dto::api::{FilePart, MultipartPayload};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    ClientDetailsQuery, ClientDetailsReader, ClientDetailsWriter, FileReader, FileWriter,
    ReferenceReader,
};

mock! {
    pub Backend {}

    #[async_trait]
    impl ClientDetailsReader for Backend {
        async fn list_client_details(
            &self,
            query: &ClientDetailsQuery,
        ) -> RepositoryResult<ClientDetailsPage>;
    }

    #[async_trait]
    impl ClientDetailsWriter for Backend {
        async fn create_client_details(&self, payload: MultipartPayload) -> RepositoryResult<()>;
        async fn update_client_details(
            &self,
            id: ClientDetailId,
            payload: MultipartPayload,
        ) -> RepositoryResult<()>;
        async fn delete_client_details(&self, id: ClientDetailId) -> RepositoryResult<()>;
    }

    #[async_trait]
    impl ReferenceReader for Backend {
        async fn list_clients(&self) -> RepositoryResult<Vec<Client>>;
        async fn list_states(&self) -> RepositoryResult<Vec<State>>;
    }

    #[async_trait]
    impl FileReader for Backend {
        async fn list_files(
            &self,
            client_details_id: ClientDetailId,
        ) -> RepositoryResult<Vec<StoredFile>>;
    }

    #[async_trait]
    impl FileWriter for Backend {
        async fn upload_files(
            &self,
            client_details_id: ClientDetailId,
            files: Vec<FilePart>,
        ) -> RepositoryResult<()>;
        async fn delete_file(&self, id: AttachmentId) -> RepositoryResult<()>;
    }
}
