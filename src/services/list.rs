//! Record listing: search, sort, pagination and deletion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::client_detail::{ClientDetail, ClientDetailsPage};
use crate::domain::types::{ClientDetailId, SortColumn, SortDirection};
use crate::dto::main::{IndexPageData, IndexQuery, RecordRow};
use crate::pagination::Paginated;
use crate::repository::{
    ClientDetailsQuery, ClientDetailsReader, ClientDetailsWriter, ReferenceReader,
};
use crate::services::dialogs::ConfirmResult;
use crate::services::{ServiceError, ServiceResult};

/// Quiet period after the last search keystroke before a request goes out.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Rows of one applied response.
#[derive(Debug)]
pub struct ListSnapshot {
    pub sequence: u64,
    pub query: ClientDetailsQuery,
    pub records: Paginated<RecordRow>,
}

fn rows(page: &ClientDetailsPage, client_names: &HashMap<i32, String>) -> Vec<RecordRow> {
    page.records
        .iter()
        .map(|record| RecordRow::new(record, |id| client_names.get(&id).cloned()))
        .collect()
}

/// Loads the records list for the main index page.
pub async fn load_index_page<R>(repo: &R, params: &IndexQuery) -> ServiceResult<IndexPageData>
where
    R: ClientDetailsReader + ReferenceReader + ?Sized,
{
    let query = params.to_query();

    let page = repo.list_client_details(&query).await.map_err(|err| {
        log::error!("Failed to fetch client details: {err}");
        err
    })?;

    // Names are cosmetic; the list still renders without them.
    let client_names = match repo.list_clients().await {
        Ok(clients) => clients
            .into_iter()
            .map(|client| (client.id.get(), client.name.into_inner()))
            .collect(),
        Err(err) => {
            log::warn!("Failed to fetch clients: {err}");
            HashMap::new()
        }
    };

    let records = Paginated::new(
        rows(&page, &client_names),
        query.page_number,
        query.page_size,
        page.total_count,
    );

    Ok(IndexPageData {
        records,
        search_term: query.search_term.clone(),
        sort_column: query.sort_column.map(SortColumn::as_str),
        sort_direction: query.sort_direction.as_str(),
        query_string: params.to_query_string(),
    })
}

/// Record `id` as it appears on the list page described by `params`.
///
/// The backend has no single-record endpoint, so the page is fetched again.
pub async fn find_record<R>(repo: &R, params: &IndexQuery, id: ClientDetailId) -> ServiceResult<ClientDetail>
where
    R: ClientDetailsReader + ?Sized,
{
    let page = repo
        .list_client_details(&params.to_query())
        .await
        .map_err(|err| {
            log::error!("Failed to fetch client details: {err}");
            err
        })?;

    page.records
        .into_iter()
        .find(|record| record.id == id)
        .ok_or(ServiceError::NotFound)
}

/// Deletes a record once the confirm dialog resolved with the confirm token.
///
/// Returns `false` without touching the backend otherwise.
pub async fn delete_record<R>(
    repo: &R,
    id: ClientDetailId,
    result: ConfirmResult,
) -> ServiceResult<bool>
where
    R: ClientDetailsWriter + ?Sized,
{
    if !result.is_confirmed() {
        return Ok(false);
    }

    repo.delete_client_details(id).await.map_err(|err| {
        log::error!("Failed to delete client details {id}: {err}");
        ServiceError::from(err)
    })?;

    Ok(true)
}

/// Stateful list controller for long-lived front ends.
///
/// Every request gets a sequence number; a response is applied only when
/// it belongs to the latest request issued.
pub struct ListController<R> {
    repo: Arc<R>,
    query: Mutex<ClientDetailsQuery>,
    issued: AtomicU64,
    search_ticket: AtomicU64,
    debounce: Duration,
    current: Mutex<Option<Arc<ListSnapshot>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<R> ListController<R>
where
    R: ClientDetailsReader,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            query: Mutex::new(ClientDetailsQuery::new()),
            issued: AtomicU64::new(0),
            search_ticket: AtomicU64::new(0),
            debounce: SEARCH_DEBOUNCE,
            current: Mutex::new(None),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn query(&self) -> ClientDetailsQuery {
        lock(&self.query).clone()
    }

    /// Last applied response, if any.
    pub fn current(&self) -> Option<Arc<ListSnapshot>> {
        lock(&self.current).clone()
    }

    /// Re-runs the current query.
    pub async fn refresh(&self) -> ServiceResult<Option<Arc<ListSnapshot>>> {
        let query = self.query();
        self.fetch(query).await
    }

    /// Search box input. Only the last input within the debounce window
    /// issues a request; earlier calls resolve to `None`.
    pub async fn search_input(
        &self,
        term: impl Into<String>,
    ) -> ServiceResult<Option<Arc<ListSnapshot>>> {
        let term = term.into();
        let ticket = self.search_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;
        if self.search_ticket.load(Ordering::SeqCst) != ticket {
            return Ok(None);
        }

        let query = {
            let mut query = lock(&self.query);
            *query = query.clone().search(term);
            query.clone()
        };
        self.fetch(query).await
    }

    /// Header click. A missing direction resets to ascending.
    pub async fn sort_changed(
        &self,
        column: Option<SortColumn>,
        direction: Option<&str>,
    ) -> ServiceResult<Option<Arc<ListSnapshot>>> {
        let query = {
            let mut query = lock(&self.query);
            *query = query
                .clone()
                .sort(column, SortDirection::from_optional(direction));
            query.clone()
        };
        self.fetch(query).await
    }

    /// Paginator change; `page_number` is 1-based.
    pub async fn page_changed(
        &self,
        page_number: usize,
        page_size: usize,
    ) -> ServiceResult<Option<Arc<ListSnapshot>>> {
        let query = {
            let mut query = lock(&self.query);
            *query = query.clone().paginate(page_number, page_size);
            query.clone()
        };
        self.fetch(query).await
    }

    async fn fetch(&self, query: ClientDetailsQuery) -> ServiceResult<Option<Arc<ListSnapshot>>> {
        let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.repo.list_client_details(&query).await;

        if self.issued.load(Ordering::SeqCst) != sequence {
            log::debug!("Discarding stale list response #{sequence}");
            return Ok(None);
        }

        let page = result.map_err(|err| {
            log::error!("Failed to fetch client details: {err}");
            ServiceError::from(err)
        })?;

        let snapshot = Arc::new(ListSnapshot {
            sequence,
            records: Paginated::new(
                rows(&page, &HashMap::new()),
                query.page_number,
                query.page_size,
                page.total_count,
            ),
            query,
        });
        *lock(&self.current) = Some(snapshot.clone());
        Ok(Some(snapshot))
    }
}

impl<R> ListController<R>
where
    R: ClientDetailsReader + ClientDetailsWriter,
{
    /// Deletes behind the confirm dialog; on success the search is cleared,
    /// which reloads the list through the debounced search path.
    pub async fn delete(
        &self,
        id: ClientDetailId,
        result: ConfirmResult,
    ) -> ServiceResult<Option<Arc<ListSnapshot>>> {
        if !delete_record(self.repo.as_ref(), id, result).await? {
            return Ok(None);
        }
        self.search_input(String::new()).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::client_detail::ClientDetail;
    use crate::domain::reference::{Client, State};
    use crate::domain::types::{ClientId, Gender, PayType, PersonName, RecordEmail, StateSelection};
    use crate::dto::api::MultipartPayload;
    use crate::repository::errors::{RepositoryError, RepositoryResult};

    fn record(id: i32, name: &str) -> ClientDetail {
        ClientDetail {
            id: ClientDetailId::new(id).expect("valid id"),
            name: PersonName::new(name).expect("valid name"),
            email: RecordEmail::new(format!("{}@example.com", name.to_lowercase()))
                .expect("valid email"),
            client_id: ClientId::new(1).expect("valid id"),
            client_name: None,
            states: StateSelection::parse("1").expect("valid states"),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid date"),
            exp_start: NaiveDate::from_ymd_opt(2020, 1, 15).expect("valid date"),
            exp_end: NaiveDate::from_ymd_opt(2022, 3, 15).expect("valid date"),
            pay_type: PayType::Hourly,
            pay_value: 20.0,
            gender: Gender::new("Male").expect("valid gender"),
            files: vec![],
        }
    }

    /// Fake backend answering with one record named after the search term.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<ClientDetailsQuery>>,
        deleted: Mutex<Vec<ClientDetailId>>,
        delays: HashMap<String, Duration>,
        fail_delete: bool,
    }

    #[async_trait]
    impl ClientDetailsReader for FakeBackend {
        async fn list_client_details(
            &self,
            query: &ClientDetailsQuery,
        ) -> RepositoryResult<ClientDetailsPage> {
            self.calls.lock().expect("lock").push(query.clone());
            if let Some(delay) = self.delays.get(&query.search_term) {
                tokio::time::sleep(*delay).await;
            }
            let name = if query.search_term.is_empty() {
                "Everyone"
            } else {
                query.search_term.as_str()
            };
            Ok(ClientDetailsPage {
                records: vec![record(1, name)],
                total_count: 7,
            })
        }
    }

    #[async_trait]
    impl ClientDetailsWriter for FakeBackend {
        async fn create_client_details(&self, _payload: MultipartPayload) -> RepositoryResult<()> {
            Ok(())
        }

        async fn update_client_details(
            &self,
            _id: ClientDetailId,
            _payload: MultipartPayload,
        ) -> RepositoryResult<()> {
            Ok(())
        }

        async fn delete_client_details(&self, id: ClientDetailId) -> RepositoryResult<()> {
            if self.fail_delete {
                return Err(RepositoryError::Backend {
                    status: 500,
                    message: "Record is locked".into(),
                });
            }
            self.deleted.lock().expect("lock").push(id);
            Ok(())
        }
    }

    #[async_trait]
    impl ReferenceReader for FakeBackend {
        async fn list_clients(&self) -> RepositoryResult<Vec<Client>> {
            Ok(vec![Client {
                id: ClientId::new(1).expect("valid id"),
                name: crate::domain::types::ReferenceName::new("Acme").expect("valid name"),
            }])
        }

        async fn list_states(&self) -> RepositoryResult<Vec<State>> {
            Ok(vec![])
        }
    }

    fn searched(backend: &FakeBackend) -> Vec<String> {
        backend
            .calls
            .lock()
            .expect("lock")
            .iter()
            .map(|query| query.search_term.clone())
            .collect()
    }

    #[tokio::test]
    async fn find_record_locates_row_on_the_page() {
        let backend = FakeBackend::default();
        let params = IndexQuery {
            search_term: Some("Ada".into()),
            ..IndexQuery::default()
        };

        let found = find_record(&backend, &params, ClientDetailId::new(1).expect("valid id"))
            .await
            .expect("record on page");
        let missing = find_record(&backend, &params, ClientDetailId::new(2).expect("valid id")).await;

        assert_eq!(found.name.as_str(), "Ada");
        assert!(matches!(missing, Err(ServiceError::NotFound)));
    }

    #[tokio::test]
    async fn index_page_derives_experience_and_client_names() {
        let backend = FakeBackend::default();

        let data = load_index_page(&backend, &IndexQuery::default())
            .await
            .expect("page loads");

        let row = &data.records.items[0];
        assert_eq!(row.years_of_experience, "2 Years 2 Months");
        assert_eq!(row.client, "Acme");
        assert_eq!(data.records.total_count, 7);
        assert_eq!(data.records.pages, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(data.sort_column, Some("name"));
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_search_input_in_window_is_sent() {
        let backend = Arc::new(FakeBackend::default());
        let controller = ListController::new(backend.clone());

        let (first, second, third) = tokio::join!(
            controller.search_input("a"),
            controller.search_input("ad"),
            controller.search_input("ada"),
        );

        assert!(first.expect("no error").is_none());
        assert!(second.expect("no error").is_none());
        let snapshot = third.expect("no error").expect("applied");
        assert_eq!(snapshot.records.items[0].name, "ada");
        assert_eq!(searched(&backend), vec!["ada"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_discarded() {
        let backend = Arc::new(FakeBackend {
            delays: HashMap::from([("slow".to_string(), Duration::from_secs(2))]),
            ..FakeBackend::default()
        });
        let controller = ListController::new(backend.clone()).with_debounce(Duration::ZERO);

        let slow = controller.fetch(ClientDetailsQuery::new().search("slow"));
        let fast = controller.fetch(ClientDetailsQuery::new().search("fast"));
        let (slow, fast) = tokio::join!(slow, fast);

        assert!(slow.expect("no error").is_none());
        assert_eq!(fast.expect("no error").map(|s| s.sequence), Some(2));
        let current = controller.current().expect("applied");
        assert_eq!(current.records.items[0].name, "fast");
    }

    #[tokio::test]
    async fn sort_and_page_changes_query_immediately() {
        let backend = Arc::new(FakeBackend::default());
        let controller = ListController::new(backend.clone());

        controller
            .sort_changed(Some(SortColumn::Rate), Some("desc"))
            .await
            .expect("no error");
        controller.page_changed(3, 5).await.expect("no error");
        controller
            .sort_changed(Some(SortColumn::Email), None)
            .await
            .expect("no error");

        let calls = backend.calls.lock().expect("lock").clone();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].sort_direction, SortDirection::Desc);
        assert_eq!((calls[1].page_number, calls[1].page_size), (3, 5));
        assert_eq!(calls[2].sort_column, Some(SortColumn::Email));
        assert_eq!(calls[2].sort_direction, SortDirection::Asc);
    }

    #[tokio::test]
    async fn delete_without_confirm_token_makes_no_call() {
        let backend = FakeBackend::default();
        let id = ClientDetailId::new(4).expect("valid id");

        let deleted = delete_record(&backend, id, ConfirmResult::from_token(Some("cancel")))
            .await
            .expect("no error");

        assert!(!deleted);
        assert!(backend.deleted.lock().expect("lock").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_delete_clears_search_and_reloads() {
        let backend = Arc::new(FakeBackend::default());
        let controller = ListController::new(backend.clone());
        controller.search_input("ada").await.expect("no error");

        let snapshot = controller
            .delete(ClientDetailId::new(4).expect("valid id"), ConfirmResult::Confirmed)
            .await
            .expect("no error")
            .expect("reloaded");

        assert_eq!(snapshot.query.search_term, "");
        assert_eq!(searched(&backend), vec!["ada", ""]);
        assert_eq!(backend.deleted.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_surfaces_backend_message() {
        let backend = FakeBackend {
            fail_delete: true,
            ..FakeBackend::default()
        };

        let result = delete_record(
            &backend,
            ClientDetailId::new(4).expect("valid id"),
            ConfirmResult::Confirmed,
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Backend(message)) if message == "Record is locked"));
    }
}
