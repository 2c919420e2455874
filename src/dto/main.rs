use serde::{Deserialize, Serialize};

use crate::domain::client_detail::ClientDetail;
use crate::domain::types::{PayType, SortColumn, SortDirection};
use crate::pagination::{DEFAULT_PAGE_SIZE, Paginated};
use crate::repository::ClientDetailsQuery;

/// Query parameters accepted by the list page.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<String>,
}

impl IndexQuery {
    /// Backend query for these parameters.
    ///
    /// A missing column sorts by name; an empty one means the sort was cleared.
    pub fn to_query(&self) -> ClientDetailsQuery {
        let sort_column = match self.sort_column.as_deref().map(str::trim) {
            None => Some(SortColumn::Name),
            Some("") => None,
            Some(raw) => match raw.parse::<SortColumn>() {
                Ok(column) => Some(column),
                Err(err) => {
                    log::warn!("Ignoring sort column: {err}");
                    Some(SortColumn::Name)
                }
            },
        };

        ClientDetailsQuery::new()
            .search(self.search_term.clone().unwrap_or_default())
            .paginate(
                self.page_number.unwrap_or(1),
                self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            )
            .sort(
                sort_column,
                SortDirection::from_optional(self.sort_direction.as_deref()),
            )
    }

    /// Explicit form of these parameters with every default filled in.
    pub fn normalized(&self) -> IndexQuery {
        let query = self.to_query();
        IndexQuery {
            search_term: Some(query.search_term).filter(|term| !term.is_empty()),
            page_size: Some(query.page_size),
            page_number: Some(query.page_number),
            sort_column: Some(
                query
                    .sort_column
                    .map(|column| column.as_str().to_string())
                    .unwrap_or_default(),
            ),
            sort_direction: Some(query.sort_direction.as_str().to_string()),
        }
    }

    /// The same parameters rendered back into a query string.
    pub fn to_query_string(&self) -> String {
        serde_html_form::to_string(self.normalized()).unwrap_or_else(|err| {
            log::error!("Failed to encode list query: {err}");
            String::new()
        })
    }
}

/// One row of the listing with its derived experience string.
#[derive(Debug, Clone, Serialize)]
pub struct RecordRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub client: String,
    pub years_of_experience: String,
    pub gender: String,
    pub rate: String,
}

impl RecordRow {
    /// Builds the row, naming the client from `client_name` or the lookup.
    pub fn new(record: &ClientDetail, lookup: impl Fn(i32) -> Option<String>) -> Self {
        let client = record
            .client_name
            .clone()
            .or_else(|| lookup(record.client_id.get()))
            .unwrap_or_else(|| record.client_id.to_string());
        let rate = match record.pay_type {
            PayType::Hourly => format!("{} / hour", record.pay_value),
            PayType::Percentage => format!("{}%", record.pay_value),
        };

        Self {
            id: record.id.get(),
            name: record.name.to_string(),
            email: record.email.to_string(),
            client,
            years_of_experience: record.years_of_experience().to_string(),
            gender: record.gender.to_string(),
            rate,
        }
    }
}

/// Data required to render the list template.
#[derive(Debug, Serialize)]
pub struct IndexPageData {
    pub records: Paginated<RecordRow>,
    pub search_term: String,
    pub sort_column: Option<&'static str>,
    pub sort_direction: &'static str,
    /// Current parameters, for links that lead back to this page.
    pub query_string: String,
}
