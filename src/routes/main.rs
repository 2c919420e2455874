//! List page and record deletion.

use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use serde::Deserialize;
use tera::Tera;

use crate::domain::types::ClientDetailId;
use crate::dto::main::{IndexPageData, IndexQuery};
use crate::pagination::{PAGE_SIZE_OPTIONS, Paginated};
use crate::repository::HttpBackend;
use crate::routes::{alert_level_to_str, base_context, collect_alerts, redirect, render_template};
use crate::services::ServiceError;
use crate::services::dialogs::{ConfirmDialog, ConfirmResult};
use crate::services::list::{self as list_service, SEARCH_DEBOUNCE};

#[derive(Deserialize)]
pub struct ConfirmForm {
    result: Option<String>,
}

fn list_url(params: &IndexQuery) -> String {
    format!("/?{}", params.to_query_string())
}

#[get("/")]
/// Records table with search, sort and pagination.
pub async fn show_index(
    params: web::Query<IndexQuery>,
    repo: web::Data<HttpBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let params = params.into_inner();
    let mut alerts = collect_alerts(&flash_messages);

    let data = match list_service::load_index_page(repo.get_ref(), &params).await {
        Ok(data) => data,
        Err(err) => {
            log::error!("Failed to load records: {err}");
            alerts.push((
                format!("Error fetching client details: {err}"),
                alert_level_to_str(&Level::Error),
            ));
            let query = params.to_query();
            IndexPageData {
                records: Paginated::new(vec![], query.page_number, query.page_size, 0),
                search_term: query.search_term.clone(),
                sort_column: query.sort_column.map(|column| column.as_str()),
                sort_direction: query.sort_direction.as_str(),
                query_string: params.to_query_string(),
            }
        }
    };

    let mut context = base_context(&flash_messages, "index");
    context.insert("alerts", &alerts);
    context.insert("page", &data);
    context.insert("sort_column", data.sort_column.unwrap_or_default());
    context.insert("page_size_options", &PAGE_SIZE_OPTIONS);
    context.insert(
        "search_debounce_ms",
        &u64::try_from(SEARCH_DEBOUNCE.as_millis()).unwrap_or(500),
    );

    render_template(&tera, "main/index.html", &context)
}

#[get("/client-details/{id}/delete")]
pub async fn confirm_delete(
    id: web::Path<i32>,
    params: web::Query<IndexQuery>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let id = id.into_inner();
    let query_string = params.to_query_string();
    let dialog = ConfirmDialog::delete_record(
        format!("/client-details/{id}/delete?{query_string}"),
        list_url(&params),
    );

    let mut context = base_context(&flash_messages, "index");
    context.insert("dialog", &dialog);

    render_template(&tera, "dialogs/confirm.html", &context)
}

#[post("/client-details/{id}/delete")]
/// Deletes the record when the dialog was confirmed, then shows the list
/// with the search cleared.
pub async fn delete_client_details(
    id: web::Path<i32>,
    params: web::Query<IndexQuery>,
    repo: web::Data<HttpBackend>,
    web::Form(form): web::Form<ConfirmForm>,
) -> impl Responder {
    let params = params.into_inner();
    let cleared = IndexQuery {
        search_term: None,
        ..params.clone()
    };

    let raw_id = id.into_inner();
    let id = match ClientDetailId::new(raw_id) {
        Ok(id) => id,
        Err(err) => {
            log::warn!("Rejected delete of record {raw_id}: {err}");
            FlashMessage::error("Record not found.").send();
            return redirect(&list_url(&params));
        }
    };

    let result = ConfirmResult::from_token(form.result.as_deref());
    match list_service::delete_record(repo.get_ref(), id, result).await {
        Ok(true) => redirect(&list_url(&cleared)),
        Ok(false) => redirect(&list_url(&params)),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Record not found.").send();
            redirect(&list_url(&params))
        }
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            redirect(&list_url(&params))
        }
    }
}
