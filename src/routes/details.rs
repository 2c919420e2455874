//! Details form: create, edit, save and attachment handling.

use actix_multipart::form::MultipartForm;
use actix_web::http::header;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use tera::Tera;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::domain::types::{AttachmentId, ClientDetailId};
use crate::dto::details::{DetailsFormView, DetailsPageData};
use crate::dto::main::IndexQuery;
use crate::forms::upload::DetailsMultipartForm;
use crate::repository::HttpBackend;
use crate::routes::{
    alert_level_to_str, base_context, collect_alerts, redirect, render_template,
    today_reference_date,
};
use crate::services::ServiceError;
use crate::services::details::{self as details_service, DetailsController, ReferenceData};
use crate::services::dialogs::SuccessDialog;
use crate::services::list as list_service;
use crate::services::preview::PreviewRegistry;

type Alerts = Vec<(String, &'static str)>;

fn edit_url(id: ClientDetailId, params: &IndexQuery) -> String {
    format!("/client-details/{id}/edit?{}", params.to_query_string())
}

async fn render_form(
    controller: &mut DetailsController<'_, HttpBackend>,
    errors: Option<&ValidationErrors>,
    mut alerts: Alerts,
    params: &IndexQuery,
    tera: &Tera,
) -> HttpResponse {
    let reference = match controller.load_reference_data().await {
        Ok(reference) => reference,
        Err(err) => {
            alerts.push((
                format!("Error fetching clients and states: {err}"),
                alert_level_to_str(&Level::Error),
            ));
            ReferenceData::default()
        }
    };

    let mut form = DetailsFormView::from(controller.state());
    if let Some(errors) = errors {
        form = form.with_errors(errors);
    }
    let page = DetailsPageData {
        form,
        clients: reference.clients,
        states: reference.states,
    };

    let mut context = tera::Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_page", "details");
    context.insert("page", &page);
    context.insert("query_string", &params.to_query_string());

    render_template(tera, "details/form.html", &context)
}

#[get("/details/new")]
pub async fn new_details(
    params: web::Query<IndexQuery>,
    repo: web::Data<HttpBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut controller = DetailsController::create(repo.get_ref(), today_reference_date());
    render_form(
        &mut controller,
        None,
        collect_alerts(&flash_messages),
        &params,
        &tera,
    )
    .await
}

#[get("/client-details/{id}/edit")]
/// Edit form for a record, located on the list page described by the query.
pub async fn edit_details(
    id: web::Path<i32>,
    params: web::Query<IndexQuery>,
    repo: web::Data<HttpBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let back = format!("/?{}", params.to_query_string());
    let Ok(id) = ClientDetailId::new(id.into_inner()) else {
        FlashMessage::error("Record not found.").send();
        return redirect(&back);
    };

    let record = match list_service::find_record(repo.get_ref(), &params, id).await {
        Ok(record) => record,
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Record not found.").send();
            return redirect(&back);
        }
        Err(err) => {
            FlashMessage::error(err.to_string()).send();
            return redirect(&back);
        }
    };

    let mut controller =
        match DetailsController::edit(repo.get_ref(), &record, today_reference_date()) {
            Ok(controller) => controller,
            Err(err) => {
                log::error!("Failed to open record {id}: {err}");
                FlashMessage::error("Failed to load attachments.").send();
                return redirect(&back);
            }
        };

    render_form(
        &mut controller,
        None,
        collect_alerts(&flash_messages),
        &params,
        &tera,
    )
    .await
}

#[post("/details/save")]
/// Creates or updates a record from the posted form and its files.
pub async fn save_details(
    params: web::Query<IndexQuery>,
    repo: web::Data<HttpBackend>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    MultipartForm(form): MultipartForm<DetailsMultipartForm>,
) -> impl Responder {
    let back = format!("/?{}", params.to_query_string());
    let mut submission = match form.into_submission() {
        Ok(submission) => submission,
        Err(err) => {
            log::error!("Failed to parse details form: {err}");
            FlashMessage::error(err.to_string()).send();
            return redirect(&back);
        }
    };

    let reference = today_reference_date();
    let mut controller = match submission.id {
        Some(id) => match DetailsController::resume_edit(repo.get_ref(), id, reference).await {
            Ok(controller) => controller,
            Err(err) => {
                FlashMessage::error(err.to_string()).send();
                return redirect(&back);
            }
        },
        None => DetailsController::create(repo.get_ref(), reference),
    };

    for event in std::mem::take(&mut submission.events) {
        controller.dispatch(event);
    }
    let notice = controller.select_files(std::mem::take(&mut submission.files));

    let mut alerts = collect_alerts(&flash_messages);
    match controller.submit().await {
        Ok(message) => {
            if let Some(notice) = notice {
                alerts.push((notice, alert_level_to_str(&Level::Warning)));
            }
            let mut context = base_context(&flash_messages, "details");
            context.insert("alerts", &alerts);
            context.insert("dialog", &SuccessDialog::new(message, back));
            render_template(&tera, "dialogs/success.html", &context)
        }
        Err(err) => {
            let errors = match err {
                ServiceError::Validation(errors) => Some(errors),
                other => {
                    alerts.push((other.to_string(), alert_level_to_str(&Level::Error)));
                    None
                }
            };
            // Uploaded temp files are gone once this request ends.
            if let Some(reselect) = controller.discard_pending_uploads() {
                alerts.push((reselect, alert_level_to_str(&Level::Warning)));
            }
            render_form(&mut controller, errors.as_ref(), alerts, &params, &tera).await
        }
    }
}

#[post("/client-details/{id}/files/{file_id}/delete")]
pub async fn delete_attachment(
    path: web::Path<(i32, i32)>,
    params: web::Query<IndexQuery>,
    repo: web::Data<HttpBackend>,
) -> impl Responder {
    let (id, file_id) = path.into_inner();
    let (Ok(id), Ok(file_id)) = (ClientDetailId::new(id), AttachmentId::new(file_id)) else {
        FlashMessage::error("File not found.").send();
        return redirect(&format!("/?{}", params.to_query_string()));
    };

    match details_service::delete_stored_file(repo.get_ref(), id, file_id, today_reference_date())
        .await
    {
        Ok(_) => FlashMessage::success("File deleted.").send(),
        Err(ServiceError::NotFound) => FlashMessage::error("File not found.").send(),
        Err(err) => FlashMessage::error(err.to_string()).send(),
    }
    redirect(&edit_url(id, &params))
}

#[get("/client-details/{id}/files/{file_id}/preview")]
/// Opens a short-lived preview link for a stored file.
pub async fn preview_attachment(
    path: web::Path<(i32, i32)>,
    repo: web::Data<HttpBackend>,
    registry: web::Data<PreviewRegistry>,
) -> impl Responder {
    let (id, file_id) = path.into_inner();
    let (Ok(id), Ok(file_id)) = (ClientDetailId::new(id), AttachmentId::new(file_id)) else {
        return HttpResponse::NotFound().finish();
    };

    match details_service::preview_stored_file(
        repo.get_ref(),
        registry.get_ref(),
        id,
        file_id,
        today_reference_date(),
    )
    .await
    {
        Ok(token) => redirect(&format!("/preview/{token}")),
        Err(ServiceError::NotFound) => HttpResponse::NotFound().finish(),
        Err(err) => {
            log::error!("Failed to preview file {file_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/preview/{token}")]
pub async fn show_preview(
    token: web::Path<Uuid>,
    registry: web::Data<PreviewRegistry>,
) -> impl Responder {
    match registry.get(token.into_inner()) {
        Some(blob) => HttpResponse::Ok()
            .content_type(blob.content_type)
            .insert_header((header::CONTENT_DISPOSITION, "inline"))
            .body(blob.bytes),
        None => HttpResponse::NotFound().finish(),
    }
}
