//! HTTP handlers and the helpers they share.

use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use chrono::{Local, NaiveDate};
use tera::{Context, Tera};

use crate::forms::details::reference_date;

pub mod details;
pub mod main;

/// Bootstrap alert class for a flash message level.
pub fn alert_level_to_str(level: &Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        _ => "info",
    }
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok().content_type("text/html").body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Pending flash messages as `(message, alert class)` pairs.
pub fn collect_alerts(flash_messages: &IncomingFlashMessages) -> Vec<(String, &'static str)> {
    flash_messages
        .iter()
        .map(|message| {
            (
                message.content().to_string(),
                alert_level_to_str(&message.level()),
            )
        })
        .collect()
}

/// Context every page starts from.
pub fn base_context(flash_messages: &IncomingFlashMessages, current_page: &str) -> Context {
    let mut context = Context::new();
    context.insert("alerts", &collect_alerts(flash_messages));
    context.insert("current_page", current_page);
    context
}

/// Latest date the date inputs accept today.
pub fn today_reference_date() -> NaiveDate {
    reference_date(Local::now().date_naive())
}
