use actix_web::cookie::Key;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::{FlashMessagesFramework, Level};
use tera::Tera;

use client_records::routes::main::confirm_delete;
use client_records::routes::{alert_level_to_str, redirect};

fn templates() -> Tera {
    Tera::new("templates/**/*").expect("templates parse")
}

#[::core::prelude::v1::test]
fn test_alert_level_to_str_mappings() {
    assert_eq!(alert_level_to_str(&Level::Error), "danger");
    assert_eq!(alert_level_to_str(&Level::Warning), "warning");
    assert_eq!(alert_level_to_str(&Level::Success), "success");
    assert_eq!(alert_level_to_str(&Level::Info), "info");
    assert_eq!(alert_level_to_str(&Level::Debug), "info");
}

#[::core::prelude::v1::test]
fn redirect_uses_see_other() {
    let response = redirect("/?pageNumber=2");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/?pageNumber=2"
    );
}

#[actix_web::test]
async fn confirm_dialog_posts_confirm_token_back_to_list_query() {
    let store = CookieMessageStore::builder(Key::generate()).build();
    let app = test::init_service(
        App::new()
            .wrap(FlashMessagesFramework::builder(store).build())
            .app_data(web::Data::new(templates()))
            .service(confirm_delete),
    )
    .await;

    let request = test::TestRequest::get()
        .uri("/client-details/5/delete?searchTerm=ada&pageNumber=2")
        .to_request();
    let body = test::call_and_read_body(&app, request).await;
    let html = String::from_utf8(body.to_vec()).expect("utf-8 body");

    assert!(html.contains("Are you sure you want to delete this record?"));
    assert!(html.contains(r#"name="result" value="confirm""#));
    assert!(html.contains(
        "/client-details/5/delete?searchTerm=ada&pageSize=3&pageNumber=2&sortColumn=name&sortDirection=asc"
    ));
}
