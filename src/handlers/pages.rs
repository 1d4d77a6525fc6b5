use actix_web::{get, web, HttpResponse, Responder};
use handlebars::{Handlebars, TemplateError};
use serde::Serialize;
use serde_json::json;

use crate::errors::UserError;

pub const TEMPLATE_DIR: &str = "./templates";

pub fn load_templates() -> Result<Handlebars<'static>, TemplateError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_templates_directory(".hbs", TEMPLATE_DIR)?;
    Ok(handlebars)
}

pub fn render<T: Serialize>(
    hb: &Handlebars<'_>,
    name: &str,
    data: &T,
) -> Result<HttpResponse, UserError> {
    let body = hb.render(name, data).map_err(|e| {
        error!("Failed to render template {}: {}", name, e);
        UserError::UnexpectedError
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

pub async fn home(hb: web::Data<Handlebars<'static>>) -> Result<HttpResponse, UserError> {
    render(&hb, "home", &json!({ "project_name": "Cat Collector" }))
}

pub async fn about(hb: web::Data<Handlebars<'static>>) -> Result<HttpResponse, UserError> {
    render(&hb, "about", &json!({ "project_name": "Cat Collector" }))
}

#[get("/health")]
pub async fn status() -> impl Responder {
    HttpResponse::Ok().body("Healthy")
}

#[cfg(test)]
mod tests {
    use crate::db;
    use crate::media::testing::MemoryMediaStore;
    use crate::test_support::test_app;
    use actix_web::test;
    use std::sync::Arc;

    #[actix_web::test]
    async fn public_pages_render() {
        let pool = db::test_pool();
        let store = Arc::new(MemoryMediaStore::default());
        let app = test_app!(pool, store);

        for uri in ["/", "/about"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success(), "{} failed", uri);
            let body = test::read_body(resp).await;
            assert!(String::from_utf8_lossy(&body).contains("Cat Collector"));
        }
    }

    #[actix_web::test]
    async fn health_check() {
        let pool = db::test_pool();
        let store = Arc::new(MemoryMediaStore::default());
        let app = test_app!(pool, store);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "Healthy");
    }
}
