use actix_web::http::header;
use actix_web::HttpResponse;
use serde::Deserialize;

pub mod accounts;
pub mod cats;
pub mod pages;
pub mod toys;

#[derive(Deserialize)]
pub struct RecordPath {
    pub id: i32,
}

#[derive(Deserialize)]
pub struct CatToyPath {
    pub id: i32,
    pub toy_id: i32,
}

/// 303 redirect, the answer to every successful form post.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}
