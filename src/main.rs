#[macro_use]
extern crate log;

use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use openssl::error::ErrorStack;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};

use std::io;
use std::sync::Arc;

mod auth;
mod config;
mod db;
mod errors;
mod handlers;
mod media;
mod model;
mod repo;
mod schema;
#[cfg(test)]
mod test_support;

use self::config::{Config, TlsFiles};
use self::errors::UserError;
use self::handlers::{accounts, cats, pages, toys};
use self::media::{MediaStore, S3MediaStore, UnconfiguredMediaStore};

fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(|e, _| {
        warn!("Rejected path: {}", e);
        UserError::ValidationError.into()
    }))
    .app_data(web::FormConfig::default().error_handler(|e, _| {
        warn!("Rejected form: {}", e);
        UserError::ValidationError.into()
    }))
    .route("/", web::get().to(pages::home))
    .route("/about", web::get().to(pages::about))
    .service(pages::status)
    .service(
        web::scope("/accounts")
            .route("/signup", web::get().to(accounts::signup_form))
            .route("/signup", web::post().to(accounts::signup))
            .route("/login", web::get().to(accounts::login_form))
            .route("/login", web::post().to(accounts::login))
            .route("/logout", web::post().to(accounts::logout)),
    )
    .service(
        web::scope("/cats")
            .route("", web::get().to(cats::cats_index))
            .route("", web::post().to(cats::cat_create))
            .route("/{id}", web::get().to(cats::cat_detail))
            .route("/{id}/update", web::post().to(cats::cat_update))
            .route("/{id}/delete", web::post().to(cats::cat_delete))
            .route("/{id}/add_feeding", web::post().to(cats::add_feeding))
            .route("/{id}/add_photo", web::post().to(cats::add_photo))
            .route("/{id}/assoc_toy/{toy_id}", web::post().to(cats::assoc_toy))
            .route("/{id}/unassoc_toy/{toy_id}", web::post().to(cats::unassoc_toy)),
    )
    .service(
        web::scope("/toys")
            .route("", web::get().to(toys::toys_index))
            .route("", web::post().to(toys::toy_create))
            .route("/{id}", web::get().to(toys::toy_detail))
            .route("/{id}/update", web::post().to(toys::toy_update))
            .route("/{id}/delete", web::post().to(toys::toy_delete)),
    );
}

fn tls_acceptor(tls: &TlsFiles) -> Result<SslAcceptorBuilder, ErrorStack> {
    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())?;
    builder.set_private_key_file(&tls.key_file, SslFiletype::PEM)?;
    builder.set_certificate_chain_file(&tls.cert_file)?;
    Ok(builder)
}

fn startup_error(what: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", what, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", what, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.upload_tmp_dir)?;

    let pool = db::setup_database(&config.database_url)
        .map_err(|e| startup_error("Failed to create DB connection pool", e))?;
    let templates = pages::load_templates()
        .map_err(|e| startup_error("Failed to load templates", e))?;

    let store: Arc<dyn MediaStore> = match config.s3_bucket.clone() {
        Some(bucket) => {
            info!("Storing photos in bucket {}", bucket);
            Arc::new(S3MediaStore::from_env(bucket, config.s3_base_url.clone()).await)
        }
        None => {
            warn!("S3_BUCKET is not set; photo uploads will fail");
            Arc::new(UnconfiguredMediaStore)
        }
    };

    let pool = web::Data::new(pool);
    let templates = web::Data::new(templates);
    let store = web::Data::from(store);
    let upload_tmp_dir = config.upload_tmp_dir.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(pool.clone())
            .app_data(templates.clone())
            .app_data(store.clone())
            .app_data(awmp::PartsConfig::default().with_temp_dir(upload_tmp_dir.clone()))
            .configure(app_config)
            .service(Files::new("/static", "static"))
    });

    let server = match &config.tls {
        Some(tls) => {
            info!("listening on https://{}", config.bind_address);
            server.bind_openssl(config.bind_address.as_str(), tls_acceptor(tls)?)?
        }
        None => {
            info!("listening on http://{}", config.bind_address);
            server.bind(config.bind_address.as_str())?
        }
    };

    server.run().await
}
