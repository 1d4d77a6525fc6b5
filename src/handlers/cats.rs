use actix_web::{web, HttpResponse};
use chrono::Local;
use serde::Serialize;
use validator::Validate;

use super::{see_other, CatToyPath, RecordPath};
use crate::auth::Actor;
use crate::db::{self, DbPool};
use crate::errors::UserError;
use crate::media::{photo_key, MediaStore};
use crate::model::{
    Cat, CatForm, Feeding, FeedingForm, FeedingFormError, Meal, NewPhoto, Photo, Toy,
};
use crate::repo::{cats as cat_repo, toys as toy_repo};

#[derive(Serialize)]
struct MealChoice {
    code: &'static str,
    label: &'static str,
}

/// Blank feeding form shown on the detail page.
#[derive(Serialize)]
struct FeedingFormView {
    meal: Meal,
    choices: Vec<MealChoice>,
}

impl FeedingFormView {
    fn empty() -> Self {
        FeedingFormView {
            meal: Meal::default(),
            choices: Meal::ALL
                .into_iter()
                .map(|meal| MealChoice {
                    code: meal.code(),
                    label: meal.label(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct CatDetail {
    cat: Cat,
    fed_for_today: i64,
    toys: Vec<Toy>,
    available_toys: Vec<Toy>,
    feedings: Vec<Feeding>,
    photos: Vec<Photo>,
    feeding_form: FeedingFormView,
}

fn detail_url(cat_id: i32) -> String {
    format!("/cats/{}", cat_id)
}

fn validated(form: CatForm) -> Result<CatForm, UserError> {
    form.validate().map_err(|e| {
        warn!("Rejected cat form: {}", e);
        UserError::ValidationError
    })?;
    Ok(form)
}

pub async fn cats_index(pool: web::Data<DbPool>, actor: Actor) -> Result<HttpResponse, UserError> {
    let cats = db::run(&pool, move |conn| Ok(cat_repo::list_for_owner(conn, actor.id)?)).await?;

    Ok(HttpResponse::Ok().json(cats))
}

pub async fn cat_detail(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<RecordPath>,
) -> Result<HttpResponse, UserError> {
    let cat_id = path.id;
    let today = Local::now().date_naive();

    let detail = db::run(&pool, move |conn| {
        let cat = actor.authorize(cat_repo::find(conn, cat_id)?)?;
        Ok(CatDetail {
            fed_for_today: cat_repo::fed_for_today(conn, cat.id, today)?,
            toys: cat_repo::toys(conn, cat.id)?,
            available_toys: cat_repo::toys_not_on(conn, cat.id)?,
            feedings: cat_repo::feedings(conn, cat.id)?,
            photos: cat_repo::photos(conn, cat.id)?,
            feeding_form: FeedingFormView::empty(),
            cat,
        })
    })
    .await?;

    Ok(HttpResponse::Ok().json(detail))
}

pub async fn cat_create(
    pool: web::Data<DbPool>,
    actor: Actor,
    form: web::Form<CatForm>,
) -> Result<HttpResponse, UserError> {
    let new_cat = validated(form.into_inner())?.into_new_cat(actor.id);

    let cat = db::run(&pool, move |conn| Ok(cat_repo::create(conn, &new_cat)?)).await?;
    info!("User {} created cat {} ({})", actor.id, cat.id, cat.name);

    Ok(see_other(&detail_url(cat.id)))
}

pub async fn cat_update(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<RecordPath>,
    form: web::Form<CatForm>,
) -> Result<HttpResponse, UserError> {
    let cat_id = path.id;
    let form = validated(form.into_inner())?;

    db::run(&pool, move |conn| {
        actor.authorize(cat_repo::find(conn, cat_id)?)?;
        Ok(cat_repo::update(conn, cat_id, &form)?)
    })
    .await?;

    Ok(see_other(&detail_url(cat_id)))
}

pub async fn cat_delete(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<RecordPath>,
) -> Result<HttpResponse, UserError> {
    let cat_id = path.id;

    db::run(&pool, move |conn| {
        actor.authorize(cat_repo::find(conn, cat_id)?)?;
        Ok(cat_repo::delete(conn, cat_id)?)
    })
    .await?;
    info!("Deleted cat {}", cat_id);

    Ok(see_other("/cats"))
}

/// Always redirects to the cat; a rejected form is flagged in the query.
/// Bodies that are not url-encoded forms count as rejected forms.
pub async fn add_feeding(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<RecordPath>,
    form: Result<web::Form<FeedingForm>, actix_web::Error>,
) -> Result<HttpResponse, UserError> {
    let cat_id = path.id;
    let parsed = match form {
        Ok(form) => form.parse(cat_id),
        Err(_) => Err(FeedingFormError::Unreadable),
    };

    let outcome = db::run(&pool, move |conn| {
        actor.authorize(cat_repo::find(conn, cat_id)?)?;
        match parsed {
            Ok(new_feeding) => Ok(Ok(cat_repo::add_feeding(conn, &new_feeding)?)),
            Err(e) => Ok(Err(e)),
        }
    })
    .await?;

    match outcome {
        Ok(feeding) => {
            info!("Cat {} fed: {}", cat_id, feeding);
            Ok(see_other(&detail_url(cat_id)))
        }
        Err(e) => {
            warn!("Rejected feeding for cat {}: {}", cat_id, e);
            Ok(see_other(&format!("{}?error=invalid_feeding", detail_url(cat_id))))
        }
    }
}

pub async fn assoc_toy(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<CatToyPath>,
) -> Result<HttpResponse, UserError> {
    let CatToyPath { id: cat_id, toy_id } = path.into_inner();

    db::run(&pool, move |conn| {
        actor.authorize(cat_repo::find(conn, cat_id)?)?;
        toy_repo::find(conn, toy_id)?;
        Ok(cat_repo::add_toy(conn, cat_id, toy_id)?)
    })
    .await?;

    Ok(see_other(&detail_url(cat_id)))
}

pub async fn unassoc_toy(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<CatToyPath>,
) -> Result<HttpResponse, UserError> {
    let CatToyPath { id: cat_id, toy_id } = path.into_inner();

    db::run(&pool, move |conn| {
        actor.authorize(cat_repo::find(conn, cat_id)?)?;
        Ok(cat_repo::remove_toy(conn, cat_id, toy_id)?)
    })
    .await?;

    Ok(see_other(&detail_url(cat_id)))
}

/// Uploads the `photo-file` part and records its URL once the store has it.
/// A form submitted without choosing a file changes nothing.
pub async fn add_photo(
    pool: web::Data<DbPool>,
    store: web::Data<dyn MediaStore>,
    actor: Actor,
    path: web::Path<RecordPath>,
    mut parts: awmp::Parts,
) -> Result<HttpResponse, UserError> {
    let cat_id = path.id;
    let cat = db::run(&pool, move |conn| actor.authorize(cat_repo::find(conn, cat_id)?)).await?;

    let file = match parts.files.take("photo-file").pop() {
        Some(file) if !file.original_file_name().unwrap_or_default().is_empty() => file,
        _ => {
            debug!("No photo chosen for cat {}", cat.id);
            return Ok(see_other(&detail_url(cat.id)));
        }
    };
    let key = photo_key(file.original_file_name().unwrap_or_default());

    let body = web::block(move || std::fs::read(file.into_inner().path()))
        .await
        .map_err(|_| {
            error!("Blocking Thread Pool Error");
            UserError::UnexpectedError
        })?
        .map_err(|e| {
            error!("Failed to read uploaded photo: {}", e);
            UserError::UnexpectedError
        })?;
    if body.is_empty() {
        debug!("Ignoring empty photo {} for cat {}", key, cat.id);
        return Ok(see_other(&detail_url(cat.id)));
    }

    let url = match store.upload(&key, body).await {
        Ok(url) => url,
        Err(e) => {
            error!("An error occurred uploading {} to the media store: {}", key, e);
            return Ok(see_other(&format!("{}?error=photo_upload_failed", detail_url(cat.id))));
        }
    };

    let new_photo = NewPhoto { url, cat_id: cat.id };
    new_photo.validate().map_err(|e| {
        error!("Stored photo URL rejected: {}", e);
        UserError::UnexpectedError
    })?;
    let photo = db::run(&pool, move |conn| Ok(cat_repo::add_photo(conn, &new_photo)?)).await?;
    info!("{} for {}", photo, cat.name);

    Ok(see_other(&detail_url(cat.id)))
}
