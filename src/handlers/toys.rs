use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{see_other, RecordPath};
use crate::auth::Actor;
use crate::db::{self, DbPool};
use crate::errors::UserError;
use crate::model::ToyForm;
use crate::repo::toys as toy_repo;

fn validated(form: ToyForm) -> Result<ToyForm, UserError> {
    form.validate().map_err(|e| {
        warn!("Rejected toy form: {}", e);
        UserError::ValidationError
    })?;
    Ok(form)
}

pub async fn toys_index(pool: web::Data<DbPool>, actor: Actor) -> Result<HttpResponse, UserError> {
    let toys = db::run(&pool, move |conn| Ok(toy_repo::list_for_owner(conn, actor.id)?)).await?;

    Ok(HttpResponse::Ok().json(toys))
}

pub async fn toy_detail(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<RecordPath>,
) -> Result<HttpResponse, UserError> {
    let toy_id = path.id;
    let toy = db::run(&pool, move |conn| actor.authorize(toy_repo::find(conn, toy_id)?)).await?;

    Ok(HttpResponse::Ok().json(toy))
}

pub async fn toy_create(
    pool: web::Data<DbPool>,
    actor: Actor,
    form: web::Form<ToyForm>,
) -> Result<HttpResponse, UserError> {
    let new_toy = validated(form.into_inner())?.into_new_toy(actor.id);

    let toy = db::run(&pool, move |conn| Ok(toy_repo::create(conn, &new_toy)?)).await?;
    info!("User {} created toy {} ({})", actor.id, toy.id, toy.name);

    Ok(see_other(&format!("/toys/{}", toy.id)))
}

pub async fn toy_update(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<RecordPath>,
    form: web::Form<ToyForm>,
) -> Result<HttpResponse, UserError> {
    let toy_id = path.id;
    let form = validated(form.into_inner())?;

    db::run(&pool, move |conn| {
        actor.authorize(toy_repo::find(conn, toy_id)?)?;
        Ok(toy_repo::update(conn, toy_id, &form)?)
    })
    .await?;

    Ok(see_other(&format!("/toys/{}", toy_id)))
}

pub async fn toy_delete(
    pool: web::Data<DbPool>,
    actor: Actor,
    path: web::Path<RecordPath>,
) -> Result<HttpResponse, UserError> {
    let toy_id = path.id;

    db::run(&pool, move |conn| {
        actor.authorize(toy_repo::find(conn, toy_id)?)?;
        Ok(toy_repo::delete(conn, toy_id)?)
    })
    .await?;
    info!("Deleted toy {}", toy_id);

    Ok(see_other("/toys"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::MemoryMediaStore;
    use crate::test_support::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use std::sync::Arc;

    #[actix_web::test]
    async fn toy_crud_flow() {
        let pool = db::test_pool();
        let store = Arc::new(MemoryMediaStore::default());
        let (tabby, cookie) = sign_up(&pool, "tabby");
        let app = test_app!(pool, store);

        let req = test::TestRequest::post()
            .uri("/toys")
            .cookie(cookie.clone())
            .set_form([("name", "Feather"), ("color", "Blue")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();

        let req = test::TestRequest::get().uri(&location).cookie(cookie.clone()).to_request();
        let toy: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(toy["name"], "Feather");
        assert_eq!(toy["user_id"], tabby.id);

        let req = test::TestRequest::post()
            .uri(&format!("{}/update", location))
            .cookie(cookie.clone())
            .set_form([("name", "Feather"), ("color", "Green")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::SEE_OTHER);

        let req = test::TestRequest::get().uri("/toys").cookie(cookie.clone()).to_request();
        let toys: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(toys[0]["color"], "Green");

        let req = test::TestRequest::post()
            .uri(&format!("{}/delete", location))
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/toys");
        assert!(toys_owned_by(&pool, tabby.id).is_empty());
    }

    #[actix_web::test]
    async fn list_is_scoped_and_detail_is_guarded() {
        let pool = db::test_pool();
        let store = Arc::new(MemoryMediaStore::default());
        let (tabby, _) = sign_up(&pool, "tabby");
        let (_, intruder) = sign_up(&pool, "calico");
        let toy = seed_toy(&pool, tabby.id, "Mouse");
        let app = test_app!(pool, store);

        let req = test::TestRequest::get().uri("/toys").cookie(intruder.clone()).to_request();
        let toys: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(toys.as_array().unwrap().is_empty());

        let req = test::TestRequest::get()
            .uri(&format!("/toys/{}", toy.id))
            .cookie(intruder.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri(&format!("/toys/{}/delete", toy.id))
            .cookie(intruder)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
        assert_eq!(toys_owned_by(&pool, tabby.id), vec![toy]);
    }

    #[actix_web::test]
    async fn oversized_color_is_rejected() {
        let pool = db::test_pool();
        let store = Arc::new(MemoryMediaStore::default());
        let (tabby, cookie) = sign_up(&pool, "tabby");
        let app = test_app!(pool, store);

        let req = test::TestRequest::post()
            .uri("/toys")
            .cookie(cookie)
            .set_form([("name", "Yarn"), ("color", "a very long shade of tangerine")])
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        assert!(toys_owned_by(&pool, tabby.id).is_empty());
    }
}
