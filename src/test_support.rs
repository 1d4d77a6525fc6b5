//! Fixtures shared by the handler tests. Every helper takes and releases its
//! own pooled connection; test pools hold a single connection.

use actix_web::cookie::Cookie;
use chrono::{NaiveDate, Utc};

use crate::auth::{hash_password, session_cookie, Actor};
use crate::db::DbPool;
use crate::model::{Cat, Meal, NewCat, NewFeeding, NewToy, NewUser, Photo, Toy};
use crate::repo::{cats, toys, users};

pub const TEST_PASSWORD: &str = "whiskers42";

/// Builds a service with the full route table over the given pool and store.
macro_rules! test_app {
    ($pool:expr, $store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .app_data(actix_web::web::Data::new(
                    crate::handlers::pages::load_templates().unwrap(),
                ))
                .app_data(actix_web::web::Data::from(
                    $store.clone() as std::sync::Arc<dyn crate::media::MediaStore>
                ))
                .configure(crate::app_config),
        )
        .await
    };
}
pub(crate) use test_app;

pub fn sign_up(pool: &DbPool, username: &str) -> (Actor, Cookie<'static>) {
    let mut conn = pool.get().unwrap();
    let user = users::create(
        &mut conn,
        &NewUser {
            username: username.to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
        },
    )
    .unwrap();
    let token = users::create_session(&mut conn, user.id, Utc::now().naive_utc()).unwrap();
    (user.into(), session_cookie(token))
}

pub fn seed_cat(pool: &DbPool, owner_id: i32, name: &str) -> Cat {
    let mut conn = pool.get().unwrap();
    cats::create(
        &mut conn,
        &NewCat {
            name: name.to_string(),
            breed: "Domestic Shorthair".to_string(),
            description: "Loves boxes".to_string(),
            age: 2,
            user_id: owner_id,
        },
    )
    .unwrap()
}

pub fn seed_toy(pool: &DbPool, owner_id: i32, name: &str) -> Toy {
    let mut conn = pool.get().unwrap();
    toys::create(
        &mut conn,
        &NewToy {
            name: name.to_string(),
            color: "Red".to_string(),
            user_id: owner_id,
        },
    )
    .unwrap()
}

pub fn seed_feeding(pool: &DbPool, cat_id: i32, date: NaiveDate) {
    let mut conn = pool.get().unwrap();
    cats::add_feeding(
        &mut conn,
        &NewFeeding {
            date,
            meal: Meal::Breakfast,
            cat_id,
        },
    )
    .unwrap();
}

pub fn link_toy(pool: &DbPool, cat_id: i32, toy_id: i32) {
    let mut conn = pool.get().unwrap();
    cats::add_toy(&mut conn, cat_id, toy_id).unwrap();
}

pub fn cats_of(pool: &DbPool, owner_id: i32) -> Vec<Cat> {
    cats::list_for_owner(&mut pool.get().unwrap(), owner_id).unwrap()
}

pub fn toys_of(pool: &DbPool, cat_id: i32) -> Vec<Toy> {
    cats::toys(&mut pool.get().unwrap(), cat_id).unwrap()
}

pub fn toys_owned_by(pool: &DbPool, owner_id: i32) -> Vec<Toy> {
    toys::list_for_owner(&mut pool.get().unwrap(), owner_id).unwrap()
}

pub fn photos_of(pool: &DbPool, cat_id: i32) -> Vec<Photo> {
    cats::photos(&mut pool.get().unwrap(), cat_id).unwrap()
}

pub fn feeding_count(pool: &DbPool) -> i64 {
    use crate::schema::feedings;
    use diesel::prelude::*;

    feedings::table
        .count()
        .get_result(&mut pool.get().unwrap())
        .unwrap()
}
