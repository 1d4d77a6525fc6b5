use chrono::{Days, NaiveDate};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::model::{Cat, CatForm, Feeding, NewCat, NewCatToy, NewFeeding, NewPhoto, Photo, Toy};
use crate::schema::{cats, cats_toys, feedings, photos, toys};

/// Width of the rolling window counted by `fed_for_today`.
pub const FEEDING_WINDOW_DAYS: u64 = 7;

pub fn list_for_owner(conn: &mut SqliteConnection, owner_id: i32) -> QueryResult<Vec<Cat>> {
    cats::table
        .filter(cats::user_id.eq(owner_id))
        .order(cats::id)
        .select(Cat::as_select())
        .load(conn)
}

pub fn find(conn: &mut SqliteConnection, cat_id: i32) -> QueryResult<Cat> {
    cats::table.find(cat_id).select(Cat::as_select()).first(conn)
}

pub fn create(conn: &mut SqliteConnection, new_cat: &NewCat) -> QueryResult<Cat> {
    diesel::insert_into(cats::table)
        .values(new_cat)
        .returning(Cat::as_returning())
        .get_result(conn)
}

pub fn update(conn: &mut SqliteConnection, cat_id: i32, form: &CatForm) -> QueryResult<Cat> {
    diesel::update(cats::table.find(cat_id))
        .set(form)
        .returning(Cat::as_returning())
        .get_result(conn)
}

/// Deletes the cat together with its feedings, photos and toy links.
pub fn delete(conn: &mut SqliteConnection, cat_id: i32) -> QueryResult<usize> {
    conn.transaction(|conn| {
        diesel::delete(feedings::table.filter(feedings::cat_id.eq(cat_id))).execute(conn)?;
        diesel::delete(photos::table.filter(photos::cat_id.eq(cat_id))).execute(conn)?;
        diesel::delete(cats_toys::table.filter(cats_toys::cat_id.eq(cat_id))).execute(conn)?;
        diesel::delete(cats::table.find(cat_id)).execute(conn)
    })
}

pub fn toys(conn: &mut SqliteConnection, cat_id: i32) -> QueryResult<Vec<Toy>> {
    cats_toys::table
        .inner_join(toys::table)
        .filter(cats_toys::cat_id.eq(cat_id))
        .order(toys::id)
        .select(Toy::as_select())
        .load(conn)
}

/// Every toy not yet linked to the cat.
pub fn toys_not_on(conn: &mut SqliteConnection, cat_id: i32) -> QueryResult<Vec<Toy>> {
    let linked: Vec<i32> = cats_toys::table
        .filter(cats_toys::cat_id.eq(cat_id))
        .select(cats_toys::toy_id)
        .load(conn)?;

    toys::table
        .filter(toys::id.ne_all(linked))
        .order(toys::id)
        .select(Toy::as_select())
        .load(conn)
}

/// Links a toy to a cat. Linking twice is a no-op.
pub fn add_toy(conn: &mut SqliteConnection, cat_id: i32, toy_id: i32) -> QueryResult<usize> {
    diesel::insert_or_ignore_into(cats_toys::table)
        .values(&NewCatToy { cat_id, toy_id })
        .execute(conn)
}

pub fn remove_toy(conn: &mut SqliteConnection, cat_id: i32, toy_id: i32) -> QueryResult<usize> {
    diesel::delete(
        cats_toys::table
            .filter(cats_toys::cat_id.eq(cat_id))
            .filter(cats_toys::toy_id.eq(toy_id)),
    )
    .execute(conn)
}

pub fn feedings(conn: &mut SqliteConnection, cat_id: i32) -> QueryResult<Vec<Feeding>> {
    feedings::table
        .filter(feedings::cat_id.eq(cat_id))
        .order((feedings::date.desc(), feedings::id.desc()))
        .select(Feeding::as_select())
        .load(conn)
}

pub fn add_feeding(conn: &mut SqliteConnection, feeding: &NewFeeding) -> QueryResult<Feeding> {
    diesel::insert_into(feedings::table)
        .values(feeding)
        .returning(Feeding::as_returning())
        .get_result(conn)
}

/// Feedings dated on or after `today` minus the window.
pub fn fed_for_today(conn: &mut SqliteConnection, cat_id: i32, today: NaiveDate) -> QueryResult<i64> {
    let window_start = today - Days::new(FEEDING_WINDOW_DAYS);

    feedings::table
        .filter(feedings::cat_id.eq(cat_id))
        .filter(feedings::date.ge(window_start))
        .count()
        .get_result(conn)
}

pub fn photos(conn: &mut SqliteConnection, cat_id: i32) -> QueryResult<Vec<Photo>> {
    photos::table
        .filter(photos::cat_id.eq(cat_id))
        .order(photos::id)
        .select(Photo::as_select())
        .load(conn)
}

pub fn add_photo(conn: &mut SqliteConnection, photo: &NewPhoto) -> QueryResult<Photo> {
    diesel::insert_into(photos::table)
        .values(photo)
        .returning(Photo::as_returning())
        .get_result(conn)
}
