use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::model::{NewToy, Toy, ToyForm};
use crate::schema::{cats_toys, toys};

pub fn list_for_owner(conn: &mut SqliteConnection, owner_id: i32) -> QueryResult<Vec<Toy>> {
    toys::table
        .filter(toys::user_id.eq(owner_id))
        .order(toys::id)
        .select(Toy::as_select())
        .load(conn)
}

pub fn find(conn: &mut SqliteConnection, toy_id: i32) -> QueryResult<Toy> {
    toys::table.find(toy_id).select(Toy::as_select()).first(conn)
}

pub fn create(conn: &mut SqliteConnection, new_toy: &NewToy) -> QueryResult<Toy> {
    diesel::insert_into(toys::table)
        .values(new_toy)
        .returning(Toy::as_returning())
        .get_result(conn)
}

pub fn update(conn: &mut SqliteConnection, toy_id: i32, form: &ToyForm) -> QueryResult<Toy> {
    diesel::update(toys::table.find(toy_id))
        .set(form)
        .returning(Toy::as_returning())
        .get_result(conn)
}

/// Deletes the toy and unlinks it from every cat.
pub fn delete(conn: &mut SqliteConnection, toy_id: i32) -> QueryResult<usize> {
    conn.transaction(|conn| {
        diesel::delete(cats_toys::table.filter(cats_toys::toy_id.eq(toy_id))).execute(conn)?;
        diesel::delete(toys::table.find(toy_id)).execute(conn)
    })
}
