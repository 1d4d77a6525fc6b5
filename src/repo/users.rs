use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::auth::{new_session_token, session_cutoff};
use crate::model::{NewSession, NewUser, User};
use crate::schema::{sessions, users};

pub fn create(conn: &mut SqliteConnection, new_user: &NewUser) -> QueryResult<User> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
}

pub fn find_by_username(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::username.eq(name))
        .select(User::as_select())
        .first(conn)
        .optional()
}

/// Opens a session for the user and returns its cookie token. Expired
/// sessions of every user are swept first.
pub fn create_session(
    conn: &mut SqliteConnection,
    user_id: i32,
    now: NaiveDateTime,
) -> QueryResult<String> {
    let cutoff = session_cutoff(now);
    let swept = diesel::delete(sessions::table.filter(sessions::created_at.le(cutoff)))
        .execute(conn)?;
    if swept > 0 {
        debug!("Removed {} expired sessions", swept);
    }

    let session = NewSession {
        token: new_session_token(),
        user_id,
        created_at: now,
    };
    diesel::insert_into(sessions::table)
        .values(&session)
        .execute(conn)?;
    Ok(session.token)
}

/// Resolves a token to its user while the session is younger than the
/// session lifetime.
pub fn find_by_session(
    conn: &mut SqliteConnection,
    token: &str,
    now: NaiveDateTime,
) -> QueryResult<Option<User>> {
    sessions::table
        .inner_join(users::table)
        .filter(sessions::token.eq(token))
        .filter(sessions::created_at.gt(session_cutoff(now)))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn delete_session(conn: &mut SqliteConnection, token: &str) -> QueryResult<usize> {
    diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(conn)
}
