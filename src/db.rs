use actix_web::web;
use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::sqlite::SqliteConnection;
use r2d2::CustomizeConnection;

use crate::errors::UserError;

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    created_at TIMESTAMP NOT NULL
);

CREATE INDEX IF NOT EXISTS sessions_created_at ON sessions (created_at);

CREATE TABLE IF NOT EXISTS cats (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL,
    breed TEXT NOT NULL,
    description TEXT NOT NULL,
    age INTEGER NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS toys (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL,
    color TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS cats_toys (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    cat_id INTEGER NOT NULL REFERENCES cats (id) ON DELETE CASCADE,
    toy_id INTEGER NOT NULL REFERENCES toys (id) ON DELETE CASCADE,
    UNIQUE (cat_id, toy_id)
);

CREATE TABLE IF NOT EXISTS feedings (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    date DATE NOT NULL,
    meal TEXT NOT NULL DEFAULT 'B' CHECK (meal IN ('B', 'L', 'D')),
    cat_id INTEGER NOT NULL REFERENCES cats (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS feedings_cat_id_date ON feedings (cat_id, date);

CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    url TEXT NOT NULL,
    cat_id INTEGER NOT NULL REFERENCES cats (id) ON DELETE CASCADE
);
"#;

/// Turns on foreign keys and makes sure the tables exist for every new
/// connection the pool opens.
#[derive(Debug)]
struct PrepareConnection;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for PrepareConnection {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(SCHEMA)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn setup_database(database_url: &str) -> Result<DbPool, r2d2::Error> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);

    r2d2::Pool::builder()
        .connection_customizer(Box::new(PrepareConnection))
        .build(manager)
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub async fn run<F, T>(pool: &DbPool, f: F) -> Result<T, UserError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, UserError> + Send + 'static,
    T: Send + 'static,
{
    let mut connection = pool.get().map_err(|e| {
        error!("Failed to get DB connection from pool: {}", e);
        UserError::DBPoolGetError
    })?;

    web::block(move || f(&mut connection))
        .await
        .map_err(|_| {
            error!("Blocking Thread Pool Error");
            UserError::UnexpectedError
        })?
}

/// Single-connection in-memory pool; every test gets its own database.
#[cfg(test)]
pub fn test_pool() -> DbPool {
    let manager = ConnectionManager::<SqliteConnection>::new(":memory:");

    r2d2::Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_customizer(Box::new(PrepareConnection))
        .build(manager)
        .expect("in-memory pool")
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::prelude::*;
    use diesel::sql_types::Integer;

    #[derive(QueryableByName)]
    struct Flag {
        #[diesel(sql_type = Integer)]
        foreign_keys: i32,
    }

    #[test]
    fn connections_enforce_foreign_keys() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();

        let flag: Flag = diesel::sql_query("PRAGMA foreign_keys")
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(flag.foreign_keys, 1);

        let orphan = conn.batch_execute("INSERT INTO feedings (date, meal, cat_id) VALUES ('2024-01-01', 'B', 99)");
        assert!(orphan.is_err());
    }

    #[test]
    fn schema_is_idempotent() {
        let pool = test_pool();
        let mut conn = pool.get().unwrap();
        conn.batch_execute(SCHEMA).unwrap();
    }

    #[actix_rt::test]
    async fn run_maps_missing_rows_to_not_found() {
        use crate::schema::cats::dsl::*;

        let pool = test_pool();
        let result = run(&pool, |conn| {
            Ok(cats.filter(id.eq(42)).select(name).first::<String>(conn)?)
        })
        .await;
        assert!(matches!(result, Err(UserError::NotFoundError)));
    }
}
