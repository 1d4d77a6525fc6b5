//! Accounts, sessions and the ownership check every cat and toy handler
//! goes through.

use std::future::Future;
use std::pin::Pin;

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, NaiveDateTime, Utc};
use rand_core::OsRng;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::errors::UserError;
use crate::model::{Cat, Toy, User};
use crate::repo::users;

pub const SESSION_COOKIE: &str = "catcollector_session";
/// Sessions and their cookies last two weeks from login.
pub const SESSION_DAYS: i64 = 14;

/// Sessions created at or before the returned instant have expired.
pub fn session_cutoff(now: NaiveDateTime) -> NaiveDateTime {
    now - Duration::days(SESSION_DAYS)
}

pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            UserError::UnexpectedError
        })
}

/// Checks a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(SESSION_DAYS))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookie
}

/// Records owned by exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i32;
}

impl Owned for Cat {
    fn owner_id(&self) -> i32 {
        self.user_id
    }
}

impl Owned for Toy {
    fn owner_id(&self) -> i32 {
        self.user_id
    }
}

/// The authenticated user of the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: i32,
    pub username: String,
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Actor {
            id: user.id,
            username: user.username,
        }
    }
}

impl Actor {
    /// Passes the record through when the actor owns it.
    pub fn authorize<R: Owned>(&self, record: R) -> Result<R, UserError> {
        if record.owner_id() == self.id {
            Ok(record)
        } else {
            warn!(
                "User {} denied access to a record owned by user {}",
                self.id,
                record.owner_id()
            );
            Err(UserError::Forbidden)
        }
    }
}

impl FromRequest for Actor {
    type Error = UserError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let token = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());

        Box::pin(async move {
            let pool = pool.ok_or_else(|| {
                error!("Database pool missing from app data");
                UserError::UnexpectedError
            })?;
            let token = token.ok_or(UserError::Unauthenticated)?;

            let now = Utc::now().naive_utc();
            let user = db::run(&pool, move |conn| {
                Ok(users::find_by_session(conn, &token, now)?)
            })
            .await?
                .ok_or(UserError::Unauthenticated)?;

            Ok(user.into())
        })
    }
}
