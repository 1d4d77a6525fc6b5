use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use diesel::Connection;
use handlebars::Handlebars;
use serde_json::json;

use super::pages::render;
use crate::auth::{
    expired_session_cookie, hash_password, session_cookie, verify_password, SESSION_COOKIE,
};
use crate::db::{self, DbPool};
use crate::errors::UserError;
use crate::model::{LoginForm, NewUser, SignupForm};
use crate::repo::users;

pub const SIGNUP_ERROR: &str = "Invalid sign up - try again";
pub const LOGIN_ERROR: &str = "Please enter a correct username and password.";
const AFTER_LOGIN: &str = "/cats";

fn signed_in(location: &str, token: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .cookie(session_cookie(token))
        .finish()
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => AFTER_LOGIN,
    }
}

pub async fn signup_form(hb: web::Data<Handlebars<'static>>) -> Result<HttpResponse, UserError> {
    render(&hb, "signup", &json!({ "username": "", "error_message": "" }))
}

pub async fn signup(
    pool: web::Data<DbPool>,
    hb: web::Data<Handlebars<'static>>,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse, UserError> {
    let form = form.into_inner();
    let username = form.username.clone();

    let token = if form.check() {
        let SignupForm { username, password1, .. } = form;
        db::run(&pool, move |conn| {
            let new_user = NewUser {
                username,
                password_hash: hash_password(&password1)?,
            };
            conn.transaction::<_, UserError, _>(|conn| {
                if users::find_by_username(conn, &new_user.username)?.is_some() {
                    return Ok(None);
                }
                let user = users::create(conn, &new_user)?;
                let now = Utc::now().naive_utc();
                Ok(Some(users::create_session(conn, user.id, now)?))
            })
        })
        .await?
    } else {
        None
    };

    match token {
        Some(token) => {
            info!("New user {} signed up", username);
            Ok(signed_in(AFTER_LOGIN, token))
        }
        None => {
            warn!("Rejected sign up for {:?}", username);
            render(
                &hb,
                "signup",
                &json!({ "username": username, "error_message": SIGNUP_ERROR }),
            )
        }
    }
}

pub async fn login_form(hb: web::Data<Handlebars<'static>>) -> Result<HttpResponse, UserError> {
    render(&hb, "login", &json!({ "username": "", "error_message": "" }))
}

pub async fn login(
    pool: web::Data<DbPool>,
    hb: web::Data<Handlebars<'static>>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, UserError> {
    let LoginForm {
        username,
        password,
        next,
    } = form.into_inner();
    let name = username.clone();

    let token = db::run(&pool, move |conn| match users::find_by_username(conn, &name)? {
        Some(user) if verify_password(&password, &user.password_hash) => {
            let now = Utc::now().naive_utc();
            Ok(Some(users::create_session(conn, user.id, now)?))
        }
        _ => Ok(None),
    })
    .await?;

    match token {
        Some(token) => {
            info!("User {} logged in", username);
            Ok(signed_in(safe_next(next.as_deref()), token))
        }
        None => {
            warn!("Failed login for {:?}", username);
            render(
                &hb,
                "login",
                &json!({ "username": username, "error_message": LOGIN_ERROR }),
            )
        }
    }
}

pub async fn logout(pool: web::Data<DbPool>, req: HttpRequest) -> Result<HttpResponse, UserError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        db::run(&pool, move |conn| Ok(users::delete_session(conn, &token)?)).await?;
    }

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .cookie(expired_session_cookie())
        .finish())
}
