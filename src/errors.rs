use actix_web::http::{header, StatusCode};
use actix_web::{error, HttpResponse};
use derive_more::Display;
use serde_json::json;

pub const LOGIN_PATH: &str = "/accounts/login";

#[derive(Debug, Display)]
pub enum UserError {
    #[display(fmt = "Invalid input parameter")]
    ValidationError,
    #[display(fmt = "Login required")]
    Unauthenticated,
    #[display(fmt = "Not authorized")]
    Forbidden,
    #[display(fmt = "Not found")]
    NotFoundError,
    #[display(fmt = "Internal server error")]
    DBPoolGetError,
    #[display(fmt = "Internal server error")]
    UnexpectedError,
}

impl error::ResponseError for UserError {
    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let UserError::Unauthenticated = self {
            response.insert_header((header::LOCATION, LOGIN_PATH));
        }
        response.json(json!({ "msg": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            UserError::ValidationError => StatusCode::BAD_REQUEST,
            UserError::Unauthenticated => StatusCode::SEE_OTHER,
            UserError::Forbidden => StatusCode::FORBIDDEN,
            UserError::NotFoundError => StatusCode::NOT_FOUND,
            UserError::DBPoolGetError | UserError::UnexpectedError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<diesel::result::Error> for UserError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => UserError::NotFoundError,
            e => {
                error!("Unexpected database error: {}", e);
                UserError::UnexpectedError
            }
        }
    }
}
