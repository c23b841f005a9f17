use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("you need to sign in to post a ride")]
    AuthRequired,
    #[error("no seats available on this ride")]
    NoSeatsAvailable,
    #[error("ride not found")]
    NotFound,
    #[error("store error: {0}")]
    Store(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn store(cause: impl std::fmt::Display) -> Self {
        Self::Store(cause.to_string())
    }

    /// Codes below 100 are internal failures whose message is not shown to callers.
    pub fn code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::Store(_) => 2,
            Self::Server(_) => 3,
            Self::Validation { .. } => 101,
            Self::AuthRequired => 102,
            Self::NotFound => 103,
            Self::NoSeatsAvailable => 104,
        }
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::store(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::store(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NoSeatsAvailable => StatusCode::CONFLICT,
            Self::Store(_) | Self::Config(_) | Self::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let code = self.code();
        let message = match code {
            1..=99 => {
                tracing::error!("internal error: {}", self);
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "code": code,
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[test]
fn error_codes_split_internal_and_caller_facing() {
    assert_eq!(Error::Store("boom".into()).code(), 2);
    assert!(Error::NoSeatsAvailable.code() >= 100);
    assert!(Error::validation("price", "not a number").code() >= 100);
}

#[test]
fn validation_error_message_names_the_field() {
    let err = Error::validation("price", "must be a non-negative number");

    assert_eq!(err.to_string(), "invalid price: must be a non-negative number");
    assert!(err.is_validation_error());
}

#[test]
fn into_response_status() {
    assert_eq!(
        Error::NoSeatsAvailable.into_response().status(),
        StatusCode::CONFLICT
    );
    assert_eq!(Error::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    assert_eq!(
        Error::AuthRequired.into_response().status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        Error::Store("connection reset".into())
            .into_response()
            .status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
