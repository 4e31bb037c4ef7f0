//! Errors surfaced by the HTTP API.
//!
//! Every variant maps to one status code and a generic message. Internal
//! detail goes to the log, never into the response body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::AuthError;
use crate::users::UserError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A gate, token, or hashing failure.
    Auth(AuthError),
    /// The request body or path is invalid.
    BadRequest(String),
    /// Unknown email, inactive account, or wrong password at login.
    InvalidLogin,
    /// The caller may not perform this action on this resource.
    Forbidden,
    NotFound,
    /// The email is already registered.
    Conflict,
    /// Storage or other internal failure.
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(e) => e.status_code(),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidLogin => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Auth(e) => e.public_message().to_string(),
            Self::BadRequest(reason) => reason.clone(),
            Self::InvalidLogin => "invalid email or password".to_string(),
            Self::Forbidden => "insufficient permissions".to_string(),
            Self::NotFound => "user not found".to_string(),
            Self::Conflict => "email already registered".to_string(),
            Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "{e}"),
            Self::BadRequest(reason) => write!(f, "bad request: {reason}"),
            Self::InvalidLogin => write!(f, "invalid login"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal(reason) => write!(f, "internal error: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Auth(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(_) => Self::NotFound,
            UserError::DuplicateEmail(_) => Self::Conflict,
            UserError::Storage(reason) => Self::Internal(reason),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(reason) = &self {
            tracing::error!("request failed: {reason}");
        }
        let body = serde_json::json!({ "error": self.public_message() });
        (self.status_code(), Json(body)).into_response()
    }
}
