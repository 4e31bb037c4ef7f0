//! Authentication and authorization failure kinds.
//!
//! # Invariants
//! - Every kind maps to exactly one HTTP status code.
//! - The response body only ever carries the generic public message; the
//!   `Display` text is for internal diagnostics and logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Error returned by the credential hasher, token manager, and gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or no principal attached to the request.
    MissingCredential,
    /// The `Authorization` header is not `Bearer <token>`.
    MalformedHeader,
    /// The token is not three base64url segments with a JSON header and payload.
    MalformedToken,
    /// The signature does not match, or the header names a disallowed algorithm.
    InvalidSignature,
    /// The token's `exp` is at or before the current time.
    Expired,
    /// The principal's role does not satisfy the route's required role.
    InsufficientRole,
    /// A stored credential hash could not be parsed.
    HashFormatError,
    /// Hashing, signing, or the worker pool failed for this request.
    InternalCryptoFailure,
}

impl AuthError {
    /// The HTTP status code this failure maps to.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::MalformedHeader => StatusCode::BAD_REQUEST,
            Self::MissingCredential
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::Expired => StatusCode::UNAUTHORIZED,
            Self::InsufficientRole => StatusCode::FORBIDDEN,
            Self::HashFormatError | Self::InternalCryptoFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The non-diagnostic message sent to clients.
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::MalformedHeader => "malformed authorization header",
            Self::MissingCredential
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::Expired => "authentication required",
            Self::InsufficientRole => "insufficient permissions",
            Self::HashFormatError | Self::InternalCryptoFailure => "internal server error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredential => write!(f, "missing credential"),
            Self::MalformedHeader => write!(f, "malformed authorization header"),
            Self::MalformedToken => write!(f, "malformed token"),
            Self::InvalidSignature => write!(f, "invalid token signature"),
            Self::Expired => write!(f, "token has expired"),
            Self::InsufficientRole => write!(f, "insufficient role"),
            Self::HashFormatError => write!(f, "unrecognized credential hash format"),
            Self::InternalCryptoFailure => write!(f, "internal crypto failure"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.public_message() });
        (self.status_code(), Json(body)).into_response()
    }
}
