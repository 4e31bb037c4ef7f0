//! Per-request authentication and role checks.
//!
//! A request moves `NoAuth -> HeaderPresent -> TokenExtracted ->
//! TokenValidated -> (RoleChecked) -> Authorized`; any failing step rejects
//! with its [`AuthError`]. [`authenticate`] and [`authorize`] are the pure
//! transitions; [`require_auth`] and [`require_role`] wire them into axum so
//! no handler runs unless every step passed.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::{AuthError, Principal, Role, TokenManager};

/// Authorization scheme expected before the token. Case-sensitive.
pub const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
/// - `MissingCredential` if the header is absent.
/// - `MalformedHeader` if the value is not visible ASCII, the scheme is not
///   `Bearer`, the separator is not a single space, or the token is empty.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MalformedHeader)?;
    if scheme != BEARER_SCHEME || token.is_empty() || token.contains(' ') {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}

/// Run the header and token steps of the gate.
///
/// # Errors
/// Propagates the header failure or the token manager's validation failure.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenManager) -> Result<Principal, AuthError> {
    let token = extract_bearer_token(headers)?;
    let claims = tokens.validate(token)?;
    Ok(claims.principal())
}

/// Run the role step of the gate.
///
/// # Errors
/// - `MissingCredential` if no principal was established.
/// - `InsufficientRole` if the principal's role does not satisfy `required`.
pub fn authorize(principal: Option<&Principal>, required: Role) -> Result<(), AuthError> {
    let principal = principal.ok_or(AuthError::MissingCredential)?;
    if principal.role().satisfies(required) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}

/// Middleware that validates the bearer token and attaches the [`Principal`]
/// to the request extensions.
pub async fn require_auth(
    State(tokens): State<Arc<TokenManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = authenticate(request.headers(), &tokens).map_err(|e| {
        tracing::debug!(path = %request.uri().path(), "authentication rejected: {e}");
        e
    })?;

    tracing::debug!(user_id = principal.subject_id(), "authenticated request");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Middleware that requires the attached principal to hold `required`.
///
/// Must be layered inside [`require_auth`].
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(request.extensions().get::<Principal>(), required).map_err(|e| {
        tracing::warn!(path = %request.uri().path(), %required, "authorization rejected: {e}");
        e
    })?;

    Ok(next.run(request).await)
}

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}
