//! JWT issuing and validation.
//!
//! Tokens are compact HS256 JWTs signed with a single process-wide secret.
//!
//! # Pre-conditions
//! - The secret must be non-empty.
//!
//! # Post-conditions
//! - `validate` returns claims only for tokens whose header names an allowed
//!   algorithm, whose signature matches, and whose `exp` is strictly after now.
//!
//! # Invariants
//! - The signing keys are derived once at construction and never change.
//! - The header algorithm is checked against [`ALLOWED_ALGORITHMS`] before the
//!   signature, and the signature before any claim is read.
//! - Validation is stateless; there is no record of issued or revoked tokens.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::{AuthError, Principal, Role};
use crate::time::TimeSource;

/// Header `alg` values a token may carry. Everything else, `none` included,
/// is rejected as an invalid signature.
pub const ALLOWED_ALGORITHMS: &[&str] = &["HS256"];

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried in a token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// The identity these claims describe.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::new(self.user_id, self.email.clone(), self.role)
    }
}

/// Only the field needed for the allow-list check.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Error returned when the token manager cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    /// The signing secret is empty.
    EmptySecret,
}

impl std::fmt::Display for TokenConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "signing secret must not be empty"),
        }
    }
}

impl std::error::Error for TokenConfigError {}

/// Issues and validates signed identity tokens.
///
/// Holds no mutable state, so a single instance can be shared across all
/// request tasks without locking.
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    time_source: Arc<dyn TimeSource>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &SIGNING_ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager from the signing secret.
    ///
    /// # Errors
    /// Returns `TokenConfigError::EmptySecret` if the secret is empty.
    pub fn new(secret: &[u8], time_source: Arc<dyn TimeSource>) -> Result<Self, TokenConfigError> {
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }

        // Expiry is checked against our own time source with no leeway, so
        // the library's wall-clock check is switched off.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            time_source,
        })
    }

    /// Issue a token for `principal` that expires `ttl` from now.
    ///
    /// A zero `ttl` produces a token that is already expired.
    ///
    /// # Errors
    /// Returns `AuthError::InternalCryptoFailure` if signing fails.
    pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String, AuthError> {
        let now = self.time_source.now_secs();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id: principal.subject_id(),
            email: principal.email().to_string(),
            role: principal.role(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("failed to sign token: {e}");
            AuthError::InternalCryptoFailure
        })
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    /// - `MalformedToken` if the token is not three segments with a decodable
    ///   header, or the verified payload is not the expected claims shape.
    /// - `InvalidSignature` if the header algorithm is not allowed or the
    ///   signature does not match.
    /// - `Expired` if `exp` is at or before the current time.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        check_header(token)?;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(map_jwt_error)?;
        let claims = token_data.claims;

        if claims.exp <= self.time_source.now_secs() {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

/// Checks the token's structure and that its header names an allowed algorithm.
fn check_header(token: &str) -> Result<(), AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::MalformedToken);
    };
    if header.is_empty() || payload.is_empty() {
        return Err(AuthError::MalformedToken);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken)?;
    let raw: RawHeader =
        serde_json::from_slice(&header_bytes).map_err(|_| AuthError::MalformedToken)?;

    if !ALLOWED_ALGORITHMS.contains(&raw.alg.as_str()) {
        tracing::warn!(alg = %raw.alg, "rejected token with disallowed algorithm");
        return Err(AuthError::InvalidSignature);
    }

    Ok(())
}

/// Maps jsonwebtoken errors to our failure kinds.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => AuthError::MalformedToken,
        _ => AuthError::MalformedToken,
    }
}
