//! Authentication module.
//!
//! This module issues and validates signed identity tokens, hashes and
//! verifies passwords, and gates requests on token validity and role.
//!
//! # Pre-conditions
//! - The signing secret and hash cost are loaded once at startup.
//!
//! # Post-conditions
//! - Every component here is immutable once built and safe to share.
//!
//! # Invariants
//! - No plaintext password or signing secret is stored or logged.

pub mod error;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod principal;

pub use error::AuthError;
pub use gate::{authenticate, authorize, extract_bearer_token, require_auth, require_role};
pub use jwt::{Claims, TokenConfigError, TokenManager};
pub use password::{CredentialHasher, HashCost, HashCostError, HashingPool};
pub use principal::{Principal, Role};
