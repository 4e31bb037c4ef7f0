//! Password hashing and verification using Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$digest`) so the
//! algorithm, cost, and salt travel with the digest. Verification always uses
//! the parameters embedded in the stored hash, so hashes made under an older
//! cost keep working after the configuration changes.
//!
//! Hashing is deliberately slow. [`HashingPool`] runs it on the blocking
//! thread pool behind a semaphore so login bursts cannot starve token checks.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tokio::sync::Semaphore;

use super::AuthError;

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Number of passes over memory (the cost factor).
    pub iterations: u32,
    /// Memory size in KiB.
    pub memory_kib: u32,
}

impl HashCost {
    pub const DEFAULT_ITERATIONS: u32 = Params::DEFAULT_T_COST;
    pub const DEFAULT_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            iterations: Self::DEFAULT_ITERATIONS,
            memory_kib: Self::DEFAULT_MEMORY_KIB,
        }
    }
}

/// Error returned when the cost parameters are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCostError(String);

impl std::fmt::Display for HashCostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid hash cost: {}", self.0)
    }
}

impl std::error::Error for HashCostError {}

/// Turns plaintext passwords into storage-safe hashes and checks them later.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    params: Params,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// # Errors
    /// Returns `HashCostError` if argon2 rejects the parameters (for example
    /// zero iterations or too little memory).
    pub fn new(cost: HashCost) -> Result<Self, HashCostError> {
        let params = Params::new(cost.memory_kib, cost.iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| HashCostError(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());
        Ok(Self { argon2, params })
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// # Errors
    /// Returns `AuthError::InternalCryptoFailure` if argon2 fails.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("failed to hash password: {e}");
                AuthError::InternalCryptoFailure
            })
    }

    /// Check `password` against a stored hash.
    ///
    /// Returns `false` for a wrong password and for any hash that cannot be
    /// parsed or names an unsupported algorithm. The digest comparison is
    /// constant-time.
    #[must_use]
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("stored credential hash is not a PHC string");
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Whether a stored hash was made with different parameters than the
    /// current configuration and should be replaced on next login.
    ///
    /// # Errors
    /// Returns `AuthError::HashFormatError` if the hash cannot be parsed.
    pub fn needs_rehash(&self, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::HashFormatError)?;
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return Ok(true);
        }
        if parsed.version != Some(Version::V0x13.into()) {
            return Ok(true);
        }

        let stored = Params::try_from(&parsed).map_err(|_| AuthError::HashFormatError)?;
        Ok(stored.m_cost() != self.params.m_cost()
            || stored.t_cost() != self.params.t_cost()
            || stored.p_cost() != self.params.p_cost())
    }
}

/// Runs a [`CredentialHasher`] on the blocking thread pool with bounded
/// concurrency.
#[derive(Debug, Clone)]
pub struct HashingPool {
    hasher: Arc<CredentialHasher>,
    permits: Arc<Semaphore>,
}

impl HashingPool {
    /// `max_concurrent` is clamped to at least one.
    #[must_use]
    pub fn new(hasher: CredentialHasher, max_concurrent: usize) -> Self {
        Self {
            hasher: Arc::new(hasher),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    #[must_use]
    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    /// # Errors
    /// Returns `AuthError::InternalCryptoFailure` if hashing fails or the
    /// blocking task cannot complete.
    pub async fn hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        self.run(move || hasher.hash(&password)).await?
    }

    /// Returns `false` on mismatch, malformed hash, or worker failure.
    pub async fn verify(&self, hash: String, password: String) -> bool {
        let hasher = Arc::clone(&self.hasher);
        self.run(move || hasher.verify(&hash, &password))
            .await
            .unwrap_or(false)
    }

    async fn run<T, F>(&self, job: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| AuthError::InternalCryptoFailure)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| {
            tracing::error!("hashing task failed: {e}");
            AuthError::InternalCryptoFailure
        })
    }
}
