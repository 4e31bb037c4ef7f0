//! Server configuration module.
//!
//! This module provides configuration loading for the intranet server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `INTRANET_JWT_SECRET`: HS256 signing secret (required)
//! - `INTRANET_TOKEN_TTL_SECS`: Token lifetime in seconds (default: `86400`)
//! - `INTRANET_HASH_COST`: Argon2 iteration count (default: `2`)
//! - `INTRANET_HASH_MEMORY_KIB`: Argon2 memory in KiB (default: `19456`)
//! - `INTRANET_HASH_CONCURRENCY`: Max concurrent hashing jobs (default: CPU count)
//! - `INTRANET_LISTEN_ADDR`: Address to listen on (default: `0.0.0.0:8070`)
//! - `INTRANET_BOOTSTRAP_ADMIN_EMAIL` / `INTRANET_BOOTSTRAP_ADMIN_PASSWORD`:
//!   Optional admin account created at startup (both or neither)
//!
//! # Invariants
//!
//! - `jwt_secret` is never empty
//! - `token_ttl` is at least one second
//! - `hash_cost` has been accepted by argon2
//! - `hash_concurrency` is at least one

use std::net::SocketAddr;
use std::time::Duration;

use crate::auth::{CredentialHasher, HashCost};

const JWT_SECRET: &str = "INTRANET_JWT_SECRET";
const TOKEN_TTL_SECS: &str = "INTRANET_TOKEN_TTL_SECS";
const HASH_COST: &str = "INTRANET_HASH_COST";
const HASH_MEMORY_KIB: &str = "INTRANET_HASH_MEMORY_KIB";
const HASH_CONCURRENCY: &str = "INTRANET_HASH_CONCURRENCY";
const LISTEN_ADDR: &str = "INTRANET_LISTEN_ADDR";
const BOOTSTRAP_ADMIN_EMAIL: &str = "INTRANET_BOOTSTRAP_ADMIN_EMAIL";
const BOOTSTRAP_ADMIN_PASSWORD: &str = "INTRANET_BOOTSTRAP_ADMIN_PASSWORD";

/// Credentials for the admin account seeded at startup.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Server configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()` or `from_lookup()`, every invariant in
/// the module docs holds; misconfiguration is reported as a `ConfigError`
/// and is the only condition that should stop the server from starting.
#[derive(Clone)]
pub struct ServerConfig {
    /// Secret used to sign and verify tokens.
    pub jwt_secret: String,
    /// Lifetime of issued tokens.
    pub token_ttl: Duration,
    /// Argon2 cost parameters for new hashes.
    pub hash_cost: HashCost,
    /// Upper bound on concurrent hash/verify jobs.
    pub hash_concurrency: usize,
    /// Address to bind the HTTP listener to.
    pub listen_addr: SocketAddr,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .field("hash_concurrency", &self.hash_concurrency)
            .field("listen_addr", &self.listen_addr)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

impl ServerConfig {
    /// Default token lifetime (24 hours).
    pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
    /// Default listen address.
    pub const DEFAULT_LISTEN_ADDR: &'static str = "0.0.0.0:8070";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is missing or invalid; see the module
    /// docs for the rules.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = Self::load_jwt_secret(&lookup)?;
        let token_ttl = Self::load_token_ttl(&lookup)?;
        let hash_cost = Self::load_hash_cost(&lookup)?;
        let hash_concurrency = Self::load_hash_concurrency(&lookup)?;
        let listen_addr = Self::load_listen_addr(&lookup)?;
        let bootstrap_admin = Self::load_bootstrap_admin(&lookup)?;

        Ok(Self {
            jwt_secret,
            token_ttl,
            hash_cost,
            hash_concurrency,
            listen_addr,
            bootstrap_admin,
        })
    }

    fn load_jwt_secret(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        let secret =
            lookup(JWT_SECRET).ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET.to_string()))?;

        if secret.is_empty() {
            return Err(ConfigError::invalid(JWT_SECRET, "must not be empty"));
        }

        Ok(secret)
    }

    fn load_token_ttl(lookup: &impl Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
        let Some(value) = lookup(TOKEN_TTL_SECS) else {
            return Ok(Duration::from_secs(Self::DEFAULT_TOKEN_TTL_SECS));
        };

        let secs = value.parse::<i64>().map_err(|_| {
            ConfigError::invalid(TOKEN_TTL_SECS, format!("'{value}' is not an integer"))
        })?;
        let secs = u64::try_from(secs)
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| ConfigError::invalid(TOKEN_TTL_SECS, "must be greater than zero"))?;

        Ok(Duration::from_secs(secs))
    }

    /// Parses the cost variables and checks them against argon2's limits.
    fn load_hash_cost(lookup: &impl Fn(&str) -> Option<String>) -> Result<HashCost, ConfigError> {
        let iterations = parse_u32(lookup, HASH_COST)?.unwrap_or(HashCost::DEFAULT_ITERATIONS);
        let memory_kib = parse_u32(lookup, HASH_MEMORY_KIB)?.unwrap_or(HashCost::DEFAULT_MEMORY_KIB);
        let cost = HashCost {
            iterations,
            memory_kib,
        };

        CredentialHasher::new(cost).map_err(|e| ConfigError::invalid(HASH_COST, e.to_string()))?;
        Ok(cost)
    }

    fn load_hash_concurrency(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<usize, ConfigError> {
        match lookup(HASH_CONCURRENCY) {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::invalid(
                        HASH_CONCURRENCY,
                        format!("'{value}' is not a positive integer"),
                    )
                }),
            None => Ok(std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)),
        }
    }

    fn load_listen_addr(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<SocketAddr, ConfigError> {
        let value = lookup(LISTEN_ADDR).unwrap_or_else(|| Self::DEFAULT_LISTEN_ADDR.to_string());
        value.parse::<SocketAddr>().map_err(|_| {
            ConfigError::invalid(LISTEN_ADDR, format!("'{value}' is not a socket address"))
        })
    }

    fn load_bootstrap_admin(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Option<BootstrapAdmin>, ConfigError> {
        match (lookup(BOOTSTRAP_ADMIN_EMAIL), lookup(BOOTSTRAP_ADMIN_PASSWORD)) {
            (Some(email), Some(password)) => Ok(Some(BootstrapAdmin { email, password })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                BOOTSTRAP_ADMIN_PASSWORD.to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(BOOTSTRAP_ADMIN_EMAIL.to_string())),
        }
    }
}

fn parse_u32(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u32>, ConfigError> {
    lookup(name)
        .map(|value| {
            value.parse::<u32>().map_err(|_| {
                ConfigError::invalid(name, format!("'{value}' is not a non-negative integer"))
            })
        })
        .transpose()
}
