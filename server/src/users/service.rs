//! Registration, login, and user management.
//!
//! The login path is the only place tokens are issued:
//! `HashingPool::verify` then `TokenManager::issue`.

use std::sync::Arc;
use std::time::Duration;

use super::model::{
    LoginRequest, NewUser, RegisterRequest, UpdateUserRequest, User, UserChanges,
};
use super::repository::UserRepository;
use crate::auth::{HashingPool, Principal, Role, TokenManager};
use crate::error::ApiError;
use crate::time::TimeSource;

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    hashing: HashingPool,
    tokens: Arc<TokenManager>,
    token_ttl: Duration,
    time_source: Arc<dyn TimeSource>,
}

impl UserService {
    #[must_use]
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hashing: HashingPool,
        tokens: Arc<TokenManager>,
        token_ttl: Duration,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            repository,
            hashing,
            tokens,
            token_ttl,
            time_source,
        }
    }

    /// Create a user with role `user`.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, ApiError> {
        request.validate().map_err(ApiError::BadRequest)?;
        self.create(request.email, request.password, request.name, Role::User)
            .await
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown email, inactive account, and wrong password all fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<(String, User), ApiError> {
        request.validate().map_err(ApiError::BadRequest)?;

        let Some(user) = self.repository.find_by_email(&request.email)? else {
            tracing::info!("login failed: unknown email");
            return Err(ApiError::InvalidLogin);
        };
        if !user.is_active {
            tracing::info!(user_id = user.id, "login failed: inactive account");
            return Err(ApiError::InvalidLogin);
        }
        if !self
            .hashing
            .verify(user.password_hash.clone(), request.password.clone())
            .await
        {
            tracing::info!(user_id = user.id, "login failed: wrong password");
            return Err(ApiError::InvalidLogin);
        }

        let user = self.upgrade_hash(user, request.password).await;
        let principal = Principal::new(user.id, user.email.clone(), user.role);
        let token = self.tokens.issue(&principal, self.token_ttl)?;

        tracing::info!(user_id = user.id, "login succeeded");
        Ok((token, user))
    }

    /// # Errors
    /// `NotFound` if no user has `id`.
    pub fn get(&self, id: i64) -> Result<User, ApiError> {
        self.repository.find_by_id(id)?.ok_or(ApiError::NotFound)
    }

    pub fn list(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.repository.list()?)
    }

    /// Apply a partial update on behalf of `actor`.
    ///
    /// Non-admins may only update themselves and may not change role or
    /// active status.
    pub async fn update(
        &self,
        actor: &Principal,
        id: i64,
        request: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        if !actor.is_admin() && (actor.subject_id() != id || request.changes_privileges()) {
            tracing::warn!(actor = actor.subject_id(), target = id, "update forbidden");
            return Err(ApiError::Forbidden);
        }
        request.validate().map_err(ApiError::BadRequest)?;

        // Fail fast before paying for a hash.
        self.get(id)?;
        let password_hash = match request.password {
            Some(password) => Some(self.hashing.hash(password).await?),
            None => None,
        };
        let changes = UserChanges {
            email: request.email,
            password_hash,
            name: request.name,
            role: request.role,
            is_active: request.is_active,
        };

        let user = self
            .repository
            .update(id, changes, self.time_source.now_secs())?;
        tracing::info!(user_id = id, "user updated");
        Ok(user)
    }

    /// # Errors
    /// `NotFound` if no user has `id`.
    pub fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.repository.delete(id)?;
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    /// Create the bootstrap admin unless the email is already registered.
    ///
    /// # Errors
    /// `BadRequest` if the email or password would be rejected at registration.
    pub async fn seed_admin(&self, email: String, password: String) -> Result<(), ApiError> {
        let name = "Administrator".to_string();
        RegisterRequest {
            email: email.clone(),
            password: password.clone(),
            name: name.clone(),
        }
        .validate()
        .map_err(ApiError::BadRequest)?;

        if self.repository.find_by_email(&email)?.is_some() {
            tracing::info!("bootstrap admin already exists");
            return Ok(());
        }
        let admin = self.create(email, password, name, Role::Admin).await?;
        tracing::info!(user_id = admin.id, "bootstrap admin created");
        Ok(())
    }

    async fn create(
        &self,
        email: String,
        password: String,
        name: String,
        role: Role,
    ) -> Result<User, ApiError> {
        if self.repository.find_by_email(&email)?.is_some() {
            return Err(ApiError::Conflict);
        }

        let password_hash = self.hashing.hash(password).await?;
        let user = self.repository.create(NewUser {
            email,
            password_hash,
            name,
            role,
            created_at: self.time_source.now_secs(),
        })?;

        tracing::info!(user_id = user.id, "user created");
        Ok(user)
    }

    /// Re-hash with current parameters if the stored hash is outdated.
    /// Failures are logged and the original user is kept; login still succeeds.
    async fn upgrade_hash(&self, user: User, password: String) -> User {
        match self.hashing.hasher().needs_rehash(&user.password_hash) {
            Ok(false) => return user,
            Ok(true) => {}
            Err(e) => {
                tracing::warn!(user_id = user.id, "cannot inspect stored hash: {e}");
                return user;
            }
        }

        let password_hash = match self.hashing.hash(password).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(user_id = user.id, "rehash failed: {e}");
                return user;
            }
        };

        // Only swap the hash that was just verified; anything written while
        // the new hash was computed wins.
        match self
            .repository
            .replace_password_hash(user.id, &user.password_hash, password_hash)
        {
            Ok(Some(upgraded)) => {
                tracing::info!(user_id = upgraded.id, "password hash upgraded");
                upgraded
            }
            Ok(None) => {
                tracing::info!(user_id = user.id, "hash changed during upgrade, keeping it");
                user
            }
            Err(e) => {
                tracing::warn!(user_id = user.id, "storing upgraded hash failed: {e}");
                user
            }
        }
    }
}
