//! User entity and request bodies.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Minimum password length accepted at registration or password change.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Allowed display name length, in characters.
pub const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;

/// A stored user. Only ever holds the password hash, never the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    /// Seconds since the Unix epoch.
    pub created_at: i64,
    /// Seconds since the Unix epoch.
    pub updated_at: i64,
}

/// A user that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub created_at: i64,
}

/// Field-level changes to a stored user; `None` leaves the field as stored.
///
/// Applied by the repository in one step, so fields not named here are never
/// overwritten from a stale copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// The public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl RegisterRequest {
    /// # Errors
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_name(&self.name)
    }
}

impl LoginRequest {
    /// # Errors
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err("password is required".to_string());
        }
        Ok(())
    }
}

impl UpdateUserRequest {
    /// # Errors
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }

    /// Whether the update touches fields only an admin may change.
    #[must_use]
    pub const fn changes_privileges(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

/// Accepts `local@domain.tld` with no whitespace.
fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err("email must be a valid address".to_string());

    if email.chars().any(char::is_whitespace) {
        return invalid();
    }
    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };
    let valid_domain = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'));

    if local.is_empty() || domain.contains('@') || !valid_domain {
        return invalid();
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), String> {
    if !NAME_LEN.contains(&name.chars().count()) {
        return Err(format!(
            "name must be between {} and {} characters",
            NAME_LEN.start(),
            NAME_LEN.end()
        ));
    }
    Ok(())
}
