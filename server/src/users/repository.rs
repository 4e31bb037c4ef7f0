//! User persistence.
//!
//! # Invariants
//! - Emails are unique across stored users.
//! - Ids are assigned once, increase monotonically, and are never reused.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::model::{NewUser, User, UserChanges};

/// Errors that can occur when reading or writing users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    /// No user has the given id.
    NotFound(i64),
    /// Another user already has this email.
    DuplicateEmail(String),
    /// The backing store failed.
    Storage(String),
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::Storage(reason) => write!(f, "storage error: {reason}"),
        }
    }
}

impl std::error::Error for UserError {}

/// Storage for users. Implementations must be safe to share across request tasks.
pub trait UserRepository: Send + Sync {
    /// Store a new user and assign its id.
    ///
    /// # Errors
    /// `DuplicateEmail` if the email is taken.
    fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// # Errors
    /// `Storage` if the backing store fails.
    fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError>;

    /// # Errors
    /// `Storage` if the backing store fails.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    /// All users ordered by id.
    ///
    /// # Errors
    /// `Storage` if the backing store fails.
    fn list(&self) -> Result<Vec<User>, UserError>;

    /// Apply `changes` to the stored user in one step and stamp `updated_at`.
    ///
    /// # Errors
    /// `NotFound` if no such user, `DuplicateEmail` if the new email is taken.
    fn update(&self, id: i64, changes: UserChanges, updated_at: i64) -> Result<User, UserError>;

    /// Swap the password hash only if the stored one is still `expected`.
    ///
    /// Returns the updated user, or `None` if the hash changed in the meantime.
    ///
    /// # Errors
    /// `NotFound` if no such user.
    fn replace_password_hash(
        &self,
        id: i64,
        expected: &str,
        replacement: String,
    ) -> Result<Option<User>, UserError>;

    /// # Errors
    /// `NotFound` if no such user.
    fn delete(&self, id: i64) -> Result<(), UserError>;
}

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Table {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// In-process user store.
///
/// Uses `RwLock` so lookups proceed concurrently while writes are exclusive.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: RwLock<Table>,
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Table>, UserError> {
        self.table
            .read()
            .map_err(|_| UserError::Storage("user table lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Table>, UserError> {
        self.table
            .write()
            .map_err(|_| UserError::Storage("user table lock poisoned".to_string()))
    }
}

impl UserRepository for InMemoryUserRepository {
    fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut table = self.write()?;
        if table.email_taken(&user.email, None) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        table.next_id += 1;
        let stored = User {
            id: table.next_id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            is_active: true,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .read()?
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.read()?.rows.values().cloned().collect())
    }

    fn update(&self, id: i64, changes: UserChanges, updated_at: i64) -> Result<User, UserError> {
        let mut table = self.write()?;
        if !table.rows.contains_key(&id) {
            return Err(UserError::NotFound(id));
        }
        if let Some(email) = &changes.email
            && table.email_taken(email, Some(id))
        {
            return Err(UserError::DuplicateEmail(email.clone()));
        }
        let user = table.rows.get_mut(&id).ok_or(UserError::NotFound(id))?;

        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = updated_at;

        Ok(user.clone())
    }

    fn replace_password_hash(
        &self,
        id: i64,
        expected: &str,
        replacement: String,
    ) -> Result<Option<User>, UserError> {
        let mut table = self.write()?;
        let user = table.rows.get_mut(&id).ok_or(UserError::NotFound(id))?;
        if user.password_hash != expected {
            return Ok(None);
        }

        user.password_hash = replacement;
        Ok(Some(user.clone()))
    }

    fn delete(&self, id: i64) -> Result<(), UserError> {
        self.write()?
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(UserError::NotFound(id))
    }
}
