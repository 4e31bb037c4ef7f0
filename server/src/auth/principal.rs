//! Authenticated identity types.

use serde::{Deserialize, Serialize};

/// Access role carried in a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Whether a principal holding `self` may access a route requiring `required`.
    ///
    /// Admin satisfies every requirement; user satisfies only `User`.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        matches!((self, required), (Self::Admin, _) | (Self::User, Self::User))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated caller, derived fresh from validated claims on every request.
///
/// Fields are private so a principal cannot be altered after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject_id: i64,
    email: String,
    role: Role,
}

impl Principal {
    #[must_use]
    pub fn new(subject_id: i64, email: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id,
            email: email.into(),
            role,
        }
    }

    #[must_use]
    pub const fn subject_id(&self) -> i64 {
        self.subject_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}
