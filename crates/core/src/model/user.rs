use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("invalid role: {0}")]
    InvalidRole(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UserError::InvalidRole(other.to_owned())),
        }
    }
}

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a user from an already-hashed credential.
    ///
    /// # Errors
    ///
    /// Returns `UserError` for a blank name or a malformed email.
    pub fn new(
        id: UserId,
        name: String,
        email: &str,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        if name.trim().is_empty() {
            return Err(UserError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            email: normalize_email(email)?,
            password_hash,
            role,
            created_at: now,
            updated_at: None,
        })
    }
}

/// Trim and lowercase; require exactly one `@` with text on both sides.
///
/// # Errors
///
/// Returns `UserError::InvalidEmail` when the shape is wrong.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(UserError::InvalidEmail(raw.to_owned()))
    }
}

/// Partial profile update. `password` is plain text and gets hashed by the
/// caller before it reaches storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Ann@Example.COM ").unwrap(), "ann@example.com");
        assert!(normalize_email("nope").is_err());
        assert!(normalize_email("@x").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User::new(
            UserId::generate(),
            "Ann".into(),
            "ann@example.com",
            "$2b$04$hash".into(),
            Role::default(),
            fixed_now(),
        )
        .unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
    }
}
