/// User account model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL,
///     hashed_password TEXT NOT NULL,
///     name TEXT NOT NULL,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// Emails are normalized to lowercase before they reach the store, so the
/// plain unique constraint is case-insensitive in practice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User model representing a registered account
///
/// Passwords are stored as Argon2id PHC strings, never in plaintext. The
/// hash is skipped when the model is serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, lowercase, unique across all users
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub hashed_password: String,

    /// Display name
    pub name: String,

    /// When the account was registered
    pub joined_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized (trimmed, lowercase) email address
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password!)
    pub hashed_password: String,

    /// Display name
    pub name: String,
}

/// Normalizes an email address for storage and lookup
///
/// # Example
///
/// ```
/// use tasktracker_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
