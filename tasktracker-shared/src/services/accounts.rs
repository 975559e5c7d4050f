/// Account registration, login and sessions
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tasktracker_shared::services::accounts::{AccountService, AccountSettings};
/// use tasktracker_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), tasktracker_shared::error::CoreError> {
/// let store = Arc::new(MemoryStore::new());
/// let accounts = AccountService::new(store.clone(), store, AccountSettings::default());
///
/// let user_id = accounts.register("ada@example.com", "MyP@ssw0rd!", "Ada").await?;
/// let session = accounts.authenticate("ada@example.com", "MyP@ssw0rd!").await?;
/// assert_eq!(accounts.resolve_session(&session.token).await?, user_id);
///
/// accounts.logout(&session.token).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password_with, verify_password, HashParams, PasswordPolicy};
use crate::auth::session_token::{generate_token, hash_token, validate_token_format};
use crate::error::{CoreError, CoreResult};
use crate::models::session::{AuthSession, NewSession};
use crate::models::user::{normalize_email, NewUser, User};
use crate::store::{SessionStore, UserStore};

/// Longest accepted display name, in characters
pub const MAX_NAME_LENGTH: usize = 100;

/// Tunables for the account service
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSettings {
    pub password_policy: PasswordPolicy,

    pub hash_params: HashParams,

    /// Lifetime of a session issued by `authenticate`
    pub session_ttl: Duration,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            password_policy: PasswordPolicy::default(),
            hash_params: HashParams::default(),
            session_ttl: Duration::hours(24),
        }
    }
}

/// Identity and credential operations
pub struct AccountService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    settings: AccountSettings,
    // Verified against when the email is unknown
    dummy_hash: OnceLock<Option<String>>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        settings: AccountSettings,
    ) -> Self {
        Self {
            users,
            sessions,
            settings,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &AccountSettings {
        &self.settings
    }

    /// Creates an account
    ///
    /// # Errors
    ///
    /// - `Validation`: malformed email, or empty/overlong name
    /// - `WeakPassword`: the password fails the configured policy
    /// - `DuplicateEmail`: the email (compared case-insensitively) exists
    pub async fn register(&self, email: &str, password: &str, name: &str) -> CoreResult<Uuid> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("Name is required"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CoreError::validation(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        self.settings
            .password_policy
            .check(password)
            .map_err(CoreError::WeakPassword)?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            debug!("Registration rejected: email already registered");
            return Err(CoreError::DuplicateEmail);
        }

        let hashed_password = hash_password_with(password, &self.settings.hash_params)
            .map_err(|e| {
                error!(error = %e, "Password hashing failed");
                CoreError::StoreUnavailable("could not hash password".to_string())
            })?;

        // The unique constraint still decides a concurrent race
        let user = self
            .users
            .insert_user(NewUser {
                email,
                hashed_password,
                name: name.to_string(),
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user.id)
    }

    /// Verifies credentials and opens a session
    ///
    /// Unknown email and wrong password both fail with `InvalidCredentials`,
    /// and both paths run one Argon2 verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<AuthSession> {
        let email = normalize_email(email);

        let user = match self.users.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                if let Some(dummy) = self.dummy_hash() {
                    let _ = verify_password(password, dummy);
                }
                debug!("Login failed");
                return Err(CoreError::InvalidCredentials);
            }
        };

        match verify_password(password, &user.hashed_password) {
            Ok(true) => {}
            Ok(false) => {
                debug!(user_id = %user.id, "Login failed");
                return Err(CoreError::InvalidCredentials);
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                return Err(CoreError::InvalidCredentials);
            }
        }

        let (token, token_hash) = generate_token();
        let expires_at = Utc::now() + self.settings.session_ttl;

        self.sessions
            .insert_session(NewSession {
                user_id: user.id,
                token_hash,
                expires_at,
            })
            .await?;

        info!(user_id = %user.id, %expires_at, "Session opened");
        Ok(AuthSession {
            user_id: user.id,
            token,
            expires_at,
        })
    }

    /// Revokes a session
    ///
    /// Succeeds for unknown, malformed, expired and already-revoked tokens.
    pub async fn logout(&self, token: &str) -> CoreResult<()> {
        if !validate_token_format(token) {
            debug!("Logout with malformed token ignored");
            return Ok(());
        }

        let revoked = self
            .sessions
            .revoke_session(&hash_token(token), Utc::now())
            .await?;

        if revoked {
            info!("Session revoked");
        } else {
            debug!("Logout for a session that was not live");
        }
        Ok(())
    }

    /// Maps a live session token to its user
    pub async fn resolve_session(&self, token: &str) -> CoreResult<Uuid> {
        if !validate_token_format(token) {
            return Err(CoreError::InvalidCredentials);
        }

        match self
            .sessions
            .find_live_session(&hash_token(token), Utc::now())
            .await?
        {
            Some(session) => Ok(session.user_id),
            None => {
                warn!("Rejected dead or unknown session token");
                Err(CoreError::InvalidCredentials)
            }
        }
    }

    /// The user's account record
    pub async fn profile(&self, user_id: Uuid) -> CoreResult<User> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    fn dummy_hash(&self) -> Option<&str> {
        self.dummy_hash
            .get_or_init(|| hash_password_with("not-a-real-password", &self.settings.hash_params).ok())
            .as_deref()
    }
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain
fn validate_email(email: &str) -> CoreResult<()> {
    let invalid = || CoreError::validation(format!("Invalid email address '{}'", email));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());

        for bad in ["", "ada", "@example.com", "ada@", "ada@example", "a@b@c.com", "ada @x.com", "ada@.com"] {
            assert!(validate_email(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = AccountSettings::default();
        assert_eq!(settings.session_ttl, Duration::hours(24));
        assert_eq!(settings.password_policy.min_length, 8);
    }
}
