/// Configuration for the API server
///
/// Loaded from environment variables; a `.env` file is read first when
/// present.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default: *)
/// - `ENVIRONMENT`: `production` enables HSTS (default: development)
/// - `SESSION_TTL_HOURS`: session lifetime, at most ten years (default: 24)
/// - `PASSWORD_MIN_LENGTH`: minimum password length (default: 8)
/// - `PASSWORD_REQUIRE_UPPERCASE|LOWERCASE|DIGIT|SPECIAL`: character class
///   rules (default: true)
/// - `ARGON2_MEMORY_KIB`, `ARGON2_ITERATIONS`, `ARGON2_PARALLELISM`: hash
///   cost (default: 65536, 3, 4)
/// - `RUST_LOG`: log filter (default: tasktracker_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use tasktracker_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;

use anyhow::Context;
use tasktracker_shared::auth::password::{HashParams, PasswordPolicy};
use tasktracker_shared::db::pool::PoolConfig;
use tasktracker_shared::services::AccountSettings;

/// Ten years; keeps `now + ttl` inside chrono's range
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub auth: AuthConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode adds HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.max_connections,
            ..PoolConfig::new(self.url.clone())
        }
    }
}

/// Account and session settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl_hours: i64,

    pub password_policy: PasswordPolicy,

    pub hash_params: HashParams,
}

impl AuthConfig {
    pub fn account_settings(&self) -> AccountSettings {
        AccountSettings {
            password_policy: self.password_policy.clone(),
            hash_params: self.hash_params,
            session_ttl: chrono::Duration::hours(self.session_ttl_hours),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            password_policy: PasswordPolicy::default(),
            hash_params: HashParams::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Fails if `DATABASE_URL` is missing or any variable has an invalid
    /// value.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL environment variable is required")?;

        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let production = var("ENVIRONMENT", "development").eq_ignore_ascii_case("production");

        let session_ttl_hours: i64 = number(&var("SESSION_TTL_HOURS", "24"), "SESSION_TTL_HOURS")?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            anyhow::bail!("SESSION_TTL_HOURS must be between 1 and {}", MAX_SESSION_TTL_HOURS);
        }

        let password_policy = PasswordPolicy {
            min_length: number(&var("PASSWORD_MIN_LENGTH", "8"), "PASSWORD_MIN_LENGTH")?,
            require_uppercase: flag(&var("PASSWORD_REQUIRE_UPPERCASE", "true"), "PASSWORD_REQUIRE_UPPERCASE")?,
            require_lowercase: flag(&var("PASSWORD_REQUIRE_LOWERCASE", "true"), "PASSWORD_REQUIRE_LOWERCASE")?,
            require_digit: flag(&var("PASSWORD_REQUIRE_DIGIT", "true"), "PASSWORD_REQUIRE_DIGIT")?,
            require_special: flag(&var("PASSWORD_REQUIRE_SPECIAL", "true"), "PASSWORD_REQUIRE_SPECIAL")?,
        };

        let defaults = HashParams::default();
        let hash_params = HashParams {
            memory_kib: number(&var("ARGON2_MEMORY_KIB", &defaults.memory_kib.to_string()), "ARGON2_MEMORY_KIB")?,
            iterations: number(&var("ARGON2_ITERATIONS", &defaults.iterations.to_string()), "ARGON2_ITERATIONS")?,
            parallelism: number(&var("ARGON2_PARALLELISM", &defaults.parallelism.to_string()), "ARGON2_PARALLELISM")?,
        };

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port: number(&var("API_PORT", "8080"), "API_PORT")?,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: number(&var("DATABASE_MAX_CONNECTIONS", "10"), "DATABASE_MAX_CONNECTIONS")?,
            },
            auth: AuthConfig {
                session_ttl_hours,
                password_policy,
                hash_params,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn number<T>(value: &str, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .with_context(|| format!("{} has invalid value '{}'", key, value))
}

fn flag(value: &str, key: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} has invalid boolean '{}'", key, value),
    }
}
