/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the configurable strength policy
/// - [`session_token`]: opaque bearer tokens stored as SHA-256 digests
///
/// Session lifecycle (issue, resolve, revoke) lives in
/// [`crate::services::accounts`]; these modules hold the stateless pieces.

pub mod password;
pub mod session_token;
