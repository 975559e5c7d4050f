/// Middleware modules for the API server
///
/// - Session authentication
/// - Security headers

pub mod auth;
pub mod security;
