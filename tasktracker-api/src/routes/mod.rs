/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, logout, profile
/// - `tasks`: Task CRUD, status, list and search
/// - `reports`: Summaries, trends, productivity, saved reports
/// - `export`: CSV and PDF downloads

pub mod auth;
pub mod export;
pub mod health;
pub mod reports;
pub mod tasks;
