/// PostgreSQL plumbing
///
/// - `pool`: connection pool creation and health check
/// - `migrations`: embedded schema migrations

pub mod migrations;
pub mod pool;
