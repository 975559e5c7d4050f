/// Account, task and report operations
///
/// Each service holds `Arc`s to the store traits it needs and nothing else,
/// so one `PgStore` (or `MemoryStore`) can back all three.
///
/// - [`accounts::AccountService`]: register, authenticate, logout, sessions
/// - [`tasks::TaskService`]: per-user task CRUD, listing and search
/// - [`reports::ReportService`]: summaries, trends and saved snapshots

pub mod accounts;
pub mod reports;
pub mod tasks;

pub use accounts::{AccountService, AccountSettings};
pub use reports::ReportService;
pub use tasks::TaskService;
