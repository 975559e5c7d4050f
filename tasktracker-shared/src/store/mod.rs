/// Persistence seam
///
/// Services talk to storage through these traits only. Two implementations
/// ship with the crate:
///
/// - [`postgres::PgStore`]: the production store
/// - [`memory::MemoryStore`]: a process-local store for tests and demos
///
/// Every task and report operation takes the owning `user_id` and never
/// returns rows belonging to anyone else. A task that exists but is owned
/// by another user is reported exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::report::{NewSavedReport, SavedReport, Window};
use crate::models::session::{NewSession, Session};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter, TaskStatus};
use crate::models::user::{NewUser, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// User accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; `DuplicateEmail` if the email is taken
    async fn insert_user(&self, user: NewUser) -> CoreResult<User>;

    /// Looks up a user by normalized email
    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn find_user(&self, id: Uuid) -> CoreResult<Option<User>>;
}

/// Login sessions, keyed by token digest
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: NewSession) -> CoreResult<Session>;

    /// Returns the session only if it is neither revoked nor expired at `now`
    async fn find_live_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Session>>;

    /// Marks the session revoked; `false` if there was nothing live to revoke
    async fn revoke_session(&self, token_hash: &str, now: DateTime<Utc>) -> CoreResult<bool>;
}

/// Per-user tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a ToDo task; `NotFound` if the user does not exist
    async fn insert_task(&self, user_id: Uuid, task: NewTask) -> CoreResult<Task>;

    async fn find_task(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<Option<Task>>;

    /// Applies the supplied fields in one write; `None` if no such task
    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        changes: &TaskChanges,
    ) -> CoreResult<Option<Task>>;

    /// Sets the status and maintains `completed_at`; `None` if no such task
    async fn set_task_status(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Task>>;

    /// `false` if no such task
    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<bool>;

    /// Tasks matching the filter, in the filter's order
    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> CoreResult<Vec<Task>>;

    /// Case-insensitive substring match on title or description, in
    /// default order
    async fn search_tasks(&self, user_id: Uuid, keyword: &str) -> CoreResult<Vec<Task>>;

    /// Tasks created or completed (UTC calendar date) inside the window
    async fn tasks_in_window(&self, user_id: Uuid, window: Window) -> CoreResult<Vec<Task>>;
}

/// Saved report snapshots
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_saved_report(&self, report: NewSavedReport) -> CoreResult<SavedReport>;

    /// Newest first
    async fn list_saved_reports(&self, user_id: Uuid) -> CoreResult<Vec<SavedReport>>;
}

/// Liveness check used by the health endpoint
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> CoreResult<()>;
}

/// Everything the services need from one backing store
pub trait Store: UserStore + SessionStore + TaskStore + ReportStore + HealthCheck {}

impl<T> Store for T where T: UserStore + SessionStore + TaskStore + ReportStore + HealthCheck {}
