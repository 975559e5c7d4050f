/// PostgreSQL store
///
/// Every mutation is a single statement, so concurrent writers to one task
/// serialize on the row lock and the last write wins.
///
/// # Example
///
/// ```no_run
/// use tasktracker_shared::db::pool::{create_pool, PoolConfig};
/// use tasktracker_shared::store::PgStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(&PoolConfig::new(std::env::var("DATABASE_URL")?)).await?;
/// let store = PgStore::new(pool);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{HealthCheck, ReportStore, SessionStore, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::error::{CoreError, CoreResult};
use crate::models::report::{NewSavedReport, SavedReport, SavedReportRow, Window};
use crate::models::session::{NewSession, Session};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter, TaskRow, TaskSort, TaskStatus};
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, email, hashed_password, name, joined_at";

const SESSION_COLUMNS: &str = "id, user_id, token_hash, created_at, expires_at, revoked_at";

const TASK_COLUMNS: &str = "id, user_id, title, description, created_at, updated_at, due_date, \
                            status, priority, category, completed_at";

const REPORT_COLUMNS: &str = "id, user_id, window_start, window_end, generated_at, stats";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> CoreResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

/// Escapes `LIKE` metacharacters so the keyword matches literally
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, hashed_password, name)
             VALUES ($1, $2, $3)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, session: NewSession) -> CoreResult<Session> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (user_id, token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_live_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {} FROM sessions
             WHERE token_hash = $1
               AND revoked_at IS NULL
               AND expires_at > $2",
            SESSION_COLUMNS
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn revoke_session(&self, token_hash: &str, now: DateTime<Utc>) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = $2
             WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, user_id: Uuid, task: NewTask) -> CoreResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (user_id, title, description, due_date, priority, category)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.priority.map(|p| p.as_str()))
        .bind(&task.category)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_task(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        changes: &TaskChanges,
    ) -> CoreResult<Option<Task>> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if changes.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if changes.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if changes.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if changes.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if changes.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {}",
            TASK_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, TaskRow>(&query).bind(task_id).bind(user_id);

        if let Some(title) = &changes.title {
            q = q.bind(title);
        }
        if let Some(description) = &changes.description {
            q = q.bind(description);
        }
        if let Some(due_date) = changes.due_date {
            q = q.bind(due_date);
        }
        if let Some(priority) = changes.priority {
            q = q.bind(priority.map(|p| p.as_str()));
        }
        if let Some(category) = &changes.category {
            q = q.bind(category);
        }

        let row = q.fetch_optional(&self.pool).await?;

        row.map(Task::try_from).transpose()
    }

    async fn set_task_status(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Task>> {
        // Re-marking a Done task keeps its original completion time
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks
             SET status = $3,
                 completed_at = CASE
                     WHEN $3 = 'done' THEN COALESCE(completed_at, $4)
                     ELSE NULL
                 END,
                 updated_at = $4
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(status.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> CoreResult<Vec<Task>> {
        let mut query = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
        let mut bind_count = 1;

        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filter.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND lower(category) = lower(${})", bind_count));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND priority = ${}", bind_count));
        }
        if filter.due_from.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND due_date >= ${}", bind_count));
        }
        if filter.due_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND due_date <= ${}", bind_count));
        }
        if filter.overdue_as_of.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND due_date < ${} AND status <> 'done'",
                bind_count
            ));
        }

        query.push_str(" ORDER BY ");
        query.push_str(filter.sort.order_by_sql());

        let mut q = sqlx::query_as::<_, TaskRow>(&query).bind(user_id);

        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(category) = &filter.category {
            q = q.bind(category);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(from) = filter.due_from {
            q = q.bind(from);
        }
        if let Some(to) = filter.due_to {
            q = q.bind(to);
        }
        if let Some(today) = filter.overdue_as_of {
            q = q.bind(today);
        }

        let rows = q.fetch_all(&self.pool).await?;

        into_tasks(rows)
    }

    async fn search_tasks(&self, user_id: Uuid, keyword: &str) -> CoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks
             WHERE user_id = $1
               AND (title ILIKE $2 ESCAPE '\\' OR description ILIKE $2 ESCAPE '\\')
             ORDER BY {}",
            TASK_COLUMNS,
            TaskSort::DueDate.order_by_sql()
        ))
        .bind(user_id)
        .bind(like_pattern(keyword))
        .fetch_all(&self.pool)
        .await?;

        into_tasks(rows)
    }

    async fn tasks_in_window(&self, user_id: Uuid, window: Window) -> CoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks
             WHERE user_id = $1
               AND ((created_at AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3
                    OR (completed_at AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3)
             ORDER BY created_at ASC, id ASC",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&self.pool)
        .await?;

        into_tasks(rows)
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn insert_saved_report(&self, report: NewSavedReport) -> CoreResult<SavedReport> {
        let row = sqlx::query_as::<_, SavedReportRow>(&format!(
            "INSERT INTO saved_reports (user_id, window_start, window_end, stats)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            REPORT_COLUMNS
        ))
        .bind(report.user_id)
        .bind(report.window.start())
        .bind(report.window.end())
        .bind(sqlx::types::Json(report.stats))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_saved_reports(&self, user_id: Uuid) -> CoreResult<Vec<SavedReport>> {
        let rows = sqlx::query_as::<_, SavedReportRow>(&format!(
            "SELECT {} FROM saved_reports
             WHERE user_id = $1
             ORDER BY generated_at DESC, id ASC",
            REPORT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SavedReport::try_from).collect()
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> CoreResult<()> {
        health_check(&self.pool).await.map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
    }
}
