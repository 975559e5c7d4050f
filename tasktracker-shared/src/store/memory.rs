//! In-memory store for tests and local demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{HealthCheck, ReportStore, SessionStore, TaskStore, UserStore};
use crate::error::{CoreError, CoreResult};
use crate::models::report::{NewSavedReport, SavedReport, Window};
use crate::models::session::{NewSession, Session};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter, TaskSort, TaskStatus};
use crate::models::user::{NewUser, User};

/// Process-local store with the same observable behavior as
/// [`super::PgStore`]
///
/// Each collection sits behind its own `RwLock`; a write holds the lock for
/// the whole read-modify-write so concurrent updates to one task serialize.
#[derive(Debug)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
    reports: Arc<RwLock<Vec<SavedReport>>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            users: Arc::default(),
            sessions: Arc::default(),
            tasks: Arc::default(),
            reports: Arc::default(),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: while unavailable every call fails with
    /// `StoreUnavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> CoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoreError::StoreUnavailable(
                "memory store is offline".to_string(),
            ))
        }
    }

    fn sorted(mut tasks: Vec<Task>, sort: TaskSort) -> Vec<Task> {
        tasks.sort_by(|a, b| sort.compare(a, b));
        tasks
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        self.check_available()?;
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(CoreError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            hashed_password: user.hashed_password,
            name: user.name,
            joined_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.check_available()?;
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        self.check_available()?;
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: NewSession) -> CoreResult<Session> {
        self.check_available()?;
        if !self.users.read().await.contains_key(&session.user_id) {
            return Err(CoreError::NotFound);
        }

        let session = Session {
            id: Uuid::new_v4(),
            user_id: session.user_id,
            token_hash: session.token_hash,
            created_at: Utc::now(),
            expires_at: session.expires_at,
            revoked_at: None,
        };
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session.clone());
        Ok(session)
    }

    async fn find_live_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Session>> {
        self.check_available()?;
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(token_hash)
            .filter(|s| s.is_live(now))
            .cloned())
    }

    async fn revoke_session(&self, token_hash: &str, now: DateTime<Utc>) -> CoreResult<bool> {
        self.check_available()?;
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(token_hash) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, user_id: Uuid, task: NewTask) -> CoreResult<Task> {
        self.check_available()?;
        if !self.users.read().await.contains_key(&user_id) {
            return Err(CoreError::NotFound);
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            user_id,
            title: task.title,
            description: task.description,
            created_at: now,
            updated_at: now,
            due_date: task.due_date,
            status: TaskStatus::ToDo,
            priority: task.priority,
            category: task.category,
            completed_at: None,
        };
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<Option<Task>> {
        self.check_available()?;
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(&task_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        changes: &TaskChanges,
    ) -> CoreResult<Option<Task>> {
        self.check_available()?;
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task_id).filter(|t| t.user_id == user_id) {
            Some(task) => {
                changes.apply_to(task);
                task.updated_at = Utc::now();
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_task_status(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Task>> {
        self.check_available()?;
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&task_id).filter(|t| t.user_id == user_id) {
            Some(task) => {
                task.completed_at = match status {
                    TaskStatus::Done => task.completed_at.or(Some(now)),
                    _ => None,
                };
                task.status = status;
                task.updated_at = now;
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<bool> {
        self.check_available()?;
        let mut tasks = self.tasks.write().await;
        if tasks.get(&task_id).map_or(false, |t| t.user_id == user_id) {
            tasks.remove(&task_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> CoreResult<Vec<Task>> {
        self.check_available()?;
        let tasks = self.tasks.read().await;
        let matching = tasks
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect();
        Ok(Self::sorted(matching, filter.sort))
    }

    async fn search_tasks(&self, user_id: Uuid, keyword: &str) -> CoreResult<Vec<Task>> {
        self.check_available()?;
        let needle = keyword.to_lowercase();
        let tasks = self.tasks.read().await;
        let matching = tasks
            .values()
            .filter(|t| t.user_id == user_id && t.mentions(&needle))
            .cloned()
            .collect();
        Ok(Self::sorted(matching, TaskSort::DueDate))
    }

    async fn tasks_in_window(&self, user_id: Uuid, window: Window) -> CoreResult<Vec<Task>> {
        self.check_available()?;
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|t| {
                t.user_id == user_id
                    && (window.contains(t.created_on())
                        || t.completed_on().map_or(false, |d| window.contains(d)))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matching)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert_saved_report(&self, report: NewSavedReport) -> CoreResult<SavedReport> {
        self.check_available()?;
        if !self.users.read().await.contains_key(&report.user_id) {
            return Err(CoreError::NotFound);
        }

        let saved = SavedReport {
            id: Uuid::new_v4(),
            user_id: report.user_id,
            window: report.window,
            generated_at: Utc::now(),
            stats: report.stats,
        };
        self.reports.write().await.push(saved.clone());
        Ok(saved)
    }

    async fn list_saved_reports(&self, user_id: Uuid) -> CoreResult<Vec<SavedReport>> {
        self.check_available()?;
        let reports = self.reports.read().await;
        // Appended in generation order
        Ok(reports
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> CoreResult<()> {
        self.check_available()
    }
}
