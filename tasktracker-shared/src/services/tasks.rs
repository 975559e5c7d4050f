/// Task CRUD and queries, scoped to one user per call
///
/// A task owned by someone else is reported as `NotFound`, exactly like a
/// task that does not exist.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::task::{NewTask, Task, TaskChanges, TaskFilter, TaskStatus};
use crate::store::TaskStore;

/// Longest accepted title, in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Longest accepted category, in characters
pub const MAX_CATEGORY_LENGTH: usize = 50;

pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Creates a ToDo task
    ///
    /// The title is trimmed and must not be empty. Blank optional text
    /// fields are stored as absent.
    pub async fn create(&self, user_id: Uuid, task: NewTask) -> CoreResult<Task> {
        let task = NewTask {
            title: clean_title(&task.title)?,
            description: blank_to_none(task.description),
            category: clean_category(task.category)?,
            ..task
        };

        let task = self.store.insert_task(user_id, task).await?;

        info!(user_id = %user_id, task_id = %task.id, "Task created");
        Ok(task)
    }

    pub async fn get(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<Task> {
        self.store
            .find_task(user_id, task_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    /// Changes only the supplied fields
    ///
    /// An empty change set is a read.
    pub async fn update(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> CoreResult<Task> {
        let changes = TaskChanges {
            title: changes.title.as_deref().map(clean_title).transpose()?,
            description: changes.description.map(blank_to_none),
            category: changes.category.map(clean_category).transpose()?,
            ..changes
        };

        if changes.is_empty() {
            return self.get(user_id, task_id).await;
        }

        let task = self
            .store
            .update_task(user_id, task_id, &changes)
            .await?
            .ok_or(CoreError::NotFound)?;

        debug!(user_id = %user_id, task_id = %task_id, "Task updated");
        Ok(task)
    }

    /// Removes a task; a second delete of the same id is `NotFound`
    pub async fn delete(&self, user_id: Uuid, task_id: Uuid) -> CoreResult<()> {
        if !self.store.delete_task(user_id, task_id).await? {
            return Err(CoreError::NotFound);
        }

        info!(user_id = %user_id, task_id = %task_id, "Task deleted");
        Ok(())
    }

    pub async fn set_status(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
    ) -> CoreResult<Task> {
        let task = self
            .store
            .set_task_status(user_id, task_id, status, Utc::now())
            .await?
            .ok_or(CoreError::NotFound)?;

        debug!(user_id = %user_id, task_id = %task_id, status = %status, "Task status changed");
        Ok(task)
    }

    /// Parses free-form status text, then sets it
    ///
    /// Unrecognized text fails with `Validation` before the store is touched,
    /// so the task keeps its previous status.
    pub async fn set_status_str(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        status: &str,
    ) -> CoreResult<Task> {
        let status = status.parse::<TaskStatus>()?;
        self.set_status(user_id, task_id, status).await
    }

    /// Fresh query on every call
    pub async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> CoreResult<Vec<Task>> {
        if let (Some(from), Some(to)) = (filter.due_from, filter.due_to) {
            if from > to {
                return Err(CoreError::validation(format!(
                    "Due date range start {} is after end {}",
                    from, to
                )));
            }
        }

        self.store.list_tasks(user_id, filter).await
    }

    /// Case-insensitive substring search over title and description
    pub async fn search(&self, user_id: Uuid, keyword: &str) -> CoreResult<Vec<Task>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(CoreError::validation("Search keyword is required"));
        }

        self.store.search_tasks(user_id, keyword).await
    }
}

fn clean_title(title: &str) -> CoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(title.to_string())
}

fn clean_category(category: Option<String>) -> CoreResult<Option<String>> {
    let category = blank_to_none(category).map(|c| c.trim().to_string());
    if let Some(c) = &category {
        if c.chars().count() > MAX_CATEGORY_LENGTH {
            return Err(CoreError::validation(format!(
                "Category must be at most {} characters",
                MAX_CATEGORY_LENGTH
            )));
        }
    }
    Ok(category)
}

fn blank_to_none(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Buy milk ").unwrap(), "Buy milk");
        assert!(clean_title("   ").is_err());
        assert!(clean_title(&"x".repeat(MAX_TITLE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_clean_category() {
        assert_eq!(clean_category(Some(" Work ".to_string())).unwrap().as_deref(), Some("Work"));
        assert_eq!(clean_category(Some("  ".to_string())).unwrap(), None);
        assert_eq!(clean_category(None).unwrap(), None);
    }
}
