/// Task endpoints
///
/// All handlers act on the caller's own tasks; another user's task id
/// answers `404 Not Found` exactly like a missing one.
///
/// - `POST /v1/tasks` - Create
/// - `GET /v1/tasks` - List with filters and sort
/// - `GET /v1/tasks/search?q=` - Keyword search
/// - `GET|PATCH|DELETE /v1/tasks/:id`
/// - `PUT /v1/tasks/:id/status` - Change status

use crate::{app::AppState, error::ApiResult, middleware::auth::AuthContext};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use tasktracker_shared::{
    error::CoreResult,
    models::task::{NewTask, Priority, Task, TaskChanges, TaskFilter},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    pub priority: Option<Priority>,

    #[validate(length(max = 50, message = "Category must be at most 50 characters"))]
    pub category: Option<String>,
}

/// Partial update request
///
/// An absent field is left alone; an explicit `null` clears it.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<Priority>>,

    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
}

/// Distinguishes `"field": null` from a missing field
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Status change request; the text is parsed leniently
/// (`"In Progress"`, `"in_progress"` and `"in-progress"` are equal)
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// List query parameters
///
/// ```text
/// GET /v1/tasks?status=todo&category=work&priority=high
///              &due_from=2025-01-01&due_to=2025-01-31&overdue=true&sort=priority
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,

    pub category: Option<String>,

    pub priority: Option<String>,

    pub due_from: Option<NaiveDate>,

    pub due_to: Option<NaiveDate>,

    /// Only tasks past due and not done, as of today (UTC)
    #[serde(default)]
    pub overdue: bool,

    pub sort: Option<String>,
}

impl ListQuery {
    pub fn to_filter(&self) -> CoreResult<TaskFilter> {
        Ok(TaskFilter {
            status: self.status.as_deref().map(str::parse).transpose()?,
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            priority: self.priority.as_deref().map(str::parse).transpose()?,
            due_from: self.due_from,
            due_to: self.due_to,
            overdue_as_of: self.overdue.then(|| Utc::now().date_naive()),
            sort: self.sort.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let task = state
        .tasks
        .create(
            auth.user_id,
            NewTask {
                title: req.title,
                description: req.description,
                due_date: req.due_date,
                category: req.category,
                priority: req.priority,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = query.to_filter()?;
    let tasks = state.tasks.list(auth.user_id, &filter).await?;
    Ok(Json(tasks))
}

pub async fn search_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.tasks.search(auth.user_id, &query.q).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.get(auth.user_id, task_id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let changes = TaskChanges {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        priority: req.priority,
        category: req.category,
    };

    Ok(Json(state.tasks.update(auth.user_id, task_id, changes).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.tasks.delete(auth.user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .tasks
        .set_status_str(auth.user_id, task_id, &req.status)
        .await?;
    Ok(Json(task))
}
