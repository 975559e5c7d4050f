/// Task model, filters and orderings
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL CHECK (length(btrim(title)) > 0),
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     due_date DATE,
///     status TEXT NOT NULL DEFAULT 'todo'
///         CHECK (status IN ('todo', 'in_progress', 'done')),
///     priority TEXT CHECK (priority IN ('low', 'medium', 'high')),
///     category TEXT,
///     completed_at TIMESTAMPTZ
/// );
/// ```
///
/// # Status
///
/// ```text
/// todo ⇄ in_progress ⇄ done
/// ```
///
/// Any status may be set from any other. Entering `done` stamps
/// `completed_at`; leaving it clears the stamp.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Task progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[serde(rename = "todo")]
    ToDo,

    /// Being worked on
    InProgress,

    /// Finished
    Done,
}

impl TaskStatus {
    /// All statuses in board order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    /// Converts status to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Human-readable label ("To Do", "In Progress", "Done")
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses storage names and display labels alike
///
/// Case, spaces, hyphens and underscores are ignored, so `"todo"`,
/// `"To Do"`, `"IN_PROGRESS"` and `"in-progress"` are all accepted.
/// Anything else is a `Validation` error.
impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "todo" => Ok(TaskStatus::ToDo),
            "inprogress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(CoreError::validation(format!(
                "Invalid status '{}': expected one of todo, in_progress, done",
                s
            ))),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Converts priority to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Sort rank, most urgent first
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(CoreError::validation(format!(
                "Invalid priority '{}': expected one of low, medium, high",
                s
            ))),
        }
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Task owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Short title, never empty
    pub title: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub due_date: Option<NaiveDate>,

    pub status: TaskStatus,

    pub priority: Option<Priority>,

    /// Free-text category ("Work", "Errands", ...)
    pub category: Option<String>,

    /// When the task last entered `Done` (None unless status is Done)
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Due before `today` and not finished
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date.map_or(false, |due| due < today)
    }

    /// Calendar day the task was created
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Calendar day the task was completed, if it is done
    pub fn completed_on(&self) -> Option<NaiveDate> {
        self.completed_at.map(|at| at.date_naive())
    }

    /// Case-insensitive substring match over title and description
    pub fn mentions(&self, keyword_lowercase: &str) -> bool {
        self.title.to_lowercase().contains(keyword_lowercase)
            || self
                .description
                .as_deref()
                .map_or(false, |d| d.to_lowercase().contains(keyword_lowercase))
    }
}

/// Raw database row; status and priority are stored as text
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = CoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, value: &str| {
            CoreError::StoreUnavailable(format!(
                "Corrupt task row {}: bad {} '{}'",
                row.id, field, value
            ))
        };

        let status = row
            .status
            .parse::<TaskStatus>()
            .map_err(|_| corrupt("status", &row.status))?;
        let priority = match row.priority.as_deref() {
            Some(p) => Some(p.parse::<Priority>().map_err(|_| corrupt("priority", p))?),
            None => None,
        };

        Ok(Task {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            due_date: row.due_date,
            status,
            priority,
            category: row.category,
            completed_at: row.completed_at,
        })
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
}

/// Partial update of a task's fields
///
/// `None` leaves a field untouched. For optional columns `Some(None)`
/// clears the value. Status is changed through `set_status` instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Option<Priority>>,
    pub category: Option<Option<String>>,
}

impl TaskChanges {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.category.is_none()
    }

    /// Applies the changes to an in-memory task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
    }
}

/// Ordering for task listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    /// Earliest due date first, undated tasks last, ties by creation time
    #[default]
    DueDate,

    /// Newest first
    CreatedAt,

    /// High before Medium before Low before unset, then by due date
    Priority,
}

impl TaskSort {
    /// Total ordering matching the SQL `ORDER BY` clause of each variant
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let by_due = || {
            // None sorts after every date
            match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
        };

        match self {
            TaskSort::DueDate => by_due(),
            TaskSort::CreatedAt => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id)),
            TaskSort::Priority => {
                let rank = |t: &Task| t.priority.map_or(3, |p| p.rank());
                rank(a).cmp(&rank(b)).then_with(by_due)
            }
        }
    }

    /// SQL `ORDER BY` clause (without the keyword)
    pub(crate) fn order_by_sql(&self) -> &'static str {
        match self {
            TaskSort::DueDate => "due_date ASC NULLS LAST, created_at ASC, id ASC",
            TaskSort::CreatedAt => "created_at DESC, id ASC",
            TaskSort::Priority => {
                "CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 WHEN 'low' THEN 2 ELSE 3 END, \
                 due_date ASC NULLS LAST, created_at ASC, id ASC"
            }
        }
    }
}

impl FromStr for TaskSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match squash(s).as_str() {
            "duedate" | "due" => Ok(TaskSort::DueDate),
            "createdat" | "created" => Ok(TaskSort::CreatedAt),
            "priority" => Ok(TaskSort::Priority),
            _ => Err(CoreError::validation(format!(
                "Invalid sort '{}': expected one of due_date, created_at, priority",
                s
            ))),
        }
    }
}

/// Predicates for `list`
///
/// All predicates are optional and combined with AND. The due-date range is
/// inclusive on both ends; when either bound is set, undated tasks are
/// excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,

    /// Case-insensitive exact match
    pub category: Option<String>,

    pub priority: Option<Priority>,

    pub due_from: Option<NaiveDate>,

    pub due_to: Option<NaiveDate>,

    /// Only tasks overdue as of this date
    pub overdue_as_of: Option<NaiveDate>,

    pub sort: TaskSort,
}

impl TaskFilter {
    /// Whether a task satisfies every predicate
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            match &task.category {
                Some(c) if c.to_lowercase() == category.to_lowercase() => {}
                _ => return false,
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != Some(priority) {
                return false;
            }
        }
        if self.due_from.is_some() || self.due_to.is_some() {
            let Some(due) = task.due_date else {
                return false;
            };
            if self.due_from.map_or(false, |from| due < from) {
                return false;
            }
            if self.due_to.map_or(false, |to| due > to) {
                return false;
            }
        }
        if let Some(today) = self.overdue_as_of {
            if !task.is_overdue(today) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn task(title: &str, due: Option<NaiveDate>, created_offset_min: i64) -> Task {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
            + Duration::minutes(created_offset_min);
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            created_at: created,
            updated_at: created,
            due_date: due,
            status: TaskStatus::ToDo,
            priority: None,
            category: None,
            completed_at: None,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_status_labels() {
        let labels: Vec<_> = TaskStatus::ALL.iter().map(TaskStatus::label).collect();
        assert_eq!(labels, ["To Do", "In Progress", "Done"]);
    }

    #[test]
    fn test_status_round_trips_through_storage_names() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_parses_labels() {
        assert_eq!("To Do".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);
        assert_eq!("IN-PROGRESS".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("Done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
    }

    #[test]
    fn test_status_rejects_unknown_values() {
        let err = "Blocked".parse::<TaskStatus>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!("".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(serde_json::to_string(&TaskStatus::ToDo).unwrap(), "\"todo\"");
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
    }

    #[test]
    fn test_is_overdue() {
        let today = date(10);
        let mut t = task("a", Some(date(9)), 0);
        assert!(t.is_overdue(today));

        t.status = TaskStatus::Done;
        assert!(!t.is_overdue(today));

        let due_today = task("b", Some(today), 0);
        assert!(!due_today.is_overdue(today));

        let undated = task("c", None, 0);
        assert!(!undated.is_overdue(today));
    }

    #[test]
    fn test_due_date_sort_puts_undated_last() {
        let mut tasks = vec![
            task("undated", None, 0),
            task("third", Some(date(3)), 1),
            task("first", Some(date(1)), 2),
            task("second", Some(date(2)), 3),
        ];
        tasks.sort_by(|a, b| TaskSort::DueDate.compare(a, b));

        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["first", "second", "third", "undated"]);
    }

    #[test]
    fn test_created_at_sort_is_newest_first() {
        let mut tasks = vec![task("old", None, 0), task("new", None, 10)];
        tasks.sort_by(|a, b| TaskSort::CreatedAt.compare(a, b));
        assert_eq!(tasks[0].title, "new");
    }

    #[test]
    fn test_priority_sort() {
        let mut low = task("low", Some(date(1)), 0);
        low.priority = Some(Priority::Low);
        let mut high = task("high", Some(date(5)), 1);
        high.priority = Some(Priority::High);
        let unset = task("unset", Some(date(1)), 2);

        let mut tasks = vec![unset, low, high];
        tasks.sort_by(|a, b| TaskSort::Priority.compare(a, b));

        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["high", "low", "unset"]);
    }

    #[test]
    fn test_filter_matches() {
        let mut t = task("report", Some(date(5)), 0);
        t.category = Some("Work".to_string());
        t.priority = Some(Priority::Medium);

        assert!(TaskFilter::default().matches(&t));
        assert!(TaskFilter {
            category: Some("work".to_string()),
            ..Default::default()
        }
        .matches(&t));
        assert!(!TaskFilter {
            status: Some(TaskStatus::Done),
            ..Default::default()
        }
        .matches(&t));
        assert!(!TaskFilter {
            priority: Some(Priority::High),
            ..Default::default()
        }
        .matches(&t));
        assert!(TaskFilter {
            due_from: Some(date(5)),
            due_to: Some(date(5)),
            ..Default::default()
        }
        .matches(&t));
        assert!(!TaskFilter {
            due_from: Some(date(6)),
            ..Default::default()
        }
        .matches(&t));
    }

    #[test]
    fn test_overdue_filter() {
        let late = task("late", Some(date(1)), 0);
        let mut finished = task("finished", Some(date(1)), 1);
        finished.status = TaskStatus::Done;
        let filter = TaskFilter {
            overdue_as_of: Some(date(2)),
            ..Default::default()
        };

        assert!(filter.matches(&late));
        assert!(!filter.matches(&finished));
    }

    #[test]
    fn test_due_range_excludes_undated() {
        let t = task("undated", None, 0);
        assert!(!TaskFilter {
            due_to: Some(date(30)),
            ..Default::default()
        }
        .matches(&t));
    }

    #[test]
    fn test_changes_apply_only_supplied_fields() {
        let mut t = task("before", Some(date(5)), 0);
        t.description = Some("keep me".to_string());
        t.category = Some("Work".to_string());

        let changes = TaskChanges {
            title: Some("after".to_string()),
            category: Some(None),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply_to(&mut t);

        assert_eq!(t.title, "after");
        assert_eq!(t.description.as_deref(), Some("keep me"));
        assert_eq!(t.due_date, Some(date(5)));
        assert_eq!(t.category, None);
    }

    #[test]
    fn test_mentions_is_case_insensitive() {
        let mut t = task("Buy MILK", None, 0);
        t.description = Some("From the Corner shop".to_string());

        assert!(t.mentions("milk"));
        assert!(t.mentions("corner"));
        assert!(!t.mentions("bread"));
    }

    #[test]
    fn test_task_row_conversion_rejects_bad_status() {
        let row = TaskRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "x".to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            due_date: None,
            status: "archived".to_string(),
            priority: None,
            category: None,
            completed_at: None,
        };
        assert!(matches!(
            Task::try_from(row),
            Err(CoreError::StoreUnavailable(_))
        ));
    }
}
