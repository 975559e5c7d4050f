/// CSV export of task lists
///
/// One header row, then one row per task in input order. Quoting follows
/// RFC 4180, so titles containing commas, quotes or newlines survive a
/// round trip through [`parse_csv`].
///
/// # Example
///
/// ```
/// use tasktracker_shared::export::csv::{parse_csv, to_csv};
///
/// let bytes = to_csv(&[]).unwrap();
/// assert!(String::from_utf8(bytes.clone()).unwrap().starts_with("title,"));
/// assert!(parse_csv(&bytes).unwrap().is_empty());
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ExportError;
use crate::models::task::{Priority, Task, TaskStatus};

/// Column order of the export
pub const CSV_HEADER: [&str; 8] = [
    "title",
    "description",
    "status",
    "priority",
    "category",
    "due_date",
    "created_at",
    "completed_at",
];

/// One exported row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Task> for ExportedTask {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            category: task.category.clone(),
            due_date: task.due_date,
            created_at: task.created_at,
            completed_at: task.completed_at,
        }
    }
}

/// Serializes tasks to CSV bytes (UTF-8)
pub fn to_csv(tasks: &[Task]) -> Result<Vec<u8>, ExportError> {
    // Header written by hand so an empty export still has one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for task in tasks {
        writer.serialize(ExportedTask::from(task))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Reads rows produced by [`to_csv`]
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ExportedTask>, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(ExportError::Format(format!(
            "Unexpected CSV header: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let rows = reader
        .deserialize::<ExportedTask>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
