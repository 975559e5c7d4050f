/// Read-only report aggregation over a user's tasks
///
/// The arithmetic lives in the pure functions [`summarize`], [`tally`] and
/// [`productivity_of`]; [`ReportService`] only fetches the tasks and picks
/// "today". Dates are UTC calendar dates.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use tasktracker_shared::models::report::Window;
/// use tasktracker_shared::services::reports::summarize;
///
/// let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
/// let stats = summarize(&[], Window::week_of(today).unwrap(), today);
/// assert_eq!(stats.total, 0);
/// ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::report::{
    Granularity, NewSavedReport, ProductivityMetrics, SavedReport, SummaryStats, TrendPoint,
    Window,
};
use crate::models::task::{Task, TaskFilter, TaskStatus};
use crate::store::{ReportStore, TaskStore};

/// Counts over the tasks created in `window`, plus completions in it
pub fn summarize(tasks: &[Task], window: Window, today: NaiveDate) -> SummaryStats {
    let created: Vec<&Task> = tasks
        .iter()
        .filter(|t| window.contains(t.created_on()))
        .collect();

    let mut stats = count(created.iter().copied(), today);
    stats.completed_in_window = tasks
        .iter()
        .filter(|t| t.completed_on().map_or(false, |d| window.contains(d)))
        .count() as u64;
    stats
}

/// Counts over every given task, regardless of dates
///
/// `completed_in_window` equals `done` here since there is no window.
pub fn tally(tasks: &[Task], today: NaiveDate) -> SummaryStats {
    let mut stats = count(tasks.iter(), today);
    stats.completed_in_window = stats.done;
    stats
}

fn count<'a>(tasks: impl Iterator<Item = &'a Task>, today: NaiveDate) -> SummaryStats {
    let mut stats = SummaryStats::default();
    for task in tasks {
        stats.total += 1;
        match task.status {
            TaskStatus::ToDo => stats.to_do += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Done => stats.done += 1,
        }
        if task.is_overdue(today) {
            stats.overdue += 1;
        }
    }
    stats
}

/// Completion metrics over the tasks created in `window`
pub fn productivity_of(tasks: &[Task], window: Window) -> ProductivityMetrics {
    let created: Vec<&Task> = tasks
        .iter()
        .filter(|t| window.contains(t.created_on()))
        .collect();

    let total = created.len() as u64;
    let done: Vec<&&Task> = created
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .collect();

    let completion_rate = if total == 0 {
        0.0
    } else {
        done.len() as f64 / total as f64 * 100.0
    };

    let durations: Vec<f64> = done
        .iter()
        .filter_map(|t| t.completed_at.map(|at| at - t.created_at))
        .map(|d| d.num_seconds().max(0) as f64 / 86_400.0)
        .collect();
    let average_completion_days = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };

    let mut by_priority = BTreeMap::new();
    let mut by_category = BTreeMap::new();
    for task in &created {
        let priority = task.priority.map_or("none", |p| p.as_str());
        *by_priority.entry(priority.to_string()).or_insert(0) += 1;

        let category = task.category.as_deref().unwrap_or("uncategorized");
        *by_category.entry(category.to_string()).or_insert(0) += 1;
    }

    ProductivityMetrics {
        window: Some(window),
        total,
        done: done.len() as u64,
        completion_rate,
        average_completion_days,
        by_priority,
        by_category,
    }
}

/// Report queries for one user per call
pub struct ReportService {
    tasks: Arc<dyn TaskStore>,
    reports: Arc<dyn ReportStore>,
}

impl ReportService {
    pub fn new(tasks: Arc<dyn TaskStore>, reports: Arc<dyn ReportStore>) -> Self {
        Self { tasks, reports }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn summary(&self, user_id: Uuid, window: Window) -> CoreResult<SummaryStats> {
        self.summary_as_of(user_id, window, Self::today()).await
    }

    /// `summary` with an explicit "today" for the overdue check
    pub async fn summary_as_of(
        &self,
        user_id: Uuid,
        window: Window,
        today: NaiveDate,
    ) -> CoreResult<SummaryStats> {
        let tasks = self.tasks.tasks_in_window(user_id, window).await?;
        let stats = summarize(&tasks, window, today);

        debug!(user_id = %user_id, window = %window, total = stats.total, "Summary computed");
        Ok(stats)
    }

    /// One point per bucket, empty buckets included
    pub async fn trend(
        &self,
        user_id: Uuid,
        window: Window,
        granularity: Granularity,
    ) -> CoreResult<Vec<TrendPoint>> {
        let buckets = window.buckets(granularity)?;
        let tasks = self.tasks.tasks_in_window(user_id, window).await?;
        let today = Self::today();

        let points: Vec<TrendPoint> = buckets
            .into_iter()
            .map(|bucket| TrendPoint {
                bucket,
                stats: summarize(&tasks, bucket, today),
            })
            .collect();

        debug!(
            user_id = %user_id,
            window = %window,
            %granularity,
            buckets = points.len(),
            "Trend computed"
        );
        Ok(points)
    }

    /// Counts over all of the user's tasks
    pub async fn overview(&self, user_id: Uuid) -> CoreResult<SummaryStats> {
        let tasks = self.tasks.list_tasks(user_id, &TaskFilter::default()).await?;
        Ok(tally(&tasks, Self::today()))
    }

    pub async fn productivity(
        &self,
        user_id: Uuid,
        window: Window,
    ) -> CoreResult<ProductivityMetrics> {
        let tasks = self.tasks.tasks_in_window(user_id, window).await?;
        Ok(productivity_of(&tasks, window))
    }

    /// Computes the summary and stores a snapshot of it
    pub async fn save(&self, user_id: Uuid, window: Window) -> CoreResult<SavedReport> {
        let stats = self.summary(user_id, window).await?;
        let saved = self
            .reports
            .insert_saved_report(NewSavedReport {
                user_id,
                window,
                stats,
            })
            .await?;

        info!(user_id = %user_id, report_id = %saved.id, window = %window, "Report saved");
        Ok(saved)
    }

    /// Saved snapshots, newest first
    pub async fn saved(&self, user_id: Uuid) -> CoreResult<Vec<SavedReport>> {
        self.reports.list_saved_reports(user_id).await
    }
}
