/// Integration tests for the report service over the in-memory store
///
/// Run with: cargo test --test reports_tests

mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::Harness;
use tasktracker_shared::error::CoreError;
use tasktracker_shared::models::report::{Granularity, SummaryStats, Window};
use tasktracker_shared::models::task::{NewTask, Priority, TaskStatus};
use uuid::Uuid;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// One overdue open task and one finished task, both created today
async fn seed(h: &Harness, user: Uuid) {
    h.tasks
        .create(
            user,
            NewTask {
                title: "Overdue".to_string(),
                due_date: Some(today() - Duration::days(1)),
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let finished = h
        .tasks
        .create(
            user,
            NewTask {
                title: "Finished".to_string(),
                category: Some("Work".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    h.tasks
        .set_status(user, finished.id, TaskStatus::Done)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_summary_overdue_and_done() {
    let h = Harness::new();
    let user = h.user("r1@example.com").await;
    seed(&h, user).await;

    let stats = h.reports.summary(user, Window::week_of(today()).unwrap()).await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.overdue, 1);
    assert_eq!(stats.done, 1);
    assert_eq!(stats.to_do, 1);
    assert_eq!(stats.in_progress, 0);
    assert_eq!(stats.completed_in_window, 1);
}

#[tokio::test]
async fn test_summary_outside_window_is_empty() {
    let h = Harness::new();
    let user = h.user("r2@example.com").await;
    seed(&h, user).await;

    let last_month = Window::month_of(today() - Duration::days(40));
    let stats = h.reports.summary(user, last_month).await.unwrap();
    assert_eq!(stats, SummaryStats::default());
}

#[tokio::test]
async fn test_summary_as_of_controls_overdue() {
    let h = Harness::new();
    let user = h.user("r3@example.com").await;
    seed(&h, user).await;

    // Seen from two days ago the task was not yet due
    let window = Window::week_of(today()).unwrap();
    let earlier = today() - Duration::days(2);
    let stats = h.reports.summary_as_of(user, window, earlier).await.unwrap();
    assert_eq!(stats.overdue, 0);
}

#[tokio::test]
async fn test_summary_is_per_user() {
    let h = Harness::new();
    let busy = h.user("busy@example.com").await;
    let idle = h.user("idle@example.com").await;
    seed(&h, busy).await;

    let stats = h.reports.summary(idle, Window::day(today())).await.unwrap();
    assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn test_trend_keeps_empty_buckets() {
    let h = Harness::new();
    let user = h.user("r4@example.com").await;
    seed(&h, user).await;

    let window = Window::new(today() - Duration::days(6), today()).unwrap();
    let points = h.reports.trend(user, window, Granularity::Day).await.unwrap();

    assert_eq!(points.len(), 7);
    assert!(points[..6].iter().all(|p| p.stats == SummaryStats::default()));
    assert_eq!(points[6].bucket, Window::day(today()));
    assert_eq!(points[6].stats.total, 2);

    // Buckets are contiguous and in order
    for pair in points.windows(2) {
        assert_eq!(pair[0].bucket.end() + Duration::days(1), pair[1].bucket.start());
    }
}

#[tokio::test]
async fn test_trend_for_user_without_tasks() {
    let h = Harness::new();
    let user = h.user("r5@example.com").await;

    let window = Window::new(today() - Duration::days(60), today()).unwrap();
    let points = h.reports.trend(user, window, Granularity::Month).await.unwrap();

    assert!(points.len() >= 2);
    assert!(points.iter().all(|p| p.stats.total == 0));
    assert_eq!(points.first().unwrap().bucket.start(), window.start());
    assert_eq!(points.last().unwrap().bucket.end(), window.end());
}

#[tokio::test]
async fn test_trend_rejects_too_many_buckets() {
    let h = Harness::new();
    let user = h.user("r6@example.com").await;

    let window = Window::new(today() - Duration::days(5000), today()).unwrap();
    let err = h
        .reports
        .trend(user, window, Granularity::Day)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_overview_counts_everything() {
    let h = Harness::new();
    let user = h.user("r7@example.com").await;
    seed(&h, user).await;

    let stats = h.reports.overview(user).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.done, 1);
    assert_eq!(stats.overdue, 1);
}

#[tokio::test]
async fn test_productivity() {
    let h = Harness::new();
    let user = h.user("r8@example.com").await;
    seed(&h, user).await;

    let metrics = h
        .reports
        .productivity(user, Window::week_of(today()).unwrap())
        .await
        .unwrap();

    assert_eq!(metrics.total, 2);
    assert_eq!(metrics.done, 1);
    assert!((metrics.completion_rate - 50.0).abs() < f64::EPSILON);
    assert!(metrics.average_completion_days.is_some());
    assert_eq!(metrics.by_priority.get("high"), Some(&1));
    assert_eq!(metrics.by_category.get("Work"), Some(&1));
}

#[tokio::test]
async fn test_saved_reports_newest_first() {
    let h = Harness::new();
    let user = h.user("r9@example.com").await;
    seed(&h, user).await;

    let week = h.reports.save(user, Window::week_of(today()).unwrap()).await.unwrap();
    let month = h.reports.save(user, Window::month_of(today())).await.unwrap();
    assert_eq!(week.stats.total, 2);

    let saved = h.reports.saved(user).await.unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].id, month.id);
    assert_eq!(saved[1].id, week.id);

    let other = h.user("r10@example.com").await;
    assert!(h.reports.saved(other).await.unwrap().is_empty());
}
