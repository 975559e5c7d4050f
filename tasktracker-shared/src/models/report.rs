/// Report windows, buckets and summary values
///
/// # Saved report schema
///
/// ```sql
/// CREATE TABLE saved_reports (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     window_start DATE NOT NULL,
///     window_end DATE NOT NULL,
///     generated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     stats JSONB NOT NULL,
///     CHECK (window_start <= window_end)
/// );
/// ```

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Upper bound on the number of buckets a single trend may produce
pub const MAX_TREND_BUCKETS: usize = 1000;

/// Closed date range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    start: NaiveDate,
    end: NaiveDate,
}

impl Window {
    /// Builds a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::validation(format!(
                "Window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The single day `date`
    pub fn day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    /// The ISO week (Monday to Sunday) containing `date`
    ///
    /// # Errors
    ///
    /// `Validation` if the week reaches past the supported date range
    /// (`NaiveDate::MIN..=NaiveDate::MAX`).
    pub fn week_of(date: NaiveDate) -> CoreResult<Self> {
        let out_of_range = || {
            CoreError::validation(format!(
                "The week of {} is outside the supported date range",
                date
            ))
        };

        let since_monday = u64::from(date.weekday().num_days_from_monday());
        let start = date
            .checked_sub_days(Days::new(since_monday))
            .ok_or_else(out_of_range)?;
        let end = week_end(date).ok_or_else(out_of_range)?;

        Ok(Self { start, end })
    }

    /// The calendar month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        Self {
            start,
            end: last_day_of_month(start),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` lies inside the window (both ends inclusive)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Splits the window into consecutive buckets of the given granularity
    ///
    /// The first and last buckets are clipped to the window, so a month
    /// window starting on the 15th yields a first bucket from the 15th to
    /// the end of that month. Every day of the window lands in exactly one
    /// bucket.
    ///
    /// # Errors
    ///
    /// `Validation` if the window would produce more than
    /// [`MAX_TREND_BUCKETS`] buckets.
    pub fn buckets(&self, granularity: Granularity) -> CoreResult<Vec<Window>> {
        let mut buckets = Vec::new();
        let mut cursor = self.start;

        while cursor <= self.end {
            if buckets.len() == MAX_TREND_BUCKETS {
                return Err(CoreError::validation(format!(
                    "Window {} spans more than {} {} buckets",
                    self, MAX_TREND_BUCKETS, granularity
                )));
            }

            let natural_end = match granularity {
                Granularity::Day => cursor,
                Granularity::Week => week_end(cursor).unwrap_or(NaiveDate::MAX),
                Granularity::Month => last_day_of_month(cursor),
            };
            let end = natural_end.min(self.end);
            buckets.push(Window { start: cursor, end });

            match end.succ_opt() {
                Some(next) => cursor = next,
                None => break,
            }
        }

        Ok(buckets)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Sunday of the week containing `date`; `None` past `NaiveDate::MAX`
fn week_end(date: NaiveDate) -> Option<NaiveDate> {
    let until_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
    date.checked_add_days(Days::new(until_sunday))
}

/// December of the last representable year ends on `NaiveDate::MAX`
fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Trend bucket size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        })
    }
}

impl FromStr for Granularity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            _ => Err(CoreError::validation(format!(
                "Invalid granularity '{}': expected one of day, week, month",
                s
            ))),
        }
    }
}

/// Task counts for one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Tasks created inside the window
    pub total: u64,

    pub to_do: u64,

    pub in_progress: u64,

    pub done: u64,

    /// Past due and not Done, among the tasks created inside the window
    pub overdue: u64,

    /// Tasks whose completion date falls inside the window, whenever they
    /// were created
    pub completed_in_window: u64,
}

/// One bucket of a trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub bucket: Window,
    pub stats: SummaryStats,
}

/// Completion metrics for a window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityMetrics {
    pub window: Option<Window>,

    /// Tasks created inside the window
    pub total: u64,

    pub done: u64,

    /// Percentage of `total` that is Done, 0 when there are no tasks
    pub completion_rate: f64,

    /// Mean days from creation to completion over Done tasks, if any
    pub average_completion_days: Option<f64>,

    /// Keyed by priority name, `"none"` for unset
    pub by_priority: BTreeMap<String, u64>,

    /// Keyed by category, `"uncategorized"` for unset
    pub by_category: BTreeMap<String, u64>,
}

/// Persisted snapshot of a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub window: Window,
    pub generated_at: DateTime<Utc>,
    pub stats: SummaryStats,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SavedReportRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub stats: sqlx::types::Json<SummaryStats>,
}

impl TryFrom<SavedReportRow> for SavedReport {
    type Error = CoreError;

    fn try_from(row: SavedReportRow) -> Result<Self, Self::Error> {
        let window = Window::new(row.window_start, row.window_end).map_err(|_| {
            CoreError::StoreUnavailable(format!("Corrupt saved report {}: inverted window", row.id))
        })?;
        Ok(SavedReport {
            id: row.id,
            user_id: row.user_id,
            window,
            generated_at: row.generated_at,
            stats: row.stats.0,
        })
    }
}

/// Input for persisting a report snapshot
#[derive(Debug, Clone)]
pub struct NewSavedReport {
    pub user_id: Uuid,
    pub window: Window,
    pub stats: SummaryStats,
}
