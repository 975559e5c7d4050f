/// Report endpoints
///
/// Every windowed report takes the same query parameters:
///
/// - `start` and `end` (`YYYY-MM-DD`, inclusive), or
/// - `period` = `day` | `week` | `month`, anchored on `date` (default
///   today, UTC)
///
/// With neither, the current week (Monday to Sunday) is used.
///
/// - `GET /v1/reports/summary`
/// - `GET /v1/reports/trend?granularity=day|week|month`
/// - `GET /v1/reports/overview` - all tasks, no window
/// - `GET /v1/reports/productivity`
/// - `POST /v1/reports/saved` - snapshot a summary
/// - `GET /v1/reports/saved` - snapshots, newest first

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthContext,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tasktracker_shared::models::report::{
    Granularity, ProductivityMetrics, SavedReport, SummaryStats, TrendPoint, Window,
};

/// Window selection shared by report and export endpoints
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub start: Option<NaiveDate>,

    pub end: Option<NaiveDate>,

    pub period: Option<String>,

    /// Anchor for `period`
    pub date: Option<NaiveDate>,
}

impl WindowQuery {
    /// `None` when no window parameter was given
    pub fn resolve(&self, today: NaiveDate) -> ApiResult<Option<Window>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => return Ok(Some(Window::new(start, end)?)),
            (Some(_), None) => return Err(ApiError::field("end", "end is required with start")),
            (None, Some(_)) => return Err(ApiError::field("start", "start is required with end")),
            (None, None) => {}
        }

        let Some(period) = self.period.as_deref() else {
            return Ok(None);
        };
        let anchor = self.date.unwrap_or(today);

        let window = match period.parse::<Granularity>()? {
            Granularity::Day => Window::day(anchor),
            Granularity::Week => Window::week_of(anchor)?,
            Granularity::Month => Window::month_of(anchor),
        };
        Ok(Some(window))
    }

    /// Like `resolve`, falling back to the current week
    pub fn resolve_or_this_week(&self) -> ApiResult<Window> {
        let today = Utc::now().date_naive();
        match self.resolve(today)? {
            Some(window) => Ok(window),
            None => Ok(Window::week_of(today)?),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    #[serde(flatten)]
    pub window: WindowQuery,

    pub granularity: Option<String>,
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<SummaryStats>> {
    let window = query.resolve_or_this_week()?;
    Ok(Json(state.reports.summary(auth.user_id, window).await?))
}

pub async fn trend(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TrendQuery>,
) -> ApiResult<Json<Vec<TrendPoint>>> {
    let window = query.window.resolve_or_this_week()?;
    let granularity = query
        .granularity
        .as_deref()
        .map(str::parse::<Granularity>)
        .transpose()?
        .unwrap_or_default();

    let points = state
        .reports
        .trend(auth.user_id, window, granularity)
        .await?;
    Ok(Json(points))
}

pub async fn overview(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<SummaryStats>> {
    Ok(Json(state.reports.overview(auth.user_id).await?))
}

pub async fn productivity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Json<ProductivityMetrics>> {
    let window = query.resolve_or_this_week()?;
    Ok(Json(state.reports.productivity(auth.user_id, window).await?))
}

pub async fn save_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<(StatusCode, Json<SavedReport>)> {
    let window = query.resolve_or_this_week()?;
    let saved = state.reports.save(auth.user_id, window).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list_saved(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<SavedReport>>> {
    Ok(Json(state.reports.saved(auth.user_id).await?))
}
