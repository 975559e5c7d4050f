/// Export endpoints
///
/// - `GET /v1/export/tasks.csv` - the caller's tasks as CSV; accepts the
///   same filters as `GET /v1/tasks`
/// - `GET /v1/export/summary.pdf` - a one-page summary; accepts the report
///   window parameters, and covers all tasks when none are given

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
    routes::{reports::WindowQuery, tasks::ListQuery},
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use tasktracker_shared::export::{to_csv, to_pdf_summary};

pub async fn tasks_csv(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Response> {
    let filter = query.to_filter()?;
    let tasks = state.tasks.list(auth.user_id, &filter).await?;
    let body = to_csv(&tasks)?;

    tracing::debug!(user_id = %auth.user_id, rows = tasks.len(), "CSV export");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"tasks.csv\""),
        ],
        body,
    )
        .into_response())
}

pub async fn summary_pdf(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Response> {
    let window = query.resolve(Utc::now().date_naive())?;

    let stats = match window {
        Some(window) => state.reports.summary(auth.user_id, window).await?,
        None => state.reports.overview(auth.user_id).await?,
    };
    let body = to_pdf_summary(window, &stats);

    tracing::debug!(user_id = %auth.user_id, bytes = body.len(), "PDF summary export");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"summary.pdf\"",
            ),
        ],
        body,
    )
        .into_response())
}
