/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasktracker_api::{app::{build_router, AppState}, config::Config};
/// use tasktracker_shared::db::pool::create_pool;
/// use tasktracker_shared::store::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(&config.database.pool_config()).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::session_auth_layer, security::security_headers},
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tasktracker_shared::{
    services::{AccountService, ReportService, TaskService},
    store::{HealthCheck, Store},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,

    pub tasks: Arc<TaskService>,

    pub reports: Arc<ReportService>,

    /// Store liveness check for `/health`
    pub health: Arc<dyn HealthCheck>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every service to one store
    pub fn new<S: Store + 'static>(store: Arc<S>, config: Config) -> Self {
        let accounts = AccountService::new(
            store.clone(),
            store.clone(),
            config.auth.account_settings(),
        );

        Self {
            accounts: Arc::new(accounts),
            tasks: Arc::new(TaskService::new(store.clone())),
            reports: Arc::new(ReportService::new(store.clone(), store.clone())),
            health: store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                      # Health check (public)
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /register       # public
///     │   ├── POST /login          # public
///     │   ├── POST /logout         # public, idempotent
///     │   └── GET  /me
///     ├── /tasks/
///     │   ├── POST   /
///     │   ├── GET    /             # filtered, sorted list
///     │   ├── GET    /search?q=
///     │   ├── GET    /:id
///     │   ├── PATCH  /:id
///     │   ├── DELETE /:id
///     │   └── PUT    /:id/status
///     ├── /reports/
///     │   ├── GET /summary
///     │   ├── GET /trend
///     │   ├── GET /overview
///     │   ├── GET /productivity
///     │   └── GET|POST /saved
///     └── /export/
///         ├── GET /tasks.csv
///         └── GET /summary.pdf
/// ```
///
/// Everything except `/health`, register, login and logout requires a
/// session token.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Session authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Only `/me` needs a session; logout stays public so it is idempotent
    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route("/search", get(routes::tasks::search_tasks))
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/status", put(routes::tasks::set_task_status));

    let report_routes = Router::new()
        .route("/summary", get(routes::reports::summary))
        .route("/trend", get(routes::reports::trend))
        .route("/overview", get(routes::reports::overview))
        .route("/productivity", get(routes::reports::productivity))
        .route(
            "/saved",
            get(routes::reports::list_saved).post(routes::reports::save_report),
        );

    let export_routes = Router::new()
        .route("/tasks.csv", get(routes::export::tasks_csv))
        .route("/summary.pdf", get(routes::export::summary_pdf));

    let protected_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/reports", report_routes)
        .nest("/export", export_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn_with_state(
            production,
            security_headers,
        ))
        .with_state(state)
}
