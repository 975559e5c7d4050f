/// HTTP-level tests for the task tracker API
///
/// Every test drives the full router (auth middleware, security headers,
/// error mapping) over an in-memory store. Run with:
///
/// ```text
/// cargo test -p tasktracker-api --test api_tests
/// ```

mod common;

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, Utc};
use common::{TestContext, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health_reports_store_state() {
    let ctx = TestContext::new();

    let response = ctx.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "healthy");
    assert_eq!(response.headers.get("x-frame-options").unwrap(), "DENY");

    ctx.store.set_available(false);
    let response = ctx.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["database"], "disconnected");
}

#[tokio::test]
async fn test_register_conflict_and_validation() {
    let ctx = TestContext::new();
    ctx.login_new_user("ada@example.com").await;

    let response = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({ "email": "ADA@example.com", "password": PASSWORD, "name": "Again" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json()["error"], "conflict");

    let response = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({ "email": "weak@example.com", "password": "short", "name": "Weak" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["details"][0]["field"], "password");

    let response = ctx
        .post(
            "/v1/auth/register",
            None,
            json!({ "email": "not-an-email", "password": PASSWORD, "name": "Nobody" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["error"], "validation_error");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.login_new_user("grace@example.com").await;

    let wrong_password = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "grace@example.com", "password": "Wr0ng!Password" }),
        )
        .await;
    let unknown_email = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let ctx = TestContext::new();

    let response = ctx.request(Method::GET, "/v1/tasks", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let token = ctx.login_new_user("linus@example.com").await;

    let response = ctx.get("/v1/auth/me", &token).await;
    assert_eq!(response.status, StatusCode::OK);
    let profile = response.json();
    assert_eq!(profile["email"], "linus@example.com");
    assert!(profile.get("hashed_password").is_none());

    let logout = ctx
        .request(Method::POST, "/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let response = ctx.get("/v1/auth/me", &token).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let again = ctx
        .request(Method::POST, "/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(again.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new();
    let token = ctx.login_new_user("owner@example.com").await;

    let task = ctx
        .create_task(
            &token,
            json!({
                "title": "  Write report  ",
                "description": "Quarterly numbers",
                "due_date": "2025-03-10",
                "priority": "high",
                "category": "Work"
            }),
        )
        .await;
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["status"], "todo");
    let id = task["id"].as_str().unwrap().to_string();
    let uri = format!("/v1/tasks/{}", id);

    let response = ctx
        .request(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "description": null, "priority": "low" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let updated = response.json();
    assert!(updated["description"].is_null());
    assert_eq!(updated["priority"], "low");
    assert_eq!(updated["due_date"], "2025-03-10");

    let status_uri = format!("{}/status", uri);
    let response = ctx
        .request(
            Method::PUT,
            &status_uri,
            Some(&token),
            Some(json!({ "status": "In Progress" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "in_progress");

    let response = ctx
        .request(
            Method::PUT,
            &status_uri,
            Some(&token),
            Some(json!({ "status": "archived" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.get(&uri, &token).await.json()["status"], "in_progress");

    let response = ctx
        .request(
            Method::PUT,
            &status_uri,
            Some(&token),
            Some(json!({ "status": "done" })),
        )
        .await;
    assert!(!response.json()["completed_at"].is_null());

    let response = ctx.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    let response = ctx.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "not_found");
}

#[tokio::test]
async fn test_tasks_are_private() {
    let ctx = TestContext::new();
    let alice = ctx.login_new_user("alice@example.com").await;
    let bob = ctx.login_new_user("bob@example.com").await;

    let task = ctx.create_task(&alice, json!({ "title": "Secret" })).await;
    let uri = format!("/v1/tasks/{}", task["id"].as_str().unwrap());

    assert_eq!(ctx.get(&uri, &bob).await.status, StatusCode::NOT_FOUND);
    let response = ctx.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let listed = ctx.get("/v1/tasks", &bob).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_order_and_filters() {
    let ctx = TestContext::new();
    let token = ctx.login_new_user("lister@example.com").await;

    for (title, due) in [
        ("third", Some("2025-01-03")),
        ("undated", None),
        ("first", Some("2025-01-01")),
        ("second", Some("2025-01-02")),
    ] {
        ctx.create_task(&token, json!({ "title": title, "due_date": due, "category": "Home" }))
            .await;
    }

    let listed = ctx.get("/v1/tasks", &token).await.json();
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["first", "second", "third", "undated"]);

    let ranged = ctx
        .get("/v1/tasks?due_from=2025-01-02&due_to=2025-01-03&category=home", &token)
        .await
        .json();
    assert_eq!(ranged.as_array().unwrap().len(), 2);

    let response = ctx.get("/v1/tasks?status=archived", &token).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .get("/v1/tasks?due_from=2025-02-01&due_to=2025-01-01", &token)
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_search() {
    let ctx = TestContext::new();
    let token = ctx.login_new_user("finder@example.com").await;

    ctx.create_task(&token, json!({ "title": "Buy milk" })).await;
    ctx.create_task(&token, json!({ "title": "Call mom", "description": "About the MILK" }))
        .await;
    ctx.create_task(&token, json!({ "title": "Unrelated" })).await;

    let found = ctx.get("/v1/tasks/search?q=milk", &token).await.json();
    assert_eq!(found.as_array().unwrap().len(), 2);

    let response = ctx.get("/v1/tasks/search?q=", &token).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_reports() {
    let ctx = TestContext::new();
    let token = ctx.login_new_user("reporter@example.com").await;
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);

    ctx.create_task(&token, json!({ "title": "Late", "due_date": yesterday }))
        .await;
    let finished = ctx.create_task(&token, json!({ "title": "Finished" })).await;
    ctx.request(
        Method::PUT,
        &format!("/v1/tasks/{}/status", finished["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({ "status": "done" })),
    )
    .await;

    let window = format!("start={}&end={}", today, today);
    let summary = ctx
        .get(&format!("/v1/reports/summary?{}", window), &token)
        .await
        .json();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["overdue"], 1);
    assert_eq!(summary["done"], 1);

    let trend = ctx
        .get(
            &format!(
                "/v1/reports/trend?start={}&end={}&granularity=day",
                today - Duration::days(2),
                today
            ),
            &token,
        )
        .await
        .json();
    let points = trend.as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[0]["stats"]["total"], 0);
    assert_eq!(points[2]["stats"]["total"], 2);

    let response = ctx
        .get(&format!("/v1/reports/summary?start={}", today), &token)
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let overview = ctx.get("/v1/reports/overview", &token).await.json();
    assert_eq!(overview["total"], 2);

    let productivity = ctx
        .get(&format!("/v1/reports/productivity?{}", window), &token)
        .await
        .json();
    assert_eq!(productivity["completion_rate"], 50.0);

    let saved = ctx
        .request(
            Method::POST,
            &format!("/v1/reports/saved?{}", window),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(saved.status, StatusCode::CREATED);
    let listed = ctx.get("/v1/reports/saved", &token).await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["stats"]["done"], 1);
}

#[tokio::test]
async fn test_windows_at_date_range_limits() {
    let ctx = TestContext::new();
    let token = ctx.login_new_user("limits@example.com").await;

    // +262142-12-31 is the last representable date, a Monday
    let response = ctx
        .get("/v1/reports/summary?period=week&date=%2B262142-12-31", &token)
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["error"], "validation_error");

    let response = ctx
        .get("/v1/export/summary.pdf?period=week&date=%2B262142-12-31", &token)
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .get(
            "/v1/reports/trend?start=%2B262142-12-30&end=%2B262142-12-31&granularity=week",
            &token,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let points = response.json();
    assert_eq!(points.as_array().unwrap().len(), 2);
    assert_eq!(points[1]["stats"]["total"], 0);
}

#[tokio::test]
async fn test_exports() {
    let ctx = TestContext::new();
    let token = ctx.login_new_user("exporter@example.com").await;
    ctx.create_task(&token, json!({ "title": "Comma, inside", "due_date": "2025-05-01" }))
        .await;

    let csv = ctx.get("/v1/export/tasks.csv", &token).await;
    assert_eq!(csv.status, StatusCode::OK);
    assert!(csv.headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let text = String::from_utf8(csv.body.to_vec()).unwrap();
    assert!(text.starts_with("title,"));
    assert!(text.contains("\"Comma, inside\""));

    let pdf = ctx.get("/v1/export/summary.pdf", &token).await;
    assert_eq!(pdf.status, StatusCode::OK);
    assert_eq!(pdf.headers[header::CONTENT_TYPE], "application/pdf");
    assert!(pdf.body.starts_with(b"%PDF-1.4"));
    assert!(String::from_utf8_lossy(&pdf.body).contains("(Total tasks: 1) Tj"));
}

#[tokio::test]
async fn test_store_outage_is_service_unavailable() {
    let ctx = TestContext::new();
    let token = ctx.login_new_user("outage@example.com").await;

    ctx.store.set_available(false);
    let response = ctx.get("/v1/tasks", &token).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json()["error"], "service_unavailable");

    ctx.store.set_available(true);
    assert_eq!(ctx.get("/v1/tasks", &token).await.status, StatusCode::OK);
}
