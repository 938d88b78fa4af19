#![allow(dead_code)]

use std::path::Path;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

use learnhub::authz::{Actor, Role};
use learnhub::models::course::{Course, CourseCreateRequest};
use learnhub::services::courses;
use learnhub::validation::{format_timestamp, parse_timestamp};

/// Fresh migrated database in a temp dir. Keep the `TempDir` alive for the test's duration.
pub async fn test_pool() -> Result<(TempDir, SqlitePool)> {
    let dir = tempfile::tempdir().context("failed to create tempdir")?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    Ok((dir, pool))
}

pub async fn test_app() -> Result<(TempDir, SqlitePool, Router)> {
    let (dir, pool) = test_pool().await?;
    std::env::set_var("JWT_SECRET", "test-secret");
    let app = learnhub::create_app(pool.clone()).await?;
    Ok((dir, pool, app))
}

/// Inserts an account directly; the password hash is a placeholder so these users cannot log in.
pub async fn seed_user(pool: &SqlitePool, username: &str, role: Role) -> Result<Actor> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, role, created_at, updated_at) \
         VALUES (?, ?, 'not-a-hash', ?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(role)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(Actor::new(id, role))
}

pub fn ts(raw: &str) -> DateTime<Utc> {
    parse_timestamp("test", raw).expect("test timestamps use DD-MM-YYYY HH:MM")
}

pub async fn seed_course(pool: &SqlitePool, mentor: &Actor, start: &str, end: &str) -> Result<Course> {
    let req = CourseCreateRequest {
        name: "Systems Programming".to_string(),
        description: None,
        mentor_id: None,
        start_date: start.to_string(),
        end_date: end.to_string(),
    };
    Ok(courses::create_course(pool, mentor, req).await?)
}

/// A course window that contains the current wall-clock time.
pub fn open_window() -> (String, String) {
    let now = Utc::now();
    (
        format_timestamp(&(now - chrono::Duration::days(7))),
        format_timestamp(&(now + chrono::Duration::days(7))),
    )
}

pub async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let resp = app.clone().oneshot(request).await?;
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
    };
    Ok((status, value))
}

/// Registers a student through the API and returns `(token, user_id)`.
pub async fn register(app: &Router, username: &str) -> Result<(String, i64)> {
    let body = serde_json::json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "password123"
    });
    let (status, value) = send(app, "POST", "/api/auth/register", None, Some(body)).await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {status} {value}");

    let token = value["token"].as_str().context("missing token")?.to_string();
    let id = value["user"]["id"].as_i64().context("missing user id")?;
    Ok((token, id))
}

pub async fn login(app: &Router, username: &str) -> Result<String> {
    let body = serde_json::json!({ "username": username, "password": "password123" });
    let (status, value) = send(app, "POST", "/api/auth/login", None, Some(body)).await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {status} {value}");
    Ok(value["token"].as_str().context("missing token")?.to_string())
}
