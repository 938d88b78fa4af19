mod common;

use anyhow::Result;
use axum::http::StatusCode;

use common::{send, test_app};

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let (_dir, _pool, app) = test_app().await?;

    let (status, body) = send(&app, "GET", "/api/health", None, None).await?;
    assert_eq!(status, StatusCode::OK, "health endpoint did not return 200");
    assert_eq!(body["db_ok"], true, "expected db_ok: true, got: {body}");
    assert_eq!(body["status"], "ok");
    Ok(())
}
