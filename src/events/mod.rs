use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<T> {
    pub id: Uuid,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub payload: T,
}

impl<T> DomainEvent<T> {
    pub fn new(name: impl Into<String>, actor_id: Option<i64>, subject_id: Option<i64>, payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            occurred_at: Utc::now(),
            actor_id,
            subject_id,
            payload,
        }
    }
}

pub type EventBus = broadcast::Sender<Value>;

pub fn init_event_bus() -> (EventBus, broadcast::Receiver<Value>) {
    broadcast::channel(1024)
}

/// Caller details recorded alongside each audit entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from)
            });

        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Self { ip, user_agent }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    #[serde(rename = "new")]
    pub current: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
    pub severity: Severity,
}

pub fn log_activity<T: Loggable>(event_bus: &EventBus, action: &str, actor_id: Option<i64>, entity: &T) {
    log_activity_with_context(event_bus, action, actor_id, entity, None, None);
}

/// Publishes `<entity>.<action>` with the entity's new and, optionally, previous state.
///
/// Never fails: a full or closed bus only drops the audit entry.
pub fn log_activity_with_context<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<i64>,
    entity: &T,
    old_entity: Option<&T>,
    context: Option<RequestContext>,
) {
    let name = format!("{}.{}", T::entity_type(), action);
    let payload = ActivityPayload {
        current: serde_json::to_value(entity).unwrap_or_default(),
        old: old_entity.map(|e| serde_json::to_value(e).unwrap_or_default()),
        context,
        severity: entity.severity_for_action(action),
    };

    let event = DomainEvent::new(
        name,
        actor_id,
        Some(entity.subject_id()),
        serde_json::to_value(&payload).unwrap_or_default(),
    );

    if event_bus.send(serde_json::to_value(event).unwrap_or_default()).is_err() {
        tracing::debug!("no activity listener attached, audit event dropped");
    }
}

fn describe(name: &str) -> &'static str {
    match name {
        "user.registered" => "New user registered",
        "user.login" => "User logged in",
        "user.role_changed" => "User role changed",
        "user.deleted" => "User deleted",
        "course.created" => "Course created",
        "course.updated" => "Course updated",
        "course.deleted" => "Course deleted",
        "class.created" => "Class scheduled",
        "class.updated" => "Class updated",
        "class.deleted" => "Class deleted",
        "project.created" => "Project created",
        "project.updated" => "Project updated",
        "project.deleted" => "Project deleted",
        "enrollment.created" => "Enrollment requested",
        "enrollment.status_changed" => "Enrollment status changed",
        "attendance.created" => "Attendance recorded",
        "attendance.deleted" => "Attendance removed",
        "submission.created" => "Project submitted",
        "submission.graded" => "Submission graded",
        _ => "System event",
    }
}

/// `SHA256(prev_hash || payload)`, hex encoded.
pub fn chain_hash(prev_hash: Option<&str>, payload: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(prev) = prev_hash {
        hasher.update(prev.as_bytes());
    }
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

async fn persist(pool: &SqlitePool, event: Value) -> Result<(), sqlx::Error> {
    let name = event.get("name").and_then(Value::as_str).unwrap_or("unknown");
    let actor_id = event.get("actor_id").and_then(Value::as_i64);
    let subject_id = event.get("subject_id").and_then(Value::as_i64);
    let occurred_at = event
        .get("occurred_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    let severity = event
        .get("payload")
        .and_then(|p| p.get("severity"))
        .and_then(Value::as_str)
        .unwrap_or(Severity::Important.as_str());
    let payload = serde_json::to_string(&event).unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO activity_log (id, event_name, description, actor_id, subject_id, occurred_at, properties, severity)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(describe(name))
    .bind(actor_id)
    .bind(subject_id)
    .bind(occurred_at)
    .bind(&payload)
    .bind(severity)
    .execute(pool)
    .await?;

    let prev_hash: Option<String> = sqlx::query_scalar("SELECT hash FROM event_store ORDER BY rowid DESC LIMIT 1")
        .fetch_optional(pool)
        .await?;
    let hash = chain_hash(prev_hash.as_deref(), &payload);

    sqlx::query(
        r#"
        INSERT INTO event_store (id, event_name, occurred_at, actor_id, subject_id, payload, severity, prev_hash, hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(occurred_at)
    .bind(actor_id)
    .bind(subject_id)
    .bind(&payload)
    .bind(severity)
    .bind(&prev_hash)
    .bind(&hash)
    .execute(pool)
    .await?;

    Ok(())
}

/// Drains the bus into `activity_log` and the hash-chained `event_store`.
pub async fn start_activity_listener(mut rx: broadcast::Receiver<Value>, pool: SqlitePool) {
    tracing::info!("activity listener started");
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Err(e) = persist(&pool, event).await {
                    tracing::error!(error = %e, "failed to persist activity event");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "activity listener lagged behind the event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_chain_depends_on_previous_link() {
        let first = chain_hash(None, "a");
        let second = chain_hash(Some(&first), "b");
        assert_eq!(first.len(), 64);
        assert_ne!(second, chain_hash(None, "b"));
        assert_eq!(second, chain_hash(Some(&first), "b"));
    }

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        headers.insert("x-real-ip", "192.168.1.1".parse().unwrap());
        headers.insert(axum::http::header::USER_AGENT, "curl/8".parse().unwrap());

        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8"));
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        #[derive(Serialize)]
        struct Thing {
            id: i64,
        }
        impl Loggable for Thing {
            fn entity_type() -> &'static str {
                "thing"
            }
            fn subject_id(&self) -> i64 {
                self.id
            }
        }

        let (bus, mut rx) = init_event_bus();
        log_activity(&bus, "deleted", Some(3), &Thing { id: 9 });

        let event = rx.recv().await.unwrap();
        assert_eq!(event["name"], "thing.deleted");
        assert_eq!(event["actor_id"], 3);
        assert_eq!(event["subject_id"], 9);
        assert_eq!(event["payload"]["severity"], "critical");
    }
}
