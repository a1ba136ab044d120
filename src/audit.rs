use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

/// AuditSink
///
/// The append-only activity log boundary. Handlers record user actions through this
/// trait and never learn whether the write succeeded: the contract is
/// **fire-and-forget**. A sink failure must not block an authorization decision or
/// fail a request, so implementations swallow their own errors and report them via
/// tracing only. The `user_id` may be 0 when the actor is the seeded admin.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one activity record. Timestamps are assigned by the sink itself.
    async fn append(&self, user_id: i32, action: &str, details: String);
}

/// AuditState
///
/// The concrete type used to share the audit sink across the application state.
pub type AuditState = Arc<dyn AuditSink>;

/// PostgresAuditSink
///
/// Production sink writing to the `user_logs` table.
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn append(&self, user_id: i32, action: &str, details: String) {
        let result = sqlx::query(
            "INSERT INTO user_logs (user_id, action, details, created_at) VALUES ($1, $2, $3, NOW())",
        )
        .bind(user_id)
        .bind(action)
        .bind(details)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            // Logged, never surfaced: the request that triggered this write has
            // already been decided.
            tracing::error!("audit append failed (action={}): {:?}", action, e);
        }
    }
}

/// MockAuditSink
///
/// Test sink recording appended entries in memory so tests can assert on the
/// fire-and-forget writes without a database.
#[derive(Default)]
pub struct MockAuditSink {
    pub entries: Mutex<Vec<(i32, String, String)>>,
}

impl MockAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<(i32, String, String)> {
        self.entries.lock().expect("audit mock poisoned").clone()
    }
}

#[async_trait]
impl AuditSink for MockAuditSink {
    async fn append(&self, user_id: i32, action: &str, details: String) {
        self.entries
            .lock()
            .expect("audit mock poisoned")
            .push((user_id, action.to_string(), details));
    }
}
