//! Redis-backed user registry and grant store (`redis` feature).
//!
//! Users live in a hash per id; `HSETNX` writes create-only fields.
//! Grants are a plain key written with `SET NX PX`, so the window is enforced
//! by key expiry and concurrent writers cannot both win.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::domain::error::GateError;
use crate::domain::traits::{GrantStore, UserRegistry};
use crate::domain::types::{UserDefaults, UserId};

fn storage_error(err: redis::RedisError) -> GateError {
    GateError::Storage(err.to_string())
}

pub async fn connect(url: &str) -> Result<ConnectionManager, GateError> {
    let client = redis::Client::open(url).map_err(storage_error)?;
    ConnectionManager::new(client).await.map_err(storage_error)
}

pub struct RedisUserRegistry {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisUserRegistry {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, user: UserId) -> String {
        format!("{}:user:{}", self.prefix, user)
    }
}

#[async_trait]
impl UserRegistry for RedisUserRegistry {
    async fn upsert(&self, user: UserId, defaults: &UserDefaults) -> Result<bool, GateError> {
        let mut conn = self.conn.clone();
        let key = self.key(user);
        let created: bool = conn
            .hset_nx(&key, "lang", &defaults.lang)
            .await
            .map_err(storage_error)?;
        if created {
            let _: bool = conn
                .hset_nx(&key, "created_at", chrono::Utc::now().timestamp_millis())
                .await
                .map_err(storage_error)?;
        }
        Ok(!created)
    }

    async fn language(&self, user: UserId) -> Result<Option<String>, GateError> {
        let mut conn = self.conn.clone();
        conn.hget(self.key(user), "lang").await.map_err(storage_error)
    }
}

pub struct RedisGrantStore {
    conn: ConnectionManager,
    prefix: String,
    window_ms: Option<i64>,
}

impl RedisGrantStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, window_ms: Option<i64>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            window_ms,
        }
    }

    fn key(&self, user: UserId) -> String {
        format!("{}:grant:{}", self.prefix, user)
    }
}

#[async_trait]
impl GrantStore for RedisGrantStore {
    async fn has_active_grant(&self, user: UserId, now_ms: i64) -> Result<bool, GateError> {
        let mut conn = self.conn.clone();
        let issued_at: Option<i64> = conn.get(self.key(user)).await.map_err(storage_error)?;
        Ok(match (issued_at, self.window_ms) {
            (Some(issued_at), Some(window)) => now_ms.saturating_sub(issued_at) <= window,
            (Some(_), None) => true,
            (None, _) => false,
        })
    }

    async fn insert_if_absent(&self, user: UserId, issued_at_ms: i64) -> Result<bool, GateError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(user)).arg(issued_at_ms).arg("NX");
        if let Some(window) = self.window_ms {
            cmd.arg("PX").arg(window.max(1));
        }
        let written: Option<String> = cmd.query_async(&mut conn).await.map_err(storage_error)?;
        if written.is_some() {
            tracing::debug!(user_id = %user, issued_at_ms, "Access grant recorded");
        }
        Ok(written.is_some())
    }
}
