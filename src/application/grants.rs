//! # Access Grants
//!
//! In-memory `GrantStore`. A grant stays active for the policy window after it
//! was issued; an expired grant is replaced by the next fresh token.
//! Every insert drops the grants that have expired, so the map holds at most
//! the users seen within one window.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::error::GateError;
use crate::domain::traits::GrantStore;
use crate::domain::types::{AccessGrant, UserId};

#[derive(Debug, Default)]
pub struct MemoryGrantStore {
    window_ms: Option<i64>,
    grants: Mutex<HashMap<UserId, AccessGrant>>,
}

impl MemoryGrantStore {
    /// `window_ms = None` keeps grants forever.
    pub fn new(window_ms: Option<i64>) -> Self {
        Self {
            window_ms,
            grants: Mutex::new(HashMap::new()),
        }
    }

    fn is_active(&self, grant: &AccessGrant, now_ms: i64) -> bool {
        match self.window_ms {
            Some(window) => now_ms.saturating_sub(grant.issued_at_ms) <= window,
            None => true,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.grants.lock().await.len()
    }

    #[cfg(test)]
    pub async fn get(&self, user: UserId) -> Option<AccessGrant> {
        self.grants.lock().await.get(&user).copied()
    }
}

#[async_trait]
impl GrantStore for MemoryGrantStore {
    async fn has_active_grant(&self, user: UserId, now_ms: i64) -> Result<bool, GateError> {
        let guard = self.grants.lock().await;
        Ok(guard
            .get(&user)
            .is_some_and(|grant| self.is_active(grant, now_ms)))
    }

    async fn insert_if_absent(&self, user: UserId, issued_at_ms: i64) -> Result<bool, GateError> {
        let mut guard = self.grants.lock().await;
        guard.retain(|_, grant| self.is_active(grant, issued_at_ms));
        if let Some(existing) = guard.get(&user)
            && self.is_active(existing, issued_at_ms)
        {
            return Ok(false);
        }
        guard.insert(
            user,
            AccessGrant {
                user_id: user,
                issued_at_ms,
            },
        );
        tracing::debug!(user_id = %user, issued_at_ms, "Access grant recorded");
        Ok(true)
    }
}
