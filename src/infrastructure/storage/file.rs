//! JSON-file user registry.
//!
//! Records are loaded once at start and kept in memory; the file is rewritten
//! after every insert, and a record is only kept once that write succeeded.
//! The check-then-insert runs under one lock, so concurrent first contacts
//! from the same user create a single record.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::domain::error::GateError;
use crate::domain::traits::UserRegistry;
use crate::domain::types::{UserDefaults, UserId, UserRecord};

pub struct FileUserRegistry {
    path: PathBuf,
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl FileUserRegistry {
    /// Loads existing records. A missing file starts an empty registry.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, GateError> {
        let path = path.into();
        let users = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| GateError::Storage(format!("read {}: {e}", path.display())))?;
            let records: Vec<UserRecord> = serde_json::from_str(&content)
                .map_err(|e| GateError::Storage(format!("parse {}: {e}", path.display())))?;
            records.into_iter().map(|r| (r.user_id, r)).collect()
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    async fn save(path: &Path, users: &HashMap<UserId, UserRecord>) -> Result<(), GateError> {
        let mut records: Vec<&UserRecord> = users.values().collect();
        records.sort_by_key(|r| r.user_id);
        let content = serde_json::to_string_pretty(&records)
            .map_err(|e| GateError::Storage(e.to_string()))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| GateError::Storage(format!("create {}: {e}", dir.display())))?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| GateError::Storage(format!("write {}: {e}", path.display())))
    }
}

#[async_trait]
impl UserRegistry for FileUserRegistry {
    async fn upsert(&self, user: UserId, defaults: &UserDefaults) -> Result<bool, GateError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user) {
            return Ok(true);
        }

        let mut next = users.clone();
        next.insert(
            user,
            UserRecord {
                user_id: user,
                lang: defaults.lang.clone(),
                created_at: chrono::Utc::now().timestamp_millis(),
            },
        );
        Self::save(&self.path, &next).await?;
        *users = next;
        Ok(false)
    }

    async fn language(&self, user: UserId) -> Result<Option<String>, GateError> {
        Ok(self.users.lock().await.get(&user).map(|r| r.lang.clone()))
    }
}
