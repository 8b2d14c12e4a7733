//! # Storage Chat Resolver
//!
//! Content codes are numeric message ids inside the configured storage chat.
//! Resolved content is copied to the user, so the original sender stays hidden.

use async_trait::async_trait;

use crate::domain::error::DecodeError;
use crate::domain::traits::ContentResolver;
use crate::domain::types::{Content, MessageRef, UserId};

pub struct StorageChatResolver {
    storage_chat: Option<i64>,
}

impl StorageChatResolver {
    pub fn new(storage_chat: Option<i64>) -> Self {
        Self { storage_chat }
    }
}

#[async_trait]
impl ContentResolver for StorageChatResolver {
    async fn decode(
        &self,
        code: &str,
        user: UserId,
        _reply_to: MessageRef,
    ) -> Result<Content, DecodeError> {
        let Some(from_chat) = self.storage_chat else {
            return Err(DecodeError::Invalid("no storage chat configured".into()));
        };

        match code.parse::<i32>() {
            Ok(id) if id > 0 => {
                tracing::debug!(user_id = %user, message_id = id, "Resolved content code");
                Ok(Content::Copy {
                    from_chat,
                    message: MessageRef(id),
                })
            }
            _ => Err(DecodeError::NotFound(code.to_string())),
        }
    }
}
