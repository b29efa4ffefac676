//! In-process member directory.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{Member, UserId};

#[derive(Default)]
struct Members {
    by_id: HashMap<UserId, Member>,
    by_handle: HashMap<String, UserId>,
}

/// Member directory held entirely in memory.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    members: RwLock<Members>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn register(&self, member: &Member) -> Result<(), UserDirectoryError> {
        let mut members = self.members.write().await;
        if members.by_id.contains_key(&member.id) {
            return Err(UserDirectoryError::duplicate(format!("id {}", member.id)));
        }
        if members.by_handle.contains_key(member.handle.as_ref()) {
            return Err(UserDirectoryError::duplicate(format!(
                "handle {}",
                member.handle
            )));
        }
        members
            .by_handle
            .insert(member.handle.to_string(), member.id.clone());
        members.by_id.insert(member.id.clone(), member.clone());
        Ok(())
    }

    async fn resolve_handle(&self, handle: &str) -> Result<Option<UserId>, UserDirectoryError> {
        Ok(self.members.read().await.by_handle.get(handle).cloned())
    }

    async fn find(&self, user_id: &UserId) -> Result<Option<Member>, UserDirectoryError> {
        Ok(self.members.read().await.by_id.get(user_id).cloned())
    }
}
