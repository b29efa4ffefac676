//! Driving port for registering forum members.

use async_trait::async_trait;

use crate::domain::{Handle, Member, ReputationError, UserId};

/// Request to register a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMemberRequest {
    /// Use this id instead of generating one, e.g. when mirroring an
    /// existing account system.
    pub id: Option<UserId>,
    pub handle: Handle,
}

/// Registers a member and opens their score account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRegistration: Send + Sync {
    /// # Errors
    /// [`ReputationError::DuplicateMember`] when the id or handle is taken.
    async fn register(&self, request: RegisterMemberRequest) -> Result<Member, ReputationError>;
}
