//! Port for the member directory that resolves mention handles.

use async_trait::async_trait;

use crate::domain::{Member, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
        /// The id or handle is already taken.
        Duplicate { message: String } =>
            "member already registered: {message}",
    }
}

/// Lookup of known members by id and by handle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Add a member. Fails with [`UserDirectoryError::Duplicate`] when the id
    /// or handle is taken.
    async fn register(&self, member: &Member) -> Result<(), UserDirectoryError>;

    /// Resolve a mention token to a user id. Unknown or malformed tokens yield
    /// `None`.
    async fn resolve_handle(&self, handle: &str) -> Result<Option<UserId>, UserDirectoryError>;

    /// Fetch a member by id.
    async fn find(&self, user_id: &UserId) -> Result<Option<Member>, UserDirectoryError>;
}
