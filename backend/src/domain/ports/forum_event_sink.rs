//! Driving port through which collaborators report forum activity.

use async_trait::async_trait;

use crate::domain::{DispatchReport, ForumEvent, ReputationError};

/// Entry point for forum events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForumEventSink: Send + Sync {
    /// Score the event and fan out its notifications.
    ///
    /// Step failures are reported inside the [`DispatchReport`]; only a
    /// rejected event surfaces as an error.
    ///
    /// # Errors
    /// [`ReputationError::InvalidEvent`] when the payload fails validation.
    async fn dispatch(&self, event: ForumEvent) -> Result<DispatchReport, ReputationError>;
}
