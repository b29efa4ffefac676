//! Domain error taxonomy for scoring and notification delivery.
//!
//! These errors are transport agnostic. The HTTP adapter maps them onto
//! status codes and JSON payloads; the event router reports them per step.

use crate::domain::UserId;
use crate::domain::ports::define_port_error;

define_port_error! {
    /// Failures surfaced by the reputation services.
    pub enum ReputationError {
        /// The rank table or another start-up setting is malformed.
        Config { message: String } => "configuration error: {message}",
        /// The event carries an unrecognised reason or a malformed amount.
        InvalidEvent { message: String } => "invalid event: {message}",
        /// A notification was addressed to someone the directory does not know.
        UnknownRecipient { recipient: String } => "unknown recipient: {recipient}",
        /// A query named a user that has no account.
        UnknownUser { user_id: UserId } => "unknown user: {user_id}",
        /// The notification does not exist in the recipient's inbox.
        NotificationNotFound { id: i64 } => "notification {id} not found",
        /// Per-user serialisation could not complete within the retry budget.
        ConcurrencyConflict { user_id: UserId, attempts: u32 } =>
            "score update for {user_id} still conflicting after {attempts} attempts",
        /// The durable store could not be reached or failed mid-operation.
        StorageUnavailable { message: String } => "storage unavailable: {message}",
        /// A router step exceeded its own deadline.
        StepTimedOut { step: String, timeout_ms: u64 } =>
            "{step} step timed out after {timeout_ms} ms",
        /// The member id or handle is already registered.
        DuplicateMember { message: String } => "member already exists: {message}",
    }
}

impl ReputationError {
    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. }
                | Self::StorageUnavailable { .. }
                | Self::StepTimedOut { .. }
        )
    }
}
