//! Domain primitives, services and ports.
//!
//! Purpose: hold the reputation rules (rank tiers, point ledger, mention
//! fan-out) independent of HTTP and storage. Adapters reach the domain only
//! through the traits in [`ports`].
//!
//! Public surface:
//! - [`RankTable`] / [`RankEvaluator`]: validated tiers and the pure mapping
//!   from totals to tiers.
//! - [`ScoreLedger`]: per-user serialised point application.
//! - [`NotificationStore`]: recipient-partitioned notification log.
//! - [`extract_mentions`]: `@handle` parsing.
//! - [`EventRouter`]: scoring plus fan-out for one [`ForumEvent`].
//! - [`ReputationService`]: the driving-port implementation.

pub mod error;
pub mod event_router;
pub mod forum_event;
pub mod mention;
pub mod notification;
pub mod notification_store;
pub mod points;
pub mod ports;
pub mod rank;
pub mod reputation_service;
pub mod score_ledger;
pub mod user;

pub use self::error::ReputationError;
pub use self::event_router::{
    Delivery, DispatchReport, EventRouter, RouterSettings, ScoringSummary, StepOutcome,
};
pub use self::forum_event::{ForumEvent, ForumEventParts};
pub use self::mention::extract_mentions;
pub use self::notification::{
    NewNotification, NotificationId, NotificationKind, NotificationRecord,
};
pub use self::notification_store::NotificationStore;
pub use self::points::{
    PointEvent, PointReason, PointSchedule, ScoreRecord, ScoreUpdate, UserScore,
};
pub use self::rank::{RankEvaluator, RankTable, RankTier, RankTierId};
pub use self::reputation_service::{
    ReputationAdapters, ReputationService, ReputationServiceConfig,
};
pub use self::score_ledger::{ApplyOutcome, RetryPolicy, ScoreLedger};
pub use self::user::{HANDLE_MAX, Handle, Member, UserId, UserValidationError};
