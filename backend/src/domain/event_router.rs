//! Routes forum events into scoring and notification fan-out.
//!
//! Scoring and delivery run concurrently. Scoring runs under one deadline;
//! delivery puts a deadline on every lookup and append, so notifications that
//! were stored are always reported as stored. A failure in one step never
//! cancels or rolls back the other; every outcome is collected into a
//! [`DispatchReport`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::domain::notification_store::map_directory_error;
use crate::domain::ports::{NotificationRepository, ScoreRepository, UserDirectory};
use crate::domain::{
    ApplyOutcome, ForumEvent, NewNotification, NotificationId, NotificationKind,
    NotificationStore, PointReason, PointSchedule, RankTier, RankTierId, ReputationError,
    ScoreLedger, UserId, extract_mentions,
};

/// Outcome of one independently executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    /// Nothing to do for this event.
    Skipped,
    Succeeded(T),
    Failed(ReputationError),
}

impl<T> StepOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&ReputationError> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Skipped | Self::Succeeded(_) => None,
        }
    }
}

impl<T> From<Result<T, ReputationError>> for StepOutcome<T> {
    fn from(value: Result<T, ReputationError>) -> Self {
        match value {
            Ok(inner) => Self::Succeeded(inner),
            Err(error) => Self::Failed(error),
        }
    }
}

/// What the scoring step changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringSummary {
    pub awarded: i64,
    pub new_total: i64,
    pub tier_changed: bool,
    pub new_tier: Option<RankTierId>,
    /// The rank-up notification, attempted only when the tier advanced.
    pub rank_up: StepOutcome<NotificationId>,
}

/// One attempted notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub kind: NotificationKind,
    /// Recipient as addressed: a user id, or the raw handle for mentions.
    pub target: String,
    pub outcome: StepOutcome<NotificationId>,
}

/// Multi-status result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub reason: PointReason,
    pub scoring: StepOutcome<ScoringSummary>,
    pub delivery: StepOutcome<Vec<Delivery>>,
}

impl DispatchReport {
    /// Every failure across all steps and deliveries.
    pub fn failures(&self) -> Vec<&ReputationError> {
        let mut failures: Vec<&ReputationError> = Vec::new();
        match &self.scoring {
            StepOutcome::Failed(error) => failures.push(error),
            StepOutcome::Succeeded(summary) => failures.extend(summary.rank_up.error()),
            StepOutcome::Skipped => {}
        }
        match &self.delivery {
            StepOutcome::Failed(error) => failures.push(error),
            StepOutcome::Succeeded(deliveries) => {
                failures.extend(deliveries.iter().filter_map(|d| d.outcome.error()));
            }
            StepOutcome::Skipped => {}
        }
        failures
    }

    /// True when nothing failed.
    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}

/// Point schedule and per-step deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterSettings {
    pub schedule: PointSchedule,
    pub scoring_timeout: Duration,
    pub delivery_timeout: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            schedule: PointSchedule::default(),
            scoring_timeout: Duration::from_secs(2),
            delivery_timeout: Duration::from_secs(2),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Integration point between forum events, the ledger and the inbox.
pub struct EventRouter<S, N, D> {
    ledger: Arc<ScoreLedger<S>>,
    store: Arc<NotificationStore<N, D>>,
    directory: Arc<D>,
    settings: RouterSettings,
}

impl<S, N, D> EventRouter<S, N, D> {
    pub fn new(
        ledger: Arc<ScoreLedger<S>>,
        store: Arc<NotificationStore<N, D>>,
        directory: Arc<D>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            ledger,
            store,
            directory,
            settings,
        }
    }
}

struct PendingDelivery {
    kind: NotificationKind,
    target: String,
    notification: NewNotification,
}

impl<S, N, D> EventRouter<S, N, D>
where
    S: ScoreRepository,
    N: NotificationRepository,
    D: UserDirectory,
{
    /// Process one event.
    ///
    /// # Errors
    /// [`ReputationError::InvalidEvent`] when the payload fails validation;
    /// nothing is scored or delivered in that case.
    pub async fn dispatch(&self, event: ForumEvent) -> Result<DispatchReport, ReputationError> {
        if let Err(error) = event.validate() {
            warn!(actor = %event.actor(), reason = %event.reason(), %error, "rejected forum event");
            return Err(error);
        }

        let (scoring, delivery) = tokio::join!(self.score(&event), self.deliver(&event));
        let report = DispatchReport {
            reason: event.reason(),
            scoring,
            delivery,
        };

        for failure in report.failures() {
            warn!(actor = %event.actor(), reason = %report.reason, error = %failure, "dispatch step failed");
        }
        Ok(report)
    }

    async fn score(&self, event: &ForumEvent) -> StepOutcome<ScoringSummary> {
        let reason = event.reason();
        let amount = self.settings.schedule.amount_for(reason);
        if amount == 0 {
            return StepOutcome::Skipped;
        }

        let deadline = self.settings.scoring_timeout;
        let applied = match timeout(deadline, self.ledger.apply(event.actor(), amount, reason)).await
        {
            Ok(result) => result,
            Err(_) => Err(ReputationError::step_timed_out("scoring", millis(deadline))),
        };

        match applied {
            Ok(outcome) => StepOutcome::Succeeded(self.announce(event.actor(), amount, outcome).await),
            Err(error) => StepOutcome::Failed(error),
        }
    }

    async fn announce(&self, user_id: &UserId, awarded: i64, outcome: ApplyOutcome) -> ScoringSummary {
        let rank_up = match (&outcome.new_tier, outcome.advanced) {
            (Some(tier), true) => {
                info!(user_id = %user_id, tier = %tier.id, "announcing rank-up");
                let notification = rank_up_notification(user_id, tier);
                self.append_with_deadline(notification).await
            }
            _ => StepOutcome::Skipped,
        };

        ScoringSummary {
            awarded,
            new_total: outcome.new_total,
            tier_changed: outcome.tier_changed,
            new_tier: outcome.new_tier.map(|tier| tier.id),
            rank_up,
        }
    }

    async fn append_with_deadline(&self, notification: NewNotification) -> StepOutcome<NotificationId> {
        let deadline = self.settings.delivery_timeout;
        match timeout(deadline, self.store.append(notification)).await {
            Ok(result) => result.map(|record| record.id).into(),
            Err(_) => StepOutcome::Failed(ReputationError::step_timed_out(
                "delivery",
                millis(deadline),
            )),
        }
    }

    /// Each directory lookup and each append carries its own deadline, so a
    /// slow recipient only fails its own delivery.
    async fn deliver(&self, event: &ForumEvent) -> StepOutcome<Vec<Delivery>> {
        let deliveries = self.fan_out(event).await;
        if deliveries.is_empty() {
            StepOutcome::Skipped
        } else {
            StepOutcome::Succeeded(deliveries)
        }
    }

    async fn resolve_with_deadline(&self, handle: &str) -> Result<Option<UserId>, ReputationError> {
        let deadline = self.settings.delivery_timeout;
        match timeout(deadline, self.directory.resolve_handle(handle)).await {
            Ok(result) => result.map_err(map_directory_error),
            Err(_) => Err(ReputationError::step_timed_out("delivery", millis(deadline))),
        }
    }

    async fn fan_out(&self, event: &ForumEvent) -> Vec<Delivery> {
        let actor = event.actor();
        let mut settled = Vec::new();
        let mut pending = Vec::new();
        let mut recipients: HashSet<UserId> = HashSet::new();
        let actor_label = self.label_for(actor).await;

        // The reply is planned first so it takes precedence over a mention of
        // the same member.
        if let Some(target) = event.replied_to().filter(|target| *target != actor) {
            recipients.insert(target.clone());
            pending.push(PendingDelivery {
                kind: NotificationKind::Reply,
                target: target.to_string(),
                notification: NewNotification::new(
                    target.clone(),
                    NotificationKind::Reply,
                    format!("{actor_label} replied to your comment"),
                    event.link().map(str::to_owned),
                ),
            });
        }

        if let Some(text) = event.text() {
            let place = match event {
                ForumEvent::CommentCreated { .. } => "a comment",
                _ => "a post",
            };
            for handle in extract_mentions(text) {
                match self.resolve_with_deadline(&handle).await {
                    Ok(Some(user_id)) if &user_id == actor => {}
                    Ok(Some(user_id)) => {
                        if recipients.insert(user_id.clone()) {
                            pending.push(PendingDelivery {
                                kind: NotificationKind::Mention,
                                target: handle,
                                notification: NewNotification::new(
                                    user_id,
                                    NotificationKind::Mention,
                                    format!("{actor_label} mentioned you in {place}"),
                                    event.link().map(str::to_owned),
                                ),
                            });
                        }
                    }
                    Ok(None) => settled.push(Delivery {
                        kind: NotificationKind::Mention,
                        outcome: StepOutcome::Failed(ReputationError::unknown_recipient(
                            handle.clone(),
                        )),
                        target: handle,
                    }),
                    Err(error) => settled.push(Delivery {
                        kind: NotificationKind::Mention,
                        target: handle,
                        outcome: StepOutcome::Failed(error),
                    }),
                }
            }
        }

        if let ForumEvent::DepositConfirmed { user, amount } = event {
            pending.push(PendingDelivery {
                kind: NotificationKind::System,
                target: user.to_string(),
                notification: NewNotification::new(
                    user.clone(),
                    NotificationKind::System,
                    format!("Your deposit of {amount} has been confirmed"),
                    None,
                ),
            });
        }

        let appended = join_all(pending.into_iter().map(|planned| async move {
            Delivery {
                kind: planned.kind,
                target: planned.target,
                outcome: self.append_with_deadline(planned.notification).await,
            }
        }))
        .await;

        settled.extend(appended);
        settled
    }

    async fn label_for(&self, user_id: &UserId) -> String {
        match timeout(self.settings.delivery_timeout, self.directory.find(user_id)).await {
            Ok(Ok(Some(member))) => format!("@{}", member.handle),
            Ok(Ok(None) | Err(_)) | Err(_) => user_id.to_string(),
        }
    }
}

fn rank_up_notification(user_id: &UserId, tier: &RankTier) -> NewNotification {
    NewNotification::new(
        user_id.clone(),
        NotificationKind::RankUp,
        format!("Congratulations! You reached the {} rank", tier.display_name),
        None,
    )
}
