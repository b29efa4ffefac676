//! Reputation service implementing the driving ports.
//!
//! Wires the ledger, the notification store and the event router over one
//! set of driven adapters so inbound adapters only ever see port traits.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::notification_store::map_directory_error;
use crate::domain::ports::{
    ForumEventSink, LeaderboardEntry, MemberRegistration, NotificationInbox,
    NotificationPublisher, NotificationRepository, RankUpAnnouncement, RegisterMemberRequest,
    ReputationQuery, ScoreRepository, ScoreView, UserDirectory,
};
use crate::domain::{
    DispatchReport, EventRouter, ForumEvent, Member, NotificationId, NotificationRecord,
    NotificationStore, PointEvent, RankEvaluator, RankTable, ReputationError, RetryPolicy,
    RouterSettings, ScoreLedger, UserId, UserScore,
};

/// Tunables for [`ReputationService`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReputationServiceConfig {
    pub router: RouterSettings,
    pub retry: RetryPolicy,
}

/// Driven adapters the service runs on.
pub struct ReputationAdapters<S, N, D> {
    pub scores: Arc<S>,
    pub notifications: Arc<N>,
    pub directory: Arc<D>,
    pub publisher: Arc<dyn NotificationPublisher>,
    pub clock: Arc<dyn Clock>,
}

/// Scoring, inbox and registration use cases.
pub struct ReputationService<S, N, D> {
    ledger: Arc<ScoreLedger<S>>,
    store: Arc<NotificationStore<N, D>>,
    directory: Arc<D>,
    router: EventRouter<S, N, D>,
}

impl<S, N, D> ReputationService<S, N, D> {
    /// Build the service over `table`, which must already be validated.
    pub fn new(
        adapters: ReputationAdapters<S, N, D>,
        table: Arc<RankTable>,
        config: ReputationServiceConfig,
    ) -> Self {
        let ReputationAdapters {
            scores,
            notifications,
            directory,
            publisher,
            clock,
        } = adapters;

        let ledger = Arc::new(ScoreLedger::new(
            scores,
            RankEvaluator::new(table),
            Arc::clone(&clock),
            config.retry,
        ));
        let store = Arc::new(NotificationStore::new(
            notifications,
            Arc::clone(&directory),
            publisher,
            clock,
        ));
        let router = EventRouter::new(
            Arc::clone(&ledger),
            Arc::clone(&store),
            Arc::clone(&directory),
            config.router,
        );

        Self {
            ledger,
            store,
            directory,
            router,
        }
    }

    fn view(&self, score: UserScore) -> ScoreView {
        let evaluator = self.ledger.evaluator();
        // A tier id from an older table resolves by total instead.
        let tier = evaluator
            .table()
            .tier(&score.current_tier_id)
            .unwrap_or_else(|| evaluator.evaluate(score.total_points))
            .clone();
        ScoreView {
            user_id: score.user_id,
            total_points: score.total_points,
            tier,
        }
    }
}

#[async_trait]
impl<S, N, D> ForumEventSink for ReputationService<S, N, D>
where
    S: ScoreRepository,
    N: NotificationRepository,
    D: UserDirectory,
{
    async fn dispatch(&self, event: ForumEvent) -> Result<DispatchReport, ReputationError> {
        self.router.dispatch(event).await
    }
}

#[async_trait]
impl<S, N, D> ReputationQuery for ReputationService<S, N, D>
where
    S: ScoreRepository,
    N: NotificationRepository,
    D: UserDirectory,
{
    async fn user_score(&self, user_id: &UserId) -> Result<ScoreView, ReputationError> {
        let score = self.ledger.score(user_id).await?;
        Ok(self.view(score))
    }

    async fn activity(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PointEvent>, ReputationError> {
        self.ledger.score(user_id).await?;
        self.ledger.history(user_id, limit).await
    }

    async fn take_rank_up(
        &self,
        user_id: &UserId,
    ) -> Result<Option<RankUpAnnouncement>, ReputationError> {
        let Some(tier_id) = self.ledger.take_pending_rank_up(user_id).await? else {
            return Ok(None);
        };
        let tier = self.ledger.evaluator().table().tier(&tier_id).cloned();
        if tier.is_none() {
            warn!(user_id = %user_id, tier = %tier_id, "discarding rank-up for unknown tier");
        }
        Ok(tier.map(|tier| RankUpAnnouncement {
            user_id: user_id.clone(),
            tier,
        }))
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, ReputationError> {
        let scores = self.ledger.top(limit).await?;
        Ok(scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| LeaderboardEntry {
                position: index + 1,
                score: self.view(score),
            })
            .collect())
    }
}

impl<S, N, D> ReputationService<S, N, D>
where
    D: UserDirectory,
{
    /// Inbox reads and writes answer only for registered members.
    async fn ensure_member(&self, user_id: &UserId) -> Result<(), ReputationError> {
        match self.directory.find(user_id).await.map_err(map_directory_error)? {
            Some(_) => Ok(()),
            None => Err(ReputationError::unknown_user(user_id.clone())),
        }
    }
}

#[async_trait]
impl<S, N, D> NotificationInbox for ReputationService<S, N, D>
where
    S: ScoreRepository,
    N: NotificationRepository,
    D: UserDirectory,
{
    async fn notifications(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<NotificationRecord>, ReputationError> {
        self.ensure_member(recipient).await?;
        self.store.list(recipient).await
    }

    async fn unread_count(&self, recipient: &UserId) -> Result<u64, ReputationError> {
        self.ensure_member(recipient).await?;
        self.store.unread_count(recipient).await
    }

    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
    ) -> Result<(), ReputationError> {
        self.ensure_member(recipient).await?;
        self.store.mark_read(recipient, id).await
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, ReputationError> {
        self.ensure_member(recipient).await?;
        self.store.mark_all_read(recipient).await
    }
}

#[async_trait]
impl<S, N, D> MemberRegistration for ReputationService<S, N, D>
where
    S: ScoreRepository,
    N: NotificationRepository,
    D: UserDirectory,
{
    async fn register(&self, request: RegisterMemberRequest) -> Result<Member, ReputationError> {
        let RegisterMemberRequest { id, handle } = request;
        let member = Member::new(id.unwrap_or_else(UserId::random), handle);

        self.directory
            .register(&member)
            .await
            .map_err(map_directory_error)?;
        let opened = self.ledger.open_account(&member.id).await?;
        info!(user_id = %member.id, handle = %member.handle, opened, "member registered");
        Ok(member)
    }
}
