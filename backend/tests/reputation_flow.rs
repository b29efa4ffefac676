//! End-to-end scoring and fan-out scenarios over the in-memory adapters.
//!
//! These drive the public driving ports exactly as the HTTP adapter does,
//! so they cover the ledger, the rank evaluator, the notification store and
//! the router together.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use mockable::DefaultClock;
use reputation::domain::ports::{
    ForumEventSink, MemberRegistration, NoOpNotificationPublisher, NotificationInbox,
    RegisterMemberRequest, ReputationQuery,
};
use reputation::domain::{
    ForumEvent, ForumEventParts, Handle, Member, NotificationKind, PointReason, RankEvaluator,
    RankTable, RankTier, ReputationAdapters, ReputationService, ReputationServiceConfig,
    RetryPolicy, ScoreLedger, StepOutcome, UserId,
};
use reputation::outbound::memory::{
    InMemoryNotificationRepository, InMemoryScoreRepository, InMemoryUserDirectory,
};
use rstest::{fixture, rstest};

type Service =
    ReputationService<InMemoryScoreRepository, InMemoryNotificationRepository, InMemoryUserDirectory>;

fn three_tier_table() -> RankTable {
    RankTable::new(vec![
        RankTier::new("newbie", "Newbie", 0, "fa-user-circle", "text-gray-400"),
        RankTier::new("member", "Member", 50, "fa-user", "text-green-400"),
        RankTier::new("expert", "Expert", 500, "fa-star", "text-yellow-400"),
    ])
    .expect("valid table")
}

#[fixture]
fn service() -> Arc<Service> {
    Arc::new(ReputationService::new(
        ReputationAdapters {
            scores: Arc::new(InMemoryScoreRepository::new()),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            directory: Arc::new(InMemoryUserDirectory::new()),
            publisher: Arc::new(NoOpNotificationPublisher),
            clock: Arc::new(DefaultClock),
        },
        Arc::new(three_tier_table()),
        ReputationServiceConfig::default(),
    ))
}

async fn register(service: &Service, handle: &str) -> Member {
    service
        .register(RegisterMemberRequest {
            id: None,
            handle: Handle::new(handle).expect("valid handle"),
        })
        .await
        .expect("registration succeeds")
}

fn event(kind: &str, actor: &UserId) -> ForumEventParts {
    ForumEventParts {
        kind: kind.to_owned(),
        actor_id: actor.to_string(),
        ..ForumEventParts::default()
    }
}

async fn dispatch(service: &Service, parts: ForumEventParts) {
    let report = service
        .dispatch(ForumEvent::try_from(parts).expect("valid event"))
        .await
        .expect("dispatch accepted");
    assert!(report.is_complete(), "unexpected failures: {:?}", report.failures());
}

async fn kinds_for(service: &Service, user: &UserId) -> Vec<NotificationKind> {
    service
        .notifications(user)
        .await
        .expect("inbox readable")
        .into_iter()
        .map(|record| record.kind)
        .collect()
}

#[rstest]
#[tokio::test]
async fn five_posts_cross_into_member_exactly_once(service: Arc<Service>) {
    let author = register(&service, "dana").await;

    for _ in 0..5 {
        dispatch(&service, event("post_created", &author.id)).await;
    }

    let score = service.user_score(&author.id).await.expect("score");
    assert_eq!(score.total_points, 50);
    assert_eq!(score.tier.id.as_ref(), "member");
    assert_eq!(kinds_for(&service, &author.id).await, [NotificationKind::RankUp]);

    let announcement = service
        .take_rank_up(&author.id)
        .await
        .expect("poll")
        .expect("pending rank-up");
    assert_eq!(announcement.tier.id.as_ref(), "member");
    assert!(service.take_rank_up(&author.id).await.expect("poll").is_none());
}

#[rstest]
#[tokio::test]
async fn replies_win_over_mentions_and_self_mentions_are_dropped(service: Arc<Service>) {
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    let carol = register(&service, "carol").await;

    dispatch(
        &service,
        ForumEventParts {
            content: Some("@bob nice work, @carol check this, signed @alice".to_owned()),
            replied_to_author_id: Some(bob.id.to_string()),
            link: Some("/threads/7#c42".to_owned()),
            ..event("comment_created", &alice.id)
        },
    )
    .await;

    assert_eq!(kinds_for(&service, &bob.id).await, [NotificationKind::Reply]);
    assert_eq!(kinds_for(&service, &carol.id).await, [NotificationKind::Mention]);
    assert!(kinds_for(&service, &alice.id).await.is_empty());

    let carol_inbox = service.notifications(&carol.id).await.expect("inbox");
    let mention = carol_inbox.first().expect("one mention");
    assert_eq!(mention.link.as_deref(), Some("/threads/7#c42"));
    assert!(mention.message.contains("alice"));
}

#[rstest]
#[tokio::test]
async fn unknown_mentions_fail_only_their_delivery(service: Arc<Service>) {
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;

    let report = service
        .dispatch(
            ForumEvent::try_from(ForumEventParts {
                content: Some("@bob meet @ghost".to_owned()),
                ..event("post_created", &alice.id)
            })
            .expect("valid event"),
        )
        .await
        .expect("dispatch accepted");

    assert!(matches!(report.scoring, StepOutcome::Succeeded(_)));
    assert_eq!(report.failures().len(), 1);
    assert_eq!(kinds_for(&service, &bob.id).await, [NotificationKind::Mention]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_applies_lose_no_updates(service: Arc<Service>) {
    let member = register(&service, "erin").await;
    let posts = 40;

    join_all((0..posts).map(|_| {
        let service = Arc::clone(&service);
        let actor = member.id.clone();
        tokio::spawn(async move { dispatch(&service, event("like_received", &actor)).await })
    }))
    .await
    .into_iter()
    .for_each(|joined| joined.expect("task completes"));

    let score = service.user_score(&member.id).await.expect("score");
    assert_eq!(score.total_points, posts * 2);
    let history = service.activity(&member.id, 100).await.expect("history");
    assert_eq!(history.len(), usize::try_from(posts).expect("small count"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_deposits_and_posts_sum_exactly(service: Arc<Service>) {
    let member = register(&service, "frank").await;
    let deposits = 12_i64;
    let posts = 15_i64;

    let deposit_tasks = (0..deposits).map(|n| {
        let service = Arc::clone(&service);
        let parts = ForumEventParts {
            amount: Some(100 + n),
            ..event("deposit_confirmed", &member.id)
        };
        tokio::spawn(async move { dispatch(&service, parts).await })
    });
    let post_tasks = (0..posts).map(|_| {
        let service = Arc::clone(&service);
        let parts = event("post_created", &member.id);
        tokio::spawn(async move { dispatch(&service, parts).await })
    });
    join_all(deposit_tasks.chain(post_tasks))
        .await
        .into_iter()
        .for_each(|joined| joined.expect("task completes"));

    let schedule = ReputationServiceConfig::default().router.schedule;
    let expected = deposits * schedule.deposit_confirmed + posts * schedule.post_created;
    let score = service.user_score(&member.id).await.expect("score");
    assert_eq!(score.total_points, expected);

    let system_notices = kinds_for(&service, &member.id)
        .await
        .into_iter()
        .filter(|kind| *kind == NotificationKind::System)
        .count();
    assert_eq!(system_notices, usize::try_from(deposits).expect("small count"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ledgers_sharing_one_store_resolve_version_races() {
    let repo = Arc::new(InMemoryScoreRepository::new());
    let table = Arc::new(three_tier_table());
    let ledgers: Vec<Arc<ScoreLedger<InMemoryScoreRepository>>> = (0..4)
        .map(|_| {
            Arc::new(ScoreLedger::new(
                Arc::clone(&repo),
                RankEvaluator::new(Arc::clone(&table)),
                Arc::new(DefaultClock),
                RetryPolicy {
                    max_attempts: 200,
                    backoff: Duration::from_millis(1),
                },
            ))
        })
        .collect();
    let user_id = UserId::random();
    let first = ledgers.first().expect("four ledgers");
    assert!(first.open_account(&user_id).await.expect("account opens"));

    let applies = 200_usize;
    let outcomes = join_all((0..applies).map(|n| {
        let ledger = Arc::clone(ledgers.get(n % ledgers.len()).expect("ledger in range"));
        let user_id = user_id.clone();
        tokio::spawn(async move { ledger.apply(&user_id, 1, PointReason::PostCreated).await })
    }))
    .await;

    let failures = outcomes
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .filter(Result::is_err)
        .count();
    assert_eq!(failures, 0);

    let score = first.score(&user_id).await.expect("score");
    assert_eq!(score.total_points, i64::try_from(applies).expect("small count"));
    assert_eq!(score.current_tier_id.as_ref(), "member");
    let history = first.history(&user_id, 500).await.expect("history");
    assert_eq!(history.len(), applies);
}

#[rstest]
#[tokio::test]
async fn mark_read_is_idempotent_and_scoped_to_the_recipient(service: Arc<Service>) {
    let alice = register(&service, "alice").await;
    let bob = register(&service, "bob").await;
    dispatch(
        &service,
        ForumEventParts {
            content: Some("hi @bob".to_owned()),
            ..event("post_created", &alice.id)
        },
    )
    .await;

    let inbox = service.notifications(&bob.id).await.expect("inbox");
    let id = inbox.first().expect("mention").id;
    service.mark_read(&bob.id, id).await.expect("first mark");
    service.mark_read(&bob.id, id).await.expect("second mark");
    assert_eq!(service.unread_count(&bob.id).await.expect("count"), 0);

    let foreign = service.mark_read(&alice.id, id).await;
    assert!(foreign.is_err(), "alice must not reach bob's notification");
}

#[rstest]
#[tokio::test]
async fn leaderboard_orders_by_total(service: Arc<Service>) {
    let quiet = register(&service, "quiet").await;
    let busy = register(&service, "busy").await;
    for _ in 0..3 {
        dispatch(&service, event("post_created", &busy.id)).await;
    }
    dispatch(&service, event("comment_created", &quiet.id)).await;

    let board = service.leaderboard(10).await.expect("leaderboard");
    let order: Vec<(usize, &UserId, i64)> = board
        .iter()
        .map(|entry| (entry.position, &entry.score.user_id, entry.score.total_points))
        .collect();
    assert_eq!(order, [(1, &busy.id, 30), (2, &quiet.id, 5)]);
}
