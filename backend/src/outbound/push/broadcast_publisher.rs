//! In-process fan-out of notifications to live subscribers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::domain::ports::{NotificationFeed, NotificationPublisher, NotificationPublisherError};
use crate::domain::{NotificationRecord, UserId};

/// Default per-recipient buffer before slow subscribers start lagging.
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// One broadcast channel per recipient, created on first subscription.
///
/// Publishing to a recipient nobody is watching is a no-op. Channels whose
/// last subscriber has gone are dropped on the next publish or subscribe.
pub struct BroadcastNotificationPublisher {
    channels: Mutex<HashMap<UserId, broadcast::Sender<NotificationRecord>>>,
    capacity: usize,
}

impl Default for BroadcastNotificationPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl BroadcastNotificationPublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<UserId, broadcast::Sender<NotificationRecord>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recipients with at least one open channel.
    pub fn live_recipients(&self) -> usize {
        self.channels().len()
    }
}

#[async_trait]
impl NotificationPublisher for BroadcastNotificationPublisher {
    async fn publish(&self, record: &NotificationRecord) -> Result<(), NotificationPublisherError> {
        let mut channels = self.channels();
        let Some(sender) = channels.get(&record.recipient_id) else {
            return Ok(());
        };
        if sender.send(record.clone()).is_err() {
            debug!(recipient = %record.recipient_id, "dropping feed without subscribers");
            channels.remove(&record.recipient_id);
        }
        Ok(())
    }
}

impl NotificationFeed for BroadcastNotificationPublisher {
    fn subscribe(&self, recipient: &UserId) -> BoxStream<'static, NotificationRecord> {
        let receiver = {
            let mut channels = self.channels();
            channels.retain(|_, sender| sender.receiver_count() > 0);
            channels
                .entry(recipient.clone())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .subscribe()
        };

        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(record) => return Some((record, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "notification feed subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}
