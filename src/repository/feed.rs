use std::sync::{Arc, Weak};

use futures::StreamExt;

use super::RideRepository;
use crate::api::RideAPI;
use crate::error::Error;
use crate::store::ChangeFeed;

impl RideRepository {
    /// Starts refreshing on every change the store announces. Returns `false`
    /// when the store has no feed. A previous subscription is replaced.
    #[tracing::instrument(skip(self))]
    pub async fn subscribe(self: &Arc<Self>) -> Result<bool, Error> {
        let feed = match self.store.changes().await? {
            Some(feed) => feed,
            None => {
                tracing::info!("store has no change feed");
                return Ok(false);
            }
        };

        let task = tokio::spawn(listen(Arc::downgrade(self), feed));

        if let Some(previous) = self.feed_slot().replace(task) {
            previous.abort();
        }

        tracing::info!("subscribed to ride changes");

        Ok(true)
    }

    pub fn unsubscribe(&self) {
        if let Some(task) = self.feed_slot().take() {
            task.abort();
            tracing::info!("unsubscribed from ride changes");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.feed_slot().is_some()
    }
}

impl Drop for RideRepository {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Holds only a weak reference so the subscription never keeps a dropped
/// repository alive.
async fn listen(repository: Weak<RideRepository>, mut feed: ChangeFeed) {
    while feed.next().await.is_some() {
        let repository = match repository.upgrade() {
            Some(repository) => repository,
            None => break,
        };

        if let Err(err) = repository.refresh().await {
            tracing::warn!("refresh on change notification failed: {}", err);
        }
    }

    tracing::debug!("ride change feed closed");
}
