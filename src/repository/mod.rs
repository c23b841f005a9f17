//! The ride repository: the single owner of the cached ride list.
//!
//! Readers get a [`Snapshot`] whose ride list is swapped as a whole, so a
//! refresh is either fully visible or not at all. Mutations go through the
//! store and are then folded back into the cache.

mod feed;
mod ride_api;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::Identity;
use crate::entities::{Ride, ValidationRules};
use crate::error::Error;
use crate::store::{DynStore, MemoryStore};

/// Whether mutations need a signed-in actor.
#[derive(Clone)]
pub enum Mode {
    /// No backend; anyone may post and rides carry no owner.
    Local,
    /// Posting requires the identity to name a current actor.
    Networked(Arc<dyn Identity>),
}

#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub rides: Arc<Vec<Ride>>,
    pub loading: bool,
    pub error: Option<String>,
    in_flight: usize,
    /// Ticket of the last fetch or write applied to `rides`.
    applied: u64,
}

pub struct RideRepository {
    store: DynStore,
    mode: Mode,
    rules: ValidationRules,
    state: watch::Sender<Snapshot>,
    feed: Mutex<Option<JoinHandle<()>>>,
    /// Hands out increasing tickets to fetches and cache writes, so a fetch
    /// can tell whether anything newer landed while it was in flight.
    tickets: AtomicU64,
}

impl RideRepository {
    pub fn new(store: DynStore, mode: Mode, rules: ValidationRules) -> Self {
        let (state, _) = watch::channel(Snapshot::default());

        Self {
            store,
            mode,
            rules,
            state,
            feed: Mutex::new(None),
            tickets: AtomicU64::new(0),
        }
    }

    /// An in-process repository seeded with `rides` (newest first).
    pub fn local(rules: ValidationRules, rides: Vec<Ride>) -> Self {
        Self::new(
            Arc::new(MemoryStore::with_rides(rides)),
            Mode::Local,
            rules,
        )
    }

    /// Builds a shared repository, subscribes to the store's change feed and
    /// loads the initial list. Neither step failing stops construction: the
    /// failure is logged and left in the snapshot's `error`.
    #[tracing::instrument(name = "RideRepository::connect", skip_all)]
    pub async fn connect(store: DynStore, mode: Mode, rules: ValidationRules) -> Arc<Self> {
        use crate::api::RideAPI;

        let repository = Arc::new(Self::new(store, mode, rules));

        if let Err(err) = repository.subscribe().await {
            tracing::warn!("change feed unavailable, relying on explicit refresh: {}", err);
        }

        if let Err(err) = repository.refresh().await {
            tracing::warn!("initial ride fetch failed: {}", err);
        }

        repository
    }

    /// Observers are woken whenever the snapshot changes.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn is_local(&self) -> bool {
        matches!(self.mode, Mode::Local)
    }

    /// An operation starts: the previous failure is cleared.
    fn begin(&self) {
        self.state.send_modify(|snapshot| {
            snapshot.in_flight += 1;
            snapshot.loading = true;
            snapshot.error = None;
        });
    }

    fn finish(&self, error: Option<&Error>) {
        self.state.send_modify(|snapshot| {
            snapshot.in_flight = snapshot.in_flight.saturating_sub(1);
            snapshot.loading = snapshot.in_flight > 0;

            if let Some(err) = error {
                snapshot.error = Some(err.to_string());
            }
        });
    }

    fn ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Installs a fetched list unless a fetch or write issued after `ticket`
    /// was applied first; returns whether it was installed.
    fn replace(&self, ticket: u64, rides: Vec<Ride>) -> bool {
        let mut installed = false;

        self.state.send_modify(|snapshot| {
            if ticket > snapshot.applied {
                snapshot.rides = Arc::new(rides);
                snapshot.applied = ticket;
                installed = true;
            }
        });

        installed
    }

    /// Folds one ride written by this repository into the cache: replaced in
    /// place if known, otherwise added as the newest.
    fn merge(&self, ride: &Ride) {
        self.state.send_modify(|snapshot| {
            let mut rides = Vec::clone(&snapshot.rides);

            match rides.iter().position(|cached| cached.id == ride.id) {
                Some(index) => rides[index] = ride.clone(),
                None => rides.insert(0, ride.clone()),
            }

            snapshot.rides = Arc::new(rides);
            snapshot.applied = self.ticket();
        });
    }

    fn feed_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
