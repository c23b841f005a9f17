use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use super::{ChangeFeed, RideStore};
use crate::entities::{NewRide, Ride};
use crate::error::Error;

/// Keeps rides in process memory, newest first. Used when no backend is
/// configured; every write is announced on an in-process change feed.
#[derive(Debug)]
pub struct MemoryStore {
    rides: Mutex<Vec<Ride>>,
    changes: broadcast::Sender<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_rides(Vec::new())
    }

    /// Rides are kept in the given order, which should be newest first.
    pub fn with_rides(rides: Vec<Ride>) -> Self {
        let (changes, _) = broadcast::channel(16);

        Self {
            rides: Mutex::new(rides),
            changes,
        }
    }

    fn rides(&self) -> MutexGuard<'_, Vec<Ride>> {
        self.rides.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        // no subscribers is fine
        let _ = self.changes.send(());
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn fetch_rides(&self) -> Result<Vec<Ride>, Error> {
        Ok(self.rides().clone())
    }

    #[tracing::instrument(skip(self))]
    async fn insert_ride(&self, ride: NewRide, owner_id: Option<Uuid>) -> Result<Ride, Error> {
        let ride = Ride::new(ride, owner_id, Utc::now());

        self.rides().insert(0, ride.clone());
        self.notify();

        Ok(ride)
    }

    #[tracing::instrument(skip(self))]
    async fn book_seat(&self, id: &str) -> Result<Option<Ride>, Error> {
        let booked = {
            let mut rides = self.rides();

            match rides.iter_mut().find(|ride| ride.id == id) {
                Some(ride) => match ride.book_seat(Utc::now()) {
                    Ok(()) => Some(ride.clone()),
                    Err(_) => None,
                },
                None => None,
            }
        };

        if booked.is_some() {
            self.notify();
        }

        Ok(booked)
    }

    async fn contains_ride(&self, id: &str) -> Result<bool, Error> {
        Ok(self.rides().iter().any(|ride| ride.id == id))
    }

    async fn changes(&self) -> Result<Option<ChangeFeed>, Error> {
        let receiver = self.changes.subscribe();

        let feed = futures::stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                // a lagged receiver missed events, which still means "something changed"
                Ok(()) | Err(RecvError::Lagged(_)) => Some(((), receiver)),
                Err(RecvError::Closed) => None,
            }
        });

        Ok(Some(feed.boxed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ride::sample_ride;
    use chrono::{NaiveDate, NaiveTime};
    use tokio_test::block_on;

    fn new_ride() -> NewRide {
        NewRide {
            driver_name: "Jane Smith".into(),
            car_model: "Honda Civic".into(),
            start_location: "Sharjah".into(),
            destination: "Dubai".into(),
            ride_date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            ride_time: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            price: 15.0,
            available_seats: 2,
            contact_detail: "555-987-6543".into(),
            remarks: None,
        }
    }

    #[test]
    fn insert_puts_newest_first_and_assigns_identity() {
        let store = MemoryStore::with_rides(vec![sample_ride("old", "Dubai", "Abu Dhabi", 3)]);

        let ride = block_on(store.insert_ride(new_ride(), None)).unwrap();
        assert!(!ride.id.is_empty());
        assert!(ride.created_at.is_some());

        let rides = block_on(store.fetch_rides()).unwrap();
        assert_eq!(rides[0].id, ride.id);
        assert_eq!(rides[1].id, "old");
    }

    #[test]
    fn book_seat_is_guarded() {
        let store = MemoryStore::with_rides(vec![sample_ride("a", "Dubai", "Abu Dhabi", 1)]);

        let booked = block_on(store.book_seat("a")).unwrap().unwrap();
        assert_eq!(booked.available_seats, 0);

        assert_eq!(block_on(store.book_seat("a")).unwrap(), None);
        assert_eq!(block_on(store.book_seat("missing")).unwrap(), None);
        assert!(block_on(store.contains_ride("a")).unwrap());
        assert!(!block_on(store.contains_ride("missing")).unwrap());
    }

    #[tokio::test]
    async fn writes_are_announced_on_the_feed() {
        let store = MemoryStore::new();
        let mut feed = store.changes().await.unwrap().unwrap();

        store.insert_ride(new_ride(), None).await.unwrap();

        assert_eq!(feed.next().await, Some(()));
    }
}
