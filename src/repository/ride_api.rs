use async_trait::async_trait;
use chrono::Local;

use super::{Mode, RideRepository, Snapshot};
use crate::api::RideAPI;
use crate::entities::{Ride, RideDraft};
use crate::error::Error;

#[async_trait]
impl RideAPI for RideRepository {
    fn list(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// On failure the cached list is left exactly as it was. A fetch that
    /// finishes after a newer fetch or write was applied is discarded.
    #[tracing::instrument(skip(self))]
    async fn refresh(&self) -> Result<Snapshot, Error> {
        self.begin();

        let ticket = self.ticket();
        let result = self.store.fetch_rides().await.map(|rides| {
            if !self.replace(ticket, rides) {
                tracing::debug!("fetch {} superseded by a newer update, discarded", ticket);
            }
        });

        self.finish(result.as_ref().err());
        result?;

        Ok(self.list())
    }

    #[tracing::instrument(skip(self, draft))]
    async fn add(&self, draft: RideDraft) -> Result<Ride, Error> {
        self.begin();

        let result = self.insert(draft).await;

        if let Ok(ride) = &result {
            tracing::info!("ride {} posted", ride.id);
            self.merge(ride);
            self.refresh_after_write(ride).await;
        }

        self.finish(result.as_ref().err());
        result
    }

    #[tracing::instrument(skip(self))]
    async fn book(&self, ride_id: &str) -> Result<Ride, Error> {
        self.begin();

        let result = self.take_seat(ride_id).await;

        if let Ok(ride) = &result {
            tracing::info!("seat booked, {} left", ride.available_seats);
            self.merge(ride);
            self.refresh_after_write(ride).await;
        }

        self.finish(result.as_ref().err());
        result
    }
}

impl RideRepository {
    async fn insert(&self, draft: RideDraft) -> Result<Ride, Error> {
        let ride = draft.validate(&self.rules, Local::now().naive_local())?;

        let owner_id = match &self.mode {
            Mode::Local => None,
            Mode::Networked(identity) => {
                let actor = identity
                    .current_actor()
                    .await?
                    .ok_or(Error::AuthRequired)?;
                Some(actor.id)
            }
        };

        self.store.insert_ride(ride, owner_id).await
    }

    async fn take_seat(&self, ride_id: &str) -> Result<Ride, Error> {
        if let Some(ride) = self.store.book_seat(ride_id).await? {
            return Ok(ride);
        }

        // the guarded update touched nothing; tell a full ride from a missing one
        match self.store.contains_ride(ride_id).await? {
            true => Err(Error::NoSeatsAvailable),
            false => Err(Error::NotFound),
        }
    }

    /// The write already succeeded, so a failed refresh is recorded but not
    /// reported to the caller.
    async fn refresh_after_write(&self, ride: &Ride) {
        if let Err(err) = self.refresh().await {
            tracing::warn!("ride {} saved but refresh failed: {}", ride.id, err);
        }
    }
}
