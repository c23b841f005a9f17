mod memory;
mod postgres;
mod record;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::entities::{NewRide, Ride};
use crate::error::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use record::RideRecord;
pub use rest::RestStore;

/// A stream of "the rides collection changed" signals. Events carry no payload;
/// consumers re-fetch everything.
pub type ChangeFeed = BoxStream<'static, ()>;

pub type DynStore = Arc<dyn RideStore>;

/// The persistence boundary. Implementations must make `book_seat` a single
/// guarded decrement: take one seat only if one is left, in one atomic step.
#[async_trait]
pub trait RideStore: Send + Sync {
    /// All rides, most recently created first.
    async fn fetch_rides(&self) -> Result<Vec<Ride>, Error>;

    /// Persists a ride; the store assigns its id and timestamps.
    async fn insert_ride(&self, ride: NewRide, owner_id: Option<Uuid>) -> Result<Ride, Error>;

    /// Returns the updated ride, or `None` when no row was affected (the ride
    /// is full or does not exist).
    async fn book_seat(&self, id: &str) -> Result<Option<Ride>, Error>;

    async fn contains_ride(&self, id: &str) -> Result<bool, Error>;

    /// Opens a change feed if the store can push one.
    async fn changes(&self) -> Result<Option<ChangeFeed>, Error> {
        Ok(None)
    }
}
