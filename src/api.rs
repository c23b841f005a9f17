use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::{Ride, RideDraft};
use crate::error::Error;
use crate::repository::Snapshot;

/// What the UI layer sees of the ride collection.
#[async_trait]
pub trait RideAPI {
    fn list(&self) -> Snapshot;
    async fn refresh(&self) -> Result<Snapshot, Error>;
    async fn add(&self, draft: RideDraft) -> Result<Ride, Error>;
    async fn book(&self, ride_id: &str) -> Result<Ride, Error>;
}

pub type DynAPI = Arc<dyn RideAPI + Send + Sync>;
