use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use futures::StreamExt;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::{interval_at, Instant};
use uuid::Uuid;

use super::record::{into_rides, RideRecord};
use super::{ChangeFeed, RideStore};
use crate::entities::{NewRide, Ride};
use crate::error::Error;
use crate::external::supabase::{check, HostedClient};

/// Rides behind a hosted PostgREST-style API. Booking goes through the
/// `book_ride` SQL function so the seat guard runs inside the database.
#[derive(Debug)]
pub struct RestStore {
    client: Arc<HostedClient>,
    poll_interval: Option<Duration>,
}

#[derive(Serialize)]
struct RideInsert<'a> {
    driver_name: &'a str,
    car_model: &'a str,
    start_location: &'a str,
    destination: &'a str,
    ride_date: NaiveDate,
    ride_time: NaiveTime,
    price: f64,
    available_seats: u32,
    contact_detail: &'a str,
    remarks: Option<&'a str>,
    user_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct IdOnly {
    #[allow(dead_code)]
    id: String,
}

impl RestStore {
    pub fn new(client: Arc<HostedClient>) -> Self {
        Self {
            client,
            poll_interval: None,
        }
    }

    /// The hosted realtime socket is not spoken here; polling stands in for it.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }
}

#[async_trait]
impl RideStore for RestStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_rides(&self) -> Result<Vec<Ride>, Error> {
        let res = self
            .client
            .request(Method::GET, "rest/v1/rides")
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        let records: Vec<RideRecord> = check(res).await?.json().await?;

        into_rides(records)
    }

    #[tracing::instrument(skip(self))]
    async fn insert_ride(&self, ride: NewRide, owner_id: Option<Uuid>) -> Result<Ride, Error> {
        let payload = RideInsert {
            driver_name: &ride.driver_name,
            car_model: &ride.car_model,
            start_location: &ride.start_location,
            destination: &ride.destination,
            ride_date: ride.ride_date,
            ride_time: ride.ride_time,
            price: ride.price,
            available_seats: ride.available_seats,
            contact_detail: &ride.contact_detail,
            remarks: ride.remarks.as_deref(),
            user_id: owner_id,
        };

        let res = self
            .client
            .request(Method::POST, "rest/v1/rides")
            .header("Prefer", "return=representation")
            .json(&[payload])
            .send()
            .await?;

        let records: Vec<RideRecord> = check(res).await?.json().await?;

        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| Error::Store("insert returned no row".into()))?;

        Ride::try_from(record)
    }

    #[tracing::instrument(skip(self))]
    async fn book_seat(&self, id: &str) -> Result<Option<Ride>, Error> {
        // the hosted table keys rides by uuid, anything else cannot match
        if Uuid::parse_str(id).is_err() {
            return Ok(None);
        }

        let res = self
            .client
            .request(Method::POST, "rest/v1/rpc/book_ride")
            .json(&json!({ "ride_id": id }))
            .send()
            .await?;

        let records: Vec<RideRecord> = check(res).await?.json().await?;

        records.into_iter().next().map(Ride::try_from).transpose()
    }

    async fn contains_ride(&self, id: &str) -> Result<bool, Error> {
        if Uuid::parse_str(id).is_err() {
            return Ok(false);
        }

        let res = self
            .client
            .request(Method::GET, "rest/v1/rides")
            .query(&[("select", "id".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await?;

        let rows: Vec<IdOnly> = check(res).await?.json().await?;

        Ok(!rows.is_empty())
    }

    async fn changes(&self) -> Result<Option<ChangeFeed>, Error> {
        let period = match self.poll_interval {
            Some(period) => period,
            None => return Ok(None),
        };

        let ticks = interval_at(Instant::now() + period, period);

        let feed = futures::stream::unfold(ticks, |mut ticks| async move {
            ticks.tick().await;
            Some(((), ticks))
        });

        Ok(Some(feed.boxed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    fn store() -> RestStore {
        // nothing listens on the discard port; tests below never reach it
        RestStore::new(Arc::new(HostedClient::new("http://127.0.0.1:9", "anon", None)))
    }

    #[test]
    fn non_uuid_ids_short_circuit() {
        let store = store();

        assert_eq!(block_on(store.book_seat("not-a-uuid")).unwrap(), None);
        assert!(!block_on(store.contains_ride("not-a-uuid")).unwrap());
    }

    #[test]
    fn no_feed_without_polling() {
        assert!(block_on(store().changes()).unwrap().is_none());
    }

    #[tokio::test]
    async fn polling_feed_ticks_each_period() {
        let store = store().with_poll_interval(Duration::from_millis(10));
        let mut feed = store.changes().await.unwrap().unwrap();

        assert_eq!(feed.next().await, Some(()));
        assert_eq!(feed.next().await, Some(()));
    }

    #[test]
    fn insert_payload_uses_column_names() {
        let payload = RideInsert {
            driver_name: "John Doe",
            car_model: "Toyota Camry",
            start_location: "Dubai",
            destination: "Abu Dhabi",
            ride_date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
            ride_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            price: 25.0,
            available_seats: 3,
            contact_detail: "555-123-4567",
            remarks: None,
            user_id: None,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["available_seats"], 3);
        assert_eq!(value["ride_date"], "2024-08-15");
        assert_eq!(value["ride_time"], "10:00:00");
    }
}
