use async_trait::async_trait;
use futures::StreamExt;
use sqlx::{
    postgres::{PgListener, PgPoolOptions},
    Executor, Pool, Postgres,
};
use uuid::Uuid;

use super::record::{into_rides, RideRecord};
use super::{ChangeFeed, RideStore};
use crate::entities::{NewRide, Ride};
use crate::error::Error;

type Database = Postgres;

const CHANGE_CHANNEL: &str = "rides_changed";

/// Rides kept in a Postgres table. Every write fires a `NOTIFY` that
/// subscribers receive as a change event.
#[derive(Debug)]
pub struct PgStore {
    pool: Pool<Database>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::new", skip_all)]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: Pool<Database>) -> Result<Self, Error> {
        pool.execute(
            "CREATE TABLE IF NOT EXISTS rides (
                id TEXT PRIMARY KEY,
                driver_name TEXT NOT NULL,
                car_model TEXT NOT NULL,
                start_location TEXT NOT NULL,
                destination TEXT NOT NULL,
                ride_date DATE NOT NULL,
                ride_time TIME NOT NULL,
                price DOUBLE PRECISION NOT NULL CHECK (price >= 0),
                available_seats INT4 NOT NULL CHECK (available_seats >= 0),
                contact_detail TEXT NOT NULL,
                remarks TEXT,
                user_id UUID,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .await?;

        pool.execute("CREATE INDEX IF NOT EXISTS rides_created_at_idx ON rides (created_at DESC)")
            .await?;

        pool.execute(
            "CREATE OR REPLACE FUNCTION notify_rides_changed() RETURNS trigger AS $$
            BEGIN
                PERFORM pg_notify('rides_changed', '');
                RETURN NULL;
            END;
            $$ LANGUAGE plpgsql",
        )
        .await?;

        pool.execute("DROP TRIGGER IF EXISTS rides_changed ON rides")
            .await?;
        pool.execute("CREATE TRIGGER rides_changed AFTER INSERT OR UPDATE OR DELETE ON rides FOR EACH STATEMENT EXECUTE FUNCTION notify_rides_changed()")
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl RideStore for PgStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_rides(&self) -> Result<Vec<Ride>, Error> {
        let records = sqlx::query_as::<_, RideRecord>("SELECT * FROM rides ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        into_rides(records)
    }

    #[tracing::instrument(skip(self))]
    async fn insert_ride(&self, ride: NewRide, owner_id: Option<Uuid>) -> Result<Ride, Error> {
        let seats = i32::try_from(ride.available_seats)
            .map_err(|_| Error::validation("availableSeats", "is too large"))?;

        let record = sqlx::query_as::<_, RideRecord>(
            "INSERT INTO rides (id, driver_name, car_model, start_location, destination, ride_date, ride_time, price, available_seats, contact_detail, remarks, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&ride.driver_name)
        .bind(&ride.car_model)
        .bind(&ride.start_location)
        .bind(&ride.destination)
        .bind(ride.ride_date)
        .bind(ride.ride_time)
        .bind(ride.price)
        .bind(seats)
        .bind(&ride.contact_detail)
        .bind(&ride.remarks)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ride::try_from(record)
    }

    /// The decrement and its guard are one statement, so concurrent bookers
    /// can never take the count below zero.
    #[tracing::instrument(skip(self))]
    async fn book_seat(&self, id: &str) -> Result<Option<Ride>, Error> {
        let maybe_record = sqlx::query_as::<_, RideRecord>(
            "UPDATE rides
            SET available_seats = available_seats - 1, updated_at = now()
            WHERE id = $1 AND available_seats > 0
            RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        maybe_record.map(Ride::try_from).transpose()
    }

    async fn contains_ride(&self, id: &str) -> Result<bool, Error> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rides WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self))]
    async fn changes(&self) -> Result<Option<ChangeFeed>, Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        tracing::info!("listening for ride changes on {}", CHANGE_CHANNEL);

        let feed = futures::stream::unfold(listener, |mut listener| async move {
            match listener.recv().await {
                Ok(_) => Some(((), listener)),
                Err(err) => {
                    tracing::warn!("ride change listener stopped: {}", err);
                    None
                }
            }
        });

        Ok(Some(feed.boxed()))
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn guarded_decrement_against_postgres() {
    use chrono::{NaiveDate, NaiveTime};

    let uri = std::env::var("DATABASE_URL").unwrap();
    let store = PgStore::new(&uri, 5).await.unwrap();

    let ride = store
        .insert_ride(
            NewRide {
                driver_name: "Sam Wilson".into(),
                car_model: "Tesla Model 3".into(),
                start_location: "Abu Dhabi".into(),
                destination: "Rasalkhaima".into(),
                ride_date: NaiveDate::from_ymd_opt(2024, 8, 16).unwrap(),
                ride_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                price: 20.0,
                available_seats: 1,
                contact_detail: "555-456-7890".into(),
                remarks: None,
            },
            None,
        )
        .await
        .unwrap();

    let booked = store.book_seat(&ride.id).await.unwrap().unwrap();
    assert_eq!(booked.available_seats, 0);
    assert!(store.book_seat(&ride.id).await.unwrap().is_none());
    assert!(store.contains_ride(&ride.id).await.unwrap());
}
