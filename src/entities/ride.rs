use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: String,
    pub driver_name: String,
    pub car_model: String,
    pub start_location: String,
    pub destination: String,
    pub ride_date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub ride_time: NaiveTime,
    pub price: f64,
    pub available_seats: u32,
    pub contact_detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A validated driver submission, ready to be persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewRide {
    pub driver_name: String,
    pub car_model: String,
    pub start_location: String,
    pub destination: String,
    pub ride_date: NaiveDate,
    pub ride_time: NaiveTime,
    pub price: f64,
    pub available_seats: u32,
    pub contact_detail: String,
    pub remarks: Option<String>,
}

impl Ride {
    /// Builds a ride with a locally generated id, as stores without their own id
    /// generation do.
    pub fn new(ride: NewRide, owner_id: Option<Uuid>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            driver_name: ride.driver_name,
            car_model: ride.car_model,
            start_location: ride.start_location,
            destination: ride.destination,
            ride_date: ride.ride_date,
            ride_time: ride.ride_time,
            price: ride.price,
            available_seats: ride.available_seats,
            contact_detail: ride.contact_detail,
            remarks: ride.remarks,
            owner_id,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn is_bookable(&self) -> bool {
        self.available_seats > 0
    }

    /// Takes one seat, refusing when the ride is already full.
    #[tracing::instrument(skip(self), fields(id = %self.id))]
    pub fn book_seat(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.available_seats {
            0 => Err(Error::NoSeatsAvailable),
            seats => {
                self.available_seats = seats - 1;
                self.updated_at = Some(now);
                Ok(())
            }
        }
    }
}

/// Accepts `HH:MM` as typed in forms and `HH:MM:SS` as returned by Postgres.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();

    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S%.f"))
        .ok()
}

pub(crate) mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;

        super::parse_time(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid time of day: {text}")))
    }
}

#[cfg(test)]
pub(crate) fn sample_ride(id: &str, start: &str, destination: &str, seats: u32) -> Ride {
    Ride {
        id: id.into(),
        driver_name: "John Doe".into(),
        car_model: "Toyota Camry".into(),
        start_location: start.into(),
        destination: destination.into(),
        ride_date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
        ride_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        price: 25.0,
        available_seats: seats,
        contact_detail: "555-123-4567".into(),
        remarks: None,
        owner_id: None,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn book_seat_never_goes_below_zero() {
    let mut ride = sample_ride("1", "Dubai", "Abu Dhabi", 1);

    ride.book_seat(Utc::now()).unwrap();
    assert_eq!(ride.available_seats, 0);

    let result = ride.book_seat(Utc::now());
    assert!(matches!(result, Err(Error::NoSeatsAvailable)));
    assert_eq!(ride.available_seats, 0);
}

#[test]
fn ride_json_uses_camel_case_and_short_time() {
    let ride = sample_ride("1", "Dubai", "Abu Dhabi", 3);
    let value = serde_json::to_value(&ride).unwrap();

    assert_eq!(value["driverName"], "John Doe");
    assert_eq!(value["rideDate"], "2024-08-15");
    assert_eq!(value["rideTime"], "10:00");
    assert_eq!(value["availableSeats"], 3);
    assert!(value.get("remarks").is_none());
}

#[test]
fn parse_time_accepts_seconds() {
    assert_eq!(
        parse_time("18:30:00"),
        NaiveTime::from_hms_opt(18, 30, 0)
    );
    assert_eq!(parse_time("07:05"), NaiveTime::from_hms_opt(7, 5, 0));
    assert_eq!(parse_time("7pm"), None);
}
