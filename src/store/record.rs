use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::Ride;
use crate::error::Error;

/// A row of the `rides` table, as returned both by Postgres and by the REST API.
#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct RideRecord {
    pub id: String,
    pub driver_name: String,
    pub car_model: String,
    pub start_location: String,
    pub destination: String,
    pub ride_date: NaiveDate,
    pub ride_time: NaiveTime,
    pub price: f64,
    pub available_seats: i32,
    pub contact_detail: String,
    pub remarks: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<RideRecord> for Ride {
    type Error = Error;

    fn try_from(record: RideRecord) -> Result<Self, Error> {
        let available_seats = u32::try_from(record.available_seats).map_err(|_| {
            Error::Store(format!(
                "ride {} has a negative seat count ({})",
                record.id, record.available_seats
            ))
        })?;

        Ok(Ride {
            id: record.id,
            driver_name: record.driver_name,
            car_model: record.car_model,
            start_location: record.start_location,
            destination: record.destination,
            ride_date: record.ride_date,
            ride_time: record.ride_time,
            price: record.price,
            available_seats,
            contact_detail: record.contact_detail,
            remarks: record.remarks.filter(|remarks| !remarks.is_empty()),
            owner_id: record.user_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

pub fn into_rides(records: Vec<RideRecord>) -> Result<Vec<Ride>, Error> {
    records.into_iter().map(Ride::try_from).collect()
}

#[test]
fn rest_row_converts_into_ride() {
    let json = r#"
        {
            "id": "0b6c1f56-3f44-4d8e-8f0e-4c1e0c1f8a10",
            "driver_name": "Sam Wilson",
            "car_model": "Tesla Model 3",
            "start_location": "Abu Dhabi",
            "destination": "Rasalkhaima",
            "ride_date": "2024-08-16",
            "ride_time": "18:00:00",
            "price": 20,
            "available_seats": 1,
            "contact_detail": "555-456-7890",
            "remarks": "",
            "user_id": null,
            "created_at": "2024-08-01T09:15:00.123456+00:00",
            "updated_at": "2024-08-01T09:15:00.123456+00:00"
        }
    "#;

    let record: RideRecord = serde_json::from_str(json).unwrap();
    let ride = Ride::try_from(record).unwrap();

    assert_eq!(ride.destination, "Rasalkhaima");
    assert_eq!(ride.ride_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    assert_eq!(ride.price, 20.0);
    assert_eq!(ride.available_seats, 1);
    assert_eq!(ride.remarks, None);
    assert!(ride.created_at.is_some());
}

#[test]
fn negative_seats_are_reported_as_store_corruption() {
    let record = RideRecord {
        id: "1".into(),
        driver_name: "John Doe".into(),
        car_model: "Toyota Camry".into(),
        start_location: "Dubai".into(),
        destination: "Abu Dhabi".into(),
        ride_date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
        ride_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        price: 25.0,
        available_seats: -1,
        contact_detail: "555-123-4567".into(),
        remarks: None,
        user_id: None,
        created_at: None,
        updated_at: None,
    };

    assert!(Ride::try_from(record).unwrap_err().is_store_error());
}
