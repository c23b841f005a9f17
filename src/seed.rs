//! Sample rides for a local deployment, so the board is not empty on first run.

use chrono::{Duration, Utc};

use crate::entities::{City, Location, Ride, RideDraft, ValidationRules};
use crate::error::Error;

struct Demo {
    driver_name: &'static str,
    car_model: &'static str,
    start: City,
    destination: City,
    date: &'static str,
    time: &'static str,
    price: &'static str,
    seats: &'static str,
    contact: &'static str,
    remarks: Option<&'static str>,
}

const DEMO_RIDES: [Demo; 3] = [
    Demo {
        driver_name: "John Doe",
        car_model: "Toyota Camry",
        start: City::Dubai,
        destination: City::AbuDhabi,
        date: "2024-08-15",
        time: "10:00",
        price: "25",
        seats: "3",
        contact: "555-123-4567",
        remarks: Some("Max 2 small bags per person. No pets allowed."),
    },
    Demo {
        driver_name: "Jane Smith",
        car_model: "Honda Civic",
        start: City::Sharjah,
        destination: City::Dubai,
        date: "2024-08-15",
        time: "12:30",
        price: "15",
        seats: "2",
        contact: "555-987-6543",
        remarks: Some("Pickup from Central Mall."),
    },
    Demo {
        driver_name: "Sam Wilson",
        car_model: "Tesla Model 3",
        start: City::AbuDhabi,
        destination: City::Rasalkhaima,
        date: "2024-08-16",
        time: "18:00",
        price: "20",
        seats: "1",
        contact: "555-456-7890",
        remarks: None,
    },
];

impl Demo {
    fn draft(&self) -> RideDraft {
        RideDraft {
            driver_name: self.driver_name.into(),
            car_model: self.car_model.into(),
            start_location: Location::City(self.start),
            destination: Location::City(self.destination),
            ride_date: self.date.into(),
            ride_time: self.time.into(),
            price: self.price.into(),
            available_seats: self.seats.into(),
            contact_detail: self.contact.into(),
            remarks: self.remarks.map(str::to_string),
        }
    }
}

/// The demo rides, newest first. They go through the same validation as
/// submitted rides, minus the deployment's optional rules.
pub fn demo_rides() -> Result<Vec<Ride>, Error> {
    let now = Utc::now();

    DEMO_RIDES
        .iter()
        .enumerate()
        .map(|(age, demo)| {
            let ride = demo
                .draft()
                .validate(&ValidationRules::default(), now.naive_local())?;
            Ok(Ride::new(ride, None, now - Duration::minutes(age as i64)))
        })
        .collect()
}

#[test]
fn demo_rides_are_valid_and_bookable() {
    let rides = demo_rides().unwrap();

    assert_eq!(rides.len(), 3);
    assert!(rides.iter().all(Ride::is_bookable));
    assert_eq!(rides[0].driver_name, "John Doe");
    assert_eq!(rides[0].destination, "Abu Dhabi");
    assert_eq!(rides[2].available_seats, 1);
    assert_eq!(rides[2].remarks, None);
    assert!(rides[0].created_at > rides[1].created_at);
}
