use axum::extract::{Extension, Json, Path, Query};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::entities::{Location, Ride, RideDraft};
use crate::error::Error;
use crate::repository::Snapshot;
use crate::search::{self, SearchCriteria};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    start_location: Option<String>,
    destination: Option<String>,
    ride_date: Option<String>,
    /// Include full rides as well.
    #[serde(default)]
    all: bool,
}

impl ListParams {
    /// Blank parameters are treated as absent.
    fn criteria(&self) -> Result<SearchCriteria, Error> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        let ride_date = match present(&self.ride_date) {
            Some(text) => Some(
                NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map_err(|_| Error::validation("rideDate", "must be a date like 2024-08-15"))?,
            ),
            None => None,
        };

        Ok(SearchCriteria {
            start_location: present(&self.start_location).map(|text| Location::parse(&text)),
            destination: present(&self.destination).map(|text| Location::parse(&text)),
            ride_date,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RidesResponse {
    rides: Vec<Ride>,
    loading: bool,
    error: Option<String>,
}

impl RidesResponse {
    fn new(rides: Vec<Ride>, snapshot: Snapshot) -> Self {
        Self {
            rides,
            loading: snapshot.loading,
            error: snapshot.error,
        }
    }
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<ListParams>,
) -> Result<Json<RidesResponse>, Error> {
    let criteria = params.criteria()?;
    let snapshot = api.list();

    let rides = match params.all {
        true => search::apply(&snapshot.rides, &criteria),
        false => search::available(&snapshot.rides, &criteria),
    };

    Ok(RidesResponse::new(rides, snapshot).into())
}

pub async fn refresh(Extension(api): Extension<DynAPI>) -> Result<Json<RidesResponse>, Error> {
    let snapshot = api.refresh().await?;

    Ok(RidesResponse::new(snapshot.rides.to_vec(), snapshot).into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(draft): Json<RideDraft>,
) -> Result<(StatusCode, Json<Ride>), Error> {
    let ride = api.add(draft).await?;

    Ok((StatusCode::CREATED, ride.into()))
}

pub async fn book(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<String>,
) -> Result<Json<Ride>, Error> {
    let ride = api.book(&id).await?;

    Ok(ride.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::block_on;

    use super::*;
    use crate::api::RideAPI;
    use crate::entities::ride::sample_ride;
    use crate::entities::{City, ValidationRules};
    use crate::repository::RideRepository;

    fn api(rides: Vec<Ride>) -> DynAPI {
        let repository = RideRepository::local(ValidationRules::default(), rides);
        block_on(repository.refresh()).unwrap();

        Arc::new(repository)
    }

    fn ids(response: &RidesResponse) -> Vec<&str> {
        response.rides.iter().map(|ride| ride.id.as_str()).collect()
    }

    fn rides() -> Vec<Ride> {
        vec![
            sample_ride("1", "Dubai", "Abu Dhabi", 3),
            sample_ride("2", "Sharjah", "Dubai", 0),
            sample_ride("3", "Abu Dhabi", "Dubai Marina", 1),
        ]
    }

    #[test]
    fn list_hides_full_rides_unless_asked() {
        let api = api(rides());

        let Json(response) = block_on(list(
            Extension(api.clone()),
            Query(ListParams::default()),
        ))
        .unwrap();
        assert_eq!(ids(&response), vec!["1", "3"]);

        let Json(response) = block_on(list(
            Extension(api),
            Query(ListParams {
                all: true,
                ..Default::default()
            }),
        ))
        .unwrap();
        assert_eq!(ids(&response), vec!["1", "2", "3"]);
    }

    #[test]
    fn list_filters_by_query() {
        let params = ListParams {
            start_location: Some("Abu Dhabi".into()),
            destination: Some("marina".into()),
            ride_date: Some("2024-08-15".into()),
            all: false,
        };

        let Json(response) = block_on(list(Extension(api(rides())), Query(params))).unwrap();

        assert_eq!(ids(&response), vec!["3"]);
    }

    #[test]
    fn blank_query_values_match_everything() {
        let params = ListParams {
            start_location: Some("  ".into()),
            destination: Some(String::new()),
            ride_date: Some(String::new()),
            all: true,
        };

        assert_eq!(params.criteria().unwrap(), SearchCriteria::default());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let params = ListParams {
            ride_date: Some("15/08/2024".into()),
            ..Default::default()
        };

        let err = params.criteria().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "rideDate", .. }));
    }

    #[test]
    fn create_then_book() {
        let api = api(Vec::new());
        let draft = RideDraft {
            driver_name: "Sam Wilson".into(),
            car_model: "Tesla Model 3".into(),
            start_location: City::AbuDhabi.into(),
            destination: City::Rasalkhaima.into(),
            ride_date: "2024-08-16".into(),
            ride_time: "18:00".into(),
            price: "20".into(),
            available_seats: "1".into(),
            contact_detail: "555-456-7890".into(),
            remarks: None,
        };

        let (status, Json(ride)) = block_on(create(Extension(api.clone()), Json(draft))).unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(ride.available_seats, 1);

        let Json(booked) = block_on(book(Extension(api.clone()), Path(ride.id.clone()))).unwrap();
        assert_eq!(booked.available_seats, 0);

        let err = block_on(book(Extension(api), Path(ride.id))).unwrap_err();
        assert!(matches!(err, Error::NoSeatsAvailable));
    }

    #[test]
    fn refresh_returns_every_ride() {
        let Json(response) = block_on(refresh(Extension(api(rides())))).unwrap();

        assert_eq!(ids(&response), vec!["1", "2", "3"]);
        assert!(!response.loading);
        assert_eq!(response.error, None);
    }
}
