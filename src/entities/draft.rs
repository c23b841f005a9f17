use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::entities::ride::parse_time;
use crate::entities::{Location, NewRide};
use crate::error::Error;

/// Checks that are off unless the deployment asks for them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Reject rides whose start and destination resolve to the same place.
    pub require_distinct_endpoints: bool,
    /// Reject rides departing at or before the submission time.
    pub require_future_departure: bool,
}

/// The driver form exactly as submitted. Numeric fields stay text until
/// validated so malformed input is reported instead of silently coerced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideDraft {
    pub driver_name: String,
    pub car_model: String,
    pub start_location: Location,
    pub destination: Location,
    pub ride_date: String,
    pub ride_time: String,
    pub price: String,
    pub available_seats: String,
    pub contact_detail: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl RideDraft {
    pub fn validate(&self, rules: &ValidationRules, now: NaiveDateTime) -> Result<NewRide, Error> {
        let driver_name = required("driverName", &self.driver_name)?;
        let car_model = required("carModel", &self.car_model)?;
        let start_location = required("startLocation", &self.start_location.resolve())?;
        let destination = required("destination", &self.destination.resolve())?;

        let ride_date = NaiveDate::parse_from_str(self.ride_date.trim(), "%Y-%m-%d")
            .map_err(|_| Error::validation("rideDate", "must be a date like 2024-08-15"))?;
        let ride_time = parse_time(&self.ride_time)
            .ok_or_else(|| Error::validation("rideTime", "must be a time like 10:00"))?;

        let price = match self.price.trim().parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => price,
            _ => return Err(Error::validation("price", "must be a non-negative number")),
        };

        let available_seats = match self.available_seats.trim().parse::<u32>() {
            Ok(0) => return Err(Error::validation("availableSeats", "must be at least 1")),
            Ok(seats) => seats,
            Err(_) => return Err(Error::validation("availableSeats", "must be a whole number")),
        };

        let contact_detail = required("contactDetail", &self.contact_detail)?;

        let remarks = self
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|remarks| !remarks.is_empty())
            .map(String::from);

        if rules.require_distinct_endpoints
            && start_location.to_lowercase() == destination.to_lowercase()
        {
            return Err(Error::validation(
                "destination",
                "must differ from the start location",
            ));
        }

        if rules.require_future_departure && ride_date.and_time(ride_time) <= now {
            return Err(Error::validation("rideDate", "must be in the future"));
        }

        Ok(NewRide {
            driver_name,
            car_model,
            start_location,
            destination,
            ride_date,
            ride_time,
            price,
            available_seats,
            contact_detail,
            remarks,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, Error> {
    match value.trim() {
        "" => Err(Error::validation(field, "is required")),
        value => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::City;

    fn draft() -> RideDraft {
        RideDraft {
            driver_name: "Jane Smith".into(),
            car_model: "Honda Civic".into(),
            start_location: City::Sharjah.into(),
            destination: Location::Other(" Dubai Marina ".into()),
            ride_date: "2024-08-15".into(),
            ride_time: "12:30".into(),
            price: "15".into(),
            available_seats: "2".into(),
            contact_detail: "555-987-6543".into(),
            remarks: Some("".into()),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 8, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn valid_draft_resolves_locations() {
        let ride = draft().validate(&ValidationRules::default(), now()).unwrap();

        assert_eq!(ride.start_location, "Sharjah");
        assert_eq!(ride.destination, "Dubai Marina");
        assert_eq!(ride.price, 15.0);
        assert_eq!(ride.available_seats, 2);
        assert_eq!(ride.remarks, None);
    }

    #[test]
    fn unparseable_price_is_rejected() {
        let mut draft = draft();
        draft.price = "abc".into();

        let err = draft.validate(&ValidationRules::default(), now()).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "price", .. }));
    }

    #[test]
    fn negative_or_non_finite_price_is_rejected() {
        for price in ["-1", "NaN", "inf"] {
            let mut draft = draft();
            draft.price = price.into();

            assert!(draft
                .validate(&ValidationRules::default(), now())
                .unwrap_err()
                .is_validation_error());
        }
    }

    #[test]
    fn seats_must_be_a_positive_whole_number() {
        for seats in ["0", "-2", "1.5", ""] {
            let mut draft = draft();
            draft.available_seats = seats.into();

            let err = draft.validate(&ValidationRules::default(), now()).unwrap_err();
            assert!(matches!(
                err,
                Error::Validation {
                    field: "availableSeats",
                    ..
                }
            ));
        }
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let mut missing_name = draft();
        missing_name.driver_name = "   ".into();
        assert!(matches!(
            missing_name.validate(&ValidationRules::default(), now()),
            Err(Error::Validation {
                field: "driverName",
                ..
            })
        ));

        let mut missing_other = draft();
        missing_other.destination = Location::Other("".into());
        assert!(matches!(
            missing_other.validate(&ValidationRules::default(), now()),
            Err(Error::Validation {
                field: "destination",
                ..
            })
        ));
    }

    #[test]
    fn same_endpoints_allowed_unless_configured() {
        let mut draft = draft();
        draft.destination = Location::Other("sharjah".into());

        assert!(draft.validate(&ValidationRules::default(), now()).is_ok());

        let rules = ValidationRules {
            require_distinct_endpoints: true,
            ..ValidationRules::default()
        };
        assert!(draft.validate(&rules, now()).is_err());
    }

    #[test]
    fn past_departure_allowed_unless_configured() {
        let later = NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert!(draft().validate(&ValidationRules::default(), later).is_ok());

        let rules = ValidationRules {
            require_future_departure: true,
            ..ValidationRules::default()
        };
        assert!(draft().validate(&rules, later).is_err());
        assert!(draft().validate(&rules, now()).is_ok());
    }
}
