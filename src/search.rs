//! Passenger-side search over the ride list.
//!
//! Everything here is a pure function of the rides and the criteria; the
//! repository owns the list and callers re-run the filter whenever it changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::{Location, Ride};

/// What the passenger asked for. A `None` field matches every ride.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default)]
    pub start_location: Option<Location>,
    #[serde(default)]
    pub destination: Option<Location>,
    #[serde(default)]
    pub ride_date: Option<NaiveDate>,
}

impl SearchCriteria {
    pub fn is_empty(&self) -> bool {
        self.start_location.is_none() && self.destination.is_none() && self.ride_date.is_none()
    }

    pub fn matches(&self, ride: &Ride) -> bool {
        location_matches(self.start_location.as_ref(), &ride.start_location)
            && location_matches(self.destination.as_ref(), &ride.destination)
            && self.ride_date.map_or(true, |date| ride.ride_date == date)
    }
}

fn location_matches(criterion: Option<&Location>, value: &str) -> bool {
    match criterion {
        None => true,
        Some(Location::City(city)) => value == city.name(),
        Some(Location::Other(fragment)) if fragment.is_empty() => true,
        Some(Location::Other(fragment)) => value
            .to_lowercase()
            .contains(&fragment.to_lowercase()),
    }
}

/// Rides matching every set criterion, in their original order.
pub fn apply(rides: &[Ride], criteria: &SearchCriteria) -> Vec<Ride> {
    if criteria.is_empty() {
        return rides.to_vec();
    }

    rides
        .iter()
        .filter(|ride| criteria.matches(ride))
        .cloned()
        .collect()
}

/// Rides that still have a seat. Full rides are dropped, not flagged.
pub fn bookable(rides: &[Ride]) -> Vec<Ride> {
    rides
        .iter()
        .filter(|ride| ride.is_bookable())
        .cloned()
        .collect()
}

/// The list passengers actually see: matching rides with seats left.
pub fn available(rides: &[Ride], criteria: &SearchCriteria) -> Vec<Ride> {
    bookable(&apply(rides, criteria))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ride::sample_ride;
    use crate::entities::City;

    fn ids(rides: &[Ride]) -> Vec<&str> {
        rides.iter().map(|ride| ride.id.as_str()).collect()
    }

    fn rides() -> Vec<Ride> {
        let mut c = sample_ride("c", "Downtown Mall", "Al Ain", 1);
        c.ride_date = NaiveDate::from_ymd_opt(2024, 8, 16).unwrap();

        vec![
            sample_ride("a", "Dubai", "Abu Dhabi", 3),
            sample_ride("b", "Dubai", "Sharjah", 2),
            c,
            sample_ride("d", "Sharjah", "Dubai", 0),
        ]
    }

    #[test]
    fn empty_criteria_is_identity() {
        let rides = rides();

        assert_eq!(apply(&rides, &SearchCriteria::default()), rides);
    }

    #[test]
    fn set_criteria_are_combined_with_and() {
        let criteria = SearchCriteria {
            start_location: Some(City::Dubai.into()),
            destination: Some(City::AbuDhabi.into()),
            ride_date: None,
        };

        assert_eq!(ids(&apply(&rides(), &criteria)), vec!["a"]);
    }

    #[test]
    fn fixed_city_requires_exact_equality() {
        let ride = sample_ride("x", "Dubai Marina", "Sharjah", 1);
        let criteria = SearchCriteria {
            start_location: Some(City::Dubai.into()),
            ..SearchCriteria::default()
        };

        assert!(apply(&[ride], &criteria).is_empty());
    }

    #[test]
    fn free_text_is_a_case_insensitive_substring() {
        let criteria = SearchCriteria {
            start_location: Some(Location::Other("mall".into())),
            ..SearchCriteria::default()
        };

        assert_eq!(ids(&apply(&rides(), &criteria)), vec!["c"]);
    }

    #[test]
    fn empty_free_text_matches_everything() {
        let criteria = SearchCriteria {
            destination: Some(Location::Other("".into())),
            ..SearchCriteria::default()
        };

        assert_eq!(apply(&rides(), &criteria).len(), 4);
    }

    #[test]
    fn date_requires_exact_match_and_keeps_order() {
        let criteria = SearchCriteria {
            ride_date: NaiveDate::from_ymd_opt(2024, 8, 15),
            ..SearchCriteria::default()
        };

        assert_eq!(ids(&apply(&rides(), &criteria)), vec!["a", "b", "d"]);
    }

    #[test]
    fn bookable_hides_full_rides() {
        let criteria = SearchCriteria {
            start_location: Some(City::Sharjah.into()),
            ..SearchCriteria::default()
        };

        assert_eq!(ids(&apply(&rides(), &criteria)), vec!["d"]);
        assert!(available(&rides(), &criteria).is_empty());
        assert_eq!(ids(&bookable(&rides())), vec!["a", "b", "c"]);
    }
}
