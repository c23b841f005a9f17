use std::fmt;

use serde::{Deserialize, Serialize};

/// Known pickup and drop-off points offered in the route dropdowns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Dubai,
    #[serde(rename = "Abu Dhabi")]
    AbuDhabi,
    Sharjah,
    Ajman,
    #[serde(rename = "Umm Al Quwain")]
    UmmAlQuwain,
    Rasalkhaima,
    Fujairah,
    #[serde(rename = "Al Ain")]
    AlAin,
}

impl City {
    pub const ALL: [City; 8] = [
        City::Dubai,
        City::AbuDhabi,
        City::Sharjah,
        City::Ajman,
        City::UmmAlQuwain,
        City::Rasalkhaima,
        City::Fujairah,
        City::AlAin,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dubai => "Dubai",
            Self::AbuDhabi => "Abu Dhabi",
            Self::Sharjah => "Sharjah",
            Self::Ajman => "Ajman",
            Self::UmmAlQuwain => "Umm Al Quwain",
            Self::Rasalkhaima => "Rasalkhaima",
            Self::Fujairah => "Fujairah",
            Self::AlAin => "Al Ain",
        }
    }

    /// Exact match on the display name.
    pub fn from_name(name: &str) -> Option<City> {
        City::ALL.iter().copied().find(|city| city.name() == name)
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A route endpoint as entered in a form: either one of the fixed cities or
/// free text typed after choosing "Other".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    City(City),
    Other(String),
}

impl Location {
    pub fn parse(text: &str) -> Self {
        match City::from_name(text) {
            Some(city) => Self::City(city),
            None => Self::Other(text.to_string()),
        }
    }

    /// The plain string stored on a ride.
    pub fn resolve(&self) -> String {
        match self {
            Self::City(city) => city.name().to_string(),
            Self::Other(text) => text.trim().to_string(),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<City> for Location {
    fn from(city: City) -> Self {
        Self::City(city)
    }
}

#[test]
fn parse_recognizes_fixed_cities() {
    assert_eq!(Location::parse("Abu Dhabi"), Location::City(City::AbuDhabi));
    assert_eq!(
        Location::parse("abu dhabi"),
        Location::Other("abu dhabi".into())
    );
    assert_eq!(
        Location::parse("Downtown Mall"),
        Location::Other("Downtown Mall".into())
    );
}

#[test]
fn resolve_trims_free_text() {
    assert_eq!(Location::Other("  Marina Walk ".into()).resolve(), "Marina Walk");
    assert_eq!(Location::City(City::AlAin).resolve(), "Al Ain");
}

#[test]
fn location_json_is_tagged() {
    let city: Location = serde_json::from_str(r#"{"city":"Umm Al Quwain"}"#).unwrap();
    assert_eq!(city, Location::City(City::UmmAlQuwain));

    let other: Location = serde_json::from_str(r#"{"other":"Global Village"}"#).unwrap();
    assert_eq!(other, Location::Other("Global Village".into()));
}
