use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("coordinate '{0}' is not a number")]
    NotANumber(String),
    #[error("coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("city id cannot be empty")]
    Empty,
    #[error("city id '{0}' is not numeric")]
    NotNumeric(String),
}

/// Identity assigned by the remote store on creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CityId(pub u64);

impl CityId {
    /// Coerces an address-derived id (always a string) into the store's identity type.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdError::NotNumeric(trimmed.to_string()))
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// json-server hands ids back as numbers, older fixtures carry them as strings.
impl<'de> Deserialize<'de> for CityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(Self(n)),
            RawId::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(deserialize_with = "number_or_string")]
    pub lat: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        Ok(Self { lat, lng })
    }

    /// Parses the textual pair carried by an address. Both halves must be present.
    pub fn from_params(lat: Option<&str>, lng: Option<&str>) -> Option<Result<Self, CoordinateError>> {
        let (lat, lng) = (lat?, lng?);
        Some(parse_coordinate(lat).and_then(|lat| Self::new(lat, parse_coordinate(lng)?)))
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, CoordinateError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CoordinateError::NotANumber(raw.to_string()))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoordinateError::NonFinite)
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCoordinate {
        Number(f64),
        Text(String),
    }

    let value = match RawCoordinate::deserialize(deserializer)? {
        RawCoordinate::Number(n) => n,
        RawCoordinate::Text(s) => parse_coordinate(&s).map_err(serde::de::Error::custom)?,
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom(CoordinateError::NonFinite))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub emoji: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    pub position: Position,
}

/// A city that has not been persisted yet; the remote store assigns its id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftCity {
    pub city_name: String,
    pub country: String,
    pub emoji: String,
    pub date: DateTime<Utc>,
    pub notes: String,
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod id_tests {
        use super::*;

        #[test]
        fn test_parse_numeric_id() {
            assert_eq!(CityId::parse("73930385"), Ok(CityId(73_930_385)));
            assert_eq!(CityId::parse(" 7 "), Ok(CityId(7)));
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert_eq!(CityId::parse(""), Err(IdError::Empty));
            assert_eq!(CityId::parse("abc"), Err(IdError::NotNumeric("abc".into())));
            assert!(CityId::parse("-1").is_err());
        }

        #[test]
        fn test_id_accepts_number_or_string_on_the_wire() {
            let from_number: CityId = serde_json::from_value(json!(7)).unwrap();
            let from_text: CityId = serde_json::from_value(json!("7")).unwrap();
            assert_eq!(from_number, from_text);
            assert_eq!(serde_json::to_value(from_text).unwrap(), json!(7));
        }
    }

    mod position_tests {
        use super::*;

        #[test]
        fn test_position_accepts_strings_and_numbers() {
            let p: Position =
                serde_json::from_value(json!({ "lat": "48.8566", "lng": 2.3522 })).unwrap();
            assert_eq!(p, Position { lat: 48.8566, lng: 2.3522 });
        }

        #[test]
        fn test_position_rejects_non_finite_text() {
            let result: Result<Position, _> =
                serde_json::from_value(json!({ "lat": "NaN", "lng": 0 }));
            assert!(result.is_err());
        }

        #[test]
        fn test_from_params_requires_both_halves() {
            assert!(Position::from_params(Some("10"), None).is_none());
            assert!(Position::from_params(None, Some("20")).is_none());
            assert_eq!(
                Position::from_params(Some("10"), Some("20")),
                Some(Ok(Position { lat: 10.0, lng: 20.0 }))
            );
        }

        #[test]
        fn test_from_params_reports_bad_numbers() {
            assert_eq!(
                Position::from_params(Some("north"), Some("20")),
                Some(Err(CoordinateError::NotANumber("north".into())))
            );
            assert_eq!(
                Position::from_params(Some("10"), Some("inf")),
                Some(Err(CoordinateError::NonFinite))
            );
        }
    }

    mod city_tests {
        use super::*;

        #[test]
        fn test_city_from_remote_record() {
            let city: City = serde_json::from_value(json!({
                "cityName": "Lisbon",
                "country": "Portugal",
                "emoji": "🇵🇹",
                "date": "2027-10-31T15:59:59.138Z",
                "notes": "My favorite city so far!",
                "position": { "lat": 38.727881642324164, "lng": -9.140900099907554 },
                "id": 73_930_385
            }))
            .unwrap();

            assert_eq!(city.id, CityId(73_930_385));
            assert_eq!(city.city_name, "Lisbon");
            assert_eq!(city.position.lng, -9.140_900_099_907_554);
        }

        #[test]
        fn test_missing_text_fields_default_to_empty() {
            let city: City = serde_json::from_value(json!({
                "id": "3",
                "date": "2027-01-01T00:00:00Z",
                "position": { "lat": "1", "lng": "2" }
            }))
            .unwrap();

            assert_eq!(city.city_name, "");
            assert_eq!(city.notes, "");
        }

        #[test]
        fn test_draft_serializes_without_id() {
            let draft = DraftCity {
                city_name: "Paris".into(),
                country: "France".into(),
                emoji: "🇫🇷".into(),
                date: "2027-05-01T10:00:00Z".parse().unwrap(),
                notes: String::new(),
                position: Position { lat: 48.8, lng: 2.3 },
            };

            let value = serde_json::to_value(&draft).unwrap();
            assert!(value.get("id").is_none());
            assert_eq!(value["cityName"], "Paris");
            assert_eq!(value["position"]["lat"], 48.8);
        }
    }
}
