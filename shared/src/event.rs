use chrono::{DateTime, Utc};
use crux_http::Response;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::geocode::GeocodeResponse;
use crate::model::{City, CityId, DraftCity};

/// Correlates the start and settle log lines of one tracked request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type HttpOutcome<T> = Box<crux_http::Result<Response<T>>>;

#[derive(Serialize, Deserialize, Debug)]
pub enum Event {
    // Shell-originated
    Configured(AppConfig),
    LoadCities,
    /// Carries the id exactly as found in the address.
    SelectCity { id: String },
    CreateCity(DraftCity),
    DeleteCity { id: CityId },
    DraftOpened { lat: Option<String>, lng: Option<String> },
    DraftNameChanged(String),
    DraftDateChanged(Option<DateTime<Utc>>),
    DraftNotesChanged(String),
    DraftSubmitted,
    Navigated { address: String },

    // Internal: settled effects
    #[serde(skip)]
    CitiesLoaded {
        request: RequestId,
        result: HttpOutcome<Vec<City>>,
    },
    #[serde(skip)]
    CityLoaded {
        request: RequestId,
        result: HttpOutcome<City>,
    },
    #[serde(skip)]
    CityCreated {
        request: RequestId,
        result: HttpOutcome<City>,
    },
    #[serde(skip)]
    CityDeleted {
        request: RequestId,
        id: CityId,
        result: HttpOutcome<Vec<u8>>,
    },
    #[serde(skip)]
    PlaceResolved {
        request: RequestId,
        result: HttpOutcome<GeocodeResponse>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configured(_) => "configured",
            Self::LoadCities => "load_cities",
            Self::SelectCity { .. } => "select_city",
            Self::CreateCity(_) => "create_city",
            Self::DeleteCity { .. } => "delete_city",
            Self::DraftOpened { .. } => "draft_opened",
            Self::DraftNameChanged(_) => "draft_name_changed",
            Self::DraftDateChanged(_) => "draft_date_changed",
            Self::DraftNotesChanged(_) => "draft_notes_changed",
            Self::DraftSubmitted => "draft_submitted",
            Self::Navigated { .. } => "navigated",
            Self::CitiesLoaded { .. } => "cities_loaded",
            Self::CityLoaded { .. } => "city_loaded",
            Self::CityCreated { .. } => "city_created",
            Self::CityDeleted { .. } => "city_deleted",
            Self::PlaceResolved { .. } => "place_resolved",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::SelectCity { .. }
                | Self::CreateCity(_)
                | Self::DeleteCity { .. }
                | Self::DraftOpened { .. }
                | Self::DraftNameChanged(_)
                | Self::DraftDateChanged(_)
                | Self::DraftNotesChanged(_)
                | Self::DraftSubmitted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shell_events_decode() {
        let event: Event = serde_json::from_value(json!({ "SelectCity": { "id": "73930385" } })).unwrap();
        assert_eq!(event.name(), "select_city");

        let event: Event =
            serde_json::from_value(json!({ "DraftOpened": { "lat": "10", "lng": null } })).unwrap();
        assert!(matches!(
            event,
            Event::DraftOpened { lat: Some(_), lng: None }
        ));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
