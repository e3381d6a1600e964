//! Authoritative client-side city state.
//!
//! Every change to [`CitiesState`] goes through [`CitiesState::reduce`]; the app
//! never writes a field directly. Request issuing and response handling live in
//! [`crate::app`], which turns each settled request into one [`CityAction`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{City, CityId};

pub const LOAD_CITIES_FAILED: &str = "There was an error in loading cities...";
pub const LOAD_CITY_FAILED: &str = "There was an error in loading city...";
pub const CREATE_CITY_FAILED: &str = "There was an error in creating city...";
pub const DELETE_CITY_FAILED: &str = "There was an error in deleting city...";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CitiesState {
    pub cities: Vec<City>,
    pub is_loading: bool,
    pub current_city: Option<City>,
    /// Empty when there is nothing to report.
    pub error: String,
}

/// Named state transitions. Kinds are phrased as things that happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CityAction {
    LoadingStarted,
    CitiesReplaced { cities: Vec<City> },
    CityReplaced { city: City },
    CityAppended { city: City },
    CityRemoved { id: CityId },
    RequestRejected { message: String },
    /// Any kind this build does not know; reducing it is a bug.
    #[serde(other)]
    Unrecognized,
}

impl CityAction {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LoadingStarted => "loading-started",
            Self::CitiesReplaced { .. } => "cities-replaced",
            Self::CityReplaced { .. } => "city-replaced",
            Self::CityAppended { .. } => "city-appended",
            Self::CityRemoved { .. } => "city-removed",
            Self::RequestRejected { .. } => "request-rejected",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl CitiesState {
    /// The transition function: (prior state, action) -> next state.
    ///
    /// # Panics
    ///
    /// Panics on [`CityAction::Unrecognized`]. An action outside the known
    /// vocabulary means the store and its producers disagree about the
    /// protocol, and continuing would silently desynchronize the UI.
    #[must_use]
    pub fn reduce(self, action: CityAction) -> Self {
        match action {
            CityAction::LoadingStarted => Self {
                is_loading: true,
                error: String::new(),
                ..self
            },
            CityAction::CitiesReplaced { cities } => Self {
                cities,
                is_loading: false,
                ..self
            },
            CityAction::CityReplaced { city } => Self {
                current_city: Some(city),
                is_loading: false,
                ..self
            },
            CityAction::CityAppended { city } => {
                let mut cities = self.cities;
                cities.push(city.clone());
                Self {
                    cities,
                    current_city: Some(city),
                    is_loading: false,
                    ..self
                }
            }
            CityAction::CityRemoved { id } => {
                let mut cities = self.cities;
                cities.retain(|city| city.id != id);
                Self {
                    cities,
                    current_city: None,
                    is_loading: false,
                    ..self
                }
            }
            CityAction::RequestRejected { message } => Self {
                is_loading: false,
                error: message,
                ..self
            },
            CityAction::Unrecognized => panic!("unknown city action"),
        }
    }

    /// Applies `action` to the latest snapshot in place.
    pub fn dispatch(&mut self, action: CityAction) {
        debug!(kind = action.kind(), "applying city action");
        *self = std::mem::take(self).reduce(action);
    }

    /// Folds a recorded action log onto an initial state.
    #[must_use]
    pub fn replay(self, actions: impl IntoIterator<Item = CityAction>) -> Self {
        actions.into_iter().fold(self, Self::reduce)
    }

    #[must_use]
    pub fn current_id(&self) -> Option<CityId> {
        self.current_city.as_ref().map(|city| city.id)
    }

    /// Loading the current city again would be a redundant round-trip.
    #[must_use]
    pub fn is_current(&self, id: CityId) -> bool {
        self.current_id() == Some(id)
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}
