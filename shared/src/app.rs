use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::capabilities::Capabilities;
use crate::config::AppConfig;
use crate::error::{settle, ApiError};
use crate::event::{Event, RequestId};
use crate::geocode::{self, GeocodeError, GeocodeResponse, GeocodeState};
use crate::model::{City, CityId, DraftCity, Position};
use crate::position::{position_from_address, MapPosition};
use crate::store::{
    CitiesState, CityAction, CREATE_CITY_FAILED, DELETE_CITY_FAILED, LOAD_CITIES_FAILED,
    LOAD_CITY_FAILED,
};

pub const CLICK_ON_MAP: &str = "Start by clicking on the map";

const WIKIPEDIA_BASE: &str = "https://en.wikipedia.org/wiki";

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("no position picked on the map")]
    MissingPosition,
    #[error("city name is empty")]
    MissingName,
    #[error("visit date is not set")]
    MissingDate,
    #[error("draft is already being submitted")]
    AlreadySubmitted,
}

/// The city being entered after a map click.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DraftForm {
    pub position: Option<Position>,
    pub city_name: String,
    pub country: String,
    pub emoji: String,
    pub date: Option<DateTime<Utc>>,
    pub notes: String,
    pub submitted: bool,
}

impl DraftForm {
    #[must_use]
    pub fn at(position: Position) -> Self {
        Self {
            position: Some(position),
            date: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Fills the fields the resolver owns. The name stays editable afterwards.
    pub fn seed(&mut self, place: &geocode::ResolvedPlace) {
        self.city_name.clone_from(&place.name);
        self.country.clone_from(&place.country);
        self.emoji.clone_from(&place.emoji);
    }

    pub fn to_city(&self) -> Result<DraftCity, DraftError> {
        if self.submitted {
            return Err(DraftError::AlreadySubmitted);
        }
        let position = self.position.ok_or(DraftError::MissingPosition)?;
        let city_name = self.city_name.trim();
        if city_name.is_empty() {
            return Err(DraftError::MissingName);
        }
        let date = self.date.ok_or(DraftError::MissingDate)?;

        Ok(DraftCity {
            city_name: city_name.to_string(),
            country: self.country.clone(),
            emoji: self.emoji.clone(),
            date,
            notes: self.notes.clone(),
            position,
        })
    }
}

#[derive(Default)]
pub struct Model {
    pub config: AppConfig,
    pub cities: CitiesState,
    pub geocode: GeocodeState,
    pub draft: DraftForm,
    pub map: MapPosition,
}

// --- View model ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CityItem {
    pub id: CityId,
    pub city_name: String,
    pub emoji: String,
    pub date_label: String,
    pub is_current: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CityDetail {
    pub id: CityId,
    pub city_name: String,
    pub emoji: String,
    pub date_label: String,
    pub notes: String,
    pub wiki_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapMarker {
    pub id: CityId,
    pub position: Position,
    pub city_name: String,
    pub emoji: String,
    pub flag_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum DraftView {
    NeedsPosition {
        message: String,
    },
    Resolving,
    Failed {
        message: String,
    },
    Editing {
        city_name: String,
        country: String,
        emoji: String,
        date: Option<DateTime<Utc>>,
        notes: String,
        can_submit: bool,
        is_submitting: bool,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub cities: Vec<CityItem>,
    pub current_city: Option<CityDetail>,
    pub is_loading: bool,
    /// Latest store failure; the shell shows it instead of the content.
    pub error: Option<String>,
    pub markers: Vec<MapMarker>,
    pub map_center: Position,
    pub map_zoom: u8,
    pub draft: DraftView,
}

fn date_label(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn wiki_url(city_name: &str) -> String {
    format!("{WIKIPEDIA_BASE}/{}", city_name.trim().replace(' ', "_"))
}

// --- App ---

#[derive(Default)]
pub struct App;

impl App {
    fn cities_url(config: &AppConfig) -> Result<Url, ApiError> {
        config.endpoints()?.cities()
    }

    fn city_url(config: &AppConfig, id: CityId) -> Result<Url, ApiError> {
        config.endpoints()?.city(id)
    }

    fn start(model: &mut Model, request: RequestId, operation: &'static str) {
        debug!(%request, operation, "city request started");
        model.cities.dispatch(CityAction::LoadingStarted);
    }

    fn reject(
        model: &mut Model,
        request: RequestId,
        operation: &'static str,
        message: &str,
        error: &ApiError,
    ) {
        warn!(%request, operation, code = error.code(), error = %error, "city request failed");
        model.cities.dispatch(CityAction::RequestRejected {
            message: message.to_string(),
        });
    }

    #[instrument(skip_all)]
    fn load_cities(model: &mut Model, caps: &Capabilities) {
        let request = RequestId::new();
        Self::start(model, request, "load_cities");

        match Self::cities_url(&model.config) {
            Ok(url) => {
                caps.http
                    .get(url.as_str())
                    .expect_json::<Vec<City>>()
                    .send(move |result| Event::CitiesLoaded {
                        request,
                        result: Box::new(result),
                    });
            }
            Err(e) => Self::reject(model, request, "load_cities", LOAD_CITIES_FAILED, &e),
        }
    }

    /// Returns `false` when the request was skipped because `raw_id` is already current.
    #[instrument(skip_all, fields(id = raw_id))]
    fn load_city(model: &mut Model, caps: &Capabilities, raw_id: &str) -> bool {
        let id = match CityId::parse(raw_id) {
            Ok(id) if model.cities.is_current(id) => {
                debug!("city already current, skipping request");
                return false;
            }
            Ok(id) => id,
            Err(e) => {
                let request = RequestId::new();
                Self::start(model, request, "load_city");
                Self::reject(model, request, "load_city", LOAD_CITY_FAILED, &e.into());
                return true;
            }
        };

        let request = RequestId::new();
        Self::start(model, request, "load_city");

        match Self::city_url(&model.config, id) {
            Ok(url) => {
                caps.http
                    .get(url.as_str())
                    .expect_json::<City>()
                    .send(move |result| Event::CityLoaded {
                        request,
                        result: Box::new(result),
                    });
            }
            Err(e) => Self::reject(model, request, "load_city", LOAD_CITY_FAILED, &e),
        }
        true
    }

    #[instrument(skip_all, fields(city = %draft.city_name))]
    fn create_city(model: &mut Model, caps: &Capabilities, draft: &DraftCity) {
        let request = RequestId::new();
        Self::start(model, request, "create_city");

        let builder = Self::cities_url(&model.config).and_then(|url| {
            caps.http
                .post(url.as_str())
                .body_json(draft)
                .map_err(|e| ApiError::Encode(e.to_string()))
        });

        match builder {
            Ok(builder) => {
                builder
                    .expect_json::<City>()
                    .send(move |result| Event::CityCreated {
                        request,
                        result: Box::new(result),
                    });
            }
            Err(e) => Self::reject(model, request, "create_city", CREATE_CITY_FAILED, &e),
        }
    }

    #[instrument(skip_all, fields(%id))]
    fn delete_city(model: &mut Model, caps: &Capabilities, id: CityId) {
        let request = RequestId::new();
        Self::start(model, request, "delete_city");

        match Self::city_url(&model.config, id) {
            Ok(url) => {
                caps.http
                    .delete(url.as_str())
                    .send(move |result| Event::CityDeleted {
                        request,
                        id,
                        result: Box::new(result),
                    });
            }
            Err(e) => Self::reject(model, request, "delete_city", DELETE_CITY_FAILED, &e),
        }
    }

    #[instrument(skip_all, fields(lat = position.lat, lng = position.lng))]
    fn resolve_place(model: &mut Model, caps: &Capabilities, position: Position) {
        let request = RequestId::new();
        model.geocode.begin();

        match model.config.endpoints() {
            Ok(endpoints) => {
                debug!(%request, "reverse geocoding started");
                let url = geocode::lookup_url(endpoints.geocode(), position);
                caps.http
                    .get(url.as_str())
                    .expect_json::<GeocodeResponse>()
                    .send(move |result| Event::PlaceResolved {
                        request,
                        result: Box::new(result),
                    });
            }
            Err(e) => {
                warn!(%request, error = %e, "no usable geocoding endpoint");
                model
                    .geocode
                    .settle(Some(GeocodeError::Transport(e.to_string())));
            }
        }
    }

    fn configure(model: &mut Model, config: AppConfig) {
        if let Err(e) = config.endpoints() {
            warn!(error = %e, "rejecting configuration, keeping the previous one");
            return;
        }

        let previous = std::mem::replace(&mut model.config, config);
        model
            .map
            .rebase(previous.default_focal_point, model.config.default_focal_point);
        info!(
            cities = %model.config.cities_base_url,
            geocoder = %model.config.geocode_endpoint,
            "configuration applied"
        );
    }

    fn submitted_draft_settled(model: &mut Model) {
        if model.draft.submitted {
            model.draft = DraftForm::default();
        }
    }

    fn draft_view(model: &Model) -> DraftView {
        let draft = &model.draft;
        if draft.position.is_none() {
            return DraftView::NeedsPosition {
                message: CLICK_ON_MAP.into(),
            };
        }
        if model.geocode.is_loading {
            return DraftView::Resolving;
        }
        if let Some(message) = model.geocode.error_message() {
            return DraftView::Failed { message };
        }

        DraftView::Editing {
            city_name: draft.city_name.clone(),
            country: draft.country.clone(),
            emoji: draft.emoji.clone(),
            date: draft.date,
            notes: draft.notes.clone(),
            can_submit: draft.to_city().is_ok(),
            is_submitting: draft.submitted,
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    #[instrument(skip_all, fields(event = event.name()))]
    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_user_initiated() {
            debug!("user action");
        }

        match event {
            Event::Configured(config) => {
                Self::configure(model, config);
                caps.render.render();
            }

            Event::LoadCities => {
                Self::load_cities(model, caps);
                caps.render.render();
            }

            Event::SelectCity { id } => {
                if Self::load_city(model, caps, &id) {
                    caps.render.render();
                }
            }

            Event::CreateCity(draft) => {
                Self::create_city(model, caps, &draft);
                caps.render.render();
            }

            Event::DeleteCity { id } => {
                Self::delete_city(model, caps, id);
                caps.render.render();
            }

            Event::DraftOpened { lat, lng } => {
                match Position::from_params(lat.as_deref(), lng.as_deref()) {
                    Some(Ok(position)) => {
                        model.draft = DraftForm::at(position);
                        Self::resolve_place(model, caps, position);
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "draft address carries unusable coordinates");
                        model.draft = DraftForm::default();
                    }
                    None => model.draft = DraftForm::default(),
                }
                caps.render.render();
            }

            Event::DraftNameChanged(name) => {
                model.draft.city_name = name;
                caps.render.render();
            }

            Event::DraftDateChanged(date) => {
                model.draft.date = date;
                caps.render.render();
            }

            Event::DraftNotesChanged(notes) => {
                model.draft.notes = notes;
                caps.render.render();
            }

            Event::DraftSubmitted => match model.draft.to_city() {
                Ok(city) => {
                    model.draft.submitted = true;
                    Self::create_city(model, caps, &city);
                    caps.render.render();
                }
                Err(e) => debug!(error = %e, "draft submission ignored"),
            },

            Event::Navigated { address } => {
                if model.map.observe(position_from_address(&address)) {
                    let focal = model.map.focal();
                    debug!(lat = focal.lat, lng = focal.lng, "map focal point moved");
                    caps.render.render();
                }
            }

            Event::CitiesLoaded { request, result } => {
                match settle(*result) {
                    Ok(cities) => {
                        info!(%request, count = cities.len(), "cities loaded");
                        model.cities.dispatch(CityAction::CitiesReplaced { cities });
                    }
                    Err(e) => Self::reject(model, request, "load_cities", LOAD_CITIES_FAILED, &e),
                }
                caps.render.render();
            }

            Event::CityLoaded { request, result } => {
                match settle(*result) {
                    Ok(city) => {
                        info!(%request, id = %city.id, "city loaded");
                        model.cities.dispatch(CityAction::CityReplaced { city });
                    }
                    Err(e) => Self::reject(model, request, "load_city", LOAD_CITY_FAILED, &e),
                }
                caps.render.render();
            }

            Event::CityCreated { request, result } => {
                match settle(*result) {
                    Ok(city) => {
                        info!(%request, id = %city.id, "city created");
                        model.cities.dispatch(CityAction::CityAppended { city });
                    }
                    Err(e) => Self::reject(model, request, "create_city", CREATE_CITY_FAILED, &e),
                }
                Self::submitted_draft_settled(model);
                caps.render.render();
            }

            Event::CityDeleted {
                request,
                id,
                result,
            } => {
                match (*result).map(drop).map_err(ApiError::from) {
                    Ok(()) => {
                        info!(%request, %id, "city deleted");
                        model.cities.dispatch(CityAction::CityRemoved { id });
                    }
                    Err(e) => Self::reject(model, request, "delete_city", DELETE_CITY_FAILED, &e),
                }
                caps.render.render();
            }

            Event::PlaceResolved { request, result } => {
                let outcome = settle(*result)
                    .map_err(GeocodeError::from)
                    .and_then(GeocodeResponse::into_place);

                match &outcome {
                    Ok(place) => {
                        info!(%request, place = %place.name, country = %place.country, "place resolved");
                        model.draft.seed(place);
                    }
                    Err(e) => warn!(%request, error = %e, "reverse geocoding failed"),
                }
                model.geocode.settle(outcome.err());
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let state = &model.cities;

        let cities = state
            .cities
            .iter()
            .map(|city| CityItem {
                id: city.id,
                city_name: city.city_name.clone(),
                emoji: city.emoji.clone(),
                date_label: date_label(&city.date),
                is_current: state.is_current(city.id),
            })
            .collect();

        let markers = state
            .cities
            .iter()
            .map(|city| MapMarker {
                id: city.id,
                position: city.position,
                city_name: city.city_name.clone(),
                emoji: city.emoji.clone(),
                flag_url: geocode::flag_image_url(&city.emoji),
            })
            .collect();

        let current_city = state.current_city.as_ref().map(|city| CityDetail {
            id: city.id,
            city_name: city.city_name.clone(),
            emoji: city.emoji.clone(),
            date_label: date_label(&city.date),
            notes: city.notes.clone(),
            wiki_url: wiki_url(&city.city_name),
        });

        ViewModel {
            cities,
            current_city,
            is_loading: state.is_loading,
            error: state.has_error().then(|| state.error.clone()),
            markers,
            map_center: model.map.focal(),
            map_zoom: model.config.map_zoom,
            draft: Self::draft_view(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lisbon() -> City {
        City {
            id: CityId(73_930_385),
            city_name: "Lisbon".into(),
            country: "Portugal".into(),
            emoji: "🇵🇹".into(),
            date: Utc.with_ymd_and_hms(2027, 10, 31, 15, 59, 59).unwrap(),
            notes: "My favorite city so far!".into(),
            position: Position { lat: 38.72, lng: -9.14 },
        }
    }

    mod draft_tests {
        use super::*;

        #[test]
        fn test_fresh_draft_needs_a_name() {
            let draft = DraftForm::at(Position { lat: 1.0, lng: 2.0 });
            assert!(draft.date.is_some());
            assert_eq!(draft.to_city(), Err(DraftError::MissingName));
        }

        #[test]
        fn test_draft_without_position_or_date() {
            let mut draft = DraftForm {
                city_name: "Paris".into(),
                ..DraftForm::default()
            };
            assert_eq!(draft.to_city(), Err(DraftError::MissingPosition));

            draft.position = Some(Position { lat: 1.0, lng: 2.0 });
            assert_eq!(draft.to_city(), Err(DraftError::MissingDate));
        }

        #[test]
        fn test_complete_draft_trims_name() {
            let mut draft = DraftForm::at(Position { lat: 1.0, lng: 2.0 });
            draft.seed(&geocode::ResolvedPlace {
                name: "Paris ".into(),
                country: "France".into(),
                emoji: "🇫🇷".into(),
            });
            draft.notes = "croissants".into();

            let city = draft.to_city().unwrap();
            assert_eq!(city.city_name, "Paris");
            assert_eq!(city.country, "France");
            assert_eq!(city.notes, "croissants");

            draft.submitted = true;
            assert_eq!(draft.to_city(), Err(DraftError::AlreadySubmitted));
        }
    }

    mod view_tests {
        use super::*;
        use crux_core::App as _;

        #[test]
        fn test_initial_view() {
            let view = App.view(&Model::default());
            assert!(view.cities.is_empty());
            assert_eq!(view.error, None);
            assert_eq!(view.map_center, Position { lat: 40.0, lng: 0.0 });
            assert_eq!(view.map_zoom, 5);
            assert_eq!(
                view.draft,
                DraftView::NeedsPosition {
                    message: CLICK_ON_MAP.into()
                }
            );
        }

        #[test]
        fn test_saved_city_is_listed_marked_and_detailed() {
            let mut model = Model::default();
            model.cities.dispatch(CityAction::CityAppended { city: lisbon() });

            let view = App.view(&model);
            assert_eq!(view.cities[0].date_label, "October 31, 2027");
            assert!(view.cities[0].is_current);
            assert_eq!(
                view.markers[0].flag_url.as_deref(),
                Some("https://flagcdn.com/24x18/pt.png")
            );

            let detail = view.current_city.unwrap();
            assert_eq!(detail.wiki_url, "https://en.wikipedia.org/wiki/Lisbon");
        }

        #[test]
        fn test_store_error_is_exposed() {
            let mut model = Model::default();
            model.cities.dispatch(CityAction::RequestRejected {
                message: LOAD_CITIES_FAILED.into(),
            });
            assert_eq!(App.view(&model).error.as_deref(), Some(LOAD_CITIES_FAILED));
        }
    }
}
