use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::error::ApiError;
use crate::geocode::DEFAULT_GEOCODE_ENDPOINT;
use crate::model::{CityId, Position};
use crate::position::WORLD_ORIGIN;

pub const DEFAULT_CITIES_BASE_URL: &str = "http://localhost:9000";
pub const DEFAULT_MAP_ZOOM: u8 = 5;
pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 18;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} is not a valid URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("{field} must use http or https, got '{scheme}'")]
    UnsupportedScheme { field: &'static str, scheme: String },

    #[error("{field} has no host")]
    MissingHost { field: &'static str },

    #[error("map zoom {0} is outside 1..=18")]
    ZoomOutOfRange(u8),
}

/// Settings handed over by the shell at start-up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub cities_base_url: String,
    pub geocode_endpoint: String,
    pub default_focal_point: Position,
    pub map_zoom: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cities_base_url: DEFAULT_CITIES_BASE_URL.into(),
            geocode_endpoint: DEFAULT_GEOCODE_ENDPOINT.into(),
            default_focal_point: WORLD_ORIGIN,
            map_zoom: DEFAULT_MAP_ZOOM,
        }
    }
}

impl AppConfig {
    /// Validates the whole config and derives the request endpoints from it.
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.map_zoom) {
            return Err(ConfigError::ZoomOutOfRange(self.map_zoom));
        }

        let mut cities_base = web_url("citiesBaseUrl", &self.cities_base_url)?;
        if !cities_base.path().ends_with('/') {
            let path = format!("{}/", cities_base.path());
            cities_base.set_path(&path);
        }

        Ok(Endpoints {
            cities_base,
            geocode: web_url("geocodeEndpoint", &self.geocode_endpoint)?,
        })
    }
}

fn web_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::UnsupportedScheme {
                field,
                scheme: other.to_string(),
            })
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::MissingHost { field });
    }

    Ok(url)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    cities_base: Url,
    geocode: Url,
}

impl Endpoints {
    pub fn cities(&self) -> Result<Url, ApiError> {
        Ok(self.cities_base.join("cities")?)
    }

    pub fn city(&self, id: CityId) -> Result<Url, ApiError> {
        Ok(self.cities_base.join(&format!("cities/{id}"))?)
    }

    #[must_use]
    pub const fn geocode(&self) -> &Url {
        &self.geocode
    }
}
