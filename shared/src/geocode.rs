//! Reverse geocoding of a clicked map position.
//!
//! The lookup itself is an HTTP effect issued by the app; this module owns the
//! wire shape of the answer, the interpretation rules and the transient
//! loading/error slice the draft view reads.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;
use url::Url;

use crate::error::ApiError;
use crate::model::Position;

pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://api.bigdatacloud.net/data/reverse-geocode-client";
pub const NOT_A_CITY: &str = "That doesn't seem to be a city. Click somewhere else 😊";

/// Distance from an ASCII capital to its regional indicator symbol.
pub const REGIONAL_INDICATOR_OFFSET: u32 = 127_397;

/// Regional indicator symbols A through Z.
pub const REGIONAL_INDICATORS: RangeInclusive<char> = '\u{1F1E6}'..='\u{1F1FF}';

const FLAG_IMAGE_BASE: &str = "https://flagcdn.com/24x18";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub name: String,
    pub country: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeocodeError {
    #[error("{}", NOT_A_CITY)]
    NoCountryCode,

    #[error("could not reach the geocoding service: {0}")]
    Transport(String),

    #[error("unexpected geocoding response: {0}")]
    Decode(String),
}

impl From<ApiError> for GeocodeError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Decode(_) | ApiError::EmptyBody => Self::Decode(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl GeocodeResponse {
    /// A country code is what makes a click a place; everything else is optional.
    pub fn into_place(self) -> Result<ResolvedPlace, GeocodeError> {
        let code = self
            .country_code
            .filter(|code| !code.trim().is_empty())
            .ok_or(GeocodeError::NoCountryCode)?;

        let name = self
            .city
            .filter(|city| !city.is_empty())
            .or(self.locality)
            .unwrap_or_default();

        Ok(ResolvedPlace {
            name,
            country: self.country_name.unwrap_or_default(),
            emoji: flag_emoji(code.trim()),
        })
    }
}

/// Maps each ASCII letter of a country code onto the regional indicator block.
///
/// Anything that is not a letter is passed through unchanged.
#[must_use]
pub fn flag_emoji(country_code: &str) -> String {
    country_code
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                char::from_u32(u32::from(c.to_ascii_uppercase()) + REGIONAL_INDICATOR_OFFSET)
                    .unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Inverse of [`flag_emoji`], lowercased. `None` unless every char is a regional indicator.
#[must_use]
pub fn country_code_from_flag(emoji: &str) -> Option<String> {
    let code = emoji
        .chars()
        .map(|c| {
            u32::from(c)
                .checked_sub(REGIONAL_INDICATOR_OFFSET)
                .and_then(char::from_u32)
                .filter(char::is_ascii_uppercase)
                .map(|c| c.to_ascii_lowercase())
        })
        .collect::<Option<String>>()?;

    (!code.is_empty()).then_some(code)
}

#[must_use]
pub fn flag_image_url(emoji: &str) -> Option<String> {
    country_code_from_flag(emoji).map(|code| format!("{FLAG_IMAGE_BASE}/{code}.png"))
}

#[must_use]
pub fn lookup_url(endpoint: &Url, position: Position) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("latitude", &position.lat.to_string())
        .append_pair("longitude", &position.lng.to_string());
    url
}

/// Transient resolver status. Never touches the city store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeocodeState {
    pub is_loading: bool,
    pub error: Option<GeocodeError>,
}

impl GeocodeState {
    pub fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    /// A resolved place is handed to the draft, so only the failure is kept here.
    pub fn settle(&mut self, error: Option<GeocodeError>) {
        self.is_loading = false;
        self.error = error;
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
