//! Map focal point, kept in step with the coordinates carried by the address.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::model::Position;

/// World-view origin shown before any city or click has been seen.
pub const WORLD_ORIGIN: Position = Position { lat: 40.0, lng: 0.0 };

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    focal: Position,
}

impl Default for MapPosition {
    fn default() -> Self {
        Self::at(WORLD_ORIGIN)
    }
}

impl MapPosition {
    #[must_use]
    pub const fn at(focal: Position) -> Self {
        Self { focal }
    }

    #[must_use]
    pub const fn focal(&self) -> Position {
        self.focal
    }

    /// Adopts `found` if present. An address without coordinates never resets
    /// the map. Returns whether the focal point moved.
    pub fn observe(&mut self, found: Option<Position>) -> bool {
        match found {
            Some(position) if position != self.focal => {
                self.focal = position;
                true
            }
            _ => false,
        }
    }

    /// Moves to `to` only while still parked on the old default `from`.
    pub fn rebase(&mut self, from: Position, to: Position) -> bool {
        if self.focal == from && from != to {
            self.focal = to;
            true
        } else {
            false
        }
    }
}

/// Reads `lat`/`lng` from the query part of a navigable address.
///
/// Accepts absolute URLs as well as bare paths such as `/app/cities/3?lat=1&lng=2`.
/// A missing or unparseable pair is treated as absent.
#[must_use]
pub fn position_from_address(address: &str) -> Option<Position> {
    let (_, rest) = address.split_once('?')?;
    let query = rest.split_once('#').map_or(rest, |(query, _)| query);

    let mut lat = None;
    let mut lng = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "lat" if lat.is_none() => lat = Some(value.into_owned()),
            "lng" if lng.is_none() => lng = Some(value.into_owned()),
            _ => {}
        }
    }

    Position::from_params(lat.as_deref(), lng.as_deref())?.ok()
}
