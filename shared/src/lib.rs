// lib.rs - Travel log shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod event;
pub mod geocode;
pub mod model;
pub mod position;
pub mod store;

pub use app::{App, DraftView, Model, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use config::AppConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{ApiError, ErrorKind};
pub use event::Event;
pub use model::{City, CityId, DraftCity, Position};
pub use store::{CitiesState, CityAction};
