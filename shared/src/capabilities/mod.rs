//! Effects the core asks the shell to perform.
//!
//! Both capabilities are stock Crux ones: HTTP for the city resource and the
//! geocoder, Render to tell the shell a fresh view model is ready.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

// The derive names each `Effect` variant after the capability type, so the
// fields spell out `Http`/`Render` rather than going through aliases.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
}
