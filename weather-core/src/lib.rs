//! Client-side state engine for the `weather` app.
//!
//! This crate defines:
//! - The application state and the engine that mutates it
//! - The lookup interface to the weather proxy backend
//! - The synthetic outlook, lookup history and clock source
//! - Configuration handling
//!
//! It is used by `weather-cli`, but any renderer can drive an [`Engine`] and
//! read its [`AppState`].

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod history;
pub mod model;
pub mod provider;

pub use clock::ClockSource;
pub use config::Config;
pub use engine::{Engine, StaleResponses, Update};
pub use error::LookupError;
pub use history::History;
pub use model::{AppState, ForecastDay, LookupStatus, WeatherSnapshot};
pub use provider::{WeatherProvider, backend::BackendProvider};
