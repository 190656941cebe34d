//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeatherMap client and its error taxonomy
//! - Normalization of current conditions and daily forecast aggregation
//! - The fetch orchestration whose state the presentation layer renders
//!
//! It is used by the `weather-dashboard` binary, but any other front end can
//! drive a [`Dashboard`] the same way.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod location;
pub mod model;
pub mod normalize;
pub mod provider;

pub use config::Config;
pub use dashboard::{Dashboard, DashboardState};
pub use error::WeatherError;
pub use forecast::{RawForecastSample, aggregate_forecast};
pub use location::{FixedLocation, LocationError, LocationSource, NoLocation};
pub use model::{
    Coordinates, ForecastDay, GeoLocation, IconCategory, WeatherReport, WeatherSnapshot,
};
pub use normalize::{RawCurrentWeather, normalize_current};
pub use provider::{OpenWeatherClient, WeatherProvider};
