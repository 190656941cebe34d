//! Error taxonomy shared by the client and the dashboard.
//!
//! Every failure that reaches the presentation layer is a [`WeatherError`];
//! its `Display` output is the message shown to the user.

use thiserror::Error;

use crate::location::LocationError;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Invalid API key. Please check your OpenWeatherMap API key.")]
    InvalidApiKey,

    #[error("City not found. Please check the spelling and try again.")]
    CityNotFound,

    #[error("API rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Any other non-success status, carrying the HTTP status text.
    #[error("Weather service error: {0}")]
    Service(String),

    /// No response at all (DNS, connect, timeout, broken body).
    #[error("Failed to fetch weather data. Please try again.")]
    Network(#[from] reqwest::Error),

    #[error("Failed to read weather data from the provider.")]
    Parse(#[from] serde_json::Error),

    /// Geocoding returned an empty result set.
    #[error("Location not found")]
    LocationNotFound,

    #[error("Geolocation is not supported on this device.")]
    GeolocationUnsupported,

    #[error("Unable to retrieve your location. Please search for a city instead.")]
    Location(#[source] LocationError),

    #[error("Please enter a city name.")]
    EmptyQuery,
}

impl WeatherError {
    /// Whether re-issuing the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Network(_) | Self::Service(_))
    }
}

impl From<LocationError> for WeatherError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::Unsupported => Self::GeolocationUnsupported,
            other => Self::Location(other),
        }
    }
}
