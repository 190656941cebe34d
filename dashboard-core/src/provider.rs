use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::{Coordinates, ForecastDay, WeatherSnapshot},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// What the dashboard needs from a weather backend.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;

    async fn current_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherSnapshot, WeatherError>;

    async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastDay>, WeatherError>;
}

/// Map a non-success provider status onto the error taxonomy.
pub fn classify_status(status: StatusCode) -> WeatherError {
    match status {
        StatusCode::UNAUTHORIZED => WeatherError::InvalidApiKey,
        StatusCode::NOT_FOUND => WeatherError::CityNotFound,
        StatusCode::TOO_MANY_REQUESTS => WeatherError::RateLimited,
        other => WeatherError::Service(
            other
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| other.as_str().to_string()),
        ),
    }
}
