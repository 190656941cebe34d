use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::{
    config::Config,
    error::WeatherError,
    forecast::{RawForecastSample, aggregate_forecast},
    model::{Coordinates, ForecastDay, GeoLocation, WeatherSnapshot},
    normalize::{RawCurrentWeather, normalize_current},
    provider::classify_status,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const GEOCODE_PATH: &str = "/geo/1.0/direct";

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("weather-dashboard/", env!("CARGO_PKG_VERSION"));

/// OpenWeatherMap client. Stateless apart from its credentials; no caching, no retry.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the client at another host, e.g. a mock server in tests.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        let base_url: String = base_url.into();

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        Self::with_base_url(config.api_key(), config.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one GET, classify the status, then decode the body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        debug!(%status, path, "provider responded");

        if !status.is_success() {
            warn!(%status, path, "provider request failed");
            return Err(classify_status(status));
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_current_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let parsed: OwCurrentResponse = self
            .get_json(CURRENT_PATH, &[("q", city), ("units", "metric")])
            .await?;

        Ok(normalize_current(&parsed.into()))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_current_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let parsed: OwCurrentResponse = self
            .get_json(
                CURRENT_PATH,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "metric")],
            )
            .await?;

        Ok(normalize_current(&parsed.into()))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_forecast_by_city(&self, city: &str) -> Result<Vec<ForecastDay>, WeatherError> {
        let parsed: OwForecastResponse = self
            .get_json(FORECAST_PATH, &[("q", city), ("units", "metric")])
            .await?;

        let samples: Vec<RawForecastSample> = parsed.list.into_iter().map(Into::into).collect();
        debug!(samples = samples.len(), "aggregating forecast");

        Ok(aggregate_forecast(&samples))
    }

    /// All geocoding matches for a free-text place name.
    #[instrument(skip(self), level = "debug")]
    pub async fn geocode(&self, query: &str) -> Result<Vec<GeoLocation>, WeatherError> {
        self.get_json(GEOCODE_PATH, &[("q", query)]).await
    }

    /// First geocoding match, or [`WeatherError::LocationNotFound`] when there is none.
    pub async fn resolve_city(&self, query: &str) -> Result<GeoLocation, WeatherError> {
        self.geocode(query)
            .await?
            .into_iter()
            .next()
            .ok_or(WeatherError::LocationNotFound)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: i32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    visibility: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

/// Description and icon code of the leading condition, if the provider sent one.
fn primary_condition(weather: Vec<OwWeather>) -> (String, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (w.description, w.icon))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

impl From<OwCurrentResponse> for RawCurrentWeather {
    fn from(res: OwCurrentResponse) -> Self {
        let (description, icon_code) = primary_condition(res.weather);

        RawCurrentWeather {
            name: res.name,
            country: res.sys.country,
            temp: res.main.temp,
            feels_like: res.main.feels_like,
            humidity: res.main.humidity,
            pressure: res.main.pressure,
            wind_speed_mps: res.wind.speed,
            visibility_m: res.visibility,
            description,
            icon_code,
        }
    }
}

impl From<OwForecastEntry> for RawForecastSample {
    fn from(entry: OwForecastEntry) -> Self {
        let (description, icon_code) = primary_condition(entry.weather);

        RawForecastSample {
            dt: entry.dt,
            temp_min: entry.main.temp_min,
            temp_max: entry.main.temp_max,
            humidity: entry.main.humidity,
            wind_speed_mps: entry.wind.speed,
            description,
            icon_code,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_current_by_city(city).await
    }

    async fn current_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_current_by_coordinates(coords).await
    }

    async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastDay>, WeatherError> {
        self.fetch_forecast_by_city(city).await
    }
}
