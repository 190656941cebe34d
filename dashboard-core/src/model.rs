use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Small set of icon buckets the presentation layer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IconCategory {
    #[default]
    Sunny,
    ClearNight,
    PartlyCloudy,
    PartlyCloudyNight,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Foggy,
}

impl IconCategory {
    /// Map an OpenWeatherMap icon code (e.g. `"10d"`) to a category.
    /// Codes outside the known table fall back to `Sunny`.
    pub fn from_provider_code(code: &str) -> Self {
        match code {
            "01d" => Self::Sunny,
            "01n" => Self::ClearNight,
            "02d" => Self::PartlyCloudy,
            "02n" => Self::PartlyCloudyNight,
            "03d" | "03n" | "04d" | "04n" => Self::Cloudy,
            "09d" | "09n" | "10d" | "10n" => Self::Rainy,
            "11d" | "11n" => Self::Stormy,
            "13d" | "13n" => Self::Snowy,
            "50d" | "50n" => Self::Foggy,
            _ => Self::Sunny,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::ClearNight => "clear-night",
            Self::PartlyCloudy => "partly-cloudy",
            Self::PartlyCloudyNight => "partly-cloudy-night",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Stormy => "stormy",
            Self::Foggy => "foggy",
        }
    }
}

impl std::fmt::Display for IconCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time current conditions, already converted to display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub location: String,
    pub country: String,
    /// °C
    pub temperature: i32,
    pub condition: String,
    /// Percent, 0..=100.
    pub humidity: u8,
    /// km/h
    pub wind_speed: i32,
    /// km
    pub visibility: i32,
    /// hPa
    pub pressure: i32,
    pub icon: IconCategory,
    /// °C
    pub feels_like: i32,
    /// No upstream source yet, always 0.
    pub uv_index: i32,
}

/// One calendar day of forecast, summarised from the provider's 3-hourly samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// "Today", "Tomorrow" or the weekday name.
    pub day: String,
    pub high: i32,
    pub low: i32,
    pub condition: String,
    pub icon: IconCategory,
    pub humidity: u8,
    pub wind_speed: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A single hit from the provider's direct geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
}

impl GeoLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Everything the dashboard shows after a successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: WeatherSnapshot,
    pub forecast: Vec<ForecastDay>,
}
