use crate::model::{IconCategory, WeatherSnapshot};

/// Current conditions as reported by the provider, in provider units
/// (°C, m/s, metres). Built from the wire format by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCurrentWeather {
    pub name: String,
    pub country: String,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub pressure: i32,
    pub wind_speed_mps: f64,
    pub visibility_m: f64,
    pub description: String,
    pub icon_code: String,
}

/// Round half away from zero and narrow to `i32`.
pub fn round_i32(value: f64) -> i32 {
    value.round() as i32
}

/// m/s → km/h, rounded.
pub fn mps_to_kmh(speed_mps: f64) -> i32 {
    round_i32(speed_mps * 3.6)
}

pub fn normalize_current(raw: &RawCurrentWeather) -> WeatherSnapshot {
    WeatherSnapshot {
        location: raw.name.clone(),
        country: raw.country.clone(),
        temperature: round_i32(raw.temp),
        condition: raw.description.clone(),
        humidity: raw.humidity,
        wind_speed: mps_to_kmh(raw.wind_speed_mps),
        visibility: round_i32(raw.visibility_m / 1000.0),
        pressure: raw.pressure,
        icon: IconCategory::from_provider_code(&raw.icon_code),
        feels_like: round_i32(raw.feels_like),
        uv_index: 0,
    }
}
