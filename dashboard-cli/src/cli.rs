use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::debug;
use weather_dashboard_core::{
    Config, Coordinates, Dashboard, DashboardState, FixedLocation, LocationSource, NoLocation,
    OpenWeatherClient, WeatherError, WeatherReport,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-dashboard",
    version,
    about = "Current conditions and a 5-day forecast from OpenWeatherMap"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and the default city.
    Configure,

    /// Show weather for a city.
    Show {
        /// City name; the configured default city when absent.
        city: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show weather for the current position.
    Here {
        /// Latitude in decimal degrees.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Place name resolved to coordinates through the geocoding API.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        place: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List places matching a name.
    Geocode {
        /// Free-text place name, e.g. "Springfield, US".
        query: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        debug!(base_url = config.base_url(), "configuration loaded");

        match self.command {
            Command::Configure => configure(config),
            Command::Show { city, json } => {
                let dashboard = dashboard_for(&config)?;
                let outcome = match city {
                    Some(city) => dashboard.search_city(&city).await,
                    None => dashboard
                        .mount()
                        .await
                        .ok_or_else(|| anyhow!("Default city was already loaded"))?,
                };
                present(dashboard.state(), outcome, json)
            }
            Command::Here {
                lat,
                lon,
                place,
                json,
            } => {
                let client = OpenWeatherClient::from_config(&config)?;
                let source: Box<dyn LocationSource> = match (lat, lon, place) {
                    (Some(lat), Some(lon), _) => {
                        Box::new(FixedLocation(Coordinates::new(lat, lon)))
                    }
                    (_, _, Some(place)) => {
                        let hit = client.resolve_city(&place).await?;
                        debug!(name = %hit.name, country = %hit.country, "place resolved");
                        Box::new(FixedLocation(hit.coordinates()))
                    }
                    _ => Box::new(NoLocation),
                };

                let dashboard = Dashboard::new(client, config.default_city());
                let outcome = dashboard.search_location(source.as_ref()).await;
                present(dashboard.state(), outcome, json)
            }
            Command::Geocode { query } => {
                let client = OpenWeatherClient::from_config(&config)?;
                let hits = client.geocode(&query).await?;
                if hits.is_empty() {
                    return Err(WeatherError::LocationNotFound.into());
                }

                for hit in &hits {
                    println!("{}", render::format_geolocation(hit));
                }
                Ok(())
            }
        }
    }
}

fn dashboard_for(config: &Config) -> anyhow::Result<Dashboard<OpenWeatherClient>> {
    let client = OpenWeatherClient::from_config(config)?;
    Ok(Dashboard::new(client, config.default_city()))
}

/// Render whatever the dashboard ended up showing.
fn present(
    state: DashboardState,
    outcome: Result<WeatherReport, WeatherError>,
    json: bool,
) -> anyhow::Result<()> {
    match state {
        DashboardState::Success(report) => render::print_report(&report, json),
        DashboardState::Error(message) => bail!(message),
        DashboardState::Idle | DashboardState::Loading => {
            // Rejected before any request was issued, e.g. a blank city.
            outcome?;
            Ok(())
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let default_city = Text::new("Default city:")
        .with_default(config.default_city())
        .prompt()
        .context("Failed to read default city")?;

    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }
    if !default_city.trim().is_empty() {
        config.set_default_city(default_city.trim().to_string());
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    if let Some(hint) = missing_key_hint(&config) {
        println!("{hint}");
    }
    Ok(())
}

fn missing_key_hint(config: &Config) -> Option<&'static str> {
    if config.is_api_key_configured() {
        None
    } else {
        Some("No API key stored; requests use the placeholder key and will be rejected.")
    }
}
