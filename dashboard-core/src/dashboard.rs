//! Fetch orchestration behind the dashboard view.
//!
//! [`Dashboard`] owns the only piece of mutable state in the system, the
//! [`DashboardState`] the presentation layer renders. It is published through
//! a `tokio::sync::watch` channel, so views can either poll [`Dashboard::state`]
//! or await changes on a [`Dashboard::subscribe`] receiver.
//!
//! Every fetch is tagged with a request id. When searches overlap, only the
//! most recently issued one may write the state; older results are still
//! returned to their callers but otherwise dropped.

use std::{
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};

use tokio::{sync::watch, time::timeout};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::WeatherError,
    location::{LOCATION_TIMEOUT, LocationError, LocationSource},
    model::WeatherReport,
    provider::WeatherProvider,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DashboardState {
    #[default]
    Idle,
    Loading,
    Success(WeatherReport),
    /// User-facing message of the failure.
    Error(String),
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            Self::Success(report) => Some(report),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Dashboard<P> {
    provider: P,
    state: watch::Sender<DashboardState>,
    latest_request: AtomicU64,
    mounted: AtomicBool,
    default_city: String,
    location_timeout: Duration,
}

impl<P: WeatherProvider> Dashboard<P> {
    pub fn new(provider: P, default_city: impl Into<String>) -> Self {
        let (state, _) = watch::channel(DashboardState::Idle);

        Self {
            provider,
            state,
            latest_request: AtomicU64::new(0),
            mounted: AtomicBool::new(false),
            default_city: default_city.into(),
            location_timeout: LOCATION_TIMEOUT,
        }
    }

    pub fn with_location_timeout(mut self, location_timeout: Duration) -> Self {
        self.location_timeout = location_timeout;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Look up the default city. Only the first call does anything; later
    /// calls return `None`.
    pub async fn mount(&self) -> Option<Result<WeatherReport, WeatherError>> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            debug!("dashboard already mounted");
            return None;
        }

        info!(city = %self.default_city, "loading default city");
        Some(self.search_city(&self.default_city).await)
    }

    /// Fetch current conditions and the forecast for `city` concurrently.
    /// Either request failing fails the whole search.
    #[instrument(skip(self))]
    pub async fn search_city(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::EmptyQuery);
        }

        let request = self.begin();
        let result = self.fetch_city(city).await;
        self.finish(request, &result);
        result
    }

    /// Resolve the device position, then fetch current conditions by
    /// coordinates, then the forecast for the place name that came back.
    #[instrument(skip_all)]
    pub async fn search_location(
        &self,
        source: &dyn LocationSource,
    ) -> Result<WeatherReport, WeatherError> {
        let request = self.begin();
        let result = self.fetch_location(source).await;
        self.finish(request, &result);
        result
    }

    /// Drop a displayed error. Any other state is left alone.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, DashboardState::Error(_)) {
                *state = DashboardState::Idle;
                true
            } else {
                false
            }
        });
    }

    async fn fetch_city(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let (current, forecast) = tokio::try_join!(
            self.provider.current_by_city(city),
            self.provider.forecast_by_city(city)
        )?;

        Ok(WeatherReport { current, forecast })
    }

    async fn fetch_location(
        &self,
        source: &dyn LocationSource,
    ) -> Result<WeatherReport, WeatherError> {
        let coords = match timeout(self.location_timeout, source.current_position()).await {
            Ok(position) => position?,
            Err(_) => return Err(LocationError::Timeout.into()),
        };
        debug!(lat = coords.latitude, lon = coords.longitude, "resolved device position");

        let current = self.provider.current_by_coordinates(coords).await?;
        let forecast = self.provider.forecast_by_city(&current.location).await?;

        Ok(WeatherReport { current, forecast })
    }

    fn begin(&self) -> u64 {
        let request = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(DashboardState::Loading);
        request
    }

    fn finish(&self, request: u64, result: &Result<WeatherReport, WeatherError>) {
        let latest = self.latest_request.load(Ordering::SeqCst);
        if request != latest {
            debug!(request, latest, "discarding stale response");
            return;
        }

        let next = match result {
            Ok(report) => DashboardState::Success(report.clone()),
            Err(err) => {
                warn!(error = %err, "weather fetch failed");
                DashboardState::Error(err.to_string())
            }
        };
        self.state.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        location::{FixedLocation, NoLocation},
        model::{Coordinates, ForecastDay, IconCategory, WeatherSnapshot},
        provider::classify_status,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeProvider {
        current_status: Option<StatusCode>,
        forecast_status: Option<StatusCode>,
        slow_city: Option<(&'static str, Duration)>,
        coordinate_place: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn delay_for(&self, city: &str) {
            if let Some((slow, delay)) = self.slow_city {
                if slow == city {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn snapshot(location: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            location: location.to_string(),
            country: "GB".into(),
            temperature: 12,
            condition: "few clouds".into(),
            humidity: 70,
            wind_speed: 11,
            visibility: 10,
            pressure: 1015,
            icon: IconCategory::PartlyCloudy,
            feels_like: 10,
            uv_index: 0,
        }
    }

    fn forecast_day() -> ForecastDay {
        ForecastDay {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            day: "Today".into(),
            high: 14,
            low: 7,
            condition: "few clouds".into(),
            icon: IconCategory::PartlyCloudy,
            humidity: 70,
            wind_speed: 11,
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current_by_city(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
            self.record(format!("current:{city}"));
            self.delay_for(city).await;
            match self.current_status {
                Some(status) => Err(classify_status(status)),
                None => Ok(snapshot(city)),
            }
        }

        async fn current_by_coordinates(
            &self,
            coords: Coordinates,
        ) -> Result<WeatherSnapshot, WeatherError> {
            self.record(format!("coords:{},{}", coords.latitude, coords.longitude));
            match self.current_status {
                Some(status) => Err(classify_status(status)),
                None => Ok(snapshot(self.coordinate_place.unwrap_or("Somewhere"))),
            }
        }

        async fn forecast_by_city(&self, city: &str) -> Result<Vec<ForecastDay>, WeatherError> {
            self.record(format!("forecast:{city}"));
            self.delay_for(city).await;
            match self.forecast_status {
                Some(status) => Err(classify_status(status)),
                None => Ok(vec![forecast_day()]),
            }
        }
    }

    #[derive(Debug)]
    struct DeniedLocation;

    #[async_trait]
    impl LocationSource for DeniedLocation {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    #[derive(Debug)]
    struct HangingLocation;

    #[async_trait]
    impl LocationSource for HangingLocation {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Coordinates::new(0.0, 0.0))
        }
    }

    #[tokio::test]
    async fn city_search_publishes_report() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London");
        assert_eq!(dashboard.state(), DashboardState::Idle);

        let report = dashboard.search_city("  Berlin ").await.unwrap();
        assert_eq!(report.current.location, "Berlin");

        let state = dashboard.state();
        assert_eq!(state.report(), Some(&report));
        assert!(state.error_message().is_none());

        let mut calls = dashboard.provider().calls();
        calls.sort();
        assert_eq!(calls, vec!["current:Berlin", "forecast:Berlin"]);
    }

    #[tokio::test]
    async fn forecast_failure_fails_the_whole_search() {
        let provider = FakeProvider {
            forecast_status: Some(StatusCode::NOT_FOUND),
            ..Default::default()
        };
        let dashboard = Dashboard::new(provider, "London");

        let err = dashboard.search_city("Atlantis").await.unwrap_err();
        assert!(matches!(err, WeatherError::CityNotFound));

        let state = dashboard.state();
        assert!(state.report().is_none());
        assert_eq!(
            state.error_message(),
            Some("City not found. Please check the spelling and try again.")
        );
    }

    #[tokio::test]
    async fn error_replaces_previous_report() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London");
        dashboard.search_city("London").await.unwrap();
        assert!(dashboard.state().report().is_some());

        let failing = FakeProvider {
            current_status: Some(StatusCode::TOO_MANY_REQUESTS),
            ..Default::default()
        };
        let dashboard = Dashboard { provider: failing, ..dashboard };
        dashboard.search_city("London").await.unwrap_err();

        let state = dashboard.state();
        assert!(state.report().is_none());
        assert_eq!(
            state.error_message(),
            Some("API rate limit exceeded. Please try again later.")
        );
    }

    #[tokio::test]
    async fn blank_search_is_rejected_without_touching_state() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London");

        let err = dashboard.search_city("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyQuery));
        assert_eq!(dashboard.state(), DashboardState::Idle);
        assert!(dashboard.provider().calls().is_empty());
    }

    #[tokio::test]
    async fn mount_loads_default_city_once() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London");

        let first = dashboard.mount().await;
        assert!(matches!(first, Some(Ok(_))));
        assert!(dashboard.mount().await.is_none());

        let current_calls = dashboard
            .provider()
            .calls()
            .into_iter()
            .filter(|c| c == "current:London")
            .count();
        assert_eq!(current_calls, 1);
    }

    #[tokio::test]
    async fn location_search_is_sequential_and_uses_resolved_name() {
        let provider = FakeProvider {
            coordinate_place: Some("Greenwich"),
            ..Default::default()
        };
        let dashboard = Dashboard::new(provider, "London");
        let source = FixedLocation(Coordinates::new(51.48, -0.01));

        let report = dashboard.search_location(&source).await.unwrap();
        assert_eq!(report.current.location, "Greenwich");
        assert_eq!(
            dashboard.provider().calls(),
            vec!["coords:51.48,-0.01", "forecast:Greenwich"]
        );
        assert!(dashboard.state().report().is_some());
    }

    #[tokio::test]
    async fn location_search_stops_when_current_fails() {
        let provider = FakeProvider {
            current_status: Some(StatusCode::UNAUTHORIZED),
            ..Default::default()
        };
        let dashboard = Dashboard::new(provider, "London");
        let source = FixedLocation(Coordinates::new(1.0, 2.0));

        let err = dashboard.search_location(&source).await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidApiKey));
        assert_eq!(dashboard.provider().calls(), vec!["coords:1,2"]);
        assert!(dashboard.state().report().is_none());
    }

    #[tokio::test]
    async fn denied_location_reports_location_message() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London");

        dashboard.search_location(&DeniedLocation).await.unwrap_err();

        assert_eq!(
            dashboard.state().error_message(),
            Some("Unable to retrieve your location. Please search for a city instead.")
        );
        assert!(dashboard.provider().calls().is_empty());
    }

    #[tokio::test]
    async fn unsupported_location_has_its_own_message() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London");

        let err = dashboard.search_location(&NoLocation).await.unwrap_err();
        assert!(matches!(err, WeatherError::GeolocationUnsupported));
    }

    #[tokio::test]
    async fn slow_location_times_out() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London")
            .with_location_timeout(Duration::from_millis(20));

        let err = dashboard.search_location(&HangingLocation).await.unwrap_err();
        assert!(matches!(err, WeatherError::Location(LocationError::Timeout)));
        assert!(dashboard.state().error_message().is_some());
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_search() {
        let provider = FakeProvider {
            slow_city: Some(("Slow", Duration::from_millis(150))),
            ..Default::default()
        };
        let dashboard = Dashboard::new(provider, "London");

        let (slow, fast) = tokio::join!(dashboard.search_city("Slow"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            dashboard.search_city("Fast").await
        });

        assert_eq!(slow.unwrap().current.location, "Slow");
        assert_eq!(fast.unwrap().current.location, "Fast");

        let state = dashboard.state();
        assert_eq!(state.report().map(|r| r.current.location.as_str()), Some("Fast"));
    }

    #[tokio::test]
    async fn clear_error_only_resets_errors() {
        let provider = FakeProvider {
            current_status: Some(StatusCode::BAD_GATEWAY),
            ..Default::default()
        };
        let dashboard = Dashboard::new(provider, "London");
        dashboard.search_city("London").await.unwrap_err();
        assert_eq!(
            dashboard.state().error_message(),
            Some("Weather service error: Bad Gateway")
        );

        dashboard.clear_error();
        assert_eq!(dashboard.state(), DashboardState::Idle);

        let dashboard = Dashboard::new(FakeProvider::default(), "London");
        dashboard.search_city("London").await.unwrap();
        dashboard.clear_error();
        assert!(dashboard.state().report().is_some());
    }

    #[tokio::test]
    async fn subscribers_observe_the_final_state() {
        let dashboard = Dashboard::new(FakeProvider::default(), "London");
        let mut rx = dashboard.subscribe();

        dashboard.search_city("Madrid").await.unwrap();

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(
            state.report().map(|r| r.current.location.as_str()),
            Some("Madrid")
        );
    }

    #[tokio::test]
    async fn state_is_loading_while_search_is_in_flight() {
        let provider = FakeProvider {
            slow_city: Some(("Slow", Duration::from_millis(100))),
            ..Default::default()
        };
        let dashboard = Dashboard::new(provider, "London");
        dashboard.search_city("London").await.unwrap();
        assert!(dashboard.state().report().is_some());

        let (result, midflight) = tokio::join!(dashboard.search_city("Slow"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            dashboard.state()
        });

        assert!(midflight.is_loading());
        assert!(midflight.report().is_none());
        assert!(result.is_ok());
        assert!(!dashboard.state().is_loading());
    }
}
