//! Daily forecast aggregation.
//!
//! The provider returns a flat list of 3-hourly samples (usually 40 of them,
//! covering five days). The dashboard shows one row per calendar day, so the
//! samples are grouped by local date and each group is summarised:
//!
//! - `high` / `low`: rounded max of interval maxima / min of interval minima
//! - `humidity`: rounded mean
//! - `wind_speed`: rounded mean in m/s converted to km/h
//! - condition and icon: taken from the sample at index `len / 2` of the group
//!
//! Only the first [`MAX_FORECAST_DAYS`] dates are kept; nothing is padded.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use tracing::warn;

use crate::{
    model::{ForecastDay, IconCategory},
    normalize::{mps_to_kmh, round_i32},
};

pub const MAX_FORECAST_DAYS: usize = 5;

/// One 3-hourly forecast record in provider units.
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastSample {
    /// Unix timestamp, seconds.
    pub dt: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub wind_speed_mps: f64,
    pub description: String,
    pub icon_code: String,
}

/// Aggregate using the local system time zone and today's local date.
pub fn aggregate_forecast(samples: &[RawForecastSample]) -> Vec<ForecastDay> {
    aggregate_forecast_in(samples, &Local, Local::now().date_naive())
}

pub fn aggregate_forecast_in<Tz: TimeZone>(
    samples: &[RawForecastSample],
    tz: &Tz,
    today: NaiveDate,
) -> Vec<ForecastDay> {
    group_by_date(samples, tz)
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(date, group)| summarize_day(date, &group, today))
        .collect()
}

/// Groups keep the order in which their date was first seen.
fn group_by_date<'a, Tz: TimeZone>(
    samples: &'a [RawForecastSample],
    tz: &Tz,
) -> Vec<(NaiveDate, Vec<&'a RawForecastSample>)> {
    let mut groups: Vec<(NaiveDate, Vec<&RawForecastSample>)> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for sample in samples {
        let Some(utc) = DateTime::from_timestamp(sample.dt, 0) else {
            warn!(dt = sample.dt, "skipping forecast sample with out-of-range timestamp");
            continue;
        };
        let date = utc.with_timezone(tz).date_naive();

        match index.get(&date) {
            Some(&i) => groups[i].1.push(sample),
            None => {
                index.insert(date, groups.len());
                groups.push((date, vec![sample]));
            }
        }
    }

    groups
}

fn summarize_day(date: NaiveDate, group: &[&RawForecastSample], today: NaiveDate) -> ForecastDay {
    let count = group.len() as f64;

    let high = group.iter().map(|s| s.temp_max).fold(f64::NEG_INFINITY, f64::max);
    let low = group.iter().map(|s| s.temp_min).fold(f64::INFINITY, f64::min);
    let humidity = group.iter().map(|s| f64::from(s.humidity)).sum::<f64>() / count;
    let wind_mps = group.iter().map(|s| s.wind_speed_mps).sum::<f64>() / count;

    // Median position, not the most frequent condition.
    let representative = group[group.len() / 2];

    ForecastDay {
        date,
        day: day_label(date, today),
        high: round_i32(high),
        low: round_i32(low),
        condition: representative.description.clone(),
        icon: IconCategory::from_provider_code(&representative.icon_code),
        humidity: humidity.round().clamp(0.0, 255.0) as u8,
        wind_speed: mps_to_kmh(wind_mps),
    }
}

/// "Today", "Tomorrow", or the full English weekday name.
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.succ_opt() == Some(date) {
        "Tomorrow".to_string()
    } else {
        date.format("%A").to_string()
    }
}
