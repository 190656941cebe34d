use weather_dashboard_core::{ForecastDay, GeoLocation, WeatherReport, WeatherSnapshot};

pub fn print_report(report: &WeatherReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", format_report(report));
    }
    Ok(())
}

pub fn format_report(report: &WeatherReport) -> String {
    let mut out = format_current(&report.current);

    if !report.forecast.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}-day forecast\n", report.forecast.len()));
        for day in &report.forecast {
            out.push_str(&format_forecast_day(day));
            out.push('\n');
        }
    }

    out
}

fn format_current(s: &WeatherSnapshot) -> String {
    let place = if s.country.is_empty() {
        s.location.clone()
    } else {
        format!("{}, {}", s.location, s.country)
    };

    format!(
        "{place}\n  {}°C  {} [{}]  feels like {}°C\n  \
         humidity {}%  wind {} km/h  visibility {} km  pressure {} hPa  UV {}\n",
        s.temperature,
        s.condition,
        s.icon,
        s.feels_like,
        s.humidity,
        s.wind_speed,
        s.visibility,
        s.pressure,
        s.uv_index,
    )
}

fn format_forecast_day(d: &ForecastDay) -> String {
    format!(
        "  {:<10} {}  {:>3}° / {:>3}°  {:<20} [{}]  {}%  {} km/h",
        d.day,
        d.date.format("%Y-%m-%d"),
        d.high,
        d.low,
        d.condition,
        d.icon,
        d.humidity,
        d.wind_speed,
    )
}

pub fn format_geolocation(g: &GeoLocation) -> String {
    match &g.state {
        Some(state) => format!("{}, {}, {}  ({:.4}, {:.4})", g.name, state, g.country, g.lat, g.lon),
        None => format!("{}, {}  ({:.4}, {:.4})", g.name, g.country, g.lat, g.lon),
    }
}
