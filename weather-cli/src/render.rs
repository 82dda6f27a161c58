//! Plain-text rendering of engine state. Pure functions of `AppState`.

use std::fmt::Write;

use weather_core::{AppState, ForecastDay, LookupStatus, WeatherSnapshot};

const MISSING: &str = "--";

pub fn render_state(state: &AppState) -> String {
    let mut out = String::new();

    match &state.status {
        LookupStatus::Idle => {
            out.push_str("Search for any city to get started.\n");
        }
        LookupStatus::InFlight => {
            out.push_str("Loading...\n");
        }
        LookupStatus::Failed(reason) => {
            let _ = writeln!(out, "Error: {reason}");
        }
        LookupStatus::Succeeded(snapshot) => {
            render_snapshot(&mut out, snapshot);
        }
    }

    if !state.forecast.is_empty() {
        out.push_str("\n5-Day Forecast\n");
        for day in &state.forecast {
            render_day(&mut out, day);
        }
    }

    if !state.history.is_empty() {
        out.push('\n');
        out.push_str(&render_history(state));
    }

    out
}

/// One-line header with clock and theme, used as the interactive prompt.
pub fn render_header(state: &AppState) -> String {
    let theme = if state.dark_mode { "dark" } else { "light" };
    format!("[{} | {theme}]", state.clock.format("%a %d %b %H:%M:%S"))
}

pub fn render_history(state: &AppState) -> String {
    let mut out = String::from("Recent Searches\n");
    for (i, city) in state.history.entries().iter().enumerate() {
        let _ = writeln!(out, "  {}. {city}", i + 1);
    }
    out
}

fn render_snapshot(out: &mut String, snapshot: &WeatherSnapshot) {
    let name = snapshot.location_name.as_deref().unwrap_or(MISSING);
    match &snapshot.country {
        Some(country) => {
            let _ = writeln!(out, "{name}, {country}");
        }
        None => {
            let _ = writeln!(out, "{name}");
        }
    }

    let _ = writeln!(
        out,
        "  {}°C (feels like {}°C), {}",
        number(snapshot.temperature_c),
        number(snapshot.feels_like_c),
        snapshot.condition.as_deref().unwrap_or(MISSING),
    );
    let _ = writeln!(
        out,
        "  Humidity {}%  Wind {} m/s  Pressure {} hPa",
        number(snapshot.humidity_pct),
        number(snapshot.wind_speed_mps),
        number(snapshot.pressure_hpa),
    );

    if let Some(url) = snapshot.icon_url() {
        let _ = writeln!(out, "  Icon: {url}");
    }
}

fn render_day(out: &mut String, day: &ForecastDay) {
    let temp = day.temperature_c.map_or_else(|| MISSING.to_string(), |t| t.to_string());
    let _ = writeln!(out, "  {}  {temp:>3}°C  {}", day.day, day.icon);
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{}", v.round()))
}
