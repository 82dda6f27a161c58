use chrono::{DateTime, Local, Weekday};
use serde::{Deserialize, Serialize};

use crate::history::History;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Result of a successful lookup.
///
/// Everything is optional: the backend payload is read defensively and a
/// missing field is rendered as missing rather than failing the lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: Option<String>,
    pub country: Option<String>,
    pub temperature_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_mps: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub condition: Option<String>,
    pub icon: Option<String>,
}

impl WeatherSnapshot {
    /// Image URL for the condition icon, if the payload carried one.
    pub fn icon_url(&self) -> Option<String> {
        self.icon.as_deref().map(icon_url)
    }
}

/// Image URL for an icon identifier such as `"01d"`.
pub fn icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}.png")
}

/// One entry of the synthetic outlook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: Weekday,
    /// `None` when the snapshot that spawned this outlook had no temperature.
    pub temperature_c: Option<i32>,
    pub icon: String,
}

/// Lifecycle of the single outstanding lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum LookupStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded(WeatherSnapshot),
    Failed(String),
}

impl LookupStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, LookupStatus::InFlight)
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            LookupStatus::Succeeded(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LookupStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Everything the renderer is allowed to see.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    pub status: LookupStatus,
    pub forecast: Vec<ForecastDay>,
    pub history: History,
    pub clock: DateTime<Local>,
    pub dark_mode: bool,
    /// Current value of the query input field.
    pub input: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            status: LookupStatus::Idle,
            forecast: Vec::new(),
            history: History::new(),
            clock: Local::now(),
            dark_mode: false,
            input: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_url_uses_openweather_image_path() {
        let snapshot = WeatherSnapshot { icon: Some("01d".into()), ..Default::default() };
        assert_eq!(
            snapshot.icon_url().as_deref(),
            Some("https://openweathermap.org/img/wn/01d.png")
        );
        assert_eq!(WeatherSnapshot::default().icon_url(), None);
    }

    #[test]
    fn status_accessors() {
        let status = LookupStatus::Failed("City not found".into());
        assert_eq!(status.error(), Some("City not found"));
        assert!(status.snapshot().is_none());
        assert!(LookupStatus::InFlight.is_in_flight());
        assert!(!LookupStatus::Idle.is_in_flight());
    }
}
