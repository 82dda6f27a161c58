//! Synthetic five-day outlook derived from the current temperature.

use chrono::Weekday;
use rand::Rng;

use crate::model::ForecastDay;

pub const FORECAST_DAYS: [Weekday; 5] =
    [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];

pub const FORECAST_ICONS: [&str; 5] = ["01d", "02d", "03d", "04d", "10d"];

/// Largest deviation from the base temperature, in degrees.
pub const MAX_OFFSET_C: f64 = 3.0;

/// Build a fresh outlook around `base_temperature`.
///
/// Each day gets `base + U[-3, 3]` rounded to a whole degree and an icon drawn
/// uniformly from [`FORECAST_ICONS`]. Without a usable base temperature the
/// icons are still drawn but every temperature is `None`.
pub fn synthesize<R: Rng + ?Sized>(base_temperature: Option<f64>, rng: &mut R) -> Vec<ForecastDay> {
    let base = base_temperature.filter(|t| t.is_finite());

    FORECAST_DAYS
        .iter()
        .map(|&day| {
            let offset = rng.random_range(-MAX_OFFSET_C..=MAX_OFFSET_C);
            let icon = FORECAST_ICONS[rng.random_range(0..FORECAST_ICONS.len())];

            ForecastDay {
                day,
                temperature_c: base.map(|t| (t + offset).round() as i32),
                icon: icon.to_string(),
            }
        })
        .collect()
}
