//! Forecast summaries for status emails and console output.

use frostwatch_weather::HourlyReading;

use crate::alert::format_degrees;

const SHORT_WINDOW_HOURS: usize = 48;
const SNAPSHOT_STEP_HOURS: usize = 6;
const TONIGHT_WINDOW_HOURS: usize = 24;

/// Used by test alerts when the forecast has no usable current reading.
pub const DEFAULT_CURRENT_F: f64 = 45.0;
pub const DEFAULT_TONIGHT_LOW_F: f64 = 38.0;

/// Lowest reported temperatures over the next 48 hours and the whole forecast.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForecastLows {
    pub low_48h: Option<f64>,
    pub low_7d: Option<f64>,
}

fn min_reported<'a>(readings: impl Iterator<Item = &'a HourlyReading>) -> Option<f64> {
    readings
        .filter_map(HourlyReading::fahrenheit)
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |m| m.min(t))))
}

/// Hours without a temperature are ignored rather than defaulted.
pub fn forecast_lows(readings: &[HourlyReading]) -> ForecastLows {
    ForecastLows {
        low_48h: min_reported(readings.iter().take(SHORT_WINDOW_HOURS)),
        low_7d: min_reported(readings.iter()),
    }
}

/// One line of the 48-hour console summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotLine {
    pub label: String,
    pub temperature: Option<f64>,
}

impl std::fmt::Display for SnapshotLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.temperature {
            Some(t) => write!(f, "  {}: {}°F", self.label, format_degrees(t)),
            None => write!(f, "  {}: N/A°F", self.label),
        }
    }
}

/// Every sixth hour of the next 48.
pub fn snapshot(readings: &[HourlyReading]) -> Vec<SnapshotLine> {
    readings
        .iter()
        .take(SHORT_WINDOW_HOURS)
        .enumerate()
        .step_by(SNAPSHOT_STEP_HOURS)
        .map(|(i, reading)| {
            let label = if !reading.start_time.is_empty() {
                reading.start_time.clone()
            } else {
                reading
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Hour {}", i))
            };
            SnapshotLine {
                label,
                temperature: reading.fahrenheit(),
            }
        })
        .collect()
}

/// Current temperature and the low over the next 24 hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConditions {
    pub current: f64,
    pub tonight_low: f64,
}

pub fn current_conditions(readings: &[HourlyReading]) -> CurrentConditions {
    CurrentConditions {
        current: readings
            .first()
            .and_then(HourlyReading::fahrenheit)
            .unwrap_or(DEFAULT_CURRENT_F),
        tonight_low: min_reported(readings.iter().take(TONIGHT_WINDOW_HOURS))
            .unwrap_or(DEFAULT_TONIGHT_LOW_F),
    }
}
