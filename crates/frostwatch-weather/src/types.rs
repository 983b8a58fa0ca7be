use frostwatch_core::{AppError, NetworkError, ReqwestErrorExt};
use serde::Deserialize;

/// Temperature assigned to readings whose value is missing or unreadable.
/// Chosen well above freezing so such hours never start or extend a freeze.
pub const NON_FREEZING_DEFAULT_F: f64 = 100.0;

/// A temperature as reported by a provider.
///
/// NWS hourly periods carry a bare number in most responses but a
/// `QuantitativeValue` object (`{"value": .., "unitCode": ..}`) in others.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum Temperature {
    Degrees(f64),
    Quantity {
        value: Option<f64>,
        unit_code: Option<String>,
    },
    #[default]
    Missing,
}

impl From<serde_json::Value> for Temperature {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Degrees),
            serde_json::Value::String(s) => {
                s.trim().parse::<f64>().map_or(Self::Missing, Self::Degrees)
            }
            serde_json::Value::Object(obj) => Self::Quantity {
                value: obj.get("value").and_then(|v| v.as_f64()),
                unit_code: obj
                    .get("unitCode")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            },
            _ => Self::Missing,
        }
    }
}

fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

fn is_celsius(unit: &str) -> bool {
    unit.eq_ignore_ascii_case("C") || unit.ends_with("degC")
}

impl Temperature {
    /// Value in °F, or `None` when the provider gave nothing usable.
    ///
    /// `unit_hint` is the period-level unit (`"F"` / `"C"`); a unit code on
    /// a quantity takes precedence over it.
    pub fn fahrenheit(&self, unit_hint: Option<&str>) -> Option<f64> {
        let (value, unit) = match self {
            Self::Degrees(v) => (*v, unit_hint),
            Self::Quantity { value, unit_code } => (
                (*value)?,
                unit_code.as_deref().or(unit_hint),
            ),
            Self::Missing => return None,
        };

        if !value.is_finite() {
            return None;
        }

        Some(match unit {
            Some(u) if is_celsius(u) => celsius_to_fahrenheit(value),
            _ => value,
        })
    }
}

/// One hour of forecast, as returned by either provider.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyReading {
    /// ISO-8601 start of the hour, verbatim from the provider
    pub start_time: String,
    pub temperature: Temperature,
    pub temperature_unit: Option<String>,
    /// Period label (NWS often leaves this empty for hourly data)
    pub name: Option<String>,
}

impl HourlyReading {
    pub fn fahrenheit(&self) -> Option<f64> {
        self.temperature.fahrenheit(self.temperature_unit.as_deref())
    }
}

/// A normalized (time, temperature) pair fed to the freeze analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub timestamp: String,
    /// °F; missing values are already replaced by [`NON_FREEZING_DEFAULT_F`]
    pub temperature: f64,
}

impl ForecastSample {
    pub fn new(timestamp: impl Into<String>, temperature: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            temperature,
        }
    }
}

impl From<&HourlyReading> for ForecastSample {
    fn from(reading: &HourlyReading) -> Self {
        Self {
            timestamp: reading.start_time.clone(),
            temperature: reading.fahrenheit().unwrap_or(NON_FREEZING_DEFAULT_F),
        }
    }
}

/// Normalize provider readings into analyzer samples, preserving order.
pub fn to_samples(readings: &[HourlyReading]) -> Vec<ForecastSample> {
    readings.iter().map(ForecastSample::from).collect()
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0} returned no forecast periods")]
    Empty(&'static str),

    #[error("All forecast providers failed (primary: {primary}; fallback: {fallback})")]
    Unavailable { primary: String, fallback: String },
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.into_network_error())
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Network(e) => AppError::Network(e),
            other => AppError::Service(other.to_string()),
        }
    }
}
