//! Forecast retrieval for frostwatch
//!
//! Fetches hourly temperatures from the National Weather Service, falling
//! back to Open-Meteo, and normalizes both payloads into [`HourlyReading`]s.

pub mod nws;
pub mod open_meteo;
pub mod provider;
pub mod retry;
pub mod types;

pub use nws::NwsClient;
pub use open_meteo::OpenMeteoClient;
pub use provider::{Forecast, ForecastProvider, ForecastSource};
pub use retry::RetryConfig;
pub use types::*;
