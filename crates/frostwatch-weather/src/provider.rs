use std::time::Duration;

use frostwatch_core::{LocationConfig, WeatherConfig};

use crate::nws::NwsClient;
use crate::open_meteo::OpenMeteoClient;
use crate::retry::RetryConfig;
use crate::types::{HourlyReading, WeatherError};

/// Which provider produced a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastSource {
    Nws,
    OpenMeteo,
}

impl std::fmt::Display for ForecastSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastSource::Nws => write!(f, "National Weather Service"),
            ForecastSource::OpenMeteo => write!(f, "Open-Meteo"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Forecast {
    pub source: ForecastSource,
    pub readings: Vec<HourlyReading>,
}

/// NWS first, Open-Meteo when NWS fails or returns nothing.
#[derive(Debug, Clone)]
pub struct ForecastProvider {
    nws: NwsClient,
    open_meteo: OpenMeteoClient,
    latitude: f64,
    longitude: f64,
}

impl ForecastProvider {
    pub fn new(weather: &WeatherConfig, location: &LocationConfig) -> Result<Self, WeatherError> {
        let timeout = Duration::from_secs(weather.timeout_secs);

        Ok(Self {
            nws: NwsClient::new(&weather.nws_base_url, &weather.user_agent, timeout)?,
            open_meteo: OpenMeteoClient::new(
                &weather.open_meteo_base_url,
                &location.timezone,
                weather.forecast_days,
                timeout,
            )?,
            latitude: location.latitude,
            longitude: location.longitude,
        })
    }

    pub fn with_retry_config(self, retry: RetryConfig) -> Self {
        Self {
            nws: self.nws.with_retry_config(retry.clone()),
            open_meteo: self.open_meteo.with_retry_config(retry),
            ..self
        }
    }

    pub async fn fetch(&self) -> Result<Forecast, WeatherError> {
        let primary = match self.nws.hourly_forecast(self.latitude, self.longitude).await {
            Ok(readings) => {
                return Ok(Forecast {
                    source: ForecastSource::Nws,
                    readings,
                })
            }
            Err(e) => e,
        };

        tracing::warn!("Error fetching NWS forecast, falling back to Open-Meteo: {}", primary);

        match self
            .open_meteo
            .hourly_forecast(self.latitude, self.longitude)
            .await
        {
            Ok(readings) => Ok(Forecast {
                source: ForecastSource::OpenMeteo,
                readings,
            }),
            Err(fallback) => {
                tracing::error!("Error fetching Open-Meteo forecast: {}", fallback);
                Err(WeatherError::Unavailable {
                    primary: primary.to_string(),
                    fallback: fallback.to_string(),
                })
            }
        }
    }
}
