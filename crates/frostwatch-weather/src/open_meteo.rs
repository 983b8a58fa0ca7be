//! Open-Meteo fallback provider. No API key; returns parallel `time` and
//! `temperature_2m` arrays already in °F and in local time.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::retry::{with_retry, RetryConfig};
use crate::types::{HourlyReading, Temperature, WeatherError};

const PROVIDER: &str = "Open-Meteo";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    timezone: String,
    forecast_days: u32,
    retry: RetryConfig,
}

impl OpenMeteoClient {
    pub fn new(
        base_url: &str,
        timezone: &str,
        forecast_days: u32,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timezone: timezone.to_string(),
            forecast_days,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Maximum number of hourly readings returned.
    pub fn max_hours(&self) -> usize {
        self.forecast_days as usize * 24
    }

    #[instrument(skip(self), level = "info")]
    pub async fn hourly_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<HourlyReading>, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let forecast_days = self.forecast_days.to_string();
        let query = [
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("hourly", "temperature_2m"),
            ("temperature_unit", "fahrenheit"),
            ("timezone", self.timezone.as_str()),
            ("forecast_days", forecast_days.as_str()),
        ];

        let response = with_retry(&self.retry, || self.client.get(&url).query(&query).send()).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let data: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("Open-Meteo response: {}", e)))?;

        let readings: Vec<HourlyReading> = data
            .hourly
            .time
            .into_iter()
            .zip(data.hourly.temperature_2m)
            .take(self.max_hours())
            .enumerate()
            .map(|(i, (time, temp))| HourlyReading {
                start_time: time,
                temperature: temp.map_or(Temperature::Missing, Temperature::Degrees),
                temperature_unit: Some("F".to_string()),
                name: Some(format!("Hour {}", i + 1)),
            })
            .collect();

        if readings.is_empty() {
            return Err(WeatherError::Empty(PROVIDER));
        }

        debug!("Got {} hourly readings from Open-Meteo", readings.len());
        Ok(readings)
    }
}
