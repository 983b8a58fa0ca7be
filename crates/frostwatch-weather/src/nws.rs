//! National Weather Service (`api.weather.gov`) hourly forecast client.
//!
//! Two requests: `/points/{lat},{lon}` resolves the grid office and hands
//! back the `forecastHourly` URL, which is then fetched for its periods.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::retry::{with_retry, RetryConfig};
use crate::types::{HourlyReading, Temperature, WeatherError};

const PROVIDER: &str = "NWS";

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    #[serde(rename = "forecastHourly")]
    forecast_hourly: String,
}

#[derive(Debug, Deserialize)]
struct HourlyForecastResponse {
    properties: HourlyForecastProperties,
}

#[derive(Debug, Deserialize)]
struct HourlyForecastProperties {
    #[serde(default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
struct Period {
    #[serde(rename = "startTime", default)]
    start_time: String,
    #[serde(default)]
    temperature: Temperature,
    #[serde(rename = "temperatureUnit", default)]
    temperature_unit: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<Period> for HourlyReading {
    fn from(period: Period) -> Self {
        Self {
            start_time: period.start_time,
            temperature: period.temperature,
            temperature_unit: period.temperature_unit,
            name: period.name.filter(|n| !n.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NwsClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl NwsClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the hourly forecast periods for a coordinate, in provider order.
    #[instrument(skip(self), level = "info")]
    pub async fn hourly_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<HourlyReading>, WeatherError> {
        let point_url = format!("{}/points/{},{}", self.base_url, latitude, longitude);
        let point: PointResponse = self.get_json(&point_url).await?;

        debug!("NWS hourly forecast URL: {}", point.properties.forecast_hourly);

        let forecast: HourlyForecastResponse =
            self.get_json(&point.properties.forecast_hourly).await?;

        let readings: Vec<HourlyReading> = forecast
            .properties
            .periods
            .into_iter()
            .map(HourlyReading::from)
            .collect();

        if readings.is_empty() {
            return Err(WeatherError::Empty(PROVIDER));
        }

        debug!("Got {} hourly periods from NWS", readings.len());
        Ok(readings)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        let response = with_retry(&self.retry, || {
            self.client
                .get(url)
                .header("Accept", "application/geo+json")
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("NWS response from {}: {}", url, e)))
    }
}
