use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the alert history document is persisted
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,

    /// Monitored location
    #[serde(default)]
    pub location: LocationConfig,

    /// Local hours at which a normal run is allowed to proceed
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Forecast provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Outbound mail settings (credentials come from the environment)
    #[serde(default)]
    pub email: EmailConfig,
}

fn default_history_path() -> PathBuf {
    PathBuf::from("alert_history.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zip_code: String,
    /// IANA zone used for the schedule gate, email timestamps and
    /// forecast times that carry no offset
    pub timezone: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: "Scotts Mills, Oregon".to_string(),
            latitude: 45.0411,
            longitude: -122.6700,
            zip_code: "97375".to_string(),
            timezone: "America/Los_Angeles".to_string(),
        }
    }
}

impl LocationConfig {
    /// Parse the configured time zone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Invalid(format!("unknown time zone: {}", self.timezone))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_scheduled_hours")]
    pub scheduled_hours: Vec<u32>,
}

fn default_scheduled_hours() -> Vec<u32> {
    vec![6, 18]
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scheduled_hours: default_scheduled_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// National Weather Service API root
    #[serde(default = "default_nws_base_url")]
    pub nws_base_url: String,

    /// Open-Meteo API root, used when NWS fails
    #[serde(default = "default_open_meteo_base_url")]
    pub open_meteo_base_url: String,

    /// NWS rejects requests without a User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

fn default_nws_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_user_agent() -> String {
    "FreezeAlert/1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_forecast_days() -> u32 {
    7
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            nws_base_url: default_nws_base_url(),
            open_meteo_base_url: default_open_meteo_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            forecast_days: default_forecast_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            location: LocationConfig::default(),
            schedule: ScheduleConfig::default(),
            weather: WeatherConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `path` is `None`. A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            let config = Self::default();
            config.save(&config_path)?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = Self::load(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.location.name.trim().is_empty() {
            result.add_warning("location.name", "Location name is empty");
        }

        if !(-90.0..=90.0).contains(&self.location.latitude) {
            result.add_error("location.latitude", "Latitude must be between -90 and 90");
        }

        if !(-180.0..=180.0).contains(&self.location.longitude) {
            result.add_error(
                "location.longitude",
                "Longitude must be between -180 and 180",
            );
        }

        if let Err(e) = self.location.tz() {
            result.add_error("location.timezone", e.to_string());
        }

        if self.schedule.scheduled_hours.is_empty() {
            result.add_warning(
                "schedule.scheduled_hours",
                "No scheduled hours - only forced runs will check the forecast",
            );
        }
        for hour in &self.schedule.scheduled_hours {
            if *hour > 23 {
                result.add_error(
                    "schedule.scheduled_hours",
                    format!("Hour {} is outside 0-23", hour),
                );
            }
        }

        self.validate_url(&self.weather.nws_base_url, "weather.nws_base_url", &mut result);
        self.validate_url(
            &self.weather.open_meteo_base_url,
            "weather.open_meteo_base_url",
            &mut result,
        );

        if self.weather.user_agent.trim().is_empty() {
            result.add_error("weather.user_agent", "User agent must not be empty");
        }

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }

        if self.weather.forecast_days == 0 || self.weather.forecast_days > 16 {
            result.add_warning(
                "weather.forecast_days",
                "Open-Meteo supports 1 to 16 forecast days",
            );
        }

        if self.email.smtp_host.trim().is_empty() {
            result.add_error("email.smtp_host", "SMTP host must not be empty");
        }

        if self.email.smtp_port == 0 {
            result.add_error("email.smtp_port", "Port cannot be 0");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create config directory")?;
            }
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `<config_dir>/frostwatch/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("frostwatch");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_default_location_is_scotts_mills() {
        let config = Config::default();
        assert_eq!(config.location.zip_code, "97375");
        assert_eq!(config.location.tz().unwrap(), chrono_tz::America::Los_Angeles);
        assert_eq!(config.schedule.scheduled_hours, vec![6, 18]);
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.nws_base_url = "ftp://api.weather.gov".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = Config::default();
        config.location.timezone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.timezone"));
    }

    #[test]
    fn test_out_of_range_coordinates_and_hours() {
        let mut config = Config::default();
        config.location.latitude = 91.0;
        config.location.longitude = -181.0;
        config.schedule.scheduled_hours = vec![6, 24];
        let result = config.validate();
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"location.latitude"));
        assert!(fields.contains(&"location.longitude"));
        assert!(fields.contains(&"schedule.scheduled_hours"));
    }

    #[test]
    fn test_empty_schedule_is_warning() {
        let mut config = Config::default();
        config.schedule.scheduled_hours.clear();
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "schedule.scheduled_hours"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.location.name, "Scotts Mills, Oregon");
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "history_path = \"/var/lib/frostwatch/history.json\"\n\n[schedule]\nscheduled_hours = [7]\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.history_path, PathBuf::from("/var/lib/frostwatch/history.json"));
        assert_eq!(config.schedule.scheduled_hours, vec![7]);
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.weather.forecast_days, 7);
    }

    #[test]
    fn test_load_validated_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.email.smtp_port = 0;
        config.save(&path).unwrap();

        let err = Config::load_validated(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("email.smtp_port"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
