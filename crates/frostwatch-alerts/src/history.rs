//! Alert history and its persistence.
//!
//! The history document records which frosts have already been announced
//! so repeated runs do not resend them. It is loaded once per run, updated
//! by the analyzer and written back by the caller.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use frostwatch_core::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timestamp::parse_timestamp;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertHistory {
    /// Start time of the first frost that was announced this season
    #[serde(default)]
    pub first_frost_alerted: Option<String>,

    #[serde(default)]
    pub second_frost_alerted: Option<String>,

    /// `{start_time}_{duration_hours}` keys of announced extended freezes
    #[serde(default)]
    pub extended_freeze_alerts: Vec<String>,
}

fn is_recorded(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

impl AlertHistory {
    pub fn first_frost_recorded(&self) -> bool {
        is_recorded(&self.first_frost_alerted)
    }

    pub fn second_frost_recorded(&self) -> bool {
        is_recorded(&self.second_frost_alerted)
    }

    pub fn has_extended_alert(&self, key: &str) -> bool {
        self.extended_freeze_alerts.iter().any(|k| k == key)
    }

    /// Drop extended freeze keys that started at or before `cutoff`.
    ///
    /// Keys whose start time cannot be parsed are kept. Returns the number
    /// of keys removed.
    pub fn prune_extended_alerts(&mut self, cutoff: DateTime<Utc>, tz: Tz) -> usize {
        let before = self.extended_freeze_alerts.len();

        self.extended_freeze_alerts.retain(|key| {
            let start = key.rsplit_once('_').map_or(key.as_str(), |(start, _)| start);
            match parse_timestamp(start, tz) {
                Some(started) => started > cutoff,
                None => {
                    if !key.is_empty() {
                        tracing::warn!("Keeping extended freeze key with unreadable time: {}", key);
                    }
                    true
                }
            }
        });

        before - self.extended_freeze_alerts.len()
    }
}

/// Errors from loading or saving alert history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        AppError::Service(err.to_string())
    }
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Where alert history lives between runs.
pub trait HistoryStore {
    /// Load the stored history, or an empty one if nothing was saved yet.
    fn load(&self) -> HistoryResult<AlertHistory>;

    fn save(&self, history: &AlertHistory) -> HistoryResult<()>;
}

/// Store for a run against the history file at `path`.
///
/// A dry run reads the file once into a [`MemoryStore`], so the run's
/// updates are discarded and the file is never written.
pub fn open_history_store(
    path: impl Into<PathBuf>,
    dry_run: bool,
) -> HistoryResult<Box<dyn HistoryStore>> {
    let file = JsonFileStore::new(path);
    if dry_run {
        tracing::debug!("Dry run: history at {} is read-only", file.path().display());
        return Ok(Box::new(MemoryStore::new(file.load()?)));
    }
    Ok(Box::new(file))
}

/// History kept as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> HistoryResult<AlertHistory> {
        if !self.path.exists() {
            tracing::info!("No alert history at {}, starting fresh", self.path.display());
            return Ok(AlertHistory::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if contents.trim().is_empty() {
            return Ok(AlertHistory::default());
        }

        serde_json::from_str(&contents).map_err(|source| HistoryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, history: &AlertHistory) -> HistoryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let contents = serde_json::to_string_pretty(history).map_err(HistoryError::Encode)?;

        // Write then rename so an interrupted run never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!("Saved alert history to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<AlertHistory>,
}

impl MemoryStore {
    pub fn new(history: AlertHistory) -> Self {
        Self {
            inner: Mutex::new(history),
        }
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> HistoryResult<AlertHistory> {
        self.inner
            .lock()
            .map(|h| h.clone())
            .map_err(|e| HistoryError::Unavailable(e.to_string()))
    }

    fn save(&self, history: &AlertHistory) -> HistoryResult<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| HistoryError::Unavailable(e.to_string()))?;
        *guard = history.clone();
        Ok(())
    }
}
