//! Freeze detection and alert bookkeeping.
//!
//! [`FreezeAnalyzer`] scans an hourly forecast for runs of sub-freezing
//! hours, decides which of them warrant a notification given the
//! [`AlertHistory`], and hands back the updated history for persistence
//! through a [`HistoryStore`].

pub mod alert;
pub mod analyzer;
pub mod history;
pub mod schedule;
pub mod simulate;
pub mod summary;
pub mod timestamp;

pub use alert::{Alert, AlertKind};
pub use analyzer::{find_freeze_events, Analysis, FreezeAnalyzer, FreezeEvent};
pub use history::{
    open_history_store, AlertHistory, HistoryError, HistoryStore, JsonFileStore, MemoryStore,
};
pub use schedule::{GateDecision, ScheduleGate};
pub use simulate::{simulate_alerts, TestMode, UnknownTestMode};
pub use summary::{current_conditions, forecast_lows, snapshot, CurrentConditions, ForecastLows};
