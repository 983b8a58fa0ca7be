//! Time-of-day gate for scheduled runs.
//!
//! The job is triggered hourly by an external scheduler but should only
//! check and mail at the configured local hours.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Run,
    /// Outside the window but forced by flag or environment
    Forced,
    Skip { local_time: String },
}

impl GateDecision {
    pub fn should_run(&self) -> bool {
        !matches!(self, GateDecision::Skip { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleGate {
    tz: Tz,
    hours: Vec<u32>,
}

impl ScheduleGate {
    pub fn new(tz: Tz, hours: Vec<u32>) -> Self {
        Self { tz, hours }
    }

    pub fn check(&self, now: DateTime<Utc>, force: bool) -> GateDecision {
        let local = now.with_timezone(&self.tz);
        if self.hours.contains(&local.hour()) {
            GateDecision::Run
        } else if force {
            GateDecision::Forced
        } else {
            GateDecision::Skip {
                local_time: format_local(now, self.tz),
            }
        }
    }

    /// e.g. `6 AM/6 PM` for the default window
    pub fn describe_hours(&self) -> String {
        self.hours
            .iter()
            .map(|h| match h {
                0 => "12 AM".to_string(),
                1..=11 => format!("{} AM", h),
                12 => "12 PM".to_string(),
                _ => format!("{} PM", h - 12),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// `FORCE_RUN=1` in the environment forces a run like `--force` does.
pub fn force_from_env(value: Option<&str>) -> bool {
    value.map(str::trim) == Some("1")
}

/// Local timestamp as shown in emails and console output, e.g. `11/02 06:00AM PST`.
pub fn format_local(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%m/%d %I:%M%p %Z").to_string()
}
