//! Simulated alerts for checking the mail path end to end.
//!
//! Uses real current conditions from the forecast so the test email looks
//! like a real one, with fixed made-up freeze events.

use std::str::FromStr;

use crate::alert::{Alert, AlertKind};
use crate::analyzer::FreezeEvent;
use crate::summary::CurrentConditions;

pub const VALID_TEST_MODES: &str = "frost1, frost2, extended_freeze, all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    Frost1,
    Frost2,
    ExtendedFreeze,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid test mode: {0}")]
pub struct UnknownTestMode(pub String);

impl FromStr for TestMode {
    type Err = UnknownTestMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "frost1" => Ok(Self::Frost1),
            "frost2" => Ok(Self::Frost2),
            "extended_freeze" => Ok(Self::ExtendedFreeze),
            "all" => Ok(Self::All),
            _ => Err(UnknownTestMode(s.to_string())),
        }
    }
}

impl TestMode {
    fn includes(self, kind: AlertKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Frost1, AlertKind::FirstFrost)
                | (Self::Frost2, AlertKind::SecondFrost)
                | (Self::ExtendedFreeze, AlertKind::ExtendedFreeze)
        )
    }
}

struct Scenario {
    kind: AlertKind,
    heading: &'static str,
    noun: &'static str,
    min_temp: f64,
    duration_hours: u32,
}

const SCENARIOS: [Scenario; 3] = [
    Scenario {
        kind: AlertKind::FirstFrost,
        heading: "First frost",
        noun: "frost",
        min_temp: 28.0,
        duration_hours: 3,
    },
    Scenario {
        kind: AlertKind::SecondFrost,
        heading: "Second frost",
        noun: "frost",
        min_temp: 30.0,
        duration_hours: 2,
    },
    Scenario {
        kind: AlertKind::ExtendedFreeze,
        heading: "Extended freeze",
        noun: "freeze",
        min_temp: 25.0,
        duration_hours: 6,
    },
];

pub fn simulate_alerts(mode: TestMode, conditions: &CurrentConditions) -> Vec<Alert> {
    SCENARIOS
        .iter()
        .filter(|s| mode.includes(s.kind))
        .map(|s| {
            let message = format!(
                "TEST ALERT - {}\nCurrent: {:.0}F\nTonight low: {:.0}F\nSimulated {}: {}F\nDuration: {}hrs",
                s.heading,
                conditions.current,
                conditions.tonight_low,
                s.noun,
                s.min_temp,
                s.duration_hours
            );
            let event = FreezeEvent {
                start_time: "TEST".to_string(),
                duration_hours: s.duration_hours,
                min_temp: s.min_temp,
            };
            Alert::simulated(s.kind, message, event)
        })
        .collect()
}
