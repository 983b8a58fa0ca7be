use serde::Serialize;

use crate::analyzer::FreezeEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    FirstFrost,
    SecondFrost,
    ExtendedFreeze,
}

impl AlertKind {
    /// Tag used as the email heading, e.g. `FIRST FROST`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::FirstFrost => "FIRST FROST",
            Self::SecondFrost => "SECOND FROST",
            Self::ExtendedFreeze => "EXTENDED FREEZE",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::FirstFrost => "First frost warning",
            Self::SecondFrost => "Second frost warning",
            Self::ExtendedFreeze => "Extended freeze",
        }
    }
}

/// A notification to deliver, tied to the freeze event that caused it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    /// Produced by a test-mode run rather than the real forecast
    pub simulated: bool,
    pub message: String,
    pub event: FreezeEvent,
}

impl Alert {
    pub fn for_event(kind: AlertKind, event: &FreezeEvent) -> Self {
        let message = format!(
            "{}\n{}\nLow: {}F\nDuration: {}hrs",
            kind.title(),
            event.start_time,
            format_degrees(event.min_temp),
            event.duration_hours
        );

        Self {
            kind,
            simulated: false,
            message,
            event: event.clone(),
        }
    }

    pub fn simulated(kind: AlertKind, message: String, event: FreezeEvent) -> Self {
        Self {
            kind,
            simulated: true,
            message,
            event,
        }
    }

    /// `FIRST FROST`, or `TEST FIRST FROST` for simulated alerts
    pub fn label(&self) -> String {
        if self.simulated {
            format!("TEST {}", self.kind.tag())
        } else {
            self.kind.tag().to_string()
        }
    }
}

/// Whole degrees print without a fraction; converted values keep one decimal.
pub fn format_degrees(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format!("{}", rounded)
}
