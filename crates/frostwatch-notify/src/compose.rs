use frostwatch_alerts::{Alert, ForecastLows};

/// A rendered email, plus the alerts it carries for console fallback.
#[derive(Debug, Clone)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub alerts: Vec<Alert>,
}

impl Notification {
    /// Build the message for a run.
    ///
    /// With alerts, each becomes a `TAG` line followed by its message. With
    /// none, the body is a status update quoting the forecast lows when
    /// `lows` is given. Both end with the location and local send time.
    pub fn compose(
        alerts: Vec<Alert>,
        lows: Option<&ForecastLows>,
        location_name: &str,
        local_time: &str,
    ) -> Self {
        let mut lines: Vec<String> = Vec::new();

        if alerts.is_empty() {
            lines.push("No freeze detected".to_string());
            lines.push(String::new());
            if let Some(lows) = lows {
                if let Some(low) = lows.low_48h {
                    lines.push(format!("48hr low: {:.0}F", low));
                }
                if let Some(low) = lows.low_7d {
                    lines.push(format!("7day low: {:.0}F", low));
                }
            }
        } else {
            for (i, alert) in alerts.iter().enumerate() {
                if i > 0 {
                    lines.push(String::new());
                }
                lines.push(alert.label());
                lines.push(alert.message.clone());
            }
        }

        if lines.last().is_some_and(|l| !l.is_empty()) {
            lines.push(String::new());
        }
        lines.push(location_name.to_string());
        lines.push(local_time.to_string());

        Self {
            subject: subject_for(&alerts, location_name),
            body: lines.join("\n"),
            alerts,
        }
    }

    /// Console rendering of the alerts, used when mail cannot be sent.
    pub fn alerts_as_text(&self) -> String {
        self.alerts
            .iter()
            .map(|a| format!("\n{}:\n{}", a.label(), a.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn subject_for(alerts: &[Alert], location_name: &str) -> String {
    if alerts.is_empty() {
        return format!("Freeze status: {}", location_name);
    }

    let labels: Vec<String> = alerts.iter().map(Alert::label).collect();
    format!("Freeze alert: {}", labels.join(", "))
}
