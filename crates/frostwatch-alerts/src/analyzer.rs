//! Freeze event detection and classification.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use frostwatch_weather::ForecastSample;
use serde::Serialize;

use crate::alert::{Alert, AlertKind};
use crate::history::{AlertHistory, HistoryResult, HistoryStore};
use crate::timestamp::whole_days_between;

/// Samples at or below this temperature (°F) are freezing.
pub const FREEZING_POINT_F: f64 = 32.0;

/// Extended freeze keys older than this are dropped from history.
pub const EXTENDED_ALERT_RETENTION_DAYS: i64 = 14;

/// A maximal run of consecutive freezing samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreezeEvent {
    pub start_time: String,
    pub duration_hours: u32,
    pub min_temp: f64,
}

impl FreezeEvent {
    /// More than one consecutive freezing hour
    pub fn is_extended(&self) -> bool {
        self.duration_hours > 1
    }

    /// History key identifying this event: `{start_time}_{duration_hours}`
    pub fn alert_key(&self) -> String {
        format!("{}_{}", self.start_time, self.duration_hours)
    }
}

fn is_freezing(sample: &ForecastSample) -> bool {
    sample.temperature <= FREEZING_POINT_F
}

/// Group consecutive freezing samples into events, in forecast order.
///
/// Each sample belongs to at most one event; the cursor skips past a run
/// once it has been measured.
pub fn find_freeze_events(samples: &[ForecastSample]) -> Vec<FreezeEvent> {
    let mut events = Vec::new();
    let mut i = 0;

    while i < samples.len() {
        if !is_freezing(&samples[i]) {
            i += 1;
            continue;
        }

        let run_len = samples[i..].iter().take_while(|s| is_freezing(s)).count();
        let min_temp = samples[i..i + run_len]
            .iter()
            .map(|s| s.temperature)
            .fold(f64::INFINITY, f64::min);

        events.push(FreezeEvent {
            start_time: samples[i].timestamp.clone(),
            duration_hours: run_len as u32,
            min_temp,
        });

        i += run_len;
    }

    events
}

/// Result of one analyzer pass.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub events: Vec<FreezeEvent>,
    /// Alerts to send, in emission order
    pub alerts: Vec<Alert>,
    /// History updated with everything alerted in this pass
    pub history: AlertHistory,
}

struct Candidates<'a> {
    first_frost: Option<&'a FreezeEvent>,
    second_frost: Option<&'a FreezeEvent>,
    extended: Vec<&'a FreezeEvent>,
}

#[derive(Debug, Clone, Copy)]
pub struct FreezeAnalyzer {
    tz: Tz,
}

impl FreezeAnalyzer {
    /// `tz` places timestamps that carry no UTC offset.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn analyze(
        &self,
        samples: &[ForecastSample],
        mut history: AlertHistory,
        now: DateTime<Utc>,
    ) -> Analysis {
        let events = find_freeze_events(samples);
        let candidates = self.classify(&events);
        let mut alerts = Vec::new();

        if let Some(event) = candidates.first_frost {
            if !history.first_frost_recorded() {
                alerts.push(Alert::for_event(AlertKind::FirstFrost, event));
                history.first_frost_alerted = Some(event.start_time.clone());
            }
        }

        if let Some(event) = candidates.second_frost {
            if !history.second_frost_recorded() {
                alerts.push(Alert::for_event(AlertKind::SecondFrost, event));
                history.second_frost_alerted = Some(event.start_time.clone());
            }
        }

        for event in candidates.extended {
            let key = event.alert_key();
            if history.has_extended_alert(&key) {
                tracing::debug!("Extended freeze {} already alerted", key);
                continue;
            }
            alerts.push(Alert::for_event(AlertKind::ExtendedFreeze, event));
            history.extended_freeze_alerts.push(key);
        }

        let cutoff = now - Duration::days(EXTENDED_ALERT_RETENTION_DAYS);
        let pruned = history.prune_extended_alerts(cutoff, self.tz);
        if pruned > 0 {
            tracing::info!("Pruned {} extended freeze alert(s) older than {}", pruned, cutoff);
        }

        tracing::info!(
            "Found {} freeze event(s), {} new alert(s)",
            events.len(),
            alerts.len()
        );

        Analysis {
            events,
            alerts,
            history,
        }
    }

    /// Load history from `store`, analyze, and save the result back
    /// before returning, so history is persisted ahead of any delivery.
    pub fn analyze_with_store(
        &self,
        samples: &[ForecastSample],
        store: &dyn HistoryStore,
        now: DateTime<Utc>,
    ) -> HistoryResult<Analysis> {
        let history = store.load()?;
        let analysis = self.analyze(samples, history, now);
        store.save(&analysis.history)?;
        Ok(analysis)
    }

    fn classify<'a>(&self, events: &'a [FreezeEvent]) -> Candidates<'a> {
        let first_frost = events.first();
        let second_frost = first_frost.and_then(|first| {
            events[1..]
                .iter()
                .find(|event| self.is_later_day(first, event))
        });
        let extended = events.iter().filter(|e| e.is_extended()).collect();

        Candidates {
            first_frost,
            second_frost,
            extended,
        }
    }

    /// Whole days between the two starts is at least one. Offset-free
    /// times compare on the wall clock; unparseable or mixed timestamps
    /// count as a later day.
    fn is_later_day(&self, first: &FreezeEvent, candidate: &FreezeEvent) -> bool {
        match whole_days_between(&first.start_time, &candidate.start_time) {
            Some(days) => days >= 1,
            None => {
                tracing::warn!(
                    "Could not compare frost times {:?} and {:?}; treating as second frost",
                    first.start_time,
                    candidate.start_time
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{open_history_store, HistoryError, JsonFileStore};
    use chrono::TimeZone;
    use chrono_tz::America::Los_Angeles;

    fn analyzer() -> FreezeAnalyzer {
        FreezeAnalyzer::new(Los_Angeles)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap()
    }

    /// Hourly samples starting at 2025-11-01T00:00 Pacific.
    fn hourly(temps: &[f64]) -> Vec<ForecastSample> {
        hourly_from(0, temps)
    }

    fn hourly_from(start_hour: i64, temps: &[f64]) -> Vec<ForecastSample> {
        let base = Los_Angeles.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        temps
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let ts = base + Duration::hours(start_hour + i as i64);
                ForecastSample::new(ts.to_rfc3339(), *t)
            })
            .collect()
    }

    fn kinds(analysis: &Analysis) -> Vec<AlertKind> {
        analysis.alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_no_freezing_samples() {
        let samples = hourly(&[45.0, 40.0, 33.0, 32.1, 50.0]);
        assert!(find_freeze_events(&samples).is_empty());

        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert!(analysis.alerts.is_empty());
        assert_eq!(analysis.history, AlertHistory::default());
    }

    #[test]
    fn test_empty_forecast() {
        assert!(find_freeze_events(&[]).is_empty());
    }

    #[test]
    fn test_isolated_freezing_hour() {
        let samples = hourly(&[36.0, 31.0, 35.0]);
        let events = find_freeze_events(&samples);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration_hours, 1);
        assert_eq!(events[0].min_temp, 31.0);
        assert_eq!(events[0].start_time, samples[1].timestamp);
        assert!(!events[0].is_extended());

        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(kinds(&analysis), vec![AlertKind::FirstFrost]);
    }

    #[test]
    fn test_two_consecutive_freezing_hours_are_extended() {
        let samples = hourly(&[40.0, 30.0, 29.0, 40.0]);
        let events = find_freeze_events(&samples);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration_hours, 2);
        assert_eq!(events[0].min_temp, 29.0);
        assert!(events[0].is_extended());

        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&analysis),
            vec![AlertKind::FirstFrost, AlertKind::ExtendedFreeze]
        );
        assert_eq!(
            analysis.history.extended_freeze_alerts,
            vec![format!("{}_2", samples[1].timestamp)]
        );
    }

    #[test]
    fn test_exactly_freezing_counts() {
        let events = find_freeze_events(&hourly(&[32.0]));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_same_day_runs_have_no_second_frost() {
        let samples = hourly(&[32.0, 32.0, 40.0, 30.0, 30.0, 30.0]);
        let events = find_freeze_events(&samples);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start_time, samples[0].timestamp);
        assert_eq!(events[0].duration_hours, 2);
        assert_eq!(events[1].start_time, samples[3].timestamp);
        assert_eq!(events[1].duration_hours, 3);

        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&analysis),
            vec![
                AlertKind::FirstFrost,
                AlertKind::ExtendedFreeze,
                AlertKind::ExtendedFreeze
            ]
        );
        assert!(analysis.history.second_frost_alerted.is_none());
    }

    #[test]
    fn test_whole_day_comparison() {
        // 23 hours apart: not a later day
        let mut samples = hourly(&[30.0, 40.0]);
        samples.extend(hourly_from(23, &[31.0]));
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert!(analysis.history.second_frost_alerted.is_none());

        // 24 hours apart: second frost
        let mut samples = hourly(&[30.0, 40.0]);
        samples.extend(hourly_from(24, &[31.0]));
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&analysis),
            vec![AlertKind::FirstFrost, AlertKind::SecondFrost]
        );
        assert_eq!(
            analysis.history.second_frost_alerted.as_deref(),
            Some(samples[2].timestamp.as_str())
        );
    }

    #[test]
    fn test_second_frost_skips_same_day_runs() {
        let mut samples = hourly(&[30.0, 40.0, 31.0, 40.0]);
        samples.extend(hourly_from(30, &[29.0]));
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());

        let second = analysis
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::SecondFrost)
            .unwrap();
        assert_eq!(second.event.start_time, samples[4].timestamp);
        assert_eq!(second.event.min_temp, 29.0);
    }

    #[test]
    fn test_malformed_timestamp_qualifies_as_second_frost() {
        let samples = vec![
            ForecastSample::new("2025-11-01T03:00:00-07:00", 30.0),
            ForecastSample::new("2025-11-01T04:00:00-07:00", 40.0),
            ForecastSample::new("sometime later", 31.0),
        ];
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&analysis),
            vec![AlertKind::FirstFrost, AlertKind::SecondFrost]
        );
    }

    #[test]
    fn test_naive_local_timestamps() {
        let samples = vec![
            ForecastSample::new("2025-11-01T02:00", 31.0),
            ForecastSample::new("2025-11-01T03:00", 30.0),
            ForecastSample::new("2025-11-01T04:00", 36.0),
            ForecastSample::new("2025-11-02T02:00", 28.0),
        ];
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&analysis),
            vec![
                AlertKind::FirstFrost,
                AlertKind::SecondFrost,
                AlertKind::ExtendedFreeze
            ]
        );
        assert_eq!(
            analysis.history.extended_freeze_alerts,
            vec!["2025-11-01T02:00_2".to_string()]
        );
    }

    #[test]
    fn test_local_times_ignore_fall_back_hour() {
        // 23.5 hours on the wall clock even though 24.5 hours elapse
        let samples = vec![
            ForecastSample::new("2025-11-01T05:00", 30.0),
            ForecastSample::new("2025-11-01T06:00", 40.0),
            ForecastSample::new("2025-11-02T04:30", 31.0),
        ];
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(kinds(&analysis), vec![AlertKind::FirstFrost]);
        assert!(analysis.history.second_frost_alerted.is_none());
    }

    #[test]
    fn test_local_times_ignore_spring_forward_hour() {
        // 24 hours on the wall clock even though only 23 elapse
        let samples = vec![
            ForecastSample::new("2025-03-08T03:00", 30.0),
            ForecastSample::new("2025-03-08T04:00", 40.0),
            ForecastSample::new("2025-03-09T03:00", 31.0),
        ];
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&analysis),
            vec![AlertKind::FirstFrost, AlertKind::SecondFrost]
        );
    }

    #[test]
    fn test_mixed_local_and_offset_times_qualify() {
        let samples = vec![
            ForecastSample::new("2025-11-01T05:00", 30.0),
            ForecastSample::new("2025-11-01T06:00", 40.0),
            ForecastSample::new("2025-11-01T07:00:00-07:00", 31.0),
        ];
        let analysis = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&analysis),
            vec![AlertKind::FirstFrost, AlertKind::SecondFrost]
        );
    }

    #[test]
    fn test_store_round_trip_persists_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alert_history.json");
        let store = open_history_store(&path, false).unwrap();
        let samples = hourly(&[30.0, 29.0, 40.0]);

        let first = analyzer()
            .analyze_with_store(&samples, store.as_ref(), now())
            .unwrap();
        assert_eq!(
            kinds(&first),
            vec![AlertKind::FirstFrost, AlertKind::ExtendedFreeze]
        );
        assert_eq!(JsonFileStore::new(&path).load().unwrap(), first.history);

        let second = analyzer()
            .analyze_with_store(&samples, store.as_ref(), now())
            .unwrap();
        assert!(second.alerts.is_empty());
    }

    #[test]
    fn test_dry_run_leaves_history_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alert_history.json");
        JsonFileStore::new(&path)
            .save(&AlertHistory::default())
            .unwrap();
        let before = std::fs::read(&path).unwrap();

        let store = open_history_store(&path, true).unwrap();
        let analysis = analyzer()
            .analyze_with_store(&hourly(&[30.0, 29.0, 40.0]), store.as_ref(), now())
            .unwrap();

        assert_eq!(analysis.alerts.len(), 2);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_store_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alert_history.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = open_history_store(&path, false).unwrap();
        let result = analyzer().analyze_with_store(&hourly(&[30.0]), store.as_ref(), now());

        assert!(matches!(result, Err(HistoryError::Parse { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let mut samples = hourly(&[30.0, 29.0, 40.0]);
        samples.extend(hourly_from(30, &[28.0, 27.0, 26.0]));

        let first = analyzer().analyze(&samples, AlertHistory::default(), now());
        assert_eq!(
            kinds(&first),
            vec![
                AlertKind::FirstFrost,
                AlertKind::SecondFrost,
                AlertKind::ExtendedFreeze,
                AlertKind::ExtendedFreeze
            ]
        );

        let second = analyzer().analyze(&samples, first.history.clone(), now());
        assert!(second.alerts.is_empty());
        assert_eq!(second.history, first.history);
    }

    #[test]
    fn test_recorded_frosts_are_never_reset() {
        let history = AlertHistory {
            first_frost_alerted: Some("2025-10-20T05:00:00-07:00".to_string()),
            second_frost_alerted: None,
            extended_freeze_alerts: vec![],
        };
        let analysis = analyzer().analyze(&hourly(&[45.0, 46.0]), history, now());
        assert_eq!(
            analysis.history.first_frost_alerted.as_deref(),
            Some("2025-10-20T05:00:00-07:00")
        );
    }

    #[test]
    fn test_first_frost_already_alerted_still_allows_second() {
        let history = AlertHistory {
            first_frost_alerted: Some("2025-10-20T05:00:00-07:00".to_string()),
            ..AlertHistory::default()
        };
        let mut samples = hourly(&[30.0, 40.0]);
        samples.extend(hourly_from(26, &[31.0]));

        let analysis = analyzer().analyze(&samples, history, now());
        assert_eq!(kinds(&analysis), vec![AlertKind::SecondFrost]);
        assert_eq!(
            analysis.history.first_frost_alerted.as_deref(),
            Some("2025-10-20T05:00:00-07:00")
        );
    }

    #[test]
    fn test_changed_duration_is_a_new_extended_alert() {
        let samples = hourly(&[30.0, 30.0, 40.0]);
        let first = analyzer().analyze(&samples, AlertHistory::default(), now());

        let longer = hourly(&[30.0, 30.0, 30.0, 40.0]);
        let second = analyzer().analyze(&longer, first.history, now());

        assert_eq!(kinds(&second), vec![AlertKind::ExtendedFreeze]);
        assert_eq!(second.history.extended_freeze_alerts.len(), 2);
    }

    #[test]
    fn test_prunes_old_extended_keys() {
        let now = now();
        let fifteen_days = (now - Duration::days(15)).with_timezone(&Los_Angeles);
        let thirteen_days = (now - Duration::days(13)).with_timezone(&Los_Angeles);
        let old_key = format!("{}_4", fifteen_days.to_rfc3339());
        let recent_key = format!("{}_3", thirteen_days.to_rfc3339());

        let history = AlertHistory {
            extended_freeze_alerts: vec![old_key, recent_key.clone()],
            ..AlertHistory::default()
        };

        let analysis = analyzer().analyze(&hourly(&[50.0]), history, now);
        assert_eq!(analysis.history.extended_freeze_alerts, vec![recent_key]);
    }
}
