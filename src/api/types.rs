//! Records exchanged with the activity-recognition service.
//!
//! Wire structs mirror the JSON bodies exactly; the domain records the rest of
//! the crate works with are produced from them and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label the service reports when it has not classified anything yet.
pub const WAITING_LABEL: &str = "Waiting for data...";

/// Activity classification reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Activity {
    Walking,
    Running,
    Idle,
    /// Placeholder sent before the first prediction exists.
    Waiting,
    /// Any label the client has no mapping for (kept verbatim for display).
    Unknown(String),
}

impl Activity {
    /// The label as the service spells it.
    pub fn label(&self) -> &str {
        match self {
            Activity::Walking => "Walking",
            Activity::Running => "Running",
            Activity::Idle => "Idle",
            Activity::Waiting => WAITING_LABEL,
            Activity::Unknown(label) => label,
        }
    }
}

impl From<String> for Activity {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Walking" => Activity::Walking,
            "Running" => Activity::Running,
            "Idle" => Activity::Idle,
            WAITING_LABEL => Activity::Waiting,
            _ => Activity::Unknown(label),
        }
    }
}

impl From<&str> for Activity {
    fn from(label: &str) -> Self {
        Activity::from(label.to_string())
    }
}

impl From<Activity> for String {
    fn from(activity: Activity) -> Self {
        match activity {
            Activity::Unknown(label) => label,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single classification produced by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub activity: Activity,
    /// Model confidence in `[0, 1]`
    pub confidence: f64,
    /// ISO-8601-like timestamp, passed through as received
    pub timestamp: String,
}

impl Prediction {
    pub fn new(activity: impl Into<Activity>, confidence: f64, timestamp: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            confidence,
            timestamp: timestamp.into(),
        }
    }
}

/// Aggregate counts over every stored prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_records: u64,
    pub walking_count: u64,
    pub running_count: u64,
    pub idle_count: u64,
    pub calibrating_count: Option<u64>,
}

/// Lookback windows the history screen offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum HistoryWindow {
    OneHour,
    SixHours,
    #[default]
    OneDay,
    OneWeek,
}

impl HistoryWindow {
    pub const ALL: [HistoryWindow; 4] = [
        HistoryWindow::OneHour,
        HistoryWindow::SixHours,
        HistoryWindow::OneDay,
        HistoryWindow::OneWeek,
    ];

    pub fn hours(self) -> u32 {
        match self {
            HistoryWindow::OneHour => 1,
            HistoryWindow::SixHours => 6,
            HistoryWindow::OneDay => 24,
            HistoryWindow::OneWeek => 168,
        }
    }

    pub fn from_hours(hours: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.hours() == hours)
    }
}

impl TryFrom<u32> for HistoryWindow {
    type Error = String;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        Self::from_hours(hours)
            .ok_or_else(|| format!("unsupported history window: {hours}h (expected 1, 6, 24 or 168)"))
    }
}

impl From<HistoryWindow> for u32 {
    fn from(window: HistoryWindow) -> Self {
        window.hours()
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryWindow::OneWeek => write!(f, "1 week"),
            HistoryWindow::OneHour => write!(f, "1 hour"),
            other => write!(f, "{} hours", other.hours()),
        }
    }
}

/// Parameters of one history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub window: HistoryWindow,
    pub limit: u32,
}

impl HistoryQuery {
    /// Row cap the history screen always asks for.
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn new(window: HistoryWindow) -> Self {
        Self {
            window,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Query-string pairs for `/api/history`.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("hours", self.window.hours().to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Records returned for a window, in server order (newest first).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryResult {
    pub records: Vec<Prediction>,
    /// Per-activity counts over the whole window, when the service sends them
    pub statistics: BTreeMap<String, u64>,
}

impl HistoryResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Body of `GET /api/realtime`.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeResponse {
    pub status: String,
    pub activity: Activity,
    pub confidence: f64,
    #[serde(default)]
    pub source: Option<String>,
    pub timestamp: String,
}

impl From<RealtimeResponse> for Prediction {
    fn from(response: RealtimeResponse) -> Self {
        Prediction {
            activity: response.activity,
            confidence: response.confidence,
            timestamp: response.timestamp,
        }
    }
}

/// Body of `GET /api/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub status: String,
    pub total_records: u64,
    pub walking_count: u64,
    pub running_count: u64,
    pub idle_count: u64,
    #[serde(default)]
    pub calibrating_count: Option<u64>,
}

impl From<StatsResponse> for StatsSnapshot {
    fn from(response: StatsResponse) -> Self {
        StatsSnapshot {
            total_records: response.total_records,
            walking_count: response.walking_count,
            running_count: response.running_count,
            idle_count: response.idle_count,
            calibrating_count: response.calibrating_count,
        }
    }
}

/// Body of `GET /api/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub records: Vec<Prediction>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_records: Option<u64>,
    #[serde(default)]
    pub statistics: BTreeMap<String, u64>,
}

impl From<HistoryResponse> for HistoryResult {
    fn from(response: HistoryResponse) -> Self {
        HistoryResult {
            records: response.records,
            statistics: response.statistics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_labels_round_trip_through_serde() {
        let parsed: Vec<Activity> =
            serde_json::from_str(r#"["Walking","Running","Idle","Waiting for data...","Calibrating"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                Activity::Walking,
                Activity::Running,
                Activity::Idle,
                Activity::Waiting,
                Activity::Unknown("Calibrating".to_string()),
            ]
        );
        assert_eq!(serde_json::to_string(&parsed[4]).unwrap(), r#""Calibrating""#);
    }

    #[test]
    fn test_history_window_hours() {
        assert_eq!(HistoryWindow::from_hours(6), Some(HistoryWindow::SixHours));
        assert_eq!(HistoryWindow::from_hours(168), Some(HistoryWindow::OneWeek));
        assert_eq!(HistoryWindow::from_hours(12), None);
        assert!(HistoryWindow::try_from(0).is_err());
        assert_eq!(HistoryWindow::default().hours(), 24);
    }

    #[test]
    fn test_history_query_params() {
        let query = HistoryQuery::new(HistoryWindow::OneHour);
        assert_eq!(
            query.params(),
            vec![("hours", "1".to_string()), ("limit", "100".to_string())]
        );
        assert_eq!(query.with_limit(5).limit, 5);
    }

    #[test]
    fn test_stats_response_without_calibrating() {
        let body = r#"{"status":"success","total_records":10,"walking_count":4,"running_count":3,"idle_count":3}"#;
        let stats: StatsSnapshot = serde_json::from_str::<StatsResponse>(body).unwrap().into();
        assert_eq!(stats.total_records, 10);
        assert_eq!(stats.calibrating_count, None);
    }
}
