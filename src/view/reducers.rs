//! Pure projections from service records to display fields.
//!
//! Nothing here can fail: unmapped activities get the default style and
//! unparseable timestamps are shown as received.

use crate::api::{Activity, HistoryResult, Prediction, StatsSnapshot};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Icon and accent color for an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityStyle {
    pub icon: &'static str,
    /// `#RRGGBB`
    pub color: &'static str,
}

pub const DEFAULT_STYLE: ActivityStyle = ActivityStyle {
    icon: "❓",
    color: "#667eea",
};

const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DISPLAY_FORMAT: &str = "%b %d, %H:%M:%S";

pub fn activity_style(activity: &Activity) -> ActivityStyle {
    match activity {
        Activity::Walking => ActivityStyle {
            icon: "🚶",
            color: "#4CAF50",
        },
        Activity::Running => ActivityStyle {
            icon: "🏃",
            color: "#FF5722",
        },
        Activity::Idle => ActivityStyle {
            icon: "🧍",
            color: "#9E9E9E",
        },
        Activity::Waiting => ActivityStyle {
            icon: "⏳",
            color: "#667eea",
        },
        Activity::Unknown(_) => DEFAULT_STYLE,
    }
}

/// Style lookup by raw label.
pub fn style_for_label(label: &str) -> ActivityStyle {
    activity_style(&Activity::from(label))
}

/// `0.873` → `"87.3%"`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// `"2024-01-01T10:00:00Z"` → `"Jan 01, 10:00:00"`.
///
/// Only the first 19 characters are read. Anything that does not parse is
/// returned unchanged.
pub fn format_timestamp(raw: &str) -> String {
    raw.get(..19)
        .filter(|head| has_timestamp_shape(head))
        .and_then(|head| NaiveDateTime::parse_from_str(head, INPUT_FORMAT).ok())
        .map(|ts| ts.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}

// chrono accepts single-digit fields, so the layout is checked byte by byte.
fn has_timestamp_shape(head: &str) -> bool {
    head.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        10 => b == b'T',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    })
}

/// Display fields for the live prediction card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealtimeView {
    pub activity: String,
    pub icon: &'static str,
    pub color: &'static str,
    pub confidence: String,
    pub updated: String,
}

impl RealtimeView {
    /// What the card shows before the first prediction arrives.
    pub fn waiting() -> Self {
        let style = activity_style(&Activity::Waiting);
        Self {
            activity: Activity::Waiting.label().to_string(),
            icon: style.icon,
            color: style.color,
            confidence: format_confidence(0.0),
            updated: String::new(),
        }
    }
}

pub fn realtime_view(prediction: &Prediction) -> RealtimeView {
    let style = activity_style(&prediction.activity);
    RealtimeView {
        activity: prediction.activity.label().to_string(),
        icon: style.icon,
        color: style.color,
        confidence: format_confidence(prediction.confidence),
        updated: format_timestamp(&prediction.timestamp),
    }
}

/// Display fields for the counters panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub total: String,
    pub walking: String,
    pub running: String,
    pub idle: String,
    pub calibrating: Option<String>,
}

pub fn stats_view(stats: &StatsSnapshot) -> StatsView {
    StatsView {
        total: stats.total_records.to_string(),
        walking: stats.walking_count.to_string(),
        running: stats.running_count.to_string(),
        idle: stats.idle_count.to_string(),
        calibrating: stats.calibrating_count.map(|c| c.to_string()),
    }
}

/// One line of the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub activity: String,
    pub confidence: String,
    pub timestamp: String,
    pub color: &'static str,
}

pub fn history_row(prediction: &Prediction) -> HistoryRow {
    HistoryRow {
        activity: prediction.activity.label().to_string(),
        confidence: format_confidence(prediction.confidence),
        timestamp: format_timestamp(&prediction.timestamp),
        color: activity_style(&prediction.activity).color,
    }
}

/// Rows in server order, one per record.
pub fn history_rows(result: &HistoryResult) -> Vec<HistoryRow> {
    result.records.iter().map(history_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_prediction_reduces() {
        let prediction = Prediction::new("Running", 0.873, "2024-01-01T10:00:00Z");
        let view = realtime_view(&prediction);
        assert_eq!(view.confidence, "87.3%");
        assert_eq!(view.icon, "🏃");
        assert_eq!(view.color, "#FF5722");
        assert_eq!(view.updated, "Jan 01, 10:00:00");
    }

    #[test]
    fn test_unmapped_activities_use_default_style() {
        for label in ["Calibrating", "", "walking", "Sprinting", "🚲", "Idle "] {
            assert_eq!(style_for_label(label), DEFAULT_STYLE, "label {label:?}");
        }
        assert_eq!(style_for_label("Idle").icon, "🧍");
        assert_eq!(style_for_label("Waiting for data...").icon, "⏳");
    }

    #[test]
    fn test_malformed_timestamps_pass_through() {
        for raw in [
            "",
            "yesterday",
            "2024-01-01",
            "2024-13-01T10:00:00",
            "2024-01-01 10:00:00",
            "2024-01-01T25:00:00Z",
            "2024-01-01T10:00:0",
            "ééééééééééééééééééééé",
        ] {
            assert_eq!(format_timestamp(raw), raw);
        }
    }

    #[test]
    fn test_short_fields_are_not_accepted() {
        for raw in [
            "20245-1-01T10:00:00",
            "2024-1-01T10:00:00Z",
            "2024-01-01T1:00:00Z+",
            "+2024-1-01T10:00:00",
        ] {
            assert_eq!(format_timestamp(raw), raw);
        }
    }

    #[test]
    fn test_timestamp_suffix_is_ignored() {
        assert_eq!(
            format_timestamp("2024-03-15T08:05:09.123456+00:00"),
            "Mar 15, 08:05:09"
        );
        assert_eq!(format_timestamp("2024-12-31T23:59:59"), "Dec 31, 23:59:59");
    }

    #[test]
    fn test_confidence_has_one_decimal() {
        assert_eq!(format_confidence(0.0), "0.0%");
        assert_eq!(format_confidence(1.0), "100.0%");
        assert_eq!(format_confidence(0.5049), "50.5%");
    }

    #[test]
    fn test_history_rows_keep_server_order() {
        let result = HistoryResult {
            records: vec![
                Prediction::new("Walking", 0.9, "2024-01-01T10:00:02"),
                Prediction::new("Calibrating", 0.1, "bad"),
            ],
            ..Default::default()
        };
        let rows = history_rows(&result);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].activity, "Walking");
        assert_eq!(rows[0].color, "#4CAF50");
        assert_eq!(rows[1].timestamp, "bad");
        assert_eq!(rows[1].color, DEFAULT_STYLE.color);
    }

    #[test]
    fn test_stats_view() {
        let view = stats_view(&StatsSnapshot {
            total_records: 7,
            walking_count: 3,
            running_count: 2,
            idle_count: 2,
            calibrating_count: None,
        });
        assert_eq!(view.total, "7");
        assert_eq!(view.calibrating, None);
    }
}
