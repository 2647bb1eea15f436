//! Presentation-side state: reducers and screen models.

pub mod reducers;
pub mod screen;

// Re-export commonly used types
pub use reducers::{
    activity_style, format_confidence, format_timestamp, history_row, history_rows, realtime_view,
    stats_view, style_for_label, ActivityStyle, HistoryRow, RealtimeView, StatsView, DEFAULT_STYLE,
};
pub use screen::{HistoryScreen, HistoryStatus, LiveScreen};
