//! Network side of the client: records, decoding, transport and the data client.

pub mod client;
pub mod decode;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use client::{
    BlockingDataClient, Completion, DataClient, FetchError, Fetched, HISTORY_PATH, REALTIME_PATH,
    STATS_PATH,
};
pub use decode::decode;
pub use transport::Transport;
pub use types::{
    Activity, HistoryQuery, HistoryResult, HistoryWindow, Prediction, StatsSnapshot, WAITING_LABEL,
};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
