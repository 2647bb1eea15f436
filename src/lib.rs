//! Activity Sync - client-side synchronization engine for an
//! activity-recognition service.
//!
//! The service classifies motion as Walking, Running or Idle. This crate
//! polls it, turns responses into display state and makes sure no request
//! outlives the screen that issued it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         SyncSession                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐  tick  ┌────────────┐   ┌───────────┐          │
//! │  │  Poller  │──────▶│ DataClient │──▶│ Transport │──▶ HTTP   │
//! │  └──────────┘        └────────────┘   └───────────┘          │
//! │  ┌──────────┐  load        │ decode                          │
//! │  │ History  │──────────────┘                                 │
//! │  └──────────┘              ▼                                 │
//! │                      ┌───────────┐   SyncEvent   ┌────────┐  │
//! │                      │ EventGate │─────────────▶│ Screen │  │
//! │                      └───────────┘               └────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use activity_sync::{Config, LiveScreen, SyncSession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let (mut session, mut events) = SyncSession::connect(&config)?;
//! session.start_polling(config.poll_interval)?;
//!
//! let mut screen = LiveScreen::new();
//! if let Some(event) = events.recv().await {
//!     screen.apply(&event);
//!     println!("{} {}", screen.realtime.icon, screen.realtime.activity);
//! }
//!
//! session.teardown();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod sync;
pub mod view;

// Re-export key types at crate root for convenience
pub use api::{
    Activity, BlockingDataClient, Completion, DataClient, FetchError, Fetched, HistoryQuery,
    HistoryResult, HistoryWindow, Prediction, StatsSnapshot, Transport,
};
pub use config::{Config, ConfigError};
pub use sync::{
    EventReceiver, HistoryController, Poller, PollerState, ScheduleError, SessionSettings,
    SyncEvent, SyncLedgerStats, SyncSession,
};
pub use view::{HistoryScreen, HistoryStatus, LiveScreen};

#[cfg(feature = "http")]
pub use api::HttpTransport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
