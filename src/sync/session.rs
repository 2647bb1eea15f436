//! Screen-scoped synchronization session.
//!
//! A [`SyncSession`] owns everything a screen's network activity depends on:
//! the shared data client, the poll timer, the history controller and the
//! root event gate. [`SyncSession::start`] and [`SyncSession::teardown`] are
//! its only entry and exit points; dropping a session tears it down as well.

use crate::api::{DataClient, HistoryQuery, HistoryWindow, Transport};
use crate::sync::gate::{EventGate, EventReceiver};
use crate::sync::history::HistoryController;
use crate::sync::ledger::{create_shared_ledger, SharedLedger, SyncLedgerStats};
use crate::sync::poller::Poller;
use crate::sync::ScheduleError;
use std::time::Duration;
use uuid::Uuid;

/// Session tunables, normally taken from [`crate::config::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub history_limit: u32,
    pub initial_window: HistoryWindow,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_limit: HistoryQuery::DEFAULT_LIMIT,
            initial_window: HistoryWindow::default(),
        }
    }
}

impl From<&crate::config::Config> for SessionSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            history_limit: config.history_limit,
            initial_window: config.default_window,
        }
    }
}

pub struct SyncSession<T: Transport> {
    id: Uuid,
    client: DataClient<T>,
    gate: EventGate,
    ledger: SharedLedger,
    poller: Poller<T>,
    history: HistoryController<T>,
    torn_down: bool,
}

impl<T: Transport> SyncSession<T> {
    /// Open a session over `transport`.
    ///
    /// Returns the session and the receiving end of its event stream. The
    /// caller applies events to its screen state in the order received.
    pub fn start(transport: T, settings: SessionSettings) -> (Self, EventReceiver) {
        let id = Uuid::new_v4();
        let client = DataClient::new(transport);
        let (gate, events) = EventGate::channel();
        let ledger = create_shared_ledger();

        let poller = Poller::new(client.clone(), gate.clone(), ledger.clone());
        let history = HistoryController::new(client.clone(), gate.clone(), ledger.clone())
            .with_limit(settings.history_limit)
            .with_window(settings.initial_window);

        tracing::info!(session = %id, "sync session started");
        (
            Self {
                id,
                client,
                gate,
                ledger,
                poller,
                history,
                torn_down: false,
            },
            events,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &DataClient<T> {
        &self.client
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// Begin the live-screen poll loop.
    pub fn start_polling(&mut self, period: Duration) -> Result<(), ScheduleError> {
        self.poller.start(period)
    }

    pub fn stop_polling(&mut self) -> bool {
        self.poller.stop()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Load a history window, superseding any load in flight.
    pub fn load_history(&mut self, window: HistoryWindow) -> Result<(), ScheduleError> {
        self.history.load(window)
    }

    /// Reload the last selected window.
    pub fn reload_history(&mut self) -> Result<(), ScheduleError> {
        self.history.reload()
    }

    pub fn history_window(&self) -> HistoryWindow {
        self.history.current_window()
    }

    pub fn is_loading_history(&self) -> bool {
        self.history.is_loading()
    }

    /// End the session: stop the timer, cancel every outstanding request and
    /// close the event gate. Returns the final ledger counters.
    pub fn teardown(mut self) -> SyncLedgerStats {
        self.shutdown();
        self.ledger.stats()
    }

    fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.gate.close();
        self.poller.stop();
        self.history.cancel();
        self.client.cancel_all();
        tracing::info!(session = %self.id, "sync session torn down");
    }
}

impl<T: Transport> Drop for SyncSession<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(feature = "http")]
impl SyncSession<crate::api::HttpTransport> {
    /// Open a session against the configured service.
    pub fn connect(
        config: &crate::config::Config,
    ) -> Result<(Self, EventReceiver), crate::api::FetchError> {
        let transport = crate::api::HttpTransport::from_config(config)?;
        Ok(Self::start(transport, SessionSettings::from(config)))
    }
}
