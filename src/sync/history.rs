//! On-demand history loading.
//!
//! At most one history request is in flight. Loading a new window closes the
//! previous load's gate before aborting it, so a superseded window can never
//! reach the screen, whichever response comes back first.

use crate::api::{Completion, DataClient, HistoryQuery, HistoryWindow, Transport};
use crate::sync::gate::{EventGate, SyncEvent};
use crate::sync::ledger::SharedLedger;
use crate::sync::ScheduleError;
use tokio::task::JoinHandle;

struct PendingLoad {
    gate: EventGate,
    task: JoinHandle<()>,
}

impl PendingLoad {
    fn cancel(self) {
        self.gate.close();
        self.task.abort();
    }
}

pub struct HistoryController<T> {
    client: DataClient<T>,
    gate: EventGate,
    ledger: SharedLedger,
    limit: u32,
    window: HistoryWindow,
    pending: Option<PendingLoad>,
}

impl<T: Transport> HistoryController<T> {
    pub fn new(client: DataClient<T>, gate: EventGate, ledger: SharedLedger) -> Self {
        Self {
            client,
            gate,
            ledger,
            limit: HistoryQuery::DEFAULT_LIMIT,
            window: HistoryWindow::default(),
            pending: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    /// The most recently selected window.
    pub fn current_window(&self) -> HistoryWindow {
        self.window
    }

    /// Whether a load is still waiting on the network.
    pub fn is_loading(&self) -> bool {
        self.pending
            .as_ref()
            .map(|p| !p.task.is_finished())
            .unwrap_or(false)
    }

    /// Load `window`, superseding any load still in flight.
    ///
    /// The outcome arrives as `HistoryLoaded`, `HistoryEmpty` or
    /// `HistoryFailed`. Must be called from within a Tokio runtime.
    pub fn load(&mut self, window: HistoryWindow) -> Result<(), ScheduleError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;

        if let Some(previous) = self.pending.take() {
            if !previous.task.is_finished() {
                tracing::debug!(superseded_by = window.hours(), "superseding history load");
            }
            previous.cancel();
        }

        self.window = window;
        let query = HistoryQuery::new(window).with_limit(self.limit);
        let gate = self.gate.child();
        let task = runtime.spawn(load_window(
            self.client.clone(),
            gate.clone(),
            self.ledger.clone(),
            query,
        ));
        self.pending = Some(PendingLoad { gate, task });
        Ok(())
    }

    /// Load the current window again.
    pub fn reload(&mut self) -> Result<(), ScheduleError> {
        self.load(self.window)
    }

    /// Drop the pending load, if any, without starting another.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }
}

impl<T> Drop for HistoryController<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }
}

async fn load_window<T: Transport>(
    client: DataClient<T>,
    gate: EventGate,
    ledger: SharedLedger,
    query: HistoryQuery,
) {
    let window = query.window;
    let event = match client.fetch_history(query).await {
        Completion::Cancelled => return,
        Completion::Finished(Ok(result)) => {
            ledger.record_history(true);
            tracing::debug!(hours = window.hours(), records = result.len(), "history loaded");
            if result.is_empty() {
                SyncEvent::HistoryEmpty { window }
            } else {
                SyncEvent::HistoryLoaded { window, result }
            }
        }
        Completion::Finished(Err(error)) => {
            ledger.record_history(false);
            tracing::warn!(hours = window.hours(), %error, "history fetch failed");
            SyncEvent::HistoryFailed { window, error }
        }
    };
    if !gate.emit(event) {
        ledger.record_discarded();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{history_body, CallQueue, ScriptedTransport, EMPTY_HISTORY_BODY};
    use crate::api::{FetchError, HISTORY_PATH};
    use crate::sync::gate::EventReceiver;
    use crate::sync::ledger::create_shared_ledger;
    use crate::view::{HistoryScreen, HistoryStatus};

    fn controller() -> (HistoryController<ScriptedTransport>, CallQueue, EventReceiver) {
        let (transport, calls) = ScriptedTransport::new();
        let (gate, rx) = EventGate::channel();
        let controller = HistoryController::new(DataClient::new(transport), gate, create_shared_ledger());
        (controller, calls, rx)
    }

    /// Yield until the pending load has finished and emitted.
    async fn until_finished(controller: &HistoryController<ScriptedTransport>) {
        while controller.is_loading() {
            tokio::task::yield_now().await;
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_empty_window_is_not_an_error() {
        let (mut controller, mut calls, mut rx) = controller();
        controller.load(HistoryWindow::OneHour).unwrap();

        let call = calls.take(HISTORY_PATH).await;
        assert_eq!(call.param("hours"), Some("1"));
        assert_eq!(call.param("limit"), Some("100"));
        call.respond(EMPTY_HISTORY_BODY);

        assert_eq!(
            rx.recv().await.unwrap(),
            SyncEvent::HistoryEmpty {
                window: HistoryWindow::OneHour
            }
        );
    }

    #[tokio::test]
    async fn test_newer_window_wins_when_older_arrives_first() {
        let (mut controller, mut calls, mut rx) = controller();
        controller.load(HistoryWindow::OneHour).unwrap();
        let older = calls.take(HISTORY_PATH).await;

        controller.load(HistoryWindow::OneWeek).unwrap();
        let newer = calls.take(HISTORY_PATH).await;
        assert_eq!(newer.param("hours"), Some("168"));

        older.respond(history_body(&["Idle"]));
        settle().await;
        newer.respond(history_body(&["Walking", "Running"]));

        match rx.recv().await.unwrap() {
            SyncEvent::HistoryLoaded { window, result } => {
                assert_eq!(window, HistoryWindow::OneWeek);
                assert_eq!(result.len(), 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        settle().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(controller.current_window(), HistoryWindow::OneWeek);
    }

    #[tokio::test]
    async fn test_newer_window_wins_when_older_arrives_last() {
        let (mut controller, mut calls, mut rx) = controller();
        controller.load(HistoryWindow::SixHours).unwrap();
        let older = calls.take(HISTORY_PATH).await;
        controller.load(HistoryWindow::OneDay).unwrap();
        let newer = calls.take(HISTORY_PATH).await;

        newer.respond(EMPTY_HISTORY_BODY);
        assert_eq!(
            rx.recv().await.unwrap(),
            SyncEvent::HistoryEmpty {
                window: HistoryWindow::OneDay
            }
        );

        older.respond(history_body(&["Running"]));
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_reload_uses_last_window() {
        let (mut controller, mut calls, mut rx) = controller();
        controller.load(HistoryWindow::SixHours).unwrap();
        calls.take(HISTORY_PATH).await.respond("not json");

        match rx.recv().await.unwrap() {
            SyncEvent::HistoryFailed { window, error } => {
                assert_eq!(window, HistoryWindow::SixHours);
                assert!(matches!(error, FetchError::Decode(_)));
            }
            other => panic!("unexpected event: {other:?}"),
        }

        controller.reload().unwrap();
        let call = calls.take(HISTORY_PATH).await;
        assert_eq!(call.param("hours"), Some("6"));
    }

    #[tokio::test]
    async fn test_cancel_drops_pending_load() {
        let (mut controller, mut calls, mut rx) = controller();
        controller.load(HistoryWindow::OneDay).unwrap();
        let call = calls.take(HISTORY_PATH).await;
        assert!(controller.is_loading());

        controller.cancel();
        call.respond(history_body(&["Idle"]));
        settle().await;

        assert!(rx.try_recv().is_err());
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_queued_result_of_superseded_load_never_reaches_screen() {
        let (mut controller, mut calls, mut rx) = controller();
        let mut screen = HistoryScreen::new(HistoryWindow::OneHour);

        screen.begin_load(HistoryWindow::OneHour);
        controller.load(HistoryWindow::OneHour).unwrap();
        calls.take(HISTORY_PATH).await.respond(history_body(&["Idle"]));
        until_finished(&controller).await;

        // The one-hour result is already queued when the user picks a week.
        screen.begin_load(HistoryWindow::OneWeek);
        controller.load(HistoryWindow::OneWeek).unwrap();
        let newer = calls.take(HISTORY_PATH).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(screen.window, HistoryWindow::OneWeek);
        assert!(screen.is_loading());

        newer.respond(history_body(&["Walking", "Running"]));
        let event = rx.recv().await.unwrap();
        assert!(screen.apply(&event));
        assert_eq!(screen.window, HistoryWindow::OneWeek);
        assert_eq!(screen.status, HistoryStatus::Loaded);
        assert_eq!(screen.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_reload_drops_queued_result_of_same_window() {
        let (mut controller, mut calls, mut rx) = controller();
        controller.load(HistoryWindow::SixHours).unwrap();
        calls.take(HISTORY_PATH).await.respond(history_body(&["Idle"]));
        until_finished(&controller).await;

        controller.reload().unwrap();
        let again = calls.take(HISTORY_PATH).await;
        assert!(rx.try_recv().is_err());

        again.respond(EMPTY_HISTORY_BODY);
        assert_eq!(
            rx.recv().await.unwrap(),
            SyncEvent::HistoryEmpty {
                window: HistoryWindow::SixHours
            }
        );
    }
}
