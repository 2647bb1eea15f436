//! Fixed-cadence realtime + stats polling.
//!
//! A running poller starts a fetch cycle immediately and then one per period,
//! measured from each cycle's start. Cycles never wait for the previous one to
//! finish, so their completions can interleave; whichever arrives last is what
//! the screen ends up showing.

use crate::api::{Completion, DataClient, Transport};
use crate::sync::gate::{EventGate, SyncEvent};
use crate::sync::ledger::SharedLedger;
use crate::sync::ScheduleError;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Stopped,
    Running,
}

struct PollRun {
    gate: EventGate,
    ticker: JoinHandle<()>,
    period: Duration,
}

pub struct Poller<T> {
    client: DataClient<T>,
    gate: EventGate,
    ledger: SharedLedger,
    run: Option<PollRun>,
}

impl<T: Transport> Poller<T> {
    pub fn new(client: DataClient<T>, gate: EventGate, ledger: SharedLedger) -> Self {
        Self {
            client,
            gate,
            ledger,
            run: None,
        }
    }

    pub fn state(&self) -> PollerState {
        if self.run.is_some() {
            PollerState::Running
        } else {
            PollerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Period of the current run, if any.
    pub fn period(&self) -> Option<Duration> {
        self.run.as_ref().map(|run| run.period)
    }

    /// Start polling every `period`. The first cycle begins immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, period: Duration) -> Result<(), ScheduleError> {
        if self.run.is_some() {
            return Err(ScheduleError::AlreadyRunning);
        }
        if period.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;

        let gate = self.gate.child();
        let ticker = runtime.spawn(run_cycles(
            self.client.clone(),
            gate.clone(),
            self.ledger.clone(),
            period,
        ));
        tracing::info!(period_ms = period.as_millis() as u64, "poller started");

        self.run = Some(PollRun {
            gate,
            ticker,
            period,
        });
        Ok(())
    }

    /// Stop polling. Returns false if the poller was not running.
    ///
    /// Completions of fetches still in flight are discarded, even if they
    /// arrive after this returns.
    pub fn stop(&mut self) -> bool {
        let Some(run) = self.run.take() else {
            return false;
        };
        run.gate.close();
        // Dropping the ticker's JoinSet aborts the fetches it still owns.
        run.ticker.abort();
        tracing::info!("poller stopped");
        true
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.gate.close();
            run.ticker.abort();
        }
    }
}

async fn run_cycles<T: Transport>(
    client: DataClient<T>,
    gate: EventGate,
    ledger: SharedLedger,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut inflight = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                ledger.record_cycle();
                inflight.spawn(poll_realtime(client.clone(), gate.clone(), ledger.clone()));
                inflight.spawn(poll_stats(client.clone(), gate.clone(), ledger.clone()));
            }
            Some(_) = inflight.join_next() => {}
        }
    }
}

async fn poll_realtime<T: Transport>(client: DataClient<T>, gate: EventGate, ledger: SharedLedger) {
    let event = match client.fetch_realtime().await {
        Completion::Cancelled => return,
        Completion::Finished(Ok(prediction)) => {
            ledger.record_realtime(true);
            SyncEvent::Realtime(prediction)
        }
        Completion::Finished(Err(e)) => {
            ledger.record_realtime(false);
            tracing::warn!(error = %e, "realtime fetch failed");
            SyncEvent::RealtimeFailed(e)
        }
    };
    if !gate.emit(event) {
        ledger.record_discarded();
    }
}

async fn poll_stats<T: Transport>(client: DataClient<T>, gate: EventGate, ledger: SharedLedger) {
    match client.fetch_stats().await {
        Completion::Cancelled => {}
        Completion::Finished(Ok(stats)) => {
            ledger.record_stats(true);
            if !gate.emit(SyncEvent::Stats(stats)) {
                ledger.record_discarded();
            }
        }
        Completion::Finished(Err(e)) => {
            // Stats failures are not surfaced; the next cycle tries again.
            ledger.record_stats(false);
            tracing::debug!(error = %e, "stats fetch failed");
        }
    }
}
