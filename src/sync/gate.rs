//! Event delivery to the presentation layer.
//!
//! Completions never touch presentation state directly. They are turned into
//! [`SyncEvent`]s and pushed through an [`EventGate`]; the single consumer of
//! the channel applies them in arrival order. Closing a gate is synchronous:
//! once `close()` returns, nothing can pass through it again.

use crate::api::{FetchError, HistoryResult, HistoryWindow, Prediction, StatsSnapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Something the presentation layer should render.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Fresh realtime prediction.
    Realtime(Prediction),
    /// Realtime fetch failed (user-visible).
    RealtimeFailed(FetchError),
    /// Fresh aggregate counts. Stats failures produce no event.
    Stats(StatsSnapshot),
    /// History window loaded with at least one record.
    HistoryLoaded {
        window: HistoryWindow,
        result: HistoryResult,
    },
    /// History window loaded but holds no records.
    HistoryEmpty { window: HistoryWindow },
    /// History fetch failed (user-visible).
    HistoryFailed {
        window: HistoryWindow,
        error: FetchError,
    },
}

/// An event together with the gate it was emitted through.
struct Envelope {
    origin: EventGate,
    event: SyncEvent,
}

/// Receiving end of a session's event stream.
///
/// Events are checked again on the way out: one whose gate (or any parent of
/// it) was closed after it was queued is dropped here, so stopping, superseding
/// or tearing down also silences what is already waiting in the channel.
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<Envelope>,
    root: EventGate,
}

impl EventReceiver {
    /// Next live event. `None` once the root gate is closed.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        while self.root.is_open() {
            let envelope = self.rx.recv().await?;
            if envelope.origin.is_live() {
                return Some(envelope.event);
            }
            tracing::debug!("dropped queued event from a closed gate");
        }
        None
    }

    /// Next live event without waiting.
    pub fn try_recv(&mut self) -> Result<SyncEvent, TryRecvError> {
        loop {
            if !self.root.is_open() {
                return Err(TryRecvError::Disconnected);
            }
            let envelope = self.rx.try_recv()?;
            if envelope.origin.is_live() {
                return Ok(envelope.event);
            }
            tracing::debug!("dropped queued event from a closed gate");
        }
    }
}

impl std::fmt::Debug for EventReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReceiver")
            .field("open", &self.root.is_open())
            .finish()
    }
}

enum Sink {
    /// Root of the tree. The sender is dropped when the root closes.
    Channel(Option<mpsc::UnboundedSender<Envelope>>),
    Parent(EventGate),
}

struct GateState {
    open: bool,
    sink: Sink,
}

/// Closable path from background tasks to the event channel.
///
/// Gates nest: a child forwards into its parent, and an event only gets
/// through if every gate on the way is open, both when it is emitted and when
/// it is received. Sessions own the root gate; each poll run and each history
/// load gets a child it can close on its own.
#[derive(Clone)]
pub struct EventGate {
    state: Arc<Mutex<GateState>>,
}

impl EventGate {
    /// Root gate plus the receiving end of its channel.
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let root = Self::with_sink(Sink::Channel(Some(tx)));
        let receiver = EventReceiver {
            rx,
            root: root.clone(),
        };
        (root, receiver)
    }

    /// A new open gate that forwards into this one.
    pub fn child(&self) -> Self {
        Self::with_sink(Sink::Parent(self.clone()))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState { open: true, sink })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver an event. Returns false when it was discarded.
    pub fn emit(&self, event: SyncEvent) -> bool {
        self.forward(self.clone(), event)
    }

    // Locks are always taken child first, then parent.
    fn forward(&self, origin: EventGate, event: SyncEvent) -> bool {
        let state = self.lock();
        if !state.open {
            return false;
        }
        match &state.sink {
            Sink::Channel(Some(tx)) => tx.send(Envelope { origin, event }).is_ok(),
            Sink::Channel(None) => false,
            Sink::Parent(parent) => parent.forward(origin, event),
        }
    }

    /// Close the gate. Idempotent.
    pub fn close(&self) {
        let mut state = self.lock();
        state.open = false;
        if let Sink::Channel(tx) = &mut state.sink {
            tx.take();
        }
    }

    /// Whether this gate itself is open (parents are not consulted).
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Whether this gate and every parent above it are open.
    pub fn is_live(&self) -> bool {
        let state = self.lock();
        if !state.open {
            return false;
        }
        match &state.sink {
            Sink::Channel(tx) => tx.is_some(),
            Sink::Parent(parent) => parent.is_live(),
        }
    }
}

impl std::fmt::Debug for EventGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventGate")
            .field("open", &self.is_open())
            .finish()
    }
}
