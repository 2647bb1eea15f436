//! Data client for the activity-recognition service.
//!
//! [`DataClient`] wraps a [`Transport`] and the decoder behind the three
//! operations the screens need. Every request it issues can be cancelled in
//! one shot with [`DataClient::cancel_all`].

use crate::api::decode::decode;
use crate::api::transport::Transport;
use crate::api::types::{
    HistoryQuery, HistoryResponse, HistoryResult, Prediction, RealtimeResponse, StatsResponse,
    StatsSnapshot,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

pub const REALTIME_PATH: &str = "/api/realtime";
pub const STATS_PATH: &str = "/api/stats";
pub const HISTORY_PATH: &str = "/api/history";

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, timeout or non-success HTTP status
    Transport(String),
    /// The body did not match the expected shape
    Decode(String),
}

impl FetchError {
    pub fn detail(&self) -> &str {
        match self {
            FetchError::Transport(detail) | FetchError::Decode(detail) => detail,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Network error: {msg}"),
            FetchError::Decode(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// How an issued request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    /// The request ran to completion (successfully or not).
    Finished(T),
    /// [`DataClient::cancel_all`] fired while the request was outstanding.
    /// Nothing is delivered.
    Cancelled,
}

impl<T> Completion<T> {
    pub fn finished(self) -> Option<T> {
        match self {
            Completion::Finished(value) => Some(value),
            Completion::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Completion::Cancelled)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Completion<U> {
        match self {
            Completion::Finished(value) => Completion::Finished(f(value)),
            Completion::Cancelled => Completion::Cancelled,
        }
    }
}

/// Result of one client operation.
pub type Fetched<T> = Completion<Result<T, FetchError>>;

/// Client for the realtime, stats and history endpoints.
///
/// Cloning is cheap; clones share the transport and the cancellation epoch,
/// so `cancel_all` on any clone cancels requests issued through all of them.
pub struct DataClient<T> {
    transport: Arc<T>,
    cancel: Arc<watch::Sender<u64>>,
    outstanding: Arc<AtomicUsize>,
}

impl<T> Clone for DataClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cancel: Arc::clone(&self.cancel),
            outstanding: Arc::clone(&self.outstanding),
        }
    }
}

impl<T: Transport> DataClient<T> {
    pub fn new(transport: T) -> Self {
        let (cancel, _) = watch::channel(0);
        Self {
            transport: Arc::new(transport),
            cancel: Arc::new(cancel),
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Latest prediction from `/api/realtime`.
    pub async fn fetch_realtime(&self) -> Fetched<Prediction> {
        self.request(REALTIME_PATH, Vec::new())
            .await
            .map(|body| body.and_then(|b| decode::<RealtimeResponse>(&b)).map(Prediction::from))
    }

    /// Aggregate counts from `/api/stats`.
    pub async fn fetch_stats(&self) -> Fetched<StatsSnapshot> {
        self.request(STATS_PATH, Vec::new())
            .await
            .map(|body| body.and_then(|b| decode::<StatsResponse>(&b)).map(StatsSnapshot::from))
    }

    /// Records inside the query window from `/api/history`.
    pub async fn fetch_history(&self, query: HistoryQuery) -> Fetched<HistoryResult> {
        self.request(HISTORY_PATH, query.params())
            .await
            .map(|body| body.and_then(|b| decode::<HistoryResponse>(&b)).map(HistoryResult::from))
    }

    /// Cancel every request currently outstanding on this client.
    ///
    /// Requests issued afterwards are unaffected.
    pub fn cancel_all(&self) {
        let pending = self.outstanding();
        self.cancel.send_modify(|epoch| *epoch = epoch.wrapping_add(1));
        if pending > 0 {
            tracing::debug!(pending, "cancelled outstanding requests");
        }
    }

    /// Number of requests issued and not yet finished or cancelled.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    async fn request(&self, path: &'static str, query: Vec<(&'static str, String)>) -> Fetched<String> {
        let mut epoch_rx = self.cancel.subscribe();
        let epoch = *epoch_rx.borrow_and_update();
        let _outstanding = OutstandingGuard::enter(&self.outstanding);

        tokio::select! {
            biased;
            _ = cancelled(epoch_rx, epoch) => {
                tracing::debug!(path, "request cancelled");
                Completion::Cancelled
            }
            result = self.transport.get(path, &query) => {
                if let Err(ref e) = result {
                    tracing::debug!(path, error = %e, "request failed");
                }
                Completion::Finished(result)
            }
        }
    }
}

/// Resolves once the cancellation epoch moves past `epoch`.
async fn cancelled(mut rx: watch::Receiver<u64>, epoch: u64) {
    loop {
        if *rx.borrow_and_update() != epoch {
            return;
        }
        if rx.changed().await.is_err() {
            // Client dropped: nothing can cancel us any more.
            std::future::pending::<()>().await;
        }
    }
}

struct OutstandingGuard<'a>(&'a AtomicUsize);

impl<'a> OutstandingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for OutstandingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Blocking data client for use in synchronous contexts.
pub struct BlockingDataClient<T> {
    inner: DataClient<T>,
    runtime: tokio::runtime::Runtime,
}

impl<T: Transport> BlockingDataClient<T> {
    pub fn new(transport: T) -> Result<Self, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: DataClient::new(transport),
            runtime,
        })
    }

    pub fn fetch_realtime(&self) -> Fetched<Prediction> {
        self.runtime.block_on(self.inner.fetch_realtime())
    }

    pub fn fetch_stats(&self) -> Fetched<StatsSnapshot> {
        self.runtime.block_on(self.inner.fetch_stats())
    }

    pub fn fetch_history(&self, query: HistoryQuery) -> Fetched<HistoryResult> {
        self.runtime.block_on(self.inner.fetch_history(query))
    }

    /// Handle that can cancel this client's requests from another thread.
    pub fn canceller(&self) -> DataClient<T> {
        self.inner.clone()
    }
}
