//! In-memory transport for unit tests.
//!
//! Every GET is parked until the test answers it, so tests decide the exact
//! order in which completions arrive.

use crate::api::client::FetchError;
use crate::api::transport::Transport;
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};

/// A GET waiting for the test to supply its response.
#[derive(Debug)]
pub struct PendingCall {
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    reply: oneshot::Sender<Result<String, FetchError>>,
}

impl PendingCall {
    /// Deliver a response body. Returns false if the requester already went away.
    pub fn respond(self, body: impl Into<String>) -> bool {
        self.reply.send(Ok(body.into())).is_ok()
    }

    /// Fail the request at the transport level.
    pub fn fail(self, detail: &str) -> bool {
        self.reply
            .send(Err(FetchError::Transport(detail.to_string())))
            .is_ok()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub struct ScriptedTransport {
    calls: mpsc::UnboundedSender<PendingCall>,
}

impl ScriptedTransport {
    pub fn new() -> (Self, CallQueue) {
        let (calls, rx) = mpsc::unbounded_channel();
        (
            Self { calls },
            CallQueue {
                rx,
                stash: VecDeque::new(),
            },
        )
    }
}

impl Transport for ScriptedTransport {
    fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        let (reply, response) = oneshot::channel();
        let _ = self.calls.send(PendingCall {
            path: path.to_string(),
            query: query.to_vec(),
            reply,
        });
        async move {
            response
                .await
                .unwrap_or_else(|_| Err(FetchError::Transport("script dropped".to_string())))
        }
    }
}

/// Test-side view of the requests the transport has received.
pub struct CallQueue {
    rx: mpsc::UnboundedReceiver<PendingCall>,
    stash: VecDeque<PendingCall>,
}

impl CallQueue {
    /// Wait for the next request to `path`, holding back requests to other paths.
    pub async fn take(&mut self, path: &str) -> PendingCall {
        if let Some(pos) = self.stash.iter().position(|c| c.path == path) {
            if let Some(call) = self.stash.remove(pos) {
                return call;
            }
        }
        loop {
            let call = self.rx.recv().await.expect("transport dropped");
            if call.path == path {
                return call;
            }
            self.stash.push_back(call);
        }
    }
}

pub const RUNNING_BODY: &str = r#"{"status":"success","activity":"Running","confidence":0.873,"source":"model","timestamp":"2024-01-01T10:00:00Z"}"#;
pub const WALKING_BODY: &str = r#"{"status":"success","activity":"Walking","confidence":0.51,"source":"model","timestamp":"2024-01-01T09:59:58Z"}"#;
pub const STATS_BODY: &str = r#"{"status":"success","total_records":12,"walking_count":5,"running_count":4,"idle_count":2,"calibrating_count":1}"#;
pub const EMPTY_HISTORY_BODY: &str = r#"{"status":"success","total_records":0,"records":[],"statistics":{}}"#;

/// A history body with one record per activity label.
pub fn history_body(labels: &[&str]) -> String {
    let records: Vec<serde_json::Value> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            serde_json::json!({
                "activity": label,
                "confidence": 0.9,
                "timestamp": format!("2024-01-01T10:00:{:02}", i),
            })
        })
        .collect();
    serde_json::json!({
        "status": "success",
        "total_records": records.len(),
        "records": records,
    })
    .to_string()
}
