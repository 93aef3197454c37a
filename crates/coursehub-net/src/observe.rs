use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::NetError;
use crate::key::CanonicalKey;
use crate::types::ApiMethod;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: ApiMethod,
    pub endpoint: String,
    pub key: CanonicalKey,
    pub trusted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome<'a> {
    Success,
    Failure(&'a NetError),
}

/// Start/end notifications for calls made with `loading` enabled.
///
/// Observers only watch; they cannot alter or fail the call.
pub trait ProgressObserver: Send + Sync {
    fn on_start(&self, _info: &RequestInfo) {}

    fn on_end(&self, _info: &RequestInfo, _outcome: Outcome<'_>) {}
}

pub type ObserverObject = Arc<dyn ProgressObserver>;

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_start(&self, info: &RequestInfo) {
        tracing::debug!(
            target: "coursehub::net",
            method = %info.method,
            endpoint = %info.endpoint,
            "Loading started..."
        );
    }

    fn on_end(&self, info: &RequestInfo, outcome: Outcome<'_>) {
        tracing::debug!(
            target: "coursehub::net",
            method = %info.method,
            endpoint = %info.endpoint,
            ok = matches!(outcome, Outcome::Success),
            "Loading completed."
        );
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Started(RequestInfo),
    Finished { info: RequestInfo, ok: bool },
}

/// Keeps every notification in memory, in arrival order.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_start(&self, info: &RequestInfo) {
        self.events.lock().push(ProgressEvent::Started(info.clone()));
    }

    fn on_end(&self, info: &RequestInfo, outcome: Outcome<'_>) {
        self.events.lock().push(ProgressEvent::Finished {
            info: info.clone(),
            ok: matches!(outcome, Outcome::Success),
        });
    }
}
