use crate::error::TransportError;
use crate::transport::{Transport, TransportRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Scripted in-memory transport: replies in FIFO order and records every
/// request it sees.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportState>>,
}

#[derive(Debug, Default)]
struct MockTransportState {
    responses: VecDeque<Result<Value, TransportError>>,
    requests: Vec<TransportRequest>,
    gate: Option<ResponseGate>,
}

/// Holds responses until released, so a request can be observed in flight.
#[derive(Clone, Debug)]
pub struct ResponseGate {
    released: watch::Sender<bool>,
    arrived: watch::Sender<usize>,
}

impl ResponseGate {
    fn new() -> Self {
        Self {
            released: watch::Sender::new(false),
            arrived: watch::Sender::new(0),
        }
    }

    /// Resolves once `count` requests are parked behind the gate.
    pub async fn wait_for_requests(&self, count: usize) {
        let mut arrived = self.arrived.subscribe();
        let _ = arrived.wait_for(|seen| *seen >= count).await;
    }

    pub fn release(&self) {
        self.released.send_replace(true);
    }

    async fn pass(&self) {
        self.arrived.send_modify(|seen| *seen += 1);
        let mut released = self.released.subscribe();
        let _ = released.wait_for(|open| *open).await;
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, document: Value) {
        self.push(Ok(document));
    }

    pub fn push_error(&self, error: TransportError) {
        self.push(Err(error));
    }

    /// Every mutation under the lock is a single push or assignment, so a
    /// panic elsewhere while holding it leaves the script intact.
    fn state(&self) -> MutexGuard<'_, MockTransportState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, response: Result<Value, TransportError>) {
        self.state().responses.push_back(response);
    }

    /// Parks every later request until the returned gate is released.
    pub fn hold_responses(&self) -> ResponseGate {
        let gate = ResponseGate::new();
        self.state().gate = Some(gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state().requests.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform_request(&self, request: TransportRequest) -> Result<Value, TransportError> {
        let (response, gate) = {
            let mut state = self.state();
            state.requests.push(request);
            let response = state.responses.pop_front().unwrap_or_else(|| {
                Err(TransportError::Backend(
                    "mock transport has no scripted response".to_string(),
                ))
            });
            (response, state.gate.clone())
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        response
    }
}
