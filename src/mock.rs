use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use bytes::Bytes;

use super::transport::{
    OutboundRequest, PredictionResponse, PredictionTransport, TransportError, TransportErrorKind,
    TransportFuture, TransportResult,
};

#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    Fail {
        kind: TransportErrorKind,
        status: Option<u16>,
        reason: String,
    },
}

impl MockBehavior {
    pub fn pass() -> Self {
        Self::Pass
    }

    pub fn fail(kind: TransportErrorKind, reason: impl Into<String>) -> Self {
        Self::Fail {
            kind,
            status: None,
            reason: reason.into(),
        }
    }

    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::fail(TransportErrorKind::Connect, reason)
    }

    pub fn timeout_error(reason: impl Into<String>) -> Self {
        Self::fail(TransportErrorKind::Timeout, reason)
    }

    pub fn receive_error(reason: impl Into<String>, status: Option<u16>) -> Self {
        Self::Fail {
            kind: TransportErrorKind::Receive,
            status,
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockTransportSnapshot {
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct MockTransportState {
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    behavior_plan: VecDeque<MockBehavior>,
    response_queue: VecDeque<PredictionResponse>,
    outbound_log: Vec<OutboundRequest>,
    last_error: Option<String>,
}

/// In-memory endpoint: records every request and answers from a queue.
/// With an empty queue it replies `200` with an empty body.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviors(behaviors: impl IntoIterator<Item = MockBehavior>) -> Self {
        let transport = Self::new();
        transport
            .state
            .lock()
            .expect("mock transport mutex poisoned while seeding behaviors")
            .behavior_plan
            .extend(behaviors);
        transport
    }

    pub fn queue_response(&self, status: u16, body: impl Into<Bytes>) {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing response")
            .response_queue
            .push_back(PredictionResponse::new(status, body));
    }

    pub fn snapshot(&self) -> MockTransportSnapshot {
        let state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while taking snapshot");
        MockTransportSnapshot {
            request_count: state.request_count,
            last_url: state.last_url.clone(),
            last_status: state.last_status,
            behavior_remaining: state.behavior_plan.len(),
            response_queue_len: state.response_queue.len(),
            last_error: state.last_error.clone(),
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while reading outbound log")
            .outbound_log
            .clone()
    }

    fn exchange(&self, request: OutboundRequest) -> TransportResult<PredictionResponse> {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while executing request");
        state.request_count += 1;
        state.last_url = Some(request.url.clone());
        state.outbound_log.push(request);

        match state.behavior_plan.pop_front().unwrap_or_default() {
            MockBehavior::Fail {
                kind,
                status,
                reason,
            } => {
                state.last_error = Some(reason.clone());
                state.last_status = status;
                Err(TransportError::new(kind, status, reason))
            }
            MockBehavior::Pass => {
                let response = state
                    .response_queue
                    .pop_front()
                    .unwrap_or_else(|| PredictionResponse::new(200, Bytes::new()));
                state.last_error = None;
                state.last_status = Some(response.status);
                Ok(response)
            }
        }
    }
}

impl PredictionTransport for MockTransport {
    fn execute(&self, request: OutboundRequest) -> TransportFuture<TransportResult<PredictionResponse>> {
        let transport = self.clone();
        Box::pin(async move { transport.exchange(request) })
    }
}
