use std::{
    borrow::Cow,
    future::Future,
    pin::Pin,
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use thiserror::Error;
use tracing::debug;

pub type TransportFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    Payload,
    Connect,
    Timeout,
    Send,
    Receive,
    Internal,
}

/// A failed prediction call. Non-success HTTP statuses are not errors; they
/// come back as ordinary responses.
#[derive(Clone, Debug, Error)]
#[error("transport error {kind:?} status={status:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Internal, None, message)
    }

    /// Classifies a reqwest failure raised while sending. Timeouts win over
    /// connect errors because a connect timeout reports both.
    fn from_send(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Send
        };
        Self::from_reqwest(kind, err)
    }

    fn from_receive(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else {
            TransportErrorKind::Receive
        };
        Self::from_reqwest(kind, err)
    }

    fn from_reqwest(kind: TransportErrorKind, err: reqwest::Error) -> Self {
        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<sonic_rs::Error> for TransportError {
    fn from(err: sonic_rs::Error) -> Self {
        Self::new(TransportErrorKind::Payload, None, err.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, Bytes)>,
    pub body: Bytes,
    pub timeout: Option<Duration>,
}

impl OutboundRequest {
    pub fn post(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: body.into(),
            timeout: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_ref())
    }
}

/// Raw reply from the prediction endpoint.
#[derive(Clone, Debug)]
pub struct PredictionResponse {
    pub status: u16,
    pub body: Bytes,
    pub elapsed: Duration,
}

impl PredictionResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

pub trait PredictionTransport: Send + Sync {
    fn execute(&self, request: OutboundRequest) -> TransportFuture<TransportResult<PredictionResponse>>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: ReqwestClient::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionTransport for ReqwestTransport {
    fn execute(&self, request: OutboundRequest) -> TransportFuture<TransportResult<PredictionResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut req = client.request(request.method, &request.url);

            for (key, value) in request.headers {
                let name = HeaderName::from_bytes(key.as_bytes())
                    .map_err(|err| TransportError::internal(err.to_string()))?;
                let value = HeaderValue::from_bytes(value.as_ref())
                    .map_err(|err| TransportError::internal(err.to_string()))?;
                req = req.header(name, value);
            }

            if let Some(timeout) = request.timeout {
                req = req.timeout(timeout);
            }

            let resp = req
                .body(request.body)
                .send()
                .await
                .map_err(TransportError::from_send)?;

            let status = resp.status().as_u16();
            let body = resp.bytes().await.map_err(TransportError::from_receive)?;
            let elapsed = start.elapsed();
            debug!(status, bytes = body.len(), ?elapsed, "prediction response received");

            Ok(PredictionResponse {
                status,
                body,
                elapsed,
            })
        })
    }
}
