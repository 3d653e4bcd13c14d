use std::{io::Write, sync::Arc};

use tracing::{debug, info, warn};

use super::config::SenderConfig;
use super::record::PredictionRequest;
use super::transport::{
    OutboundRequest, PredictionResponse, PredictionTransport, ReqwestTransport, TransportError,
    TransportResult,
};

pub type SharedPredictionTransport = dyn PredictionTransport + Send + Sync;

#[derive(Clone)]
pub struct PredictionClient {
    config: SenderConfig,
    transport: Arc<SharedPredictionTransport>,
}

impl PredictionClient {
    pub fn new(config: SenderConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    pub fn with_transport<T>(config: SenderConfig, transport: T) -> Self
    where
        T: PredictionTransport + 'static,
    {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    /// Builds the POST for `record` without sending it.
    pub fn request_for(&self, record: &PredictionRequest) -> TransportResult<OutboundRequest> {
        let body = record.to_payload()?;
        let mut request =
            OutboundRequest::post(self.config.endpoint.as_str(), body).with_timeout(self.config.timeout);
        if self.config.json_content_type {
            request = request.with_header("content-type", "application/json");
        }
        Ok(request)
    }

    /// Posts `record` once. Any status the endpoint answers with is returned
    /// as-is; only transport failures are errors.
    pub async fn send(&self, record: &PredictionRequest) -> TransportResult<PredictionResponse> {
        let request = self.request_for(record)?;
        info!(endpoint = %request.url, "sending prediction request");
        debug!(payload = %String::from_utf8_lossy(&request.body), "prediction payload");

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            warn!(status = response.status(), "prediction endpoint returned non-success status");
        }
        Ok(response)
    }

    pub async fn send_text(&self, record: &PredictionRequest) -> TransportResult<String> {
        Ok(self.send(record).await?.text().into_owned())
    }
}

/// Sends `record` and prints the response text to `out`, newline terminated.
pub async fn run<W: Write>(
    client: &PredictionClient,
    record: &PredictionRequest,
    out: &mut W,
) -> TransportResult<PredictionResponse> {
    let response = client.send(record).await?;
    writeln!(out, "{}", response.text())
        .map_err(|err| TransportError::internal(format!("failed to write response: {err}")))?;
    Ok(response)
}
