use std::time::Duration;

/// Endpoint the prediction payload is posted to when nothing overrides it.
pub const DEFAULT_ENDPOINT: &str = "https://1baa-104-199-184-211.ngrok-free.app/diabetes_prediction";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderConfig {
    pub endpoint: String,
    /// `None` leaves the request unbounded.
    pub timeout: Option<Duration>,
    /// Adds `Content-Type: application/json`. Off by default; the endpoint has
    /// always been called without it.
    pub json_content_type: bool,
}

impl SenderConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_json_content_type(mut self, enabled: bool) -> Self {
        self.json_content_type = enabled;
        self
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            json_content_type: false,
        }
    }
}
