//! Sends one diabetes prediction request (eight feature values as JSON) to an
//! HTTP endpoint and hands back the raw response text. The transport is a
//! trait so the same call runs against reqwest or an in-memory mock.

pub mod config;
pub mod mock;
pub mod record;
pub mod sender;
pub mod transport;

pub use config::{DEFAULT_ENDPOINT, SenderConfig};
pub use mock::{MockBehavior, MockTransport, MockTransportSnapshot};
pub use record::{FIELD_NAMES, PredictionRequest};
pub use sender::{PredictionClient, run};
pub use transport::{
    OutboundRequest, PredictionResponse, PredictionTransport, ReqwestTransport, TransportError,
    TransportErrorKind, TransportFuture, TransportResult,
};
