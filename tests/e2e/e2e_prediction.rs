use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use diabetes_predict::{PredictionClient, PredictionRequest, SenderConfig, TransportErrorKind};
use tokio::net::TcpListener;
use tokio::task::spawn_blocking;
use tokio::time::sleep;

const SAMPLE_PAYLOAD: &str = r#"{"Pregnancies":6,"Glucose":148,"BloodPressure":72,"SkinThickness":35,"Insulin":0,"BMI":33.6,"DiabetesPedigreeFunction":0.627,"Age":50}"#;

#[derive(Clone, Default)]
struct AppState {
    received: Arc<Mutex<Vec<(HeaderMap, Bytes)>>>,
}

impl AppState {
    fn received(&self) -> Vec<(HeaderMap, Bytes)> {
        self.received.lock().expect("stub state lock").clone()
    }
}

#[tokio::test]
async fn e2e_stub_receives_payload_and_output_matches_response() {
    let server = TestServer::start().await;
    let client = PredictionClient::new(SenderConfig::new(server.url("/diabetes_prediction")));

    let mut out = Vec::new();
    let response = diabetes_predict::run(&client, &PredictionRequest::sample(), &mut out)
        .await
        .expect("stub should answer");
    assert_eq!(response.status(), 200);

    let received = server.state.received();
    assert_eq!(received.len(), 1);
    let (headers, body) = &received[0];
    assert!(headers.get("content-type").is_none());

    let received_json: sonic_rs::Value =
        sonic_rs::from_slice(body).expect("stub body should be json");
    let expected: sonic_rs::Value =
        sonic_rs::from_str(SAMPLE_PAYLOAD).expect("reference payload should parse");
    assert_eq!(received_json, expected);

    let mut printed = body.to_vec();
    printed.push(b'\n');
    assert_eq!(out, printed);
}

#[tokio::test]
async fn e2e_json_content_type_is_sent_when_enabled() {
    let server = TestServer::start().await;
    let client = PredictionClient::new(
        SenderConfig::new(server.url("/diabetes_prediction")).with_json_content_type(true),
    );

    client
        .send(&PredictionRequest::sample())
        .await
        .expect("stub should answer");

    let received = server.state.received();
    assert_eq!(
        received[0].0.get("content-type").map(|value| value.as_bytes()),
        Some(&b"application/json"[..])
    );
}

#[tokio::test]
async fn e2e_server_error_body_is_printed() {
    let server = TestServer::start().await;
    let client = PredictionClient::new(SenderConfig::new(server.url("/broken")));

    let mut out = Vec::new();
    let response = diabetes_predict::run(&client, &PredictionRequest::sample(), &mut out)
        .await
        .expect("500 is returned, not raised");

    assert_eq!(response.status(), 500);
    assert_eq!(out, b"model failed to load\n");
}

#[tokio::test]
async fn e2e_configured_timeout_triggers() {
    let server = TestServer::start().await;
    let client = PredictionClient::new(
        SenderConfig::new(server.url("/slow")).with_timeout(Duration::from_millis(200)),
    );

    let err = client
        .send(&PredictionRequest::sample())
        .await
        .expect_err("timeout should trigger");
    assert_eq!(err.kind(), TransportErrorKind::Timeout);
}

#[tokio::test]
async fn e2e_refused_connection_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = PredictionClient::new(SenderConfig::new(format!(
        "http://{addr}/diabetes_prediction"
    )));
    let mut out = Vec::new();
    let err = diabetes_predict::run(&client, &PredictionRequest::sample(), &mut out)
        .await
        .expect_err("closed port should refuse");

    assert_eq!(err.kind(), TransportErrorKind::Connect);
    assert!(out.is_empty());
}

#[tokio::test]
async fn e2e_binary_prints_stub_response_and_exits_zero() {
    let server = TestServer::start().await;
    let url = server.url("/diabetes_prediction");

    let output = spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_diabetes-predict"))
            .args(["--url", &url])
            .env_remove("DIABETES_PREDICT_TIMEOUT_MS")
            .output()
    })
    .await
    .expect("join binary task")
    .expect("binary should launch");

    assert!(output.status.success(), "status: {:?}", output.status);
    let received = server.state.received();
    assert_eq!(received.len(), 1);
    let (_, body) = &received[0];

    let received_json: sonic_rs::Value =
        sonic_rs::from_slice(body).expect("stub body should be json");
    let expected: sonic_rs::Value =
        sonic_rs::from_str(SAMPLE_PAYLOAD).expect("reference payload should parse");
    assert_eq!(received_json, expected);

    let mut printed = body.to_vec();
    printed.push(b'\n');
    assert_eq!(output.stdout, printed);
}

#[tokio::test]
async fn e2e_binary_exits_zero_on_server_error() {
    let server = TestServer::start().await;
    let url = server.url("/broken");

    let output = spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_diabetes-predict"))
            .args(["--url", &url])
            .output()
    })
    .await
    .expect("join binary task")
    .expect("binary should launch");

    assert!(output.status.success(), "status: {:?}", output.status);
    assert_eq!(output.stdout, b"model failed to load\n");
}

struct TestServer {
    base_url: String,
    state: AppState,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/diabetes_prediction", post(echo_handler))
            .route("/broken", post(broken_handler))
            .route("/slow", post(slow_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn echo_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Bytes {
    state
        .received
        .lock()
        .expect("stub state lock")
        .push((headers, body.clone()));
    body
}

async fn broken_handler() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "model failed to load")
}

async fn slow_handler() -> (StatusCode, &'static str) {
    sleep(Duration::from_millis(1500)).await;
    (StatusCode::OK, r#"{"prediction":"late"}"#)
}
