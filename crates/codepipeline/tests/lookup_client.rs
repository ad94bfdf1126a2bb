//! Pipeline lookup client tests against a local HTTP server speaking the
//! service's JSON protocol.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_codepipeline::config::{Credentials, SharedCredentialsProvider};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Router;

use codepipeline::CodePipelineClient;
use relay::{
    ExecutionId, PipelineExecutionSource, PipelineName, PipelineStatus, RelayError,
    UpstreamService, SOURCE_ARTIFACT,
};

#[derive(Clone)]
struct ServerState {
    reply_status: StatusCode,
    reply_body: &'static str,
    served: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(HeaderMap, Bytes)>>>,
}

async fn service_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    state.served.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some((headers, body));
    (
        state.reply_status,
        [(header::CONTENT_TYPE, "application/x-amz-json-1.1")],
        state.reply_body,
    )
}

async fn start_test_server(
    reply_status: StatusCode,
    reply_body: &'static str,
) -> (String, ServerState) {
    let state = ServerState {
        reply_status,
        reply_body,
        served: Arc::new(AtomicUsize::new(0)),
        last_request: Arc::new(Mutex::new(None)),
    };
    let app = Router::new()
        .fallback(service_handler)
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr: SocketAddr = listener.local_addr().expect("listener addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test server");
    });

    (format!("http://{addr}"), state)
}

/// Shared configuration that asks for retries; the client must ignore it.
fn client(endpoint: &str) -> CodePipelineClient {
    let shared = SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("eu-west-1"))
        .endpoint_url(endpoint)
        .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
            "AKIDTEST", "secret", None, None, "test",
        )))
        .retry_config(RetryConfig::standard().with_max_attempts(3))
        .build();
    CodePipelineClient::from_sdk_config(&shared)
}

fn ids() -> (PipelineName, ExecutionId) {
    (
        PipelineName::new("build-pipe").unwrap(),
        ExecutionId::new("exec-1").unwrap(),
    )
}

#[tokio::test]
async fn execution_is_fetched_and_projected() {
    let (url, state) = start_test_server(
        StatusCode::OK,
        r#"{"pipelineExecution":{"pipelineName":"build-pipe","pipelineExecutionId":"exec-1","status":"Succeeded","artifactRevisions":[{"name":"SourceArtifact","revisionId":"abc123","revisionUrl":"https://github.com/my-org/my-repo/commit/abc123"}]}}"#,
    )
    .await;
    let client = client(&url);
    assert_eq!(client.region(), Some("eu-west-1"));

    let (pipeline, execution) = ids();
    let found = client.get_execution(&pipeline, &execution).await.unwrap();

    assert_eq!(found.status, PipelineStatus::Succeeded);
    let source = found.source_artifact().unwrap();
    assert_eq!(source.name.as_str(), SOURCE_ARTIFACT);
    assert_eq!(source.revision_id.as_ref().unwrap().as_str(), "abc123");

    let (headers, body) = state.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(
        headers.get("x-amz-target").unwrap(),
        "CodePipeline_20150709.GetPipelineExecution"
    );
    let sent: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(sent["pipelineName"], "build-pipe");
    assert_eq!(sent["pipelineExecutionId"], "exec-1");
}

#[tokio::test]
async fn server_error_is_reported_after_a_single_request() {
    let (url, state) = start_test_server(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"__type":"InternalFailure","message":"boom"}"#,
    )
    .await;

    let (pipeline, execution) = ids();
    let err = client(&url)
        .get_execution(&pipeline, &execution)
        .await
        .unwrap_err();

    assert_eq!(state.served.load(Ordering::SeqCst), 1);
    match err {
        RelayError::UpstreamError {
            service,
            status,
            body,
            message,
        } => {
            assert_eq!(service, UpstreamService::PipelineService);
            assert_eq!(status, Some(500));
            assert!(message.starts_with("InternalFailure"), "{message}");
            assert!(body.unwrap().contains("boom"));
        }
        other => panic!("expected UpstreamError, got {other:?}"),
    }
}

#[tokio::test]
async fn service_error_renders_code_message_status_and_body() {
    const REPLY: &str =
        r#"{"__type":"PipelineExecutionNotFoundException","message":"execution not found"}"#;
    let (url, state) = start_test_server(StatusCode::BAD_REQUEST, REPLY).await;

    let (pipeline, execution) = ids();
    let err = client(&url)
        .get_execution(&pipeline, &execution)
        .await
        .unwrap_err();

    assert_eq!(state.served.load(Ordering::SeqCst), 1);
    let text = err.to_string();
    assert_eq!(
        text,
        format!(
            "PipelineExecutionNotFoundException: execution not found from pipeline service: 400 body: {REPLY}"
        )
    );
    assert!(!text.contains("Response {"), "{text}");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");
    drop(listener);

    let (pipeline, execution) = ids();
    let err = client(&format!("http://{addr}"))
        .get_execution(&pipeline, &execution)
        .await
        .unwrap_err();

    match err {
        RelayError::UpstreamError {
            service, status, ..
        } => {
            assert_eq!(service, UpstreamService::PipelineService);
            assert_eq!(status, None);
        }
        other => panic!("expected UpstreamError, got {other:?}"),
    }
}
