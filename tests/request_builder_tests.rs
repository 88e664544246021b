//! Integration tests for request dispatch against a mock server.
//!
//! These tests verify awaited and detached dispatch, JSON decoding, body
//! encodings, uploads, and the error logging contract.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use fluent_request::{
    BearerToken, ClientConfig, HttpError, HttpMethod, InvalidHttpRequestError, RequestBuilder,
};
use serde_json::json;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Counts error-level events.
#[derive(Clone, Default)]
struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Installs an error counter for the current thread.
fn capture_errors() -> (ErrorCounter, tracing::subscriber::DefaultGuard) {
    let counter = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (counter, guard)
}

fn create_config() -> ClientConfig {
    ClientConfig::builder()
        .default_base_path("/api")
        .default_bearer_token(BearerToken::new("default-token").unwrap())
        .build()
        .unwrap()
}

fn create_builder(server: &MockServer) -> RequestBuilder {
    RequestBuilder::new(&create_config(), Some(&server.uri()), false).unwrap()
}

/// Returns a URL nothing is listening on.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn write_temp_file(name: &str, contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("fluent-request-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

// ============================================================================
// Awaited dispatch
// ============================================================================

#[tokio::test]
async fn test_get_json_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let value = builder.get_json("/status").await.unwrap();

    assert_eq!(value, json!({"ok": true}));
    assert!(builder.has_client());
}

#[tokio::test]
async fn test_get_http_client_applies_base_path_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/users"))
        .and(header("authorization", "Bearer explicit-token"))
        .and(header("content-type", "application/json"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let value = builder
        .get_http_client(Some("/v2"), Some("explicit-token"))
        .unwrap()
        .with_query([("page", "2")])
        .get_json("/users")
        .await
        .unwrap();

    assert_eq!(value, json!([1, 2]));
}

#[tokio::test]
async fn test_get_http_client_falls_back_to_default_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/me"))
        .and(header("authorization", "Bearer default-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let value = builder
        .get_http_client(None, None)
        .unwrap()
        .get_json("/me")
        .await
        .unwrap();

    assert_eq!(value["id"], 7);
}

#[tokio::test]
async fn test_post_json_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/widgets"))
        .and(body_json(json!({"name": "widget"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let value = builder
        .with_json(json!({"name": "widget"}))
        .post_json("/widgets")
        .await
        .unwrap();

    assert_eq!(value, json!({"id": 1}));
}

#[tokio::test]
async fn test_put_json_sends_form_body_with_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/profile"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("name=alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updated": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let value = builder
        .with_auth("user", "pass")
        .with_form([("name", "alice")])
        .put_json("/profile")
        .await
        .unwrap();

    assert_eq!(value, json!({"updated": true}));
}

#[tokio::test]
async fn test_bearer_replaces_header_merged_with_other_case() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/x"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    builder.with_headers([("authorization", "Bearer old")]);
    let value = builder
        .get_http_client(None, Some("new"))
        .unwrap()
        .with_form([("a", "1")])
        .post_json("/x")
        .await
        .unwrap();

    assert_eq!(value, json!({"ok": true}));
    assert_eq!(
        builder.options().header_values("Authorization"),
        Some(&["Bearer new".to_string()][..])
    );
}

#[tokio::test]
async fn test_form_body_drops_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(header("authorization", "Bearer token-1"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("user=alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let value = builder
        .get_http_client(None, Some("token-1"))
        .unwrap()
        .with_form([("user", "alice")])
        .post_json("/login")
        .await
        .unwrap();

    assert_eq!(value, json!({"ok": true}));
    assert_eq!(
        builder.options().header_values("Content-Type"),
        Some(&["application/json".to_string()][..])
    );
}

#[tokio::test]
async fn test_delete_json_requires_body_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (errors, _guard) = capture_errors();
    let mut builder = create_builder(&server);
    let result = builder.delete_json("/items/1").await;

    assert!(matches!(
        result,
        Err(HttpError::InvalidRequest(InvalidHttpRequestError::MissingBody))
    ));
    assert_eq!(errors.count(), 0);
}

#[tokio::test]
async fn test_ambiguous_body_is_rejected_on_plain_dispatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let result = builder
        .with_json(json!({"a": 1}))
        .with_form([("a", "1")])
        .post("/items")
        .await;

    assert!(matches!(
        result,
        Err(HttpError::InvalidRequest(InvalidHttpRequestError::AmbiguousBody { .. }))
    ));
}

#[tokio::test]
async fn test_non_200_status_is_logged_but_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let (errors, _guard) = capture_errors();
    let mut builder = create_builder(&server);
    let response = builder.get("/missing").await.unwrap();

    assert_eq!(response.code, 404);
    assert_eq!(response.text(), "not found");
    assert_eq!(errors.count(), 1);
}

#[tokio::test]
async fn test_200_status_is_not_logged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let (errors, _guard) = capture_errors();
    let mut builder = create_builder(&server);
    builder.get("/anything").await.unwrap();

    assert_eq!(errors.count(), 0);
}

#[tokio::test]
async fn test_transport_failure_returns_err_and_logs_once() {
    let (errors, _guard) = capture_errors();
    let url = closed_port_url();
    let mut builder = RequestBuilder::new(&create_config(), Some(&url), false).unwrap();

    let result = builder.get_json("/status").await;

    assert!(matches!(result, Err(HttpError::Network(_))));
    assert_eq!(errors.count(), 1);
}

#[tokio::test]
async fn test_timeout_is_reported_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let mut builder = RequestBuilder::new(&config, Some(&server.uri()), false).unwrap();

    match builder.get("/slow").await {
        Err(HttpError::Network(error)) => assert!(error.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (errors, _guard) = capture_errors();
    let mut builder = create_builder(&server);
    let result = builder.get_json("/page").await;

    assert!(matches!(result, Err(HttpError::Decode(_))));
    assert_eq!(errors.count(), 1);
}

#[tokio::test]
async fn test_empty_body_decodes_to_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let value = builder.get_json("/empty").await.unwrap();

    assert!(value.is_null());
}

#[tokio::test]
async fn test_client_is_reused_across_dispatches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    builder.get("/one").await.unwrap();
    builder.request(HttpMethod::Get, "/two").await.unwrap();
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_sends_file_and_form_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/files"))
        .and(query_param("folder", "docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stored": true})))
        .expect(1)
        .mount(&server)
        .await;

    let file = write_temp_file("x.bin", b"file-bytes-123");
    let file_name = file.file_name().unwrap().to_string_lossy().into_owned();

    let mut builder = create_builder(&server);
    let value = builder
        .upload(
            "/files",
            [("f", file.clone())],
            [("name", "x")],
            [("folder", "docs")],
        )
        .await
        .unwrap();

    assert_eq!(value, json!({"stored": true}));

    let parts = builder.options().multipart.as_ref().unwrap();
    assert_eq!(parts.len(), 2);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert_eq!(body.matches("Content-Disposition: form-data").count(), 2);
    assert!(body.contains(&format!("name=\"f\"; filename=\"{file_name}\"")));
    assert!(body.contains("file-bytes-123"));
    assert!(body.contains("name=\"name\""));

    std::fs::remove_file(file).unwrap();
}

#[tokio::test]
async fn test_upload_with_missing_file_returns_err_and_logs_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (errors, _guard) = capture_errors();
    let mut builder = create_builder(&server);
    let result = builder
        .upload(
            "/files",
            [("f", "/path/to/nowhere/x.bin")],
            std::iter::empty::<(&str, &str)>(),
            std::iter::empty::<(&str, &str)>(),
        )
        .await;

    assert!(matches!(result, Err(HttpError::File { .. })));
    assert_eq!(errors.count(), 1);
}

#[tokio::test]
async fn test_upload_rejects_previously_set_json_body() {
    let (errors, _guard) = capture_errors();
    let server = MockServer::start().await;

    let mut builder = create_builder(&server);
    builder.with_json(json!({"a": 1}));
    let result = builder
        .upload(
            "/files",
            std::iter::empty::<(&str, &str)>(),
            [("name", "x")],
            std::iter::empty::<(&str, &str)>(),
        )
        .await;

    assert!(matches!(
        result,
        Err(HttpError::InvalidRequest(InvalidHttpRequestError::AmbiguousBody { .. }))
    ));
    assert_eq!(errors.count(), 1);
}

// ============================================================================
// Detached dispatch
// ============================================================================

#[tokio::test]
async fn test_get_async_invokes_success_callback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();
    let error_tx = tx.clone();

    let mut builder = create_builder(&server);
    let handle = builder
        .get_async(
            "/ping",
            move |response| tx.send(Ok(response)).unwrap(),
            move |error| error_tx.send(Err(error.to_string())).unwrap(),
        )
        .unwrap();
    handle.await.unwrap();

    let response = rx.try_recv().unwrap().unwrap();
    assert_eq!(response.code, 200);
    assert_eq!(response.text(), "pong");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_json_async_callbacks_receive_raw_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"a": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (tx, rx) = mpsc::channel();

    let mut builder = create_builder(&server);
    let handle = builder
        .with_json(json!({"a": 1}))
        .post_json_async(
            "/things",
            move |response| tx.send(response).unwrap(),
            |error| panic!("unexpected error: {error}"),
        )
        .unwrap();
    handle.await.unwrap();

    let response = rx.try_recv().unwrap();
    assert_eq!(response.json().unwrap(), json!({"ok": true}));
}

#[tokio::test]
async fn test_async_transport_failure_invokes_error_callback() {
    let url = closed_port_url();
    let mut builder = RequestBuilder::new(&create_config(), Some(&url), false).unwrap();
    let (tx, rx) = mpsc::channel();
    let success_tx = tx.clone();

    let handle = builder
        .delete_async(
            "/items/1",
            move |_| success_tx.send("success").unwrap(),
            move |error| {
                assert!(matches!(error, HttpError::Network(_)));
                tx.send("error").unwrap();
            },
        )
        .unwrap();
    handle.await.unwrap();

    assert_eq!(rx.try_recv().unwrap(), "error");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_put_json_async_checks_data_before_spawning() {
    let server = MockServer::start().await;
    let mut builder = create_builder(&server);

    let result = builder.put_json_async("/items/1", |_| {}, |_| {});

    assert!(matches!(
        result,
        Err(HttpError::InvalidRequest(InvalidHttpRequestError::MissingBody))
    ));
}

#[tokio::test]
async fn test_async_dispatch_snapshots_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"version": 1})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut builder = create_builder(&server);
    let handle = builder
        .with_json(json!({"version": 1}))
        .post_async("/items", |_| {}, |error| panic!("unexpected error: {error}"))
        .unwrap();

    builder.with_json(json!({"version": 2}));
    handle.await.unwrap();
}
