//! Integration tests — build the router around a stub provider and drive it
//! with `oneshot` requests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use botrelay_api::{AppState, config::ApiConfig};
use botrelay_core::bots::BotRegistry;
use botrelay_core::config::GatewayConfig;
use botrelay_core::gateway::{FALLBACK_NOTE, Gateway};
use botrelay_core::picker::{FixedPicker, RandomPicker, ReplyPicker};
use botrelay_core::provider::{ChatMessage, CompletionProvider, UpstreamError};
use serde_json::{Value, json};
use tower::ServiceExt;

enum Behaviour {
    Reply(&'static str),
    Fail,
    Hang,
    Panic,
}

struct StubProvider {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl StubProvider {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Reply(text) => Ok(text.to_string()),
            Behaviour::Fail => Err(UpstreamError::Unauthorized {
                status: 401,
                body: "invalid api key".into(),
            }),
            Behaviour::Hang => std::future::pending().await,
            Behaviour::Panic => panic!("provider exploded"),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn app_with(
    provider: Arc<StubProvider>,
    picker: Arc<dyn ReplyPicker>,
    tweak: impl FnOnce(&mut GatewayConfig),
) -> Router {
    let mut config = GatewayConfig::default();
    config.upstream_timeout = Duration::from_millis(100);
    tweak(&mut config);
    let gateway = Gateway::new(config, provider, picker);
    botrelay_api::router(AppState::new(
        gateway,
        ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            log_requests: true,
        },
    ))
}

fn app(provider: Arc<StubProvider>) -> Router {
    app_with(provider, Arc::new(FixedPicker(0)), |_| {})
}

fn post_chat(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn nfl_fallbacks() -> Vec<String> {
    BotRegistry::builtin().get("nfl").unwrap().fallbacks.clone()
}

#[tokio::test]
async fn live_reply_is_returned_verbatim_without_note() {
    let provider = StubProvider::new(Behaviour::Reply("Touchdown!"));
    let (status, json) = send(
        app(provider.clone()),
        post_chat(json!({"message": "Who won?", "botType": "nfl"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"message": "Touchdown!"}));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn upstream_failure_serves_nfl_fallback_with_note() {
    let provider = StubProvider::new(Behaviour::Fail);
    let (status, json) = send(
        app_with(provider.clone(), Arc::new(RandomPicker), |_| {}),
        post_chat(json!({"message": "Who won the last Super Bowl?", "botType": "nfl"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let message = json["message"].as_str().expect("message is string");
    assert!(nfl_fallbacks().iter().any(|f| f == message));
    assert_eq!(json["note"], FALLBACK_NOTE);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn unknown_bot_type_lists_valid_types() {
    let provider = StubProvider::new(Behaviour::Reply("unused"));
    let (status, json) = send(
        app(provider.clone()),
        post_chat(json!({"message": "hi", "botType": "movies"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid bot type");
    assert_eq!(json["validTypes"], json!(["ebay", "nfl", "homedepot"]));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn missing_fields_are_rejected_before_upstream() {
    let provider = StubProvider::new(Behaviour::Reply("unused"));
    let bodies = [
        json!({}),
        json!({"message": "hi"}),
        json!({"botType": "nfl"}),
        json!({"message": "", "botType": "nfl"}),
        json!({"message": "   ", "botType": "ebay"}),
        json!({"message": null, "botType": "nfl"}),
    ];

    for body in bodies {
        let (status, json) = send(app(provider.clone()), post_chat(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["error"], "Message and botType are required");
        assert!(json.get("received").is_some());
    }
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn validation_is_idempotent() {
    let provider = StubProvider::new(Behaviour::Reply("unused"));
    let mut seen = HashSet::new();
    for _ in 0..5 {
        let (status, json) = send(
            app(provider.clone()),
            post_chat(json!({"message": "hi", "botType": "movies"})),
        )
        .await;
        seen.insert((status, json.to_string()));
    }
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let provider = StubProvider::new(Behaviour::Reply("unused"));
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, json) = send(app(provider.clone()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid request body");
    assert!(json["details"].is_string());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn hanging_upstream_degrades_to_fallback() {
    let provider = StubProvider::new(Behaviour::Hang);
    let (status, json) = tokio::time::timeout(
        Duration::from_secs(5),
        send(
            app(provider),
            post_chat(json!({"message": "hi", "botType": "nfl"})),
        ),
    )
    .await
    .expect("request must not hang");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], nfl_fallbacks()[0].as_str());
    assert_eq!(json["note"], FALLBACK_NOTE);
}

#[tokio::test]
async fn fallback_disabled_surfaces_internal_error() {
    let provider = StubProvider::new(Behaviour::Fail);
    let (status, json) = send(
        app_with(provider, Arc::new(FixedPicker(0)), |c| {
            c.fallback_enabled = false;
        }),
        post_chat(json!({"message": "hi", "botType": "nfl"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An error occurred while processing your request");
    assert!(json["details"].as_str().unwrap().contains("invalid api key"));
}

#[tokio::test]
async fn handler_panic_becomes_500() {
    let provider = StubProvider::new(Behaviour::Panic);
    let (status, json) = send(
        app(provider),
        post_chat(json!({"message": "hi", "botType": "nfl"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Something went wrong");
    assert_eq!(json["details"], "provider exploded");
}

#[tokio::test]
async fn health_reports_ok_with_timestamp() {
    let req = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(StubProvider::new(Behaviour::Fail)), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    let ts = json["timestamp"].as_str().expect("timestamp is string");
    assert!(ts.ends_with('Z'), "unexpected timestamp: {ts}");
    chrono::DateTime::parse_from_rfc3339(ts).expect("RFC 3339 timestamp");
}

#[tokio::test]
async fn chat_info_lists_endpoints_and_bots() {
    let req = Request::builder()
        .uri("/api/chat")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(StubProvider::new(Behaviour::Fail)), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["endpoints"]["health"], "GET /api/health");
    assert_eq!(json["endpoints"]["chat"], "POST /api/chat");
    assert_eq!(json["botTypes"], json!(["ebay", "nfl", "homedepot"]));
}

#[tokio::test]
async fn unmatched_route_is_404_with_path() {
    let req = Request::builder()
        .uri("/api/unknown")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(StubProvider::new(Behaviour::Fail)), req).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"error": "Not Found", "path": "/api/unknown"}));
}

#[tokio::test]
async fn unsupported_method_is_404() {
    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/api/chat")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app(StubProvider::new(Behaviour::Fail)), req).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["path"], "/api/chat");
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .header(header::ORIGIN, "http://192.168.0.10:8081")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let resp = app(StubProvider::new(Behaviour::Fail))
        .oneshot(req)
        .await
        .expect("request");
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn logging_toggle_does_not_change_responses() {
    let provider = StubProvider::new(Behaviour::Reply("quiet"));
    let gateway = Gateway::new(
        GatewayConfig::default(),
        provider.clone(),
        Arc::new(FixedPicker(0)),
    );
    let app = botrelay_api::router(AppState::new(
        gateway,
        ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            log_requests: false,
        },
    ));

    let (status, json) = send(app, post_chat(json!({"message": "hi", "botType": "ebay"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "quiet");
}

#[tokio::test]
async fn request_body_survives_debug_logging() {
    // Enable debug so the logging middleware buffers and re-injects the body.
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish(),
    );

    let provider = StubProvider::new(Behaviour::Reply("still here"));
    let (status, json) = send(
        app(provider),
        post_chat(json!({"message": "hi", "botType": "homedepot"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "still here");
}

#[tokio::test]
async fn oversized_body_is_rejected_the_same_with_or_without_logging() {
    let _guard = tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish(),
    );

    let message = "a".repeat(3 * 1024 * 1024);
    let body = json!({"message": message, "botType": "nfl"});

    let mut responses = Vec::new();
    for log_requests in [true, false] {
        let provider = StubProvider::new(Behaviour::Reply("unused"));
        let gateway = Gateway::new(
            GatewayConfig::default(),
            provider.clone(),
            Arc::new(FixedPicker(0)),
        );
        let app = botrelay_api::router(AppState::new(
            gateway,
            ApiConfig {
                bind_addr: "127.0.0.1:0".into(),
                log_requests,
            },
        ));
        responses.push(send(app, post_chat(body.clone())).await);
        assert_eq!(provider.calls(), 0);
    }

    assert_eq!(responses[0], responses[1]);
    let (status, json) = &responses[0];
    assert_eq!(*status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid request body");
}
