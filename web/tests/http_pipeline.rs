//! End-to-end HTTP tests: correlation IDs, mediator dispatch and problem details.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use crosscut_core::mediator::Request;
use crosscut_core::{CancellationToken, Mediator, Outcome};
use crosscut_testing::logs;
use crosscut_testing::mocks::{CallLog, RecordingBehavior};
use crosscut_web::{
    correlation_id_layer, AppState, CorrelationId, PropagateCorrelationIdLayer, WebResult,
    CORRELATION_ID_HEADER, PROBLEM_JSON,
};
use serde::Serialize;
use std::convert::Infallible;
use tower::{ServiceBuilder, ServiceExt};

struct GetOrder {
    id: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderView {
    order_id: u64,
    customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl Request for GetOrder {
    type Output = OrderView;
}

struct Unwired;

impl Request for Unwired {
    type Output = ();
}

async fn get_order(State(state): State<AppState>, Path(id): Path<u64>) -> WebResult<Json<OrderView>> {
    let order = state
        .mediator
        .send(GetOrder { id }, &CancellationToken::new())
        .await?
        .into_result()?;
    Ok(Json(order))
}

async fn unwired(State(state): State<AppState>) -> WebResult<StatusCode> {
    state
        .mediator
        .send(Unwired, &CancellationToken::new())
        .await?
        .into_result()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn echo_downstream_header() -> String {
    let downstream = tower::service_fn(|req: http::Request<()>| async move {
        Ok::<_, Infallible>(
            req.headers()
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string(),
        )
    });
    let client = ServiceBuilder::new()
        .layer(PropagateCorrelationIdLayer)
        .service(downstream);
    client.oneshot(http::Request::new(())).await.unwrap_or_default()
}

async fn own_header() -> impl IntoResponse {
    ([(CORRELATION_ID_HEADER, "set-by-handler")], "ok")
}

async fn logged(id: CorrelationId) -> &'static str {
    tracing::info!(order_count = 3, "Listing orders");
    assert_eq!(CorrelationId::current(), Some(id));
    "ok"
}

fn app(log: &CallLog) -> Router {
    let mediator = Mediator::builder()
        .handler_fn(|request: &GetOrder| {
            if request.id == 1 {
                Outcome::success_with(OrderView {
                    order_id: 1,
                    customer_name: "Ada".to_string(),
                    note: None,
                })
            } else {
                Outcome::failure_with_code(404, [format!("order {} not found", request.id)])
            }
        })
        .behavior(RecordingBehavior::<GetOrder>::passing(log.clone()))
        .build()
        .unwrap();

    Router::new()
        .route("/orders/:id", get(get_order))
        .route("/unwired", get(unwired))
        .route("/outbound", get(echo_downstream_header))
        .route("/own-header", get(own_header))
        .route("/logged", get(logged))
        .layer(correlation_id_layer())
        .with_state(AppState::new(mediator))
}

fn get_with_id(uri: &str, id: &str) -> http::Request<Body> {
    http::Request::builder()
        .uri(uri)
        .header(CORRELATION_ID_HEADER, id)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn successful_request_returns_camel_case_json() {
    let log = CallLog::new();
    let response = app(&log)
        .oneshot(get_with_id("/orders/1", "req-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CORRELATION_ID_HEADER], "req-1");

    let json = json_body(response).await;
    assert_eq!(json["orderId"], 1);
    assert_eq!(json["customerName"], "Ada");
    assert!(json.get("note").is_none());
    assert_eq!(log.entries(), vec!["before", "after", "after:success"]);
}

#[tokio::test]
async fn domain_failure_becomes_problem_with_correlation_id() {
    let log = CallLog::new();
    let response = app(&log)
        .oneshot(get_with_id("/orders/7", "req-7"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CONTENT_TYPE], PROBLEM_JSON);

    let json = json_body(response).await;
    assert_eq!(json["status"], 404);
    assert_eq!(json["title"], "Not Found");
    assert_eq!(json["errors"][0], "order 7 not found");
    assert_eq!(json["correlationId"], "req-7");
    assert_eq!(log.count("after:failure"), 1);
}

#[tokio::test]
async fn missing_handler_is_logged_server_error() {
    let (events, _guard) = logs::capture();
    let response = app(&CallLog::new())
        .oneshot(get_with_id("/unwired", "req-500"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["status"], 500);
    assert_eq!(json["correlationId"], "req-500");

    let logged = events.with_message("Internal server error");
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].span_field("correlation_id"), Some("req-500"));
}

#[tokio::test]
async fn log_lines_inside_request_carry_correlation_id() {
    let (events, _guard) = logs::capture();
    let response = app(&CallLog::new())
        .oneshot(get_with_id("/logged", "trace-me"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let listed = events.with_message("Listing orders");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].span_field("correlation_id"), Some("trace-me"));
    assert_eq!(listed[0].field("order_count"), Some("3"));
}

#[tokio::test]
async fn handler_set_header_is_kept() {
    let response = app(&CallLog::new())
        .oneshot(get_with_id("/own-header", "from-client"))
        .await
        .unwrap();

    assert_eq!(response.headers()[CORRELATION_ID_HEADER], "set-by-handler");
}

#[tokio::test]
async fn outbound_requests_carry_inbound_id() {
    let response = app(&CallLog::new())
        .oneshot(get_with_id("/outbound", "chain-42"))
        .await
        .unwrap();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"chain-42");
}

#[tokio::test]
async fn outbound_outside_request_is_untouched() {
    assert_eq!(echo_downstream_header().await, "none");
}

#[tokio::test]
async fn outbound_keeps_explicit_header() {
    let downstream = tower::service_fn(|req: http::Request<()>| async move {
        Ok::<_, Infallible>(req.headers()[CORRELATION_ID_HEADER].clone())
    });
    let client = ServiceBuilder::new()
        .layer(PropagateCorrelationIdLayer)
        .service(downstream);
    let request = http::Request::builder()
        .header(CORRELATION_ID_HEADER, "explicit")
        .body(())
        .unwrap();

    let seen = CorrelationId::generate()
        .scope(client.oneshot(request))
        .await
        .unwrap();

    assert_eq!(seen, "explicit");
}
