//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use capmint_crypto::keypair_from_seed;
use capmint_gateway::MintGateway;
use capmint_nullables::{NullLedger, NullVerifier};
use capmint_rpc::{build_router, AppState, GatewayMetrics};
use capmint_types::{Address, MintAmount};
use capmint_verification::{VerificationOutcome, VerifierError};
use std::sync::Arc;
use tower::ServiceExt;

const RECIPIENT: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const CONTRACT: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

async fn app_with(ledger: Arc<NullLedger>) -> Router {
    let verifier = NullVerifier::rejecting()
        .on("good-token", VerificationOutcome::Accepted)
        .on(
            "down-token",
            VerificationOutcome::VerifierUnavailable(VerifierError::HttpStatus(500)),
        );
    let gateway = MintGateway::connect(
        Arc::new(verifier),
        ledger.clone(),
        keypair_from_seed(&[2u8; 32]),
        Address::parse(CONTRACT).unwrap(),
        MintAmount::new(100),
    )
    .await
    .unwrap();
    build_router(AppState {
        gateway: Arc::new(gateway),
        token: ledger,
        metrics: Some(Arc::new(GatewayMetrics::new().unwrap())),
    })
}

async fn app() -> Router {
    app_with(Arc::new(NullLedger::new(3).with_cap(1_000))).await
}

fn mint_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/token/mint")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn mint_body(address: &str, token: &str) -> String {
    serde_json::json!({ "recipientAddress": address, "humanityProof": token }).to_string()
}

#[tokio::test]
async fn good_request_is_submitted() {
    let response = app()
        .await
        .oneshot(mint_request(mint_body(RECIPIENT, "good-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "submitted");
    let id = body["transactionId"].as_str().unwrap();
    assert!(id.starts_with("0x"));
}

#[tokio::test]
async fn front_end_field_names_are_accepted() {
    let body = serde_json::json!({ "address": RECIPIENT, "token": "good-token" }).to_string();
    let response = app().await.oneshot(mint_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_address_is_bad_request() {
    let response = app()
        .await
        .oneshot(mint_request(mint_body("not-an-address", "good-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({ "status": "invalid_input" }));
}

#[tokio::test]
async fn unparseable_body_is_invalid_input() {
    let response = app()
        .await
        .oneshot(mint_request("{ nope".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["status"], "invalid_input");
}

#[tokio::test]
async fn rejected_proof_is_forbidden() {
    let response = app()
        .await
        .oneshot(mint_request(mint_body(RECIPIENT, "bad-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["status"], "verification_failed");
}

#[tokio::test]
async fn oracle_outage_is_service_unavailable() {
    let response = app()
        .await
        .oneshot(mint_request(mint_body(RECIPIENT, "down-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["status"], "verifier_error");
}

#[tokio::test]
async fn ledger_rejection_is_bad_gateway() {
    let ledger = Arc::new(NullLedger::new(0).with_cap(50));
    let response = app_with(ledger.clone())
        .await
        .oneshot(mint_request(mint_body(RECIPIENT, "good-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["status"], "submission_failed");
    assert!(body.get("transactionId").is_none());
    assert_eq!(ledger.dispatched_sequences(), vec![0]);
}

#[tokio::test]
async fn cap_and_supply_are_decimal_strings() {
    let ledger = Arc::new(NullLedger::new(0).with_cap(21_000_000).with_supply(1_234));
    let app = app_with(ledger).await;

    let response = app.clone().oneshot(get("/token/cap")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({ "cap": "21000000" }));

    let response = app.oneshot(get("/token/supply")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({ "supply": "1234" }));
}

#[tokio::test]
async fn price_is_not_found() {
    let response = app().await.oneshot(get("/token/price")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthcheck_is_ok() {
    let response = app().await.oneshot(get("/healthcheck")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/token/cap")
        .header("origin", "https://faucet.example")
        .body(Body::empty())
        .unwrap();
    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn metrics_count_outcomes_and_track_sequence() {
    let app = app().await;
    app.clone()
        .oneshot(mint_request(mint_body(RECIPIENT, "good-token")))
        .await
        .unwrap();
    app.clone()
        .oneshot(mint_request(mint_body("0x12", "good-token")))
        .await
        .unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = text_body(response).await;
    assert!(text.contains("capmint_mint_outcomes_total{status=\"submitted\"} 1"));
    assert!(text.contains("capmint_mint_outcomes_total{status=\"invalid_input\"} 1"));
    assert!(text.contains("capmint_next_sequence 4"));
}

#[tokio::test]
async fn metrics_disabled_is_not_found() {
    let ledger = Arc::new(NullLedger::new(0));
    let gateway = MintGateway::connect(
        Arc::new(NullVerifier::accepting()),
        ledger.clone(),
        keypair_from_seed(&[2u8; 32]),
        Address::parse(CONTRACT).unwrap(),
        MintAmount::new(1),
    )
    .await
    .unwrap();
    let app = build_router(AppState {
        gateway: Arc::new(gateway),
        token: ledger,
        metrics: None,
    });
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sequence_gauge_moves_while_a_mint_is_in_flight() {
    let ledger = Arc::new(NullLedger::new(0).with_delay(std::time::Duration::from_millis(300)));
    let app = app_with(ledger.clone()).await;

    let in_flight = tokio::spawn(
        app.clone()
            .oneshot(mint_request(mint_body(RECIPIENT, "good-token"))),
    );
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(ledger.dispatched_sequences(), vec![0]);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    let text = text_body(response).await;
    assert!(text.contains("capmint_next_sequence 1"), "{text}");

    let response = in_flight.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
