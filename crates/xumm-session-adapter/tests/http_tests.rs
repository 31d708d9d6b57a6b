/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for the REST client
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints change
*/

mod common;

use common::{
    ACCOUNT, PAYLOAD_UUID, client_for, created_payload, created_payload_json, payload_record_json,
    payload_uuid, setup_mock_server,
};
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};
use xumm_session_adapter::{
    ApiCredentials, ClientConfig, PayloadApi, PayloadBody, XummClient, XummError,
};

const NO_WS: &str = "ws://127.0.0.1:9/sign/";

#[test]
fn test_client_creation() {
    let client = assert_ok!(XummClient::new(ApiCredentials::new("key", "secret")));
    assert_eq!(client.api_base_url().as_str(), "https://xumm.app/api/v1/");
    assert_eq!(
        client.subscription_url(payload_uuid()).unwrap().as_str(),
        format!("wss://xumm.app/sign/{PAYLOAD_UUID}")
    );
}

#[test]
fn test_client_rejects_empty_key() {
    let result = XummClient::with_config(ApiCredentials::new(" ", "secret"), ClientConfig::default());
    assert!(matches!(result, Err(XummError::Config(_))));
}

#[test]
fn test_error_retryable() {
    assert!(XummError::RateLimit { retry_after: 5 }.is_retryable());
    assert!(!XummError::InvalidPayload.is_retryable());
    assert!(!XummError::SignInProgress.is_retryable());
}

#[tokio::test]
async fn test_payload_lifecycle_endpoints() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/platform/payload"))
        .and(header("X-API-Key", "test-key"))
        .and(header("X-API-Secret", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created_payload_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/platform/payload/{PAYLOAD_UUID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload_record_json(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/platform/payload/{PAYLOAD_UUID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": { "cancelled": false, "reason": "ALREADY_RESOLVED" },
            "meta": { "exists": true, "uuid": PAYLOAD_UUID, "resolved": true, "signed": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, NO_WS);

    let created = assert_ok!(client.create_payload(&PayloadBody::sign_in()).await);
    assert_eq!(created.uuid, payload_uuid());

    let record = assert_ok!(client.get_payload(created.uuid).await);
    assert!(record.is_signed());
    assert_eq!(record.signer_account(), Some(ACCOUNT));
    assert_eq!(record.txid(), Some("A1B2C3"));

    let cancel = assert_ok!(client.cancel_payload(created.uuid).await);
    assert!(!cancel.result.cancelled);
    assert_eq!(cancel.result.reason.as_deref(), Some("ALREADY_RESOLVED"));
}

#[tokio::test]
async fn test_error_mapping() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path(format!("/platform/payload/{PAYLOAD_UUID}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "reference": "abc", "code": 404 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/platform/ping"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let client = client_for(&server, NO_WS);

    let err = client.get_payload(payload_uuid()).await.unwrap_err();
    assert!(matches!(err, XummError::Api { code: 404, .. }));

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, XummError::RateLimit { retry_after: 7 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_payload_api_subscription_unavailable_is_none() {
    let server = setup_mock_server().await;
    let client = client_for(&server, NO_WS);

    let subscription = assert_ok!(PayloadApi::subscribe(&client, &created_payload()).await);
    assert!(subscription.is_none());
}
