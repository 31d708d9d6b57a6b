/*
[INPUT]:  WebSocket test scenarios
[OUTPUT]: Test results for payload subscriptions
[POS]:    Integration tests - WebSocket
[UPDATE]: When subscription handling changes
*/

mod common;

use common::{
    client_for, created_payload_with_status, payload_uuid, serve_ws_frames, setup_mock_server,
};
use tokio::sync::mpsc;
use url::Url;
use xumm_session_adapter::ws::connect_subscription;
use xumm_session_adapter::{PayloadApi, PayloadSubscription, SubscriptionMessage};

#[tokio::test]
async fn test_subscription_over_local_socket() {
    let base = serve_ws_frames(vec![
        r#"{"message":"Welcome"}"#.to_string(),
        r#"{"expires_in_seconds":300}"#.to_string(),
        r#"{"signed":true,"txid":"A1B2C3"}"#.to_string(),
    ])
    .await;
    let url = Url::parse(&base).unwrap().join(&payload_uuid().to_string()).unwrap();

    let mut subscription = connect_subscription(&url, payload_uuid()).await.unwrap();
    assert_eq!(subscription.uuid(), payload_uuid());

    let mut kinds = Vec::new();
    while let Some(message) = subscription.next_message().await {
        kinds.push(message.kind());
        if let SubscriptionMessage::Resolved(resolution) = message {
            assert!(resolution.signed);
        }
    }
    assert_eq!(kinds, vec!["welcome", "expires_in", "resolved"]);
}

#[tokio::test]
async fn test_channel_subscription_skips_garbage() {
    let (tx, rx) = mpsc::channel(4);
    tx.send("}{".to_string()).await.unwrap();
    tx.send(r#"{"expired":true}"#.to_string()).await.unwrap();
    drop(tx);

    let mut subscription = PayloadSubscription::from_channel(payload_uuid(), rx);
    assert_eq!(
        subscription.next_message().await,
        Some(SubscriptionMessage::Expired)
    );
    assert!(subscription.next_message().await.is_none());
}

#[tokio::test]
async fn test_payload_api_follows_returned_status_url() {
    let server = setup_mock_server().await;
    let status_base = serve_ws_frames(vec![r#"{"signed":false}"#.to_string()]).await;
    let client = client_for(&server, "ws://127.0.0.1:9/sign/");

    let mut subscription = client
        .subscribe(&created_payload_with_status(&status_base))
        .await
        .unwrap()
        .expect("subscription on the returned status url");

    match subscription.next_message().await {
        Some(SubscriptionMessage::Resolved(resolution)) => assert!(!resolution.signed),
        other => panic!("unexpected message: {other:?}"),
    }
}
