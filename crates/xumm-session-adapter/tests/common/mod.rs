/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock capabilities
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for xumm-session-adapter tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use uuid::Uuid;
use wiremock::MockServer;
use xumm_session_adapter::{
    ApiCredentials, AuthEvent, AuthEventBus, Authorizer, ClientConfig, CreatedPayload,
    EmbeddedHost, Environment, PayloadApi, PayloadBody, PayloadRecord, PayloadSubscription,
    RedirectSurface, Result, SurfaceOpener, User, XummClient,
};

pub const PAYLOAD_UUID: &str = "0b0e8cf7-3d91-4b5c-9e0e-4a8f3f8f2c11";
pub const ACCOUNT: &str = "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn payload_uuid() -> Uuid {
    Uuid::parse_str(PAYLOAD_UUID).expect("valid uuid")
}

pub fn created_payload() -> CreatedPayload {
    serde_json::from_value(created_payload_json()).expect("created payload")
}

/// Created payload without a status URL, so subscriptions use the client's
/// websocket base
pub fn created_payload_json() -> serde_json::Value {
    serde_json::json!({
        "uuid": PAYLOAD_UUID,
        "next": { "always": format!("https://xumm.app/sign/{PAYLOAD_UUID}") },
        "refs": {
            "qr_png": format!("https://xumm.app/sign/{PAYLOAD_UUID}_q.png")
        },
        "pushed": false
    })
}

/// Created payload whose status URL points at `ws_base`
pub fn created_payload_with_status(ws_base: &str) -> CreatedPayload {
    let mut json = created_payload_json();
    json["refs"]["websocket_status"] = serde_json::json!(format!("{ws_base}{PAYLOAD_UUID}"));
    serde_json::from_value(json).expect("created payload")
}

pub fn payload_record_json(signed: bool) -> serde_json::Value {
    serde_json::json!({
        "meta": {
            "exists": true,
            "uuid": PAYLOAD_UUID,
            "resolved": true,
            "signed": signed,
            "cancelled": false,
            "expired": false
        },
        "application": { "name": "Demo app", "issued_user_token": "issued-token" },
        "payload": { "tx_type": "SignIn", "request_json": { "TransactionType": "SignIn" } },
        "response": {
            "txid": "A1B2C3",
            "account": ACCOUNT,
            "dispatched_nodetype": "TESTNET"
        }
    })
}

pub fn payload_record(signed: bool) -> PayloadRecord {
    serde_json::from_value(payload_record_json(signed)).expect("payload record")
}

/// REST client pointed at a mock server and a websocket base
pub fn client_for(server: &MockServer, ws_base_url: &str) -> XummClient {
    let config = ClientConfig {
        api_base_url: server.uri(),
        ws_base_url: ws_base_url.to_string(),
        ..ClientConfig::default()
    };
    XummClient::with_config(ApiCredentials::new("test-key", "test-secret"), config)
        .expect("client init")
}

/// Websocket server that sends the given frames to the first connection
pub async fn serve_ws_frames(frames: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut ws) = accept_async(stream).await else {
            return;
        };
        for frame in frames {
            if ws.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = ws.close(None).await;
    });
    format!("ws://{addr}/sign/")
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Payload capability driven by the test
pub struct MockPayloadApi {
    created: Mutex<Option<CreatedPayload>>,
    subscriptions: Mutex<VecDeque<mpsc::Receiver<String>>>,
    record: Mutex<PayloadRecord>,
    pub creates: AtomicUsize,
    pub subscribes: AtomicUsize,
    pub gets: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl MockPayloadApi {
    pub fn new(created: Option<CreatedPayload>) -> Self {
        Self {
            created: Mutex::new(created),
            subscriptions: Mutex::new(VecDeque::new()),
            record: Mutex::new(payload_record(true)),
            creates: AtomicUsize::new(0),
            subscribes: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        }
    }

    /// Queue a subscription and return the sender feeding its frames
    pub fn push_subscription(&self) -> mpsc::Sender<String> {
        let (tx, rx) = mpsc::channel(16);
        self.subscriptions.lock().unwrap().push_back(rx);
        tx
    }

    pub fn set_record(&self, record: PayloadRecord) {
        *self.record.lock().unwrap() = record;
    }
}

#[async_trait]
impl PayloadApi for MockPayloadApi {
    async fn create(&self, _body: &PayloadBody) -> Result<Option<CreatedPayload>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.created.lock().unwrap().clone())
    }

    async fn subscribe(&self, created: &CreatedPayload) -> Result<Option<PayloadSubscription>> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let frames = self.subscriptions.lock().unwrap().pop_front();
        Ok(frames.map(|rx| PayloadSubscription::from_channel(created.uuid, rx)))
    }

    async fn get(&self, _uuid: Uuid) -> Result<PayloadRecord> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.record.lock().unwrap().clone())
    }

    async fn cancel(&self, _uuid: Uuid) -> Result<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Surface opener that records every open and close
#[derive(Default)]
pub struct RecordingSurfaces {
    pub opened: Mutex<Vec<Url>>,
    pub closed: Arc<AtomicUsize>,
}

impl RecordingSurfaces {
    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

struct RecordingSurface {
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl RedirectSurface for RecordingSurface {
    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SurfaceOpener for RecordingSurfaces {
    async fn open(&self, url: &Url) -> Result<Box<dyn RedirectSurface>> {
        self.opened.lock().unwrap().push(url.clone());
        Ok(Box::new(RecordingSurface {
            closed: self.closed.clone(),
        }))
    }
}

/// Embedded host that counts close requests
#[derive(Default)]
pub struct RecordingHost {
    pub closes: AtomicUsize,
}

#[async_trait]
impl EmbeddedHost for RecordingHost {
    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct MockAuthState {
    user: Option<User>,
    environment: Option<Environment>,
}

/// Authorizer whose state and events are driven by the test
pub struct MockAuthorizer {
    events: AuthEventBus,
    state: Mutex<MockAuthState>,
    read_delay: Duration,
    pub authorizes: AtomicUsize,
    pub logouts: AtomicUsize,
}

impl MockAuthorizer {
    pub fn new() -> Self {
        Self::with_read_delay(Duration::ZERO)
    }

    /// Delay every `user()` / `environment()` read
    pub fn with_read_delay(read_delay: Duration) -> Self {
        Self {
            events: AuthEventBus::new(),
            state: Mutex::new(MockAuthState::default()),
            read_delay,
            authorizes: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        }
    }

    /// Replace user and environment in one step
    pub fn set_state(&self, user: Option<User>, environment: Option<Environment>) {
        *self.state.lock().unwrap() = MockAuthState { user, environment };
    }

    pub fn emit(&self, event: AuthEvent) {
        self.events.emit(event);
    }

    async fn pause(&self) {
        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }
    }
}

/// Environment tagged with a marker in its locale
pub fn tagged_environment(tag: &str) -> Environment {
    Environment {
        application: None,
        ott: Some(xumm_session_adapter::OttData {
            locale: Some(tag.to_string()),
            ..Default::default()
        }),
        embedded: false,
    }
}

#[async_trait]
impl Authorizer for MockAuthorizer {
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn authorize(&self) -> Result<()> {
        self.authorizes.fetch_add(1, Ordering::SeqCst);
        self.set_state(None, Some(tagged_environment("ready")));
        self.events.emit(AuthEvent::Ready);
        self.set_state(Some(User::new(ACCOUNT)), Some(tagged_environment("ready")));
        self.events.emit(AuthEvent::Success);
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        self.set_state(None, None);
        self.events.emit(AuthEvent::LoggedOut);
        Ok(())
    }

    async fn user(&self) -> Result<Option<User>> {
        let user = self.state.lock().unwrap().user.clone();
        self.pause().await;
        Ok(user)
    }

    async fn environment(&self) -> Result<Option<Environment>> {
        let environment = self.state.lock().unwrap().environment.clone();
        self.pause().await;
        Ok(environment)
    }
}
