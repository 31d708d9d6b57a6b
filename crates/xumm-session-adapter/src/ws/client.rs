/*
[INPUT]:  Payload status websocket URL
[OUTPUT]: PayloadSubscription yielding typed status messages via a channel
[POS]:    WebSocket layer - per-payload status stream handling
[UPDATE]: When changing connection logic or frame handling
*/

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::http::{Result, XummError};
use crate::ws::SubscriptionMessage;

const FRAME_BUFFER: usize = 64;
const RAW_LOG_MAX_BYTES: usize = 512;

/// Live status channel bound to one payload
///
/// Frames arrive in order through an mpsc channel fed by a background task.
/// The channel ends when the socket closes; dropping the subscription closes
/// the socket.
#[derive(Debug)]
pub struct PayloadSubscription {
    uuid: Uuid,
    frames: mpsc::Receiver<String>,
    shutdown: CancellationToken,
}

impl PayloadSubscription {
    /// Wrap an existing frame channel (used by alternative transports and tests)
    pub fn from_channel(uuid: Uuid, frames: mpsc::Receiver<String>) -> Self {
        Self {
            uuid,
            frames,
            shutdown: CancellationToken::new(),
        }
    }

    /// Payload this subscription tracks
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Next raw text frame, `None` once the channel has closed
    pub async fn next_frame(&mut self) -> Option<String> {
        self.frames.recv().await
    }

    /// Next frame that parses as a status message
    ///
    /// Frames that are not JSON are logged and skipped.
    pub async fn next_message(&mut self) -> Option<SubscriptionMessage> {
        loop {
            let raw = self.next_frame().await?;
            match SubscriptionMessage::parse(&raw) {
                Ok(message) => return Some(message),
                Err(err) => {
                    warn!(
                        uuid = %self.uuid,
                        error = %err,
                        bytes = raw.len(),
                        frame = %truncate_for_log(&raw, RAW_LOG_MAX_BYTES),
                        "subscription frame parse failed"
                    );
                }
            }
        }
    }

    /// Close the underlying socket
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for PayloadSubscription {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Open the status websocket for a payload
pub async fn connect_subscription(url: &Url, uuid: Uuid) -> Result<PayloadSubscription> {
    let (ws_stream, _response) = connect_async(url.as_str())
        .await
        .map_err(|err| XummError::WebSocket(err.to_string()))?;
    let (mut write, mut read) = ws_stream.split();
    let (frame_tx, frame_rx) = mpsc::channel(FRAME_BUFFER);
    let shutdown = CancellationToken::new();
    let task_shutdown = shutdown.clone();

    info!(uuid = %uuid, url = %url, "payload subscription opened");

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = task_shutdown.cancelled() => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    break;
                }
                incoming = read.next() => {
                    match incoming {
                        Some(Ok(WsMessage::Text(text))) => {
                            if frame_tx.send(text.to_string()).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(WsMessage::Binary(bytes))) => {
                            if let Ok(text) = String::from_utf8(bytes.to_vec()) {
                                if frame_tx.send(text).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            debug!(uuid = %uuid, ?frame, "payload subscription closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(uuid = %uuid, error = %err, "payload subscription read failed");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
        debug!(uuid = %uuid, "payload subscription task finished");
    });

    Ok(PayloadSubscription {
        uuid,
        frames: frame_rx,
        shutdown,
    })
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    async fn serve_frames(frames: Vec<&'static str>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            for frame in frames {
                ws.send(WsMessage::Text(frame.into())).await.unwrap();
            }
            let _ = ws.close(None).await;
        });
        Url::parse(&format!("ws://{addr}/sign/test")).unwrap()
    }

    #[tokio::test]
    async fn test_subscription_yields_frames_in_order() {
        let url = serve_frames(vec![
            r#"{"message":"Welcome"}"#,
            "not json",
            r#"{"opened":true}"#,
            r#"{"signed":true}"#,
        ])
        .await;

        let mut subscription = connect_subscription(&url, Uuid::new_v4()).await.unwrap();
        assert!(matches!(
            subscription.next_message().await,
            Some(SubscriptionMessage::Welcome { .. })
        ));
        assert_eq!(
            subscription.next_message().await,
            Some(SubscriptionMessage::Opened)
        );
        assert!(matches!(
            subscription.next_message().await,
            Some(SubscriptionMessage::Resolved(_))
        ));
        assert!(subscription.next_message().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_failure_is_websocket_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("ws://{addr}/sign/test")).unwrap();
        let err = connect_subscription(&url, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, XummError::WebSocket(_)));
    }

    #[tokio::test]
    async fn test_from_channel_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let mut subscription = PayloadSubscription::from_channel(Uuid::new_v4(), rx);
        tx.send(r#"{"expired":true}"#.to_string()).await.unwrap();
        drop(tx);

        assert_eq!(
            subscription.next_message().await,
            Some(SubscriptionMessage::Expired)
        );
        assert!(subscription.next_message().await.is_none());
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let value = "ééééé";
        let truncated = truncate_for_log(value, 3);
        assert_eq!(truncated, "é...");
    }
}
