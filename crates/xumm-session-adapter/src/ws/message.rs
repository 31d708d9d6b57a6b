/*
[INPUT]:  Raw text frames from a payload status websocket
[OUTPUT]: Typed SubscriptionMessage values
[POS]:    WebSocket layer - message parsing and classification
[UPDATE]: When the status channel gains new frame kinds
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Completion frame sent once the sign request has been resolved
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SignResolution {
    pub signed: bool,
    #[serde(default)]
    pub payload_uuidv4: Option<String>,
    #[serde(default)]
    pub reference_call_uuidv4: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub user_token: Option<bool>,
    #[serde(default)]
    pub opened_by_deeplink: Option<bool>,
    #[serde(default)]
    pub return_url: Option<Value>,
    #[serde(default)]
    pub custom_meta: Option<Value>,
}

impl SignResolution {
    fn signed_only(signed: bool) -> Self {
        Self {
            signed,
            payload_uuidv4: None,
            reference_call_uuidv4: None,
            txid: None,
            user_token: None,
            opened_by_deeplink: None,
            return_url: None,
            custom_meta: None,
        }
    }
}

/// Frames seen on a payload status channel
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionMessage {
    /// Greeting sent right after connecting
    Welcome { message: String },
    /// Remaining lifetime of the payload
    ExpiresIn { seconds: i64 },
    /// The sign request was opened on a device
    Opened,
    /// The user approved, submission pending
    PreSigned,
    /// The signed transaction was submitted
    Dispatched,
    /// Signed or rejected
    Resolved(SignResolution),
    /// The payload expired unresolved
    Expired,
    Other(Value),
}

impl SubscriptionMessage {
    /// Parse a raw frame. Non-JSON frames are an error; unknown JSON is `Other`.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Other(value);
        };

        if let Some(Value::Bool(signed)) = object.get("signed") {
            let signed = *signed;
            return match serde_json::from_value::<SignResolution>(value) {
                Ok(resolution) => Self::Resolved(resolution),
                Err(_) => Self::Resolved(SignResolution::signed_only(signed)),
            };
        }

        if is_true(object.get("expired")) {
            return Self::Expired;
        }
        if is_true(object.get("opened")) {
            return Self::Opened;
        }
        if is_true(object.get("pre_signed")) {
            return Self::PreSigned;
        }
        if is_true(object.get("dispatched")) {
            return Self::Dispatched;
        }
        if let Some(seconds) = object.get("expires_in_seconds").and_then(Value::as_i64) {
            return Self::ExpiresIn { seconds };
        }
        if let Some(message) = object.get("message").and_then(Value::as_str) {
            return Self::Welcome {
                message: message.to_string(),
            };
        }

        Self::Other(value)
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::ExpiresIn { .. } => "expires_in",
            Self::Opened => "opened",
            Self::PreSigned => "pre_signed",
            Self::Dispatched => "dispatched",
            Self::Resolved(_) => "resolved",
            Self::Expired => "expired",
            Self::Other(_) => "other",
        }
    }
}

fn is_true(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}
