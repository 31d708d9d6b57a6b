/*
[INPUT]:  Payload API schema definitions and serde requirements
[OUTPUT]: Typed payload request/response structs
[POS]:    Data layer - type definitions for payload creation and retrieval
[UPDATE]: When payload schema changes or new fields are consumed
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// Body submitted to `POST platform/payload`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txjson: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txblob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PayloadOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_meta: Option<CustomMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
}

impl PayloadBody {
    /// Body wrapping a transaction in JSON form
    pub fn from_txjson(txjson: Value) -> Self {
        Self {
            txjson: Some(txjson),
            txblob: None,
            options: None,
            custom_meta: None,
            user_token: None,
        }
    }

    /// Pseudo-transaction used to identify the signing account
    pub fn sign_in() -> Self {
        Self::from_txjson(serde_json::json!({ "TransactionType": "SignIn" }))
    }

    /// Push the request straight to a known user's device
    pub fn with_user_token(mut self, user_token: impl Into<String>) -> Self {
        self.user_token = Some(user_token.into());
        self
    }

    /// Text shown to the user next to the sign request
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.custom_meta
            .get_or_insert_with(CustomMeta::default)
            .instruction = Some(instruction.into());
        self
    }

    pub fn with_options(mut self, options: PayloadOptions) -> Self {
        self.options = Some(options);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multisign: Option<bool>,
    /// Expiry in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<ReturnUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_network: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnUrl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// Descriptor returned when a payload has been created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPayload {
    pub uuid: Uuid,
    pub next: PayloadNext,
    #[serde(default)]
    pub refs: PayloadRefs,
    #[serde(default)]
    pub pushed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadNext {
    /// Redirect target that always leads to the sign request
    pub always: Url,
    #[serde(default)]
    pub no_push_msg_received: Option<Url>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadRefs {
    #[serde(default)]
    pub qr_png: Option<Url>,
    #[serde(default)]
    pub qr_matrix: Option<Url>,
    #[serde(default)]
    pub qr_uri_quality_opts: Vec<String>,
    #[serde(default)]
    pub websocket_status: Option<Url>,
}

/// Full payload record from `GET platform/payload/{uuid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadRecord {
    pub meta: PayloadMeta,
    #[serde(default)]
    pub application: Option<PayloadApplication>,
    #[serde(default)]
    pub payload: Option<PayloadDetails>,
    #[serde(default)]
    pub response: Option<PayloadResponse>,
    #[serde(default)]
    pub custom_meta: Option<CustomMeta>,
}

impl PayloadRecord {
    pub fn is_signed(&self) -> bool {
        self.meta.signed
    }

    /// Account that signed, if any
    pub fn signer_account(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|response| response.account.as_deref())
            .filter(|account| !account.is_empty())
    }

    /// Txid of the signed transaction, if any
    pub fn txid(&self) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|response| response.txid.as_deref())
            .filter(|txid| !txid.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadMeta {
    #[serde(default)]
    pub exists: bool,
    pub uuid: Uuid,
    #[serde(default)]
    pub multisign: bool,
    #[serde(default)]
    pub submit: bool,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub resolved_destination: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub signed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub pushed: bool,
    #[serde(default)]
    pub app_opened: bool,
    #[serde(default)]
    pub opened_by_deeplink: Option<bool>,
    #[serde(default)]
    pub return_url_app: Option<String>,
    #[serde(default)]
    pub return_url_web: Option<String>,
    #[serde(default)]
    pub is_xapp: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadApplication {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub disabled: Option<u8>,
    #[serde(default)]
    pub uuidv4: Option<Uuid>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub issued_user_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadDetails {
    pub tx_type: String,
    #[serde(default)]
    pub tx_destination: Option<String>,
    #[serde(default)]
    pub tx_destination_tag: Option<u32>,
    #[serde(default)]
    pub request_json: Value,
    #[serde(default)]
    pub origintype: Option<String>,
    #[serde(default)]
    pub signmethod: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadResponse {
    #[serde(default)]
    pub hex: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dispatched_to: Option<String>,
    #[serde(default)]
    pub dispatched_result: Option<String>,
    #[serde(default)]
    pub dispatched_nodetype: Option<String>,
    #[serde(default)]
    pub multisign_account: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Result of `DELETE platform/payload/{uuid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelResult {
    pub result: CancelOutcome,
    #[serde(default)]
    pub meta: Option<PayloadMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOutcome {
    pub cancelled: bool,
    #[serde(default)]
    pub reason: Option<String>,
}
