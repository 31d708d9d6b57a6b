/*
[INPUT]:  Platform API schema definitions (ping, xApp one-time token)
[OUTPUT]: Typed application and launch-context structs
[POS]:    Data layer - type definitions for platform endpoints
[UPDATE]: When platform schema changes or new fields are consumed
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Response of `GET platform/ping`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    pub pong: bool,
    pub auth: PingAuth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingAuth {
    pub application: ApplicationDetails,
    #[serde(default)]
    pub call: Option<CallDetails>,
    #[serde(default)]
    pub quota: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDetails {
    pub uuidv4: Uuid,
    pub name: String,
    #[serde(default)]
    pub webhookurl: Option<String>,
    #[serde(default)]
    pub disabled: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDetails {
    pub uuidv4: Uuid,
}

/// Launch context handed to an app opened inside the embedded host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OttData {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub nodetype: Option<String>,
    #[serde(default)]
    pub nodewss: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub account_info: Option<OttAccountInfo>,
    #[serde(default)]
    pub accountaccess: Option<String>,
    #[serde(default)]
    pub accounttype: Option<String>,
    #[serde(default)]
    pub origin: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OttAccountInfo {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub blocked: Option<bool>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "kycApproved")]
    pub kyc_approved: Option<bool>,
    #[serde(default, rename = "proSubscription")]
    pub pro_subscription: Option<bool>,
}
