/*
[INPUT]:  Sign-in payload records, embedded launch context, platform application details
[OUTPUT]: Statically typed User / Environment / Session snapshots
[POS]:    Data layer - observable session state
[UPDATE]: When user or environment fields are added
*/

use serde::{Deserialize, Serialize};

use super::payload::PayloadRecord;
use super::platform::{ApplicationDetails, OttData};

/// Profile of the signed-in wallet user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub account: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub network_type: Option<String>,
    #[serde(default)]
    pub network_endpoint: Option<String>,
    #[serde(default)]
    pub blocked: Option<bool>,
    #[serde(default)]
    pub kyc_approved: Option<bool>,
    #[serde(default)]
    pub pro_subscription: Option<bool>,
    /// Token allowing sign requests to be pushed to this user's device
    #[serde(default)]
    pub token: Option<String>,
}

impl User {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            name: None,
            domain: None,
            picture: None,
            source: None,
            network_type: None,
            network_endpoint: None,
            blocked: None,
            kyc_approved: None,
            pro_subscription: None,
            token: None,
        }
    }

    /// User derived from a signed `SignIn` payload
    pub fn from_sign_in(record: &PayloadRecord) -> Option<Self> {
        if !record.is_signed() {
            return None;
        }

        let account = record.signer_account()?;
        let mut user = Self::new(account);
        user.token = record
            .application
            .as_ref()
            .and_then(|application| application.issued_user_token.clone());
        user.network_type = record
            .response
            .as_ref()
            .and_then(|response| response.dispatched_nodetype.clone());
        Some(user)
    }

    /// User described by the embedded host's launch context
    pub fn from_ott(ott: &OttData) -> Option<Self> {
        let info = ott.account_info.as_ref();
        let account = ott
            .account
            .clone()
            .or_else(|| info.and_then(|info| info.account.clone()))
            .filter(|account| !account.is_empty())?;

        let mut user = Self::new(account);
        user.name = info
            .and_then(|info| info.name.clone())
            .or_else(|| ott.user_name.clone());
        user.domain = info.and_then(|info| info.domain.clone());
        user.source = info.and_then(|info| info.source.clone());
        user.blocked = info.and_then(|info| info.blocked);
        user.kyc_approved = info.and_then(|info| info.kyc_approved);
        user.pro_subscription = info.and_then(|info| info.pro_subscription);
        user.network_type = ott.nodetype.clone();
        user.network_endpoint = ott.nodewss.clone();
        user.token = ott.user.clone();
        Some(user)
    }
}

/// Runtime descriptor of where and as which application the client runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub application: Option<ApplicationDetails>,
    #[serde(default)]
    pub ott: Option<OttData>,
    #[serde(default)]
    pub embedded: bool,
}

/// Snapshot published by the signing session controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub loading: bool,
    pub user: Option<User>,
    pub environment: Option<Environment>,
}

impl Session {
    pub fn clear(&mut self) {
        self.user = None;
        self.environment = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            loading: true,
            user: None,
            environment: None,
        }
    }
}
