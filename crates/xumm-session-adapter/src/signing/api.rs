/*
[INPUT]:  Payload bodies and payload uuids
[OUTPUT]: Created payloads, live subscriptions, final payload records
[POS]:    Signing layer - payload capability abstraction and its REST/websocket impl
[UPDATE]: When the payload capability gains operations
*/

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::http::{Result, XummClient, XummError};
use crate::types::{CreatedPayload, PayloadBody, PayloadRecord};
use crate::ws::{PayloadSubscription, connect_subscription};

/// Trait for the payload capability used by the signing flow
#[async_trait]
pub trait PayloadApi: Send + Sync {
    /// Submit a body for signing. `None` when the service created no payload.
    async fn create(&self, body: &PayloadBody) -> Result<Option<CreatedPayload>>;

    /// Open a status subscription for a created payload. `None` when no
    /// subscription could be set up.
    async fn subscribe(&self, created: &CreatedPayload) -> Result<Option<PayloadSubscription>>;

    /// Fetch the payload record
    async fn get(&self, uuid: Uuid) -> Result<PayloadRecord>;

    /// Cancel an unresolved payload
    async fn cancel(&self, uuid: Uuid) -> Result<()>;
}

#[async_trait]
impl PayloadApi for XummClient {
    async fn create(&self, body: &PayloadBody) -> Result<Option<CreatedPayload>> {
        match self.create_payload(body).await {
            Ok(created) => Ok(Some(created)),
            Err(XummError::Api { code, message }) => {
                warn!(code, message = %message, "payload body rejected");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn subscribe(&self, created: &CreatedPayload) -> Result<Option<PayloadSubscription>> {
        let uuid = created.uuid;
        let url = match &created.refs.websocket_status {
            Some(url) => url.clone(),
            None => self.subscription_url(uuid)?,
        };
        match connect_subscription(&url, uuid).await {
            Ok(subscription) => Ok(Some(subscription)),
            Err(err) => {
                warn!(uuid = %uuid, error = %err, "payload subscription unavailable");
                Ok(None)
            }
        }
    }

    async fn get(&self, uuid: Uuid) -> Result<PayloadRecord> {
        self.get_payload(uuid).await
    }

    async fn cancel(&self, uuid: Uuid) -> Result<()> {
        let result = self.cancel_payload(uuid).await?;
        if !result.result.cancelled {
            debug!(uuid = %uuid, reason = ?result.result.reason, "payload not cancelled");
        }
        Ok(())
    }
}
