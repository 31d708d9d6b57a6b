/*
[INPUT]:  Payload bodies and payload uuids
[OUTPUT]: Created payload descriptors, payload records, cancel results
[POS]:    HTTP layer - payload endpoints (API key + secret)
[UPDATE]: When adding payload endpoints or changing response handling
*/

use reqwest::Method;
use tracing::{debug, info};
use uuid::Uuid;

use crate::http::{Result, XummClient};
use crate::types::{CancelResult, CreatedPayload, PayloadBody, PayloadRecord};

impl XummClient {
    /// Create a sign request
    ///
    /// POST platform/payload
    pub async fn create_payload(&self, body: &PayloadBody) -> Result<CreatedPayload> {
        let builder = self.api_request(Method::POST, "platform/payload")?.json(body);
        let created: CreatedPayload = self.send_json(builder).await?;
        info!(uuid = %created.uuid, pushed = created.pushed, "payload created");
        Ok(created)
    }

    /// Fetch the current record of a payload
    ///
    /// GET platform/payload/{uuid}
    pub async fn get_payload(&self, uuid: Uuid) -> Result<PayloadRecord> {
        let endpoint = format!("platform/payload/{uuid}");
        let builder = self.api_request(Method::GET, &endpoint)?;
        let record: PayloadRecord = self.send_json(builder).await?;
        debug!(
            uuid = %uuid,
            resolved = record.meta.resolved,
            signed = record.meta.signed,
            "payload fetched"
        );
        Ok(record)
    }

    /// Cancel a payload that has not been resolved yet
    ///
    /// DELETE platform/payload/{uuid}
    pub async fn cancel_payload(&self, uuid: Uuid) -> Result<CancelResult> {
        let endpoint = format!("platform/payload/{uuid}");
        let builder = self.api_request(Method::DELETE, &endpoint)?;
        let result: CancelResult = self.send_json(builder).await?;
        info!(
            uuid = %uuid,
            cancelled = result.result.cancelled,
            reason = result.result.reason.as_deref().unwrap_or(""),
            "payload cancel requested"
        );
        Ok(result)
    }
}
