/*
[INPUT]:  API credentials and embedded-host one-time tokens
[OUTPUT]: Application details and launch context
[POS]:    HTTP layer - platform endpoints (credential check, xApp launch data)
[UPDATE]: When adding platform endpoints
*/

use reqwest::Method;
use tracing::info;

use crate::http::{Result, XummClient, XummError};
use crate::types::{OttData, Pong};

impl XummClient {
    /// Check credentials and fetch the application details
    ///
    /// GET platform/ping
    pub async fn ping(&self) -> Result<Pong> {
        let builder = self.api_request(Method::GET, "platform/ping")?;
        let pong: Pong = self.send_json(builder).await?;
        if !pong.pong {
            return Err(XummError::InvalidResponse(
                "ping answered without pong".to_string(),
            ));
        }
        info!(
            application = %pong.auth.application.name,
            app_uuid = %pong.auth.application.uuidv4,
            "platform ping ok"
        );
        Ok(pong)
    }

    /// Resolve the one-time token an embedded app was launched with
    ///
    /// GET platform/xapp/ott/{token}
    pub async fn get_ott(&self, token: &str) -> Result<OttData> {
        let token = token.trim();
        if token.is_empty() {
            return Err(XummError::Config("one-time token is empty".to_string()));
        }
        let endpoint = format!("platform/xapp/ott/{token}");
        let builder = self.api_request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }
}
