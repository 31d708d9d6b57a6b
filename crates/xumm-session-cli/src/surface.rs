/*
[INPUT]:  Redirect URLs from the signing flow, host close requests
[OUTPUT]: Terminal prompts and shutdown of the runner
[POS]:    Presentation layer - terminal stand-ins for popups and the embedded host
[UPDATE]: When the terminal presentation changes
*/

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;
use xumm_session_adapter::{EmbeddedHost, RedirectSurface, Result, SurfaceOpener};

/// Prints redirect URLs for the terminal user
#[derive(Debug, Default, Clone)]
pub struct ConsoleSurfaceOpener;

#[derive(Debug)]
struct ConsoleSurface {
    url: Url,
}

#[async_trait]
impl RedirectSurface for ConsoleSurface {
    async fn close(&self) -> Result<()> {
        info!(url = %self.url, "sign request finished, prompt closed");
        Ok(())
    }
}

#[async_trait]
impl SurfaceOpener for ConsoleSurfaceOpener {
    async fn open(&self, url: &Url) -> Result<Box<dyn RedirectSurface>> {
        println!("Open this link on the device holding your wallet:\n  {url}");
        info!(url = %url, "redirect surface opened");
        Ok(Box::new(ConsoleSurface { url: url.clone() }))
    }
}

/// Embedded host stand-in: a close request ends the runner
#[derive(Debug, Clone)]
pub struct ConsoleHost {
    shutdown: CancellationToken,
}

impl ConsoleHost {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

#[async_trait]
impl EmbeddedHost for ConsoleHost {
    async fn close(&self) -> Result<()> {
        info!("host asked to close the app");
        self.shutdown.cancel();
        Ok(())
    }
}
