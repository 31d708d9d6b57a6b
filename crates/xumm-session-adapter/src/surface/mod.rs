/*
[INPUT]:  Redirect URLs and embedded-host context
[OUTPUT]: Opened redirect surfaces and host close requests
[POS]:    Windowing layer - seams for user-facing redirects
[UPDATE]: When adding surface kinds or host integrations
*/

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::http::Result;

/// A popup, tab or view the user completes a request in
#[async_trait]
pub trait RedirectSurface: Send + Sync {
    /// Close the surface. Called at most once per opened surface.
    async fn close(&self) -> Result<()>;
}

/// Opens redirect surfaces
///
/// Implement this for the windowing facility of your front end (browser
/// popup, webview, terminal prompt).
#[async_trait]
pub trait SurfaceOpener: Send + Sync {
    async fn open(&self, url: &Url) -> Result<Box<dyn RedirectSurface>>;
}

/// Application shell that owns the lifecycle of this client
#[async_trait]
pub trait EmbeddedHost: Send + Sync {
    /// Ask the host to close the embedded app
    async fn close(&self) -> Result<()>;
}

/// Whether the controller runs standalone or inside an embedded host
#[derive(Clone, Default)]
pub enum HostContext {
    #[default]
    Standalone,
    Embedded(Arc<dyn EmbeddedHost>),
}

impl HostContext {
    pub fn embedded(host: Arc<dyn EmbeddedHost>) -> Self {
        Self::Embedded(host)
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standalone => f.write_str("Standalone"),
            Self::Embedded(_) => f.write_str("Embedded"),
        }
    }
}
