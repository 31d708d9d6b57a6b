/*
[INPUT]:  API key/secret from the environment, a destination account
[OUTPUT]: Signed payment payload record printed to stdout
[POS]:    Examples - sign-in plus transaction signing walkthrough
[UPDATE]: When controller wiring changes
*/

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;
use xumm_session_adapter::*;

/// Prints redirect URLs instead of opening a browser
struct PrintSurfaces;

struct PrintedSurface(Url);

#[async_trait]
impl RedirectSurface for PrintedSurface {
    async fn close(&self) -> Result<()> {
        println!("  (done with {})", self.0);
        Ok(())
    }
}

#[async_trait]
impl SurfaceOpener for PrintSurfaces {
    async fn open(&self, url: &Url) -> Result<Box<dyn RedirectSurface>> {
        println!("  Open in a browser or scan: {url}");
        Ok(Box::new(PrintedSurface(url.clone())))
    }
}

/// Example: sign in, then request a payment signature
///
/// XUMM_API_KEY=... XUMM_API_SECRET=... cargo run --example sign_transaction -- rDestination
#[tokio::main]
async fn main() {
    println!("=== Xumm Signing Session Example ===\n");

    let (Ok(key), Ok(secret)) = (std::env::var("XUMM_API_KEY"), std::env::var("XUMM_API_SECRET"))
    else {
        eprintln!("Set XUMM_API_KEY and XUMM_API_SECRET");
        return;
    };
    let destination = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY".to_string());

    let client = match XummClient::new(ApiCredentials::new(key, secret)) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    let surfaces: Arc<dyn SurfaceOpener> = Arc::new(PrintSurfaces);
    let authorizer = Arc::new(XummAuthorizer::new(client.clone(), surfaces.clone()));
    let controller = SigningSessionController::new(
        authorizer,
        client,
        surfaces,
        HostContext::Standalone,
        ControllerConfig::default(),
    );

    println!("Step 1: sign in");
    if let Err(e) = controller.connect().await {
        eprintln!("Sign-in failed: {}", e);
        return;
    }
    let mut session = controller.subscribe_session();
    let _ = session.wait_for(|session| session.user.is_some()).await;
    if let Some(user) = controller.session().user {
        println!("✓ Signed in as {}", user.account);
    }

    println!("\nStep 2: sign a 1 XRP payment to {destination}");
    let body = PayloadBody::from_txjson(serde_json::json!({
        "TransactionType": "Payment",
        "Destination": destination,
        "Amount": "1000000",
    }));
    match controller.sign_transaction(&body, SignOptions::new()).await {
        Ok(Some(record)) if record.is_signed() => {
            println!("✓ Signed, txid {}", record.txid().unwrap_or("-"));
        }
        Ok(Some(_)) => println!("✗ Rejected"),
        Ok(None) => println!("✗ No result (expired or closed)"),
        Err(e) => eprintln!("Signing failed: {}", e),
    }

    controller.shutdown().await;
}
