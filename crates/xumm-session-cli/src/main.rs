/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Session commands against the wallet service with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xumm_session_cli::{SessionConfig, SessionRunner, load_payload_body};

#[derive(Parser, Debug)]
#[command(name = "xumm-session", version, about = "Xumm sign-in and signing session runner")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the API credentials
    Ping,
    /// Sign in and store the session
    Connect,
    /// Request a signature on a transaction
    Sign {
        /// JSON file holding a payload body or a bare transaction
        #[arg(long = "payload", value_name = "PATH")]
        payload_path: PathBuf,
        /// Give up (and cancel the request) after this many seconds
        #[arg(long = "timeout-secs", value_name = "SECS")]
        timeout_secs: Option<u64>,
    },
    /// Show the stored session
    Status,
    /// Log out, or ask the embedded host to close
    Disconnect,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    info!(config_path = %args.config_path.display(), "starting xumm-session");

    let config = load_config(&args.config_path)?;
    info!(embedded = config.embedded, "configuration loaded");

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let runner = SessionRunner::from_config(&config, shutdown).context("build session runner")?;
    let outcome = run_command(&runner, args.command).await;
    runner.close().await;
    info!("session runner stopped");
    outcome
}

async fn run_command(runner: &SessionRunner, command: Command) -> Result<()> {
    match command {
        Command::Ping => {
            let pong = runner.ping().await?;
            print_json(&pong.auth.application)
        }
        Command::Connect => {
            let session = runner.connect().await?;
            print_json(&session)
        }
        Command::Sign {
            payload_path,
            timeout_secs,
        } => {
            let body = load_payload_body(&payload_path)?;
            let timeout = timeout_secs.map(Duration::from_secs);
            match runner.sign(body, timeout).await? {
                Some(record) => {
                    info!(signed = record.is_signed(), txid = record.txid().unwrap_or(""), "sign request resolved");
                    print_json(&record)
                }
                None => {
                    warn!("sign request ended without a result");
                    Ok(())
                }
            }
        }
        Command::Status => {
            let session = runner.status().await?;
            print_json(&session)
        }
        Command::Disconnect => runner.disconnect().await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("render output")?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn load_config(path: &PathBuf) -> Result<SessionConfig> {
    let path_str = path
        .to_str()
        .context("config path must be valid utf-8")?;
    SessionConfig::from_file(path_str).context("load config")
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
