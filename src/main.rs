//! Wallet Ledger server
//!
//! Serves the wallet ledger over HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run --
//! cargo run -- --port 9000 --default-balance 250
//! cargo run -- --data-dir /var/lib/wallet-ledger
//! cargo run -- --ephemeral
//! LEDGER_LOG_FORMAT=json cargo run
//! ```
//!
//! The server runs until it receives SIGTERM, SIGHUP or Ctrl-C, then stops
//! accepting connections and gives in-flight requests a grace period to
//! finish.
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown
//! - 1: Error (invalid arguments, unreadable database, address already in use, etc.)

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use wallet_ledger::api::{self, AppState};
use wallet_ledger::cli;
use wallet_ledger::logging;
use wallet_ledger::ServerConfig;

fn main() -> Result<()> {
    let args = cli::parse_args();
    logging::init_logging(&args.log_level, args.log_format.into());

    let ledger_config = args.to_ledger_config();
    let server_config = args.to_server_config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(server_config.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    match &ledger_config.data_dir {
        Some(dir) => info!(data_dir = %dir.display(), "opening ledger database"),
        None => info!("using in-memory ledger"),
    }
    let state = AppState::open(&ledger_config).context("failed to open ledger store")?;
    let result = runtime.block_on(serve(state, &server_config));
    if let Err(err) = &result {
        error!(error = %err, "server exited with error");
    }
    result
}

async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind listener on {}", address))?;
    info!(%address, workers = config.workers, "wallet ledger listening");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, api::create_router(state))
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        signal = shutdown_signal() => {
            signal?;
            info!("shutdown signal received");
        }
        result = &mut server => {
            // The server stopped on its own; no signal needed.
            return result.context("server task panicked")?.context("server error");
        }
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
        Ok(result) => {
            result.context("server task panicked")?.context("server error")?;
            info!("server exiting");
        }
        Err(_) => {
            warn!(
                timeout_secs = config.shutdown_timeout.as_secs(),
                "in-flight requests did not finish before shutdown timeout"
            );
            server.abort();
        }
    }
    Ok(())
}

/// Resolve on SIGTERM, SIGHUP or Ctrl-C
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        let mut hangup = signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?;

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
            _ = hangup.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    Ok(())
}
