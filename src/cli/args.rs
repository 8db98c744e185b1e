use crate::config::{LedgerConfig, ServerConfig};
use crate::logging::LogFormat;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Wallet ledger HTTP service
#[derive(Parser, Debug)]
#[command(name = "wallet-ledger")]
#[command(about = "Wallet balances and transfers over HTTP", long_about = None)]
pub struct CliArgs {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "LEDGER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener to
    #[arg(long, env = "LEDGER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Balance granted to every new wallet
    #[arg(
        long = "default-balance",
        env = "LEDGER_DEFAULT_BALANCE",
        value_name = "AMOUNT",
        default_value = "100.0"
    )]
    pub default_balance: Decimal,

    /// Maximum wait for a wallet lock before a transfer fails with a conflict
    #[arg(
        long = "lock-timeout-ms",
        env = "LEDGER_LOCK_TIMEOUT_MS",
        value_name = "MILLIS",
        default_value_t = 5000
    )]
    pub lock_timeout_ms: u64,

    /// Directory of the ledger database
    #[arg(
        long = "data-dir",
        env = "LEDGER_DATA_DIR",
        value_name = "DIR",
        default_value = "ledger-data"
    )]
    pub data_dir: PathBuf,

    /// Keep all state in memory; nothing survives a restart
    #[arg(long, env = "LEDGER_EPHEMERAL")]
    pub ephemeral: bool,

    /// Grace period for in-flight requests after a shutdown signal
    #[arg(
        long = "shutdown-timeout-secs",
        env = "LEDGER_SHUTDOWN_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = 5
    )]
    pub shutdown_timeout_secs: u64,

    /// Number of runtime worker threads
    #[arg(
        long = "workers",
        env = "LEDGER_WORKERS",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long = "log-level", env = "LEDGER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long = "log-format", env = "LEDGER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormatArg,
}

/// Log formats selectable from the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl CliArgs {
    /// Create a LedgerConfig from CLI arguments
    ///
    /// Out-of-range values fall back to defaults with a warning.
    /// `--ephemeral` drops the data directory.
    pub fn to_ledger_config(&self) -> LedgerConfig {
        let config = LedgerConfig::new(
            self.default_balance,
            Duration::from_millis(self.lock_timeout_ms),
        );

        if self.ephemeral {
            warn!("Running without persistence, state is lost on restart");
            config
        } else {
            config.with_data_dir(&self.data_dir)
        }
    }

    /// Create a ServerConfig from CLI arguments
    ///
    /// A worker count of zero falls back to the number of CPU cores.
    pub fn to_server_config(&self) -> ServerConfig {
        let default = ServerConfig::default();

        let workers = match self.workers {
            Some(0) => {
                warn!(
                    "Invalid workers (0), using default ({})",
                    default.workers
                );
                default.workers
            }
            Some(workers) => workers,
            None => default.workers,
        };

        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            workers,
        }
    }
}
