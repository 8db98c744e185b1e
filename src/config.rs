//! Runtime configuration
//!
//! Configuration values are built once at startup from the command line (see
//! [`crate::cli`]) and handed to the components that need them.

use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Settings for the ledger core
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// Balance granted to every new wallet
    pub default_balance: Decimal,
    /// Longest wait for a wallet row lock before a transfer reports a conflict
    pub lock_timeout: Duration,
    /// Database directory; `None` keeps all state in memory
    pub data_dir: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_balance: Decimal::ONE_HUNDRED,
            lock_timeout: Duration::from_secs(5),
            data_dir: None,
        }
    }
}

impl LedgerConfig {
    /// Create a new LedgerConfig with custom values
    ///
    /// A negative default balance or a zero lock timeout falls back to the
    /// default value with a warning.
    pub fn new(default_balance: Decimal, lock_timeout: Duration) -> Self {
        let default = Self::default();

        let default_balance = if default_balance < Decimal::ZERO {
            warn!(
                "Invalid default_balance ({}), using default ({})",
                default_balance, default.default_balance
            );
            default.default_balance
        } else {
            default_balance
        };

        let lock_timeout = if lock_timeout.is_zero() {
            warn!(
                "Invalid lock_timeout ({:?}), using default ({:?})",
                lock_timeout, default.lock_timeout
            );
            default.lock_timeout
        } else {
            lock_timeout
        };

        Self {
            default_balance,
            lock_timeout,
            data_dir: None,
        }
    }

    /// Persist the ledger under `data_dir`
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }
}

/// Settings for the HTTP server process
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Grace period for in-flight requests after a shutdown signal
    pub shutdown_timeout: Duration,
    /// Number of runtime worker threads
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: Duration::from_secs(5),
            workers: num_cpus::get(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
