//! Connection provider: one MySQL connection per call, no pooling, no retries.

use crate::config::DatabaseConfig;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid database configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("connecting to {addr} timed out after {}s", .timeout.as_secs())]
    Timeout { addr: String, timeout: Duration },

    /// The handshake succeeded but the session did not answer a ping.
    #[error("connection to {addr} is not usable: {source}")]
    NotConnected {
        addr: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Opens connections against a fixed configuration.
///
/// Every call to [`ConnectionProvider::connect`] is an independent attempt and yields
/// an independent handle. The caller owns the handle and is responsible for closing it.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    config: DatabaseConfig,
}

impl ConnectionProvider {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Open one connection and confirm the session is live.
    ///
    /// Failures are logged once here; callers only need to handle the `Err`.
    pub async fn connect(&self) -> Result<MySqlConnection, ConnectionError> {
        let addr = self.config.address();
        let timeout = self.config.connect_timeout();
        let options = connect_options(&self.config);

        let attempt = async {
            let mut conn = options
                .connect()
                .await
                .map_err(|source| ConnectionError::Connect {
                    addr: addr.clone(),
                    source,
                })?;
            require_open(conn.ping().await, &addr)?;
            Ok::<_, ConnectionError>(conn)
        };

        let result = match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout {
                addr: addr.clone(),
                timeout,
            }),
        };

        if let Err(e) = &result {
            error!(addr = %addr, error = %e, "database connection failed");
        }
        result
    }
}

/// Read `HOST`, `USER`, `PASSWORD`, `DATABASE` and `PORT` now and make one attempt.
pub async fn create_connection() -> Result<MySqlConnection, ConnectionError> {
    let config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let e = ConnectionError::from(e);
            error!(error = %e, "database connection failed");
            return Err(e);
        }
    };
    ConnectionProvider::new(config).connect().await
}

/// Translate the configuration into connector options.
///
/// Empty fields are left unset so the connector applies its defaults.
pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new().port(config.port());
    if !config.host.is_empty() {
        options = options.host(&config.host);
    }
    if !config.user.is_empty() {
        options = options.username(&config.user);
    }
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if !config.database.is_empty() {
        options = options.database(&config.database);
    }
    options
}

/// A handshake that cannot answer a ping counts as a failed attempt.
fn require_open(ping: Result<(), sqlx::Error>, addr: &str) -> Result<(), ConnectionError> {
    ping.map_err(|source| ConnectionError::NotConnected {
        addr: addr.to_string(),
        source,
    })
}
