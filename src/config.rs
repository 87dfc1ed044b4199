//! Process configuration, read from the environment (after `.env` is loaded).
//!
//! Database settings use the bare variable names `HOST`, `USER`, `PASSWORD`,
//! `DATABASE` and `PORT`. Server settings use `LISTEN_ADDR`, `JWT_SECRET_KEY`,
//! `TOKEN_TTL_HOURS`, `LOGLEVEL` and `INIT_SCHEMA`.

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Port used when `PORT` is not set.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Text settings taken byte-for-byte from the environment. Figment's env parser would
/// turn `0123` into `123` or reject `[x]`, which is wrong for credentials.
const VERBATIM_KEYS: &[&str] = &[
    "HOST",
    "USER",
    "PASSWORD",
    "DATABASE",
    "LISTEN_ADDR",
    "JWT_SECRET_KEY",
    "LOGLEVEL",
];

/// Settings for a single MySQL connection attempt.
///
/// Empty strings are not validated; they are handed to the connector as "unset",
/// so the connector falls back to its own default for that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            port: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    /// Read the database settings from the current process environment.
    pub fn from_env() -> Result<Self, figment::Error> {
        env_figment().extract()
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_MYSQL_PORT)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// `host:port` as used in log lines and error messages.
    pub fn address(&self) -> String {
        let host = if self.host.is_empty() {
            "localhost"
        } else {
            self.host.as_str()
        };
        format!("{}:{}", host, self.port())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub jwt_secret_key: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    #[serde(default)]
    pub init_schema: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            jwt_secret_key: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
            loglevel: default_loglevel(),
            init_schema: false,
        }
    }
}

/// Everything the binary needs, built once at startup and passed down explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, figment::Error> {
        Self::from_figment(&env_figment())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, figment::Error> {
        Ok(Self {
            database: figment.extract()?,
            server: figment.extract()?,
        })
    }
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_token_ttl_hours() -> i64 {
    72
}

fn default_loglevel() -> String {
    "info".to_string()
}

/// Typed settings (`PORT`, `TOKEN_TTL_HOURS`, ...) go through figment's value parser;
/// the [`VERBATIM_KEYS`] are read as plain strings.
fn env_figment() -> Figment {
    let verbatim: BTreeMap<String, String> = VERBATIM_KEYS
        .iter()
        .filter_map(|key| {
            std::env::var(key)
                .ok()
                .map(|value| (key.to_ascii_lowercase(), value))
        })
        .collect();
    Figment::from(Env::raw().ignore(VERBATIM_KEYS)).merge(Serialized::defaults(verbatim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn database_config_reads_bare_env_names() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("HOST", "db.internal");
            jail.set_env("USER", "root");
            jail.set_env("PASSWORD", "12345");
            jail.set_env("DATABASE", "finance");
            jail.set_env("PORT", "3307");

            let cfg = DatabaseConfig::from_env()?;
            assert_eq!(cfg.host, "db.internal");
            assert_eq!(cfg.user, "root");
            assert_eq!(cfg.password, "12345");
            assert_eq!(cfg.database, "finance");
            assert_eq!(cfg.port(), 3307);
            assert_eq!(cfg.address(), "db.internal:3307");
            Ok(())
        });
    }

    #[test]
    fn text_values_are_passed_through_unchanged() {
        Jail::expect_with(|jail| {
            for password in ["0123", "1.50", "[x]", "-0", "\"quoted\"", "true", "{a=1}"] {
                jail.clear_env();
                jail.set_env("PASSWORD", password);
                jail.set_env("HOST", "0123");
                jail.set_env("JWT_SECRET_KEY", password);

                let cfg = AppConfig::from_env()?;
                assert_eq!(cfg.database.password, password);
                assert_eq!(cfg.database.host, "0123");
                assert_eq!(cfg.server.jwt_secret_key, password);
            }
            Ok(())
        });
    }

    #[test]
    fn missing_port_falls_back_to_mysql_default() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("HOST", "localhost");

            let cfg = DatabaseConfig::from_env()?;
            assert_eq!(cfg.port, None);
            assert_eq!(cfg.port(), DEFAULT_MYSQL_PORT);
            assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
            Ok(())
        });
    }

    #[test]
    fn missing_values_become_empty_strings() {
        Jail::expect_with(|jail| {
            jail.clear_env();

            let cfg = DatabaseConfig::from_env()?;
            assert_eq!(cfg, DatabaseConfig::default());
            assert_eq!(cfg.address(), "localhost:3306");
            Ok(())
        });
    }

    #[test]
    fn malformed_port_is_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("PORT", "not-a-port");

            assert!(DatabaseConfig::from_env().is_err());
            Ok(())
        });
    }

    #[test]
    fn app_config_collects_server_settings() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("JWT_SECRET_KEY", "s3cret");
            jail.set_env("TOKEN_TTL_HOURS", "12");
            jail.set_env("LISTEN_ADDR", "127.0.0.1:9000");
            jail.set_env("INIT_SCHEMA", "true");
            jail.set_env("DATABASE", "finance");

            let cfg = AppConfig::from_env()?;
            assert_eq!(cfg.server.jwt_secret_key, "s3cret");
            assert_eq!(cfg.server.token_ttl_hours, 12);
            assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
            assert_eq!(cfg.server.loglevel, "info");
            assert!(cfg.server.init_schema);
            assert_eq!(cfg.database.database, "finance");
            Ok(())
        });
    }
}
