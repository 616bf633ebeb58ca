use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fmt,
    net::{SocketAddr, ToSocketAddrs},
};

const DISPLAY_HOST: &str = "localhost";
const DISPLAY_NAME: &str = "vizpoc";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub db: DbConfig,
    pub allowed_origins: Option<Vec<String>>,
}

/// Connection settings for the sales store.
///
/// Every field is optional; nothing is defaulted on the connection path, so an
/// incomplete configuration surfaces as a connection error on first use.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<Secret>,
    pub ssl_root_cert: Option<String>,
    pub ssl_cert: Option<String>,
    pub ssl_key: Option<String>,
}

impl DbConfig {
    /// Host name reported by the health endpoint.
    pub fn display_host(&self) -> &str {
        self.host.as_deref().unwrap_or(DISPLAY_HOST)
    }

    /// Database name reported by the health endpoint.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DISPLAY_NAME)
    }
}

/// Write-only credential. Never printed, only readable inside the crate.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    db_host: Option<String>,
    #[serde(default)]
    db_port: Option<u16>,
    #[serde(default)]
    db_name: Option<String>,
    #[serde(default)]
    db_user: Option<String>,
    #[serde(default)]
    db_password: Option<String>,
    #[serde(default)]
    db_ssl_root_cert: Option<String>,
    #[serde(default)]
    db_ssl_cert: Option<String>,
    #[serde(default)]
    db_ssl_key: Option<String>,
    #[serde(default)]
    viz_listen_addr: Option<String>,
    #[serde(default)]
    viz_listen_host: Option<String>,
    #[serde(default)]
    viz_listen_port: Option<u16>,
    #[serde(default)]
    viz_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars())
    }

    fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw: RawConfig = envy::from_iter(vars)
            .context("failed to parse DB_* / VIZ_* environment variables")?;

        let listen_addr = resolve_addr(
            raw.viz_listen_addr,
            raw.viz_listen_host,
            raw.viz_listen_port,
        )?;

        if raw.db_ssl_cert.is_some() != raw.db_ssl_key.is_some() {
            anyhow::bail!("DB_SSL_CERT and DB_SSL_KEY must both be set (or neither)");
        }

        let db = DbConfig {
            host: non_empty(raw.db_host),
            port: raw.db_port,
            name: non_empty(raw.db_name),
            user: non_empty(raw.db_user),
            password: raw.db_password.map(Secret::new),
            ssl_root_cert: non_empty(raw.db_ssl_root_cert),
            ssl_cert: non_empty(raw.db_ssl_cert),
            ssl_key: non_empty(raw.db_ssl_key),
        };

        Ok(Self {
            listen_addr,
            db,
            allowed_origins: raw.viz_allowed_origins.and_then(|csv| parse_origins(&csv)),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_origins(csv: &str) -> Option<Vec<String>> {
    let origins: Vec<_> = csv
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() {
        None
    } else {
        Some(origins)
    }
}

fn resolve_addr(
    addr: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<SocketAddr> {
    if let Some(addr) = addr {
        return addr
            .to_socket_addrs()
            .context("invalid VIZ_LISTEN_ADDR value")?
            .next()
            .context("VIZ_LISTEN_ADDR resolved to no addresses");
    }

    let host = host.unwrap_or_else(|| "0.0.0.0".to_string());
    let port = port.unwrap_or(8000);
    let combined = format!("{}:{}", host, port);
    combined
        .to_socket_addrs()
        .context("invalid listen host/port combination")?
        .next()
        .context("listen address resolved to no targets")
}
