// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub client: Client,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            server: Server::default(),
            client: Client::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: Some(staffdesk_server::DEFAULT_BIND.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Client {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            base_url: Some(staffdesk_client::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
    pub dir: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: Some(DEFAULT_LOG_FILTER.to_owned()),
            dir: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("STAFFDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set STAFFDESK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(staffdesk_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [storage], [server], [client], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            staffdesk_db::validate_db_path(db_path)?;
        }

        if let Some(bind) = &self.server.bind {
            bind.parse::<SocketAddr>().with_context(|| {
                format!(
                    "server.bind in {} must be an IP:port address, got {bind:?}",
                    path.display()
                )
            })?;
        }

        if let Some(base_url) = &self.client.base_url
            && base_url.trim().is_empty()
        {
            bail!("client.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.client.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "client.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(filter) = &self.log.filter {
            EnvFilter::try_new(filter).with_context(|| {
                format!("log.filter in {} is not a valid filter: {filter:?}", path.display())
            })?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => staffdesk_db::default_db_path(),
        }
    }

    pub fn server_bind(&self) -> &str {
        self.server
            .bind
            .as_deref()
            .unwrap_or(staffdesk_server::DEFAULT_BIND)
    }

    pub fn client_base_url(&self) -> &str {
        self.client
            .base_url
            .as_deref()
            .unwrap_or(staffdesk_client::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn client_timeout(&self) -> Result<Duration> {
        parse_duration(self.client.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Where the terminal UI writes its log files.
    pub fn log_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.log.dir {
            return Ok(PathBuf::from(dir));
        }
        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].dir in the config file")
        })?;
        Ok(data_root.join(staffdesk_db::APP_NAME).join("logs"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# staffdesk config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/staffdesk/staffdesk.db)\n# db_path = \"/absolute/path/to/staffdesk.db\"\n\n[server]\nbind = \"{}\"\n\n[client]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[log]\n# RUST_LOG overrides this when set.\nfilter = \"{}\"\n# dir = \"/absolute/path/to/logs\"\n",
            path.display(),
            staffdesk_server::DEFAULT_BIND,
            staffdesk_client::DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_LOG_FILTER,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let parse = |value: &str| -> Result<u64> {
        value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))
    };

    if let Some(value) = raw.strip_suffix("ms") {
        return Ok(Duration::from_millis(parse(value)?));
    }
    if let Some(value) = raw.strip_suffix('s') {
        return Ok(Duration::from_secs(parse(value)?));
    }
    if let Some(value) = raw.strip_suffix('m') {
        return Ok(Duration::from_secs(parse(value)? * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
