// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use palette_app::{LookupStrategy, default_tasks};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const APP_NAME: &str = "palette";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BACKEND_URL: &str = "http://localhost:10001";
const DEFAULT_BACKEND_TIMEOUT: &str = "10s";
const DEFAULT_LOOKUP_DELAY: &str = "800ms";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub lookup: Lookup,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub tasks: Tasks,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            lookup: Lookup::default(),
            backend: Backend::default(),
            tasks: Tasks::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lookup {
    pub strategy: Option<String>,
    pub delay: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Backend {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tasks {
    pub items: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub path: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("PALETTE_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set PALETTE_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
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
                    "config file {} has no version. Add `version = 1` and keep values under [lookup], [backend], [tasks], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Regenerate it with `palette --print-example-config`",
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
        if let Some(strategy) = &self.lookup.strategy
            && LookupStrategy::parse(strategy).is_none()
        {
            bail!(
                "lookup.strategy in {} must be \"canned\" or \"remote\", got {:?}",
                path.display(),
                strategy
            );
        }

        if let Some(delay) = &self.lookup.delay {
            parse_duration(delay)
                .with_context(|| format!("lookup.delay in {}", path.display()))?;
        }

        if let Some(timeout) = &self.backend.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("backend.timeout in {}", path.display()))?;
            if parsed <= Duration::ZERO {
                bail!(
                    "backend.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(base_url) = &self.backend.base_url {
            validate_base_url(base_url)
                .with_context(|| format!("backend.base_url in {}", path.display()))?;
        }

        if let Some(items) = &self.tasks.items
            && items.iter().all(|item| item.trim().is_empty())
        {
            bail!(
                "tasks.items in {} must list at least one task; remove the key to use the built-in list",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "log.level in {} must be one of {}, got {:?}",
                path.display(),
                LOG_LEVELS.join(", "),
                level
            );
        }

        Ok(())
    }

    pub fn strategy(&self) -> LookupStrategy {
        self.lookup
            .strategy
            .as_deref()
            .and_then(LookupStrategy::parse)
            .unwrap_or(LookupStrategy::Canned)
    }

    pub fn lookup_delay(&self) -> Result<Duration> {
        parse_duration(self.lookup.delay.as_deref().unwrap_or(DEFAULT_LOOKUP_DELAY))
    }

    pub fn backend_base_url(&self) -> &str {
        self.backend
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BACKEND_URL)
            .trim_end_matches('/')
    }

    pub fn backend_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.backend
                .timeout
                .as_deref()
                .unwrap_or(DEFAULT_BACKEND_TIMEOUT),
        )
    }

    pub fn task_items(&self) -> Vec<String> {
        match &self.tasks.items {
            Some(items) => items
                .iter()
                .filter(|item| !item.trim().is_empty())
                .cloned()
                .collect(),
            None => default_tasks(),
        }
    }

    pub fn log_level(&self) -> String {
        self.log
            .level
            .as_deref()
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_ascii_lowercase()
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => default_log_path(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# palette config\n# Place this file at: {}\n\nversion = 1\n\n[lookup]\n# \"canned\" answers from a built-in table; \"remote\" asks the chat backend\nstrategy = \"canned\"\n# Simulated latency for canned answers; \"0ms\" answers immediately\ndelay = \"{}\"\n\n[backend]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[tasks]\n# Optional. Replaces the built-in question list.\n# items = [\"Quantas tarefas existem no total?\", \"Lista-me tudo.\"]\n\n[log]\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/palette/palette.log)\n# path = \"/absolute/path/to/palette.log\"\n",
            path.display(),
            DEFAULT_LOOKUP_DELAY,
            DEFAULT_BACKEND_URL,
            DEFAULT_BACKEND_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

pub fn default_log_path() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set [log].path in the config file")
    })?;
    Ok(data_root.join(APP_NAME).join("palette.log"))
}

fn validate_base_url(raw: &str) -> Result<()> {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("must not be empty");
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("{trimmed:?} is not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("{trimmed:?} must use http or https");
    }
    Ok(())
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 800ms or 10s)")
}
