//! Configuration management for crudcheck
//!
//! Layers, most specific first: command-line flags, `CRUDCHECK_*`
//! environment variables, the project `crudcheck.toml`, the global
//! `~/.crudcheck/config.toml`, then built-in defaults.

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "CRUDCHECK_BASE_URL";
pub const ENV_TIMEOUT: &str = "CRUDCHECK_TIMEOUT";

/// Contents of a config file; every key is optional
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub continue_on_failure: Option<bool>,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceOverride>,
}

/// Per-resource scenario targets
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceOverride {
    pub existing_id: Option<u64>,
    pub missing_id: Option<u64>,
    pub supports_input_validation: Option<bool>,
    pub filter: Option<FilterOverride>,
    /// Values the item at `existing_id` must carry
    pub expectations: Option<BTreeMap<String, toml::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterOverride {
    pub field: String,
    pub value: toml::Value,
}

impl FileConfig {
    /// Load a config file; a missing file yields `None`
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(Some(config))
    }

    /// Overlay `other` on top of `self`; `other` wins key by key
    pub fn merge(mut self, other: FileConfig) -> Self {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.continue_on_failure.is_some() {
            self.continue_on_failure = other.continue_on_failure;
        }
        for (name, over) in other.resources {
            let entry = self.resources.entry(name).or_default();
            if over.existing_id.is_some() {
                entry.existing_id = over.existing_id;
            }
            if over.missing_id.is_some() {
                entry.missing_id = over.missing_id;
            }
            if over.supports_input_validation.is_some() {
                entry.supports_input_validation = over.supports_input_validation;
            }
            if over.filter.is_some() {
                entry.filter = over.filter;
            }
            if over.expectations.is_some() {
                entry.expectations = over.expectations;
            }
        }
        self
    }
}

/// Command-line settings that take precedence over every file
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub fail_fast: bool,
}

/// Fully resolved harness settings
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub continue_on_failure: bool,
    pub resources: BTreeMap<String, ResourceOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            continue_on_failure: true,
            resources: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Resolve configuration for the current directory and environment
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let mut files = FileConfig::default();

        if let Some(global) = paths::global_config_file() {
            if let Some(config) = FileConfig::load(&global)? {
                files = files.merge(config);
            }
        }

        let cwd = env::current_dir().context("Failed to determine current directory")?;
        if let Some(project) = paths::find_project_config(&cwd) {
            if let Some(config) = FileConfig::load(&project)? {
                files = files.merge(config);
            }
        }

        let env_base_url = env::var(ENV_BASE_URL).ok().filter(|s| !s.is_empty());
        let env_timeout = match env::var(ENV_TIMEOUT) {
            Ok(raw) if !raw.is_empty() => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT, raw))?,
            ),
            _ => None,
        };

        Ok(Self::resolve(files, env_base_url, env_timeout, cli))
    }

    /// Apply layers in precedence order: cli > env > files > defaults
    pub fn resolve(
        files: FileConfig,
        env_base_url: Option<String>,
        env_timeout: Option<u64>,
        cli: &CliOverrides,
    ) -> Self {
        let defaults = Config::default();

        let base_url = cli
            .base_url
            .clone()
            .or(env_base_url)
            .or(files.base_url)
            .unwrap_or(defaults.base_url);

        let timeout = cli
            .timeout_secs
            .or(env_timeout)
            .or(files.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let continue_on_failure = if cli.fail_fast {
            false
        } else {
            files
                .continue_on_failure
                .unwrap_or(defaults.continue_on_failure)
        };

        Self {
            base_url,
            timeout,
            continue_on_failure,
            resources: files.resources,
        }
    }
}
