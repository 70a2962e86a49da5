use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::render::OutputFormat;

pub const DEFAULT_SENTRY_URL: &str = "https://sentry.io/api/0";

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sentry: SentryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    pub url: String,
    pub token: Option<String>,
    pub org: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub template: Option<PathBuf>,
}

impl Default for SentryConfig {
    fn default() -> Self {
        SentryConfig {
            url: DEFAULT_SENTRY_URL.to_string(),
            token: None,
            org: None,
            project: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            format: OutputFormat::Markdown,
            template: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}
