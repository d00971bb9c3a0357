//! Proctor configuration and portal client factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::portal::PortalClient;

/// Portal connection settings.
///
/// Note: Custom Debug impl masks the API token to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct PortalSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
}

impl std::fmt::Debug for PortalSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalSettings")
            .field("base_url", &self.base_url)
            .field("api_token", &"***")
            .finish()
    }
}

/// Section time budgets, in minutes, applied when the paper source does
/// not specify them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionBudgets {
    #[serde(default = "default_choice_minutes")]
    pub multiple_choice_minutes: u64,
    #[serde(default = "default_essay_minutes")]
    pub essay_minutes: u64,
}

fn default_choice_minutes() -> u64 {
    20
}
fn default_essay_minutes() -> u64 {
    30
}

impl Default for SectionBudgets {
    fn default() -> Self {
        Self {
            multiple_choice_minutes: default_choice_minutes(),
            essay_minutes: default_essay_minutes(),
        }
    }
}

/// Top-level proctor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProctorConfig {
    /// Portal connection; absent when running purely locally.
    #[serde(default)]
    pub portal: Option<PortalSettings>,
    /// Default section budgets.
    #[serde(default)]
    pub budgets: SectionBudgets,
    /// Output directory for attempt reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./proctor-results")
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            portal: None,
            budgets: SectionBudgets::default(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `proctor.toml` in the current directory
/// 2. `~/.config/proctor/config.toml`
///
/// Environment variable overrides: `PROCTOR_PORTAL_URL`,
/// `PROCTOR_API_TOKEN`.
pub fn load_config() -> Result<ProctorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ProctorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("proctor.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ProctorConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ProctorConfig::default(),
    };

    // Apply env var overrides.
    if let Ok(url) = std::env::var("PROCTOR_PORTAL_URL") {
        match config.portal.as_mut() {
            Some(portal) => portal.base_url = url,
            None => {
                config.portal = Some(PortalSettings {
                    base_url: url,
                    api_token: String::new(),
                })
            }
        }
    }
    if let Ok(token) = std::env::var("PROCTOR_API_TOKEN") {
        if let Some(portal) = config.portal.as_mut() {
            portal.api_token = token;
        }
    }

    // Resolve ${VAR} references in portal settings.
    if let Some(portal) = config.portal.as_mut() {
        portal.base_url = resolve_env_vars(&portal.base_url);
        portal.api_token = resolve_env_vars(&portal.api_token);
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("proctor"))
}

/// Build a portal client from the configuration.
pub fn create_portal_client(config: &ProctorConfig) -> Result<PortalClient> {
    let portal = config
        .portal
        .as_ref()
        .context("no [portal] section in configuration")?;
    anyhow::ensure!(!portal.base_url.is_empty(), "portal base_url is empty");

    Ok(
        PortalClient::new(&portal.base_url, &portal.api_token).with_default_budgets(
            config.budgets.multiple_choice_minutes * 60,
            config.budgets.essay_minutes * 60,
        ),
    )
}
