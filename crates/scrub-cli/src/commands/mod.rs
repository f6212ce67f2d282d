pub mod check;
pub mod redact;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use scrub_config::Config;
use scrub_core::Post;
use scrub_security::{RosterFile, RosterIndex};

use crate::cli::Policy;

/// Apply command-line overrides and re-validate
pub fn with_overrides(
    mut config: Config,
    placeholder: Option<String>,
    policy: Option<Policy>,
) -> Result<Config> {
    if let Some(placeholder) = placeholder {
        config.placeholder = placeholder;
    }
    if let Some(policy) = policy {
        config.failure_policy = policy.into();
    }
    config.validate()?;
    Ok(config)
}

pub fn load_roster(path: &Path) -> Result<Arc<RosterIndex>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster {}", path.display()))?;
    let file: RosterFile = serde_json::from_str(&content)
        .with_context(|| format!("Roster {} is not a user list or id map", path.display()))?;

    let roster = RosterIndex::from_names(file.into_names());
    if roster.is_empty() {
        tracing::warn!("Roster {} has no usable names", path.display());
    }
    Ok(Arc::new(roster))
}

/// Read posts from a JSON array or from JSON lines
pub fn read_posts(path: &Path) -> Result<Vec<Post>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_posts(&content)
}

fn parse_posts(content: &str) -> Result<Vec<Post>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).context("Invalid post array");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid post on line {}", i + 1))
        })
        .collect()
}

pub fn show_config(config: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(Config::config_path);
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
