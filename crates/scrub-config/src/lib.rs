use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a redaction pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Literal written in place of every confirmed name
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    /// What a batch does with a post whose tree fails to redact
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub exclusions: ExclusionsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the batch at the first failing post
    Abort,
    /// Drop the failing post from the output and record it in the report
    #[default]
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_ner_timeout_ms")]
    pub ner_timeout_ms: u64,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum recognizer confidence for names not on the roster
    #[serde(default = "default_min_confidence")]
    pub min_ner_confidence: f32,

    #[serde(default = "default_true")]
    pub collapse_whitespace: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionsConfig {
    /// Extra common words redacted only when they are roster names
    #[serde(default)]
    pub extra_words: Vec<String>,

    /// Extra common words redacted only when capitalized roster names
    #[serde(default)]
    pub capitalized_words: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            failure_policy: FailurePolicy::default(),
            limits: LimitsConfig::default(),
            detection: DetectionConfig::default(),
            exclusions: ExclusionsConfig::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            ner_timeout_ms: default_ner_timeout_ms(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_ner_confidence: default_min_confidence(),
            collapse_whitespace: true,
        }
    }
}

fn default_placeholder() -> String {
    "[NAME]".to_string()
}

fn default_max_depth() -> usize {
    1000
}

fn default_ner_timeout_ms() -> u64 {
    2000
}

fn default_concurrency() -> usize {
    4
}

fn default_min_confidence() -> f32 {
    0.85
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            Ok(config)
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "scrub", "scrub") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.scrub/config.toml")
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let placeholder = self.placeholder.trim();
        if placeholder.is_empty() {
            anyhow::bail!("placeholder must not be empty");
        }
        if placeholder.len() != self.placeholder.len() {
            anyhow::bail!("placeholder must not start or end with whitespace");
        }
        // A bare word could be mistaken for content on a later pass
        if placeholder.chars().all(char::is_alphanumeric) {
            anyhow::bail!(
                "placeholder '{}' must contain a non-alphanumeric character",
                self.placeholder
            );
        }
        if self.limits.max_depth == 0 {
            anyhow::bail!("limits.max_depth must be at least 1");
        }
        if self.limits.concurrency == 0 {
            anyhow::bail!("limits.concurrency must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.detection.min_ner_confidence) {
            anyhow::bail!(
                "detection.min_ner_confidence must be within 0.0..=1.0, got {}",
                self.detection.min_ner_confidence
            );
        }
        Ok(())
    }
}
