//! TOML configuration parsing and validation.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below, so an empty file (or no file at all) is a valid
//! configuration.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [retrieval]
//! default_limit = 3
//!
//! [indexing]
//! delay_ms = 1000
//! timeout_secs = 30
//!
//! [prompt]
//! entry = "[SOURCE {index}]: {content}"
//!
//! [seed]
//! fixtures = true
//! documents_path = "./data/documents.json"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use rag_context_core::prompt::{PromptTemplate, DEFAULT_BLOCK, DEFAULT_ENTRY, DEFAULT_SEPARATOR};
use rag_context_core::search::DEFAULT_LIMIT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    /// Simulated per-document indexing work.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Upper bound on a single indexing task.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl IndexingConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_block")]
    pub block: String,
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            block: default_block(),
            entry: default_entry(),
            separator: default_separator(),
        }
    }
}

impl PromptConfig {
    pub fn template(&self) -> Result<PromptTemplate> {
        Ok(PromptTemplate::new(
            self.block.clone(),
            self.entry.clone(),
            self.separator.clone(),
        )?)
    }
}

fn default_block() -> String {
    DEFAULT_BLOCK.to_string()
}
fn default_entry() -> String {
    DEFAULT_ENTRY.to_string()
}
fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    /// Load the built-in style guide and product manual documents.
    #[serde(default = "default_fixtures")]
    pub fixtures: bool,
    /// JSON array of documents to add at startup.
    #[serde(default)]
    pub documents_path: Option<PathBuf>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            fixtures: default_fixtures(),
            documents_path: None,
        }
    }
}

fn default_fixtures() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.retrieval.default_limit < 1 {
        anyhow::bail!("retrieval.default_limit must be >= 1");
    }

    if config.indexing.timeout_secs == 0 {
        anyhow::bail!("indexing.timeout_secs must be > 0");
    }

    if config.indexing.delay() >= config.indexing.timeout() {
        anyhow::bail!(
            "indexing.delay_ms ({}) must be less than indexing.timeout_secs ({}s)",
            config.indexing.delay_ms,
            config.indexing.timeout_secs
        );
    }

    config
        .prompt
        .template()
        .with_context(|| "Invalid [prompt] section")?;

    EnvFilter::try_new(&config.logging.level)
        .with_context(|| format!("Invalid logging.level: '{}'", config.logging.level))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7340");
        assert_eq!(config.retrieval.default_limit, 3);
        assert_eq!(config.indexing.delay(), Duration::from_millis(1000));
        assert_eq!(config.indexing.timeout(), Duration::from_secs(30));
        assert!(config.seed.fixtures);
        assert!(config.seed.documents_path.is_none());
        assert_eq!(config.prompt.template().unwrap(), PromptTemplate::default());
    }

    #[test]
    fn test_overrides() {
        let file = write_config(
            r#"
[server]
bind = "0.0.0.0:9000"

[retrieval]
default_limit = 5

[indexing]
delay_ms = 10
timeout_secs = 2

[prompt]
entry = "- {content}"

[seed]
fixtures = false
documents_path = "docs.json"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.retrieval.default_limit, 5);
        assert_eq!(config.indexing.delay_ms, 10);
        assert_eq!(config.prompt.entry, "- {content}");
        assert_eq!(config.prompt.block, DEFAULT_BLOCK);
        assert!(!config.seed.fixtures);
        assert_eq!(config.seed.documents_path, Some(PathBuf::from("docs.json")));
    }

    #[test]
    fn test_rejects_zero_limit() {
        let file = write_config("[retrieval]\ndefault_limit = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("default_limit"));
    }

    #[test]
    fn test_rejects_delay_longer_than_timeout() {
        let file = write_config("[indexing]\ndelay_ms = 5000\ntimeout_secs = 1\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("delay_ms"));
    }

    #[test]
    fn test_rejects_template_without_content() {
        let file = write_config("[prompt]\nentry = \"[SOURCE {index}]\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/ragctx.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
