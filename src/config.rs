use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TramviaConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub matching: MatchingConfig,
    pub condenser: CondenserConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

/// Score gates for the two corpora. The thresholds are empirically chosen —
/// intents trigger side-effecting actions and demand higher confidence than
/// informational KB answers.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    pub intent_threshold: f32,
    pub kb_threshold: f32,
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CondenserConfig {
    pub max_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_tramvia_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            intent_threshold: 0.72,
            kb_threshold: 0.70,
            top_k: 3,
        }
    }
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            max_chars: crate::condense::DEFAULT_MAX_CHARS,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8787/assistant".into(),
            timeout_secs: 30,
        }
    }
}

/// Returns `~/.tramvia/`
pub fn default_tramvia_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".tramvia")
}

/// Returns the default config file path: `~/.tramvia/config.toml`
pub fn default_config_path() -> PathBuf {
    default_tramvia_dir().join("config.toml")
}

impl TramviaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TramviaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (TRAMVIA_ENDPOINT,
    /// TRAMVIA_MODEL_DIR, TRAMVIA_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TRAMVIA_ENDPOINT") {
            self.remote.endpoint = val;
        }
        if let Ok(val) = std::env::var("TRAMVIA_MODEL_DIR") {
            self.embedding.cache_dir = val;
        }
        if let Ok(val) = std::env::var("TRAMVIA_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TramviaConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.embedding.provider, "local");
        assert!((config.matching.intent_threshold - 0.72).abs() < 1e-6);
        assert!((config.matching.kb_threshold - 0.70).abs() < 1e-6);
        assert!(config.matching.intent_threshold > config.matching.kb_threshold);
        assert_eq!(config.matching.top_k, 3);
        assert_eq!(config.condenser.max_chars, 320);
        assert_eq!(config.remote.timeout_secs, 30);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[matching]
intent_threshold = 0.8

[remote]
endpoint = "https://assistant.example.com/v1"
"#;
        let config: TramviaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert!((config.matching.intent_threshold - 0.8).abs() < 1e-6);
        assert_eq!(config.remote.endpoint, "https://assistant.example.com/v1");
        // defaults still apply for unset fields
        assert!((config.matching.kb_threshold - 0.70).abs() < 1e-6);
        assert_eq!(config.condenser.max_chars, 320);
    }

    #[test]
    fn load_from_reads_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[matching]\nintent_threshold = 0.9\ntop_k = 5\n\n[condenser]\nmax_chars = 200\n",
        )
        .unwrap();

        // Only fields without env overrides are asserted here; env-overridable
        // ones race with the env test when the suite runs in parallel.
        let config = TramviaConfig::load_from(&path).unwrap();
        assert!((config.matching.intent_threshold - 0.9).abs() < 1e-6);
        assert_eq!(config.matching.top_k, 5);
        assert_eq!(config.condenser.max_chars, 200);
        assert_eq!(config.remote.timeout_secs, 30);
    }

    #[test]
    fn load_from_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TramviaConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert!((config.matching.intent_threshold - 0.72).abs() < 1e-6);
    }

    #[test]
    fn load_from_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[matching\nintent_threshold = ").unwrap();
        assert!(TramviaConfig::load_from(&path).is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = TramviaConfig::default();
        std::env::set_var("TRAMVIA_ENDPOINT", "http://127.0.0.1:9000/x");
        std::env::set_var("TRAMVIA_MODEL_DIR", "/tmp/models");
        std::env::set_var("TRAMVIA_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.remote.endpoint, "http://127.0.0.1:9000/x");
        assert_eq!(config.embedding.cache_dir, "/tmp/models");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("TRAMVIA_ENDPOINT");
        std::env::remove_var("TRAMVIA_MODEL_DIR");
        std::env::remove_var("TRAMVIA_LOG_LEVEL");
    }
}
