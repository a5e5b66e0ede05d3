//! Configuration for hitokoto

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::fetcher::Mirror;

/// Main configuration, passed explicitly to the store, fetcher and API client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the offline bundle
    #[serde(rename = "bundle-dir")]
    pub bundle_dir: PathBuf,

    /// Preferred bundle mirror
    pub mirror: Mirror,

    /// Log level used when --debug is not given (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Online API settings
    pub api: ApiConfig,

    /// Bundle download settings
    pub download: DownloadConfig,
}

fn default_bundle_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hitokoto")
        .join("bundle")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bundle_dir: default_bundle_dir(),
            mirror: Mirror::default(),
            log_level: None,
            api: ApiConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // .hitokoto.yml, then ~/.config/hitokoto/hitokoto.yml
        for candidate in Self::candidate_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {:#}", candidate.display(), e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Only the `log-level` of the config `load` would pick, read before logging is up
    ///
    /// Unreadable files are passed over quietly; `load` reports them.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let config = match config_path {
            Some(path) => Self::load_from_file(path).ok()?,
            None => Self::candidate_paths()
                .into_iter()
                .filter(|p| p.exists())
                .find_map(|p| Self::load_from_file(&p).ok())?,
        };
        config.log_level
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".hitokoto.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hitokoto").join("hitokoto.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::debug!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Online sentence API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    #[serde(rename = "international-url")]
    pub international_url: String,

    #[serde(rename = "china-url")]
    pub china_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            international_url: "https://international.v1.hitokoto.cn/".to_string(),
            china_url: "https://v1.hitokoto.cn/".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Bundle download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Per-file timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: format!("hitokoto-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.bundle_dir.ends_with("hitokoto/bundle"));
        assert_eq!(config.mirror, Mirror::Official);
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.download.timeout_ms, 30_000);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
bundle-dir: /srv/hitokoto
mirror: jsd
api:
  timeout-ms: 2500
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bundle_dir, PathBuf::from("/srv/hitokoto"));
        assert_eq!(config.mirror, Mirror::Jsdelivr);
        assert_eq!(config.api.timeout_ms, 2500);
        assert_eq!(config.api.china_url, "https://v1.hitokoto.cn/");
        assert_eq!(config.download.timeout_ms, 30_000);
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hitokoto.yml");
        fs::write(&path, "mirror: gh\nlog-level: DEBUG\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.mirror, Mirror::Github);
        assert_eq!(config.log_level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_load_log_level() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("good.yml");
        fs::write(&good, "log-level: info\n").unwrap();
        assert_eq!(Config::load_log_level(Some(&good)).as_deref(), Some("info"));

        let bad = temp.path().join("bad.yml");
        fs::write(&bad, "mirror: [not, valid").unwrap();
        assert!(Config::load_log_level(Some(&bad)).is_none());
        assert!(Config::load_log_level(Some(&temp.path().join("nope.yml"))).is_none());
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
