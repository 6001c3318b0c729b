//! Client configuration
//!
//! Settings come from an optional TOML file (`[igloo]` table or top-level keys)
//! and are then overridden by `IGLOO_MCP_*` environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file consulted when no explicit path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/igloo.toml";

/// Default number of results requested per search page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default character budget for a single fetch window
pub const DEFAULT_MAX_FETCH_CHARS: usize = 50_000;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting '{key}' (set it in the config file or via {env})")]
    Missing { key: &'static str, env: &'static str },
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Connection and behaviour settings for an Igloo community
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IglooConfig {
    /// Base URL of the community, e.g. `https://igloo.example.com`
    pub community: String,
    /// Numeric community identifier used by the v2 search API
    pub community_key: String,
    pub app_id: String,
    pub app_pass: String,
    pub username: String,
    pub password: String,
    pub proxy: Option<String>,
    pub verify_ssl: bool,
    pub page_size: usize,
    pub timeout_secs: u64,
    pub max_fetch_chars: usize,
}

impl Default for IglooConfig {
    fn default() -> Self {
        Self {
            community: String::new(),
            community_key: String::new(),
            app_id: String::new(),
            app_pass: String::new(),
            username: String::new(),
            password: String::new(),
            proxy: None,
            verify_ssl: true,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_fetch_chars: DEFAULT_MAX_FETCH_CHARS,
        }
    }
}

impl IglooConfig {
    /// Load settings from `path` (or [`DEFAULT_CONFIG_PATH`] if it exists),
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.community = config.community.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse TOML text. Accepts either an `[igloo]` table or top-level keys.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        #[derive(Deserialize)]
        struct Sectioned {
            igloo: Option<IglooConfig>,
        }

        if let Ok(Sectioned { igloo: Some(cfg) }) = toml::from_str::<Sectioned>(content) {
            return Ok(cfg);
        }
        toml::from_str::<IglooConfig>(content)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = text("IGLOO_MCP_COMMUNITY") {
            self.community = v;
        }
        if let Some(v) = text("IGLOO_MCP_COMMUNITY_KEY") {
            self.community_key = v;
        }
        if let Some(v) = text("IGLOO_MCP_APP_ID") {
            self.app_id = v;
        }
        if let Some(v) = text("IGLOO_MCP_APP_PASS") {
            self.app_pass = v;
        }
        if let Some(v) = text("IGLOO_MCP_USERNAME") {
            self.username = v;
        }
        if let Some(v) = text("IGLOO_MCP_PASSWORD") {
            self.password = v;
        }
        if let Some(v) = text("IGLOO_MCP_PROXY") {
            self.proxy = Some(v);
        }
        if let Some(v) = text("IGLOO_MCP_VERIFY_SSL") {
            self.verify_ssl = parse_bool(&v).ok_or(ConfigError::InvalidValue {
                key: "IGLOO_MCP_VERIFY_SSL",
                value: v.clone(),
            })?;
        }
        if let Some(v) = text("IGLOO_MCP_PAGE_SIZE") {
            self.page_size = parse_positive("IGLOO_MCP_PAGE_SIZE", &v)?;
        }
        if let Some(v) = text("IGLOO_MCP_TIMEOUT_SECS") {
            self.timeout_secs = parse_positive("IGLOO_MCP_TIMEOUT_SECS", &v)? as u64;
        }
        if let Some(v) = text("IGLOO_MCP_MAX_FETCH_CHARS") {
            self.max_fetch_chars = parse_positive("IGLOO_MCP_MAX_FETCH_CHARS", &v)?;
        }
        Ok(())
    }

    /// Check that everything needed to talk to the community is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (&self.community, "community", "IGLOO_MCP_COMMUNITY"),
            (&self.community_key, "community_key", "IGLOO_MCP_COMMUNITY_KEY"),
            (&self.app_id, "app_id", "IGLOO_MCP_APP_ID"),
            (&self.app_pass, "app_pass", "IGLOO_MCP_APP_PASS"),
            (&self.username, "username", "IGLOO_MCP_USERNAME"),
            (&self.password, "password", "IGLOO_MCP_PASSWORD"),
        ];
        for (value, key, env) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { key, env });
            }
        }

        if !(self.community.starts_with("http://") || self.community.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "community",
                value: self.community.clone(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "page_size",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete() -> IglooConfig {
        IglooConfig {
            community: "https://igloo.example.com".to_string(),
            community_key: "10".to_string(),
            app_id: "app".to_string(),
            app_pass: "secret".to_string(),
            username: "bot".to_string(),
            password: "pw".to_string(),
            ..IglooConfig::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = IglooConfig::default();
        assert!(cfg.verify_ssl);
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.max_fetch_chars, 50_000);
        assert!(cfg.proxy.is_none());
    }

    #[test]
    fn parses_sectioned_and_flat_toml() {
        let sectioned = "[igloo]\ncommunity = \"https://a.example\"\npage_size = 25\n";
        let cfg = IglooConfig::from_toml(sectioned).unwrap();
        assert_eq!(cfg.community, "https://a.example");
        assert_eq!(cfg.page_size, 25);
        assert!(cfg.verify_ssl);

        let flat = "community = \"https://b.example\"\nverify_ssl = false\n";
        let cfg = IglooConfig::from_toml(flat).unwrap();
        assert_eq!(cfg.community, "https://b.example");
        assert!(!cfg.verify_ssl);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn reads_config_file_from_disk() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[igloo]\ncommunity_key = \"42\"\n").unwrap();
        let cfg = IglooConfig::from_file(tmp.path()).unwrap();
        assert_eq!(cfg.community_key, "42");

        let missing = IglooConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("IGLOO_MCP_COMMUNITY", "https://env.example/"),
            ("IGLOO_MCP_PAGE_SIZE", "20"),
            ("IGLOO_MCP_VERIFY_SSL", "false"),
            ("IGLOO_MCP_PROXY", "  "),
        ]
        .into_iter()
        .collect();

        let mut cfg = complete();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.community, "https://env.example/");
        assert_eq!(cfg.page_size, 20);
        assert!(!cfg.verify_ssl);
        // Blank values are ignored
        assert!(cfg.proxy.is_none());
    }

    #[test]
    fn invalid_override_is_rejected() {
        let mut cfg = complete();
        let err = cfg
            .apply_overrides(|k| (k == "IGLOO_MCP_PAGE_SIZE").then(|| "zero".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "IGLOO_MCP_PAGE_SIZE", .. }));
    }

    #[test]
    fn validate_reports_first_missing_setting() {
        assert!(complete().validate().is_ok());

        let mut cfg = complete();
        cfg.app_pass.clear();
        match cfg.validate() {
            Err(ConfigError::Missing { key, env }) => {
                assert_eq!(key, "app_pass");
                assert_eq!(env, "IGLOO_MCP_APP_PASS");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let mut cfg = complete();
        cfg.community = "igloo.example.com".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidValue { .. })));
    }
}
