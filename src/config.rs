//! Client configuration, loaded from a JSON file.
//!
//! ```json
//! {
//!   "servers": {
//!     "weather": "servers/weather.py",
//!     "github": "servers/github.js"
//!   },
//!   "model": "claude-3-5-sonnet-20241022",
//!   "max_tokens": 1000,
//!   "max_tool_rounds": 8
//! }
//! ```
//!
//! Server order in the file is the connection (and therefore catalog)
//! order; `serde_json`'s `preserve_order` feature keeps it.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::agent::DEFAULT_MAX_TOOL_ROUNDS;

/// Default model identifier.
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Default per-response output token budget.
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    servers: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    max_tool_rounds: Option<u32>,
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `(server name, script path)` pairs in file order.
    pub servers: Vec<(String, String)>,
    pub model: String,
    pub max_tokens: u32,
    pub max_tool_rounds: u32,
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let raw: RawConfig =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut servers = Vec::with_capacity(raw.servers.len());
        for (name, value) in raw.servers {
            let script = value.as_str().ok_or_else(|| ConfigError::Invalid {
                reason: format!("server '{name}': script path must be a string"),
            })?;
            servers.push((name, script.to_string()));
        }

        Ok(Config {
            servers,
            model: raw.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: raw.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_tool_rounds: raw.max_tool_rounds.unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"{
                "servers": {"weather": "servers/weather.py", "github": "servers/github.js"},
                "model": "claude-test",
                "max_tokens": 512,
                "max_tool_rounds": 3
            }"#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.servers,
            vec![
                ("weather".to_string(), "servers/weather.py".to_string()),
                ("github".to_string(), "servers/github.js".to_string()),
            ]
        );
        assert_eq!(config.model, "claude-test");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.max_tool_rounds, 3);
    }

    #[test]
    fn test_defaults_applied() {
        let file = write_config(r#"{"servers": {"db": "db.py"}}"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
    }

    #[test]
    fn test_server_file_order_preserved() {
        let file = write_config(
            r#"{"servers": {"zeta": "z.py", "alpha": "a.py", "mid": "m.js"}}"#,
        );
        let config = Config::load(file.path()).unwrap();
        let names: Vec<&str> = config.servers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_non_string_script_path_rejected() {
        let file = write_config(r#"{"servers": {"weather": 42}}"#);
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_config("{not json");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
