//! Runtime configuration.
//!
//! An optional TOML file provides defaults; the `BOT_TOKEN` environment
//! variable always wins for the token and is the only required setting.
//! The file lives at the platform config dir (`parcel-bot/config.toml`)
//! unless `PARCEL_BOT_CONFIG` points elsewhere.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// Chat that receives completed ticket notifications.
const DEFAULT_ADMIN_CHAT_ID: &str = "1040886421";

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN is not set; export it or put `bot_token` in the config file")]
    MissingToken,

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// On-disk shape; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    bot_token: Option<String>,
    admin_chat_id: Option<String>,
    rates_url: Option<String>,
    log_level: Option<String>,
}

/// Resolved configuration used by the rest of the crate.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub admin_chat_id: String,
    /// `None` uses the built-in CBR feed URL.
    pub rates_url: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load from the config file (if any) and the environment, validating
    /// that a bot token is present.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match config_path() {
            Some(path) if path.exists() => read_file(&path)?,
            _ => FileConfig::default(),
        };
        Self::resolve(file, std::env::var("BOT_TOKEN").ok())
    }

    fn resolve(file: FileConfig, env_token: Option<String>) -> Result<Self, ConfigError> {
        let bot_token = env_token
            .filter(|t| !t.trim().is_empty())
            .or(file.bot_token)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            bot_token,
            admin_chat_id: file
                .admin_chat_id
                .unwrap_or_else(|| DEFAULT_ADMIN_CHAT_ID.to_string()),
            rates_url: file.rates_url,
            log_level: file.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PARCEL_BOT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from("", "", "parcel-bot").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_token_wins_over_file() {
        let file = FileConfig {
            bot_token: Some("file-token".into()),
            ..FileConfig::default()
        };
        let config = Config::resolve(file, Some("env-token".into())).unwrap();
        assert_eq!(config.bot_token, "env-token");
    }

    #[test]
    fn file_token_used_when_env_missing_or_blank() {
        let file = FileConfig {
            bot_token: Some("file-token".into()),
            ..FileConfig::default()
        };
        let config = Config::resolve(file.clone(), None).unwrap();
        assert_eq!(config.bot_token, "file-token");

        let config = Config::resolve(file, Some("   ".into())).unwrap();
        assert_eq!(config.bot_token, "file-token");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Config::resolve(FileConfig::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn defaults_fill_in() {
        let config = Config::resolve(FileConfig::default(), Some("t".into())).unwrap();
        assert_eq!(config.admin_chat_id, DEFAULT_ADMIN_CHAT_ID);
        assert_eq!(config.log_level, "info");
        assert!(config.rates_url.is_none());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
bot_token = "123:ABC"
admin_chat_id = "99"
rates_url = "http://localhost:8080/rates.json"
log_level = "debug"
"#,
        )
        .unwrap();

        let file = read_file(&path).unwrap();
        let config = Config::resolve(file, None).unwrap();
        assert_eq!(config.bot_token, "123:ABC");
        assert_eq!(config.admin_chat_id, "99");
        assert_eq!(
            config.rates_url.as_deref(),
            Some("http://localhost:8080/rates.json")
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bot_token = [not toml").unwrap();

        let err = read_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_file(Path::new("/nonexistent/parcel-bot.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
