//! The per-user config file `~/.gatorconfig.json`.
//!
//! Holds the database URL and the name of the logged-in user. A missing file
//! reads as an empty config; `register` and `login` write it back.
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid JSON in config file {path}: {source}")]
    Parse { path: PathBuf, #[source] source: serde_json::Error },
    #[error("cannot locate home directory (HOME is unset)")]
    NoHome,
    #[error("no user is logged in; run `gator login <name>` first")]
    NotLoggedIn,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_name: Option<String>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Config {
    /// Load from `$HOME/.gatorconfig.json`. Without a home directory this is
    /// an empty config that cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_in(std::env::var_os("HOME"))
    }

    fn load_in(home: Option<OsString>) -> Result<Self, ConfigError> {
        match home.filter(|h| !h.is_empty()) {
            Some(home) => Self::load_from(PathBuf::from(home).join(CONFIG_FILE_NAME)),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Config { path: Some(path), ..Default::default() });
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let mut cfg: Config = if raw.trim().is_empty() {
            Config::default()
        } else {
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.clone(), source })?
        };
        cfg.path = Some(path);
        Ok(cfg)
    }

    pub fn current_user(&self) -> Result<&str, ConfigError> {
        self.current_user_name.as_deref().filter(|n| !n.is_empty()).ok_or(ConfigError::NotLoggedIn)
    }

    /// Record `name` as the logged-in user and persist the file.
    pub fn set_user(&mut self, name: &str) -> Result<(), ConfigError> {
        self.current_user_name = Some(name.to_string());
        self.write()
    }

    pub fn write(&self) -> Result<(), ConfigError> {
        let path = self.path.as_ref().ok_or(ConfigError::NoHome)?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        std::fs::write(path, json + "\n").map_err(|source| ConfigError::Io { path: path.clone(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("gator-config-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_is_empty_config() {
        let path = scratch_path();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.db_url, None);
        assert!(matches!(cfg.current_user(), Err(ConfigError::NotLoggedIn)));
    }

    #[test]
    fn reads_go_style_keys() {
        let path = scratch_path();
        std::fs::write(&path, r#"{"db_url":"postgres://localhost/gator","current_user_name":"kahya"}"#).unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.db_url.as_deref(), Some("postgres://localhost/gator"));
        assert_eq!(cfg.current_user().unwrap(), "kahya");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn set_user_persists_and_keeps_db_url() {
        let path = scratch_path();
        std::fs::write(&path, r#"{"db_url":"postgres://localhost/gator"}"#).unwrap();
        let mut cfg = Config::load_from(&path).unwrap();
        cfg.set_user("holgith").unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.current_user().unwrap(), "holgith");
        assert_eq!(reloaded.db_url.as_deref(), Some("postgres://localhost/gator"));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_home_is_empty_config() {
        for home in [None, Some(OsString::new())] {
            let cfg = Config::load_in(home).unwrap();
            assert_eq!(cfg.db_url, None);
            assert!(matches!(cfg.current_user(), Err(ConfigError::NotLoggedIn)));
        }
    }

    #[test]
    fn missing_home_cannot_be_written() {
        let mut cfg = Config::load_in(None).unwrap();
        assert!(matches!(cfg.set_user("kahya"), Err(ConfigError::NoHome)));
    }

    #[test]
    fn home_dir_is_joined_with_file_name() {
        let dir = std::env::temp_dir().join(format!("gator-home-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE_NAME), r#"{"current_user_name":"kahya"}"#).unwrap();
        let cfg = Config::load_in(Some(dir.clone().into_os_string())).unwrap();
        assert_eq!(cfg.current_user().unwrap(), "kahya");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let path = scratch_path();
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        std::fs::remove_file(&path).unwrap();
    }
}
