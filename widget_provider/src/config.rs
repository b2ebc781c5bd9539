use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

pub const ENV_PREFIX: &str = "UNIGETUI_WIDGETS_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the UniGetUI background API.
    pub api_url: String,

    /// Overrides the session token file written by UniGetUI.
    pub session_token_path: Option<PathBuf>,

    /// Separator between package records in the updates response.
    pub record_separator: String,

    /// Unset keeps the HTTP client's default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:7058".to_string(),
            session_token_path: None,
            record_separator: "||".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn token_path(&self) -> PathBuf {
        self.session_token_path
            .clone()
            .unwrap_or_else(default_session_token_path)
    }
}

/// `%HOMEDRIVE%%HOMEPATH%\.wingetui\CurrentSessionToken`
pub fn default_session_token_path() -> PathBuf {
    user_home_dir()
        .join(".wingetui")
        .join("CurrentSessionToken")
}

fn user_home_dir() -> PathBuf {
    let drive = std::env::var("HOMEDRIVE").ok();
    let path = std::env::var("HOMEPATH").ok();

    if let (Some(drive), Some(path)) = (drive, path) {
        return PathBuf::from(format!("{drive}{path}"));
    }

    // Fallbacks for sessions without HOMEDRIVE/HOMEPATH
    if let Ok(profile) = std::env::var("USERPROFILE") {
        return PathBuf::from(profile);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home);
    }

    warn!("Could not resolve the home directory, using the working directory");
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_api() {
        let config = Config::default();

        assert_eq!(config.api_url, "http://localhost:7058");
        assert_eq!(config.record_separator, "||");
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_token_path_override() {
        let config = Config {
            session_token_path: Some(PathBuf::from("/tmp/session-token")),
            ..Config::default()
        };

        assert_eq!(config.token_path(), PathBuf::from("/tmp/session-token"));
    }

    #[test]
    fn test_default_token_path_file_name() {
        let path = Config::default().token_path();

        assert!(path.ends_with(".wingetui/CurrentSessionToken"));
    }
}
