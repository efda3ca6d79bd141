//! Load configuration from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**.
//!
//! [`Settings::from_env`] reads the applied environment into typed CLI settings.

mod env_file;
mod xdg_toml;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Env key selecting the demo model (`echo` or `sentiment`).
pub const ENV_MODEL: &str = "MEMOPROXY_MODEL";
/// Env key enabling input validation (`1`, `true`, `yes`, `on`).
pub const ENV_VALIDATE: &str = "MEMOPROXY_VALIDATE";
/// Env key for the log file path.
pub const ENV_LOG_FILE: &str = "LOG_FILE";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(#[from] ::dotenv::Error),
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set.
///
/// * `app_name`: e.g. `"memoproxy"`, used for `$XDG_CONFIG_HOME/<app_name>/config.toml`.
/// * `override_dir`: if `Some`, look for `.env` there instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;

    let mut keys: std::collections::HashSet<String> = xdg_map.keys().cloned().collect();
    keys.extend(dotenv_map.keys().cloned());

    for key in keys {
        if std::env::var_os(&key).is_some() {
            continue; // existing env wins
        }
        if let Some(v) = dotenv_map.get(&key).or_else(|| xdg_map.get(&key)) {
            std::env::set_var(&key, v);
        }
    }

    Ok(())
}

/// CLI defaults taken from the environment after [`load_and_apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Raw model name; parsed by the caller.
    pub model: Option<String>,
    pub validate: bool,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        Self {
            model: non_empty(ENV_MODEL),
            validate: non_empty(ENV_VALIDATE)
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            log_file: non_empty(ENV_LOG_FILE).map(PathBuf::from),
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
