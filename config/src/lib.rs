//! Configuration for maestro: XDG `config.toml` plus project `.env`, applied to the process
//! environment with priority **existing env > .env > XDG**, and the typed `[run]` table.
//!
//! ```toml
//! # ~/.config/maestro/config.toml
//! [env]
//! SERPER_API_KEY = "..."
//!
//! [run]
//! recursion_limit = 50
//! fan_out_limit = 5
//! routing_retries = 2
//! ```

mod dotenv;
mod xdg_toml;

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(String),
}

/// `[run]` table: orchestration limits. Unset fields keep the library defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Maximum node executions per workflow run.
    pub recursion_limit: Option<usize>,
    /// Concurrent units per worker turn.
    pub fan_out_limit: Option<usize>,
    /// When set, an unparseable planner decision sends control back to the planner this many times.
    pub routing_retries: Option<usize>,
}

/// Loads XDG `config.toml` `[env]` and the project `.env`, then sets each key that is
/// **not** already present in the process environment (`.env` beats XDG).
///
/// * `app_name`: directory under the config home, e.g. `"maestro"`.
/// * `override_dir`: look for `.env` here instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_file(app_name)?.env;
    let dotenv_map = dotenv::load_env_map(override_dir)?;

    let keys: HashSet<&String> = xdg_map.keys().chain(dotenv_map.keys()).collect();
    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(value) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}

/// Reads the `[run]` table of `$XDG_CONFIG_HOME/<app_name>/config.toml`.
pub fn load_settings(app_name: &str) -> Result<RunSettings, LoadError> {
    Ok(xdg_toml::load_file(app_name)?.run)
}
