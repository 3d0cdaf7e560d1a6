//! Load configuration from XDG `config.toml` and a project `.env`, then apply it to the
//! process environment with priority: **existing env > .env > XDG**.
//!
//! The search library only reads `THOUGHTREE_*` variables; this crate is how a user's
//! config file and `.env` end up there.

mod dotenv;
mod xdg_toml;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use thiserror::Error;

pub use xdg_toml::config_home;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Loads `$XDG_CONFIG_HOME/<app_name>/config.toml` and `.env` (from `override_dir` or the
/// current directory) and sets every variable that is not already set.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let home = config_home()?;
    load_and_apply_from(&home, app_name, override_dir)
}

/// Like [`load_and_apply`] with an explicit config home instead of `$XDG_CONFIG_HOME`.
pub fn load_and_apply_from(
    config_home: &Path,
    app_name: &str,
    override_dir: Option<&Path>,
) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map_in(config_home, app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;
    for (key, value) in resolve(&xdg_map, &dotenv_map, |k| std::env::var_os(k).is_some()) {
        std::env::set_var(key, value);
    }
    Ok(())
}

/// Variables to set: `.env` over XDG, skipping keys for which `is_set` holds.
fn resolve<'a>(
    xdg: &'a HashMap<String, String>,
    dotenv: &'a HashMap<String, String>,
    is_set: impl Fn(&str) -> bool,
) -> Vec<(&'a str, &'a str)> {
    let keys: HashSet<&String> = xdg.keys().chain(dotenv.keys()).collect();
    let mut out: Vec<(&str, &str)> = keys
        .into_iter()
        .filter(|k| !is_set(k.as_str()))
        .filter_map(|k| {
            dotenv
                .get(k)
                .or_else(|| xdg.get(k))
                .map(|v| (k.as_str(), v.as_str()))
        })
        .collect();
    out.sort_unstable();
    out
}
