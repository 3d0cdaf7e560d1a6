//! `$XDG_CONFIG_HOME/<app>/config.toml`: the `[env]` table plus a `[search]` table whose
//! keys become `<APP>_<KEY>` variables (`k = 20` in app `thoughtree` sets `THOUGHTREE_K`).
//!
//! ```toml
//! [env]
//! OPENAI_MODEL = "gpt-4o-mini"
//!
//! [search]
//! k = 20
//! strategy = "checked-propose"
//! backtracking = true
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// `$XDG_CONFIG_HOME` when set, else the platform config dir.
pub fn config_home() -> Result<PathBuf, LoadError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir().ok_or_else(|| LoadError::XdgPath("no config directory for this user".into()))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
    #[serde(default)]
    search: HashMap<String, toml::Value>,
}

/// `THOUGHTREE_` for `thoughtree`.
fn env_prefix(app_name: &str) -> String {
    format!("{}_", app_name.to_uppercase().replace('-', "_"))
}

fn search_key(prefix: &str, key: &str) -> String {
    let key = match key {
        // env var name is the short form
        "backtracking" => "backtrack",
        other => other,
    };
    format!("{}{}", prefix, key.to_uppercase().replace('-', "_"))
}

fn value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Variables from `<config_home>/<app>/config.toml`. `[env]` entries win over `[search]`
/// entries naming the same variable. A missing file is an empty map.
pub fn load_env_map_in(config_home: &Path, app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = config_home.join(app_name).join("config.toml");
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let file: ConfigFile = toml::from_str(&content)?;

    let prefix = env_prefix(app_name);
    let mut out: HashMap<String, String> = file
        .search
        .iter()
        .map(|(k, v)| (search_key(&prefix, k), value_to_string(v)))
        .collect();
    out.extend(file.env);
    Ok(out)
}
