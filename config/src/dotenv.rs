//! `.env` reader. Values are collected here and applied to the process in `lib`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match override_dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Strips one pair of matching quotes. Double quotes honour `\"`; single quotes are
/// literal. Unquoted values lose a trailing ` # comment`.
fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return raw[1..raw.len() - 1].replace("\\\"", "\"");
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return raw[1..raw.len() - 1].to_string();
    }
    match raw.find(" #") {
        Some(i) => raw[..i].trim_end().to_string(),
        None => raw.to_string(),
    }
}

/// `KEY=VALUE`, optionally prefixed with `export `. Blank lines, `#` comments and lines
/// without `=` yield `None`.
fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), unquote(value.trim())))
}

fn parse_dotenv(content: &str) -> HashMap<String, String> {
    content.lines().filter_map(parse_line).collect()
}

/// Reads `.env` from `override_dir` (or the current directory). A missing file is an
/// empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    let content = std::fs::read_to_string(path)?;
    Ok(parse_dotenv(&content))
}
