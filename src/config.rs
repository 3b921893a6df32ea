//! Optional config file loading. Search order: ./dmfetch.toml, then
//! $XDG_CONFIG_HOME/dmfetch/config.toml (or ~/.config/dmfetch/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Directory holding link.json / link.txt. Relative to CWD.
    pub input_dir: Option<PathBuf>,
    /// Where XML files are written. Default: `xml` inside the input directory.
    pub output_dir: Option<PathBuf>,
    /// Structured input file name (default link.json).
    pub json_file: Option<String>,
    /// Plain-text input file name (default link.txt).
    pub txt_file: Option<String>,
    /// Download URL template containing `{id}`.
    pub endpoint: Option<String>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// Search order: (1) ./dmfetch.toml, (2) $XDG_CONFIG_HOME/dmfetch/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("dmfetch.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("dmfetch").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            tracing::debug!(path = %path.display(), "loaded config");
            return Ok(Some(config));
        }
    }
    Ok(None)
}
