use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = "portgrid.yaml";

/// Optional settings file. Every key falls back to the CLI flag or the
/// built-in default when absent.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub out_csv: Option<PathBuf>,
    pub heatmap: Option<String>,
    pub json: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

/// Load `path`, or `./portgrid.yaml` when no path is given and it exists.
/// Returns `Ok(None)` when there is nothing to load.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
    let cfg = serde_yaml::from_str(&s).map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(Some(cfg))
}
