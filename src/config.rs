//! The single top-level configuration record (spec §6), loaded from a TOML
//! file. Grounded on the teacher's small typed-struct-from-disk pattern
//! (`mod_metadata.rs`/`modfile.rs`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: String,
    pub assets_root: PathBuf,
    pub cache_root: PathBuf,
    pub output_dir: PathBuf,
    pub languages: Vec<String>,
    pub language_codes: Vec<String>,
    pub wiki_language: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}
