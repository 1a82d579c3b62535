use std::path::{Path, PathBuf};

use knivete_common::{Error, Result};
use tracing::debug;

use crate::model::AppConfig;

/// File names probed, in order, by [`ConfigLoader::discover`].
const DEFAULT_FILES: [&str; 3] = ["knivete.yml", "knivete.yaml", "knivete.toml"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate the config at `path`, picking the format from the
    /// file extension.
    pub fn load(path: &Path) -> Result<AppConfig> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: AppConfig = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display())))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display())))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        config.validate()?;
        debug!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Look for a default config file in `dir`; fall back to defaults when
    /// none exists.
    pub fn discover(dir: &Path) -> Result<AppConfig> {
        match Self::locate(dir) {
            Some(path) => Self::load(&path),
            None => {
                debug!("no config file in {}, using defaults", dir.display());
                Ok(AppConfig::default())
            }
        }
    }

    /// First default config file present in `dir`, if any.
    pub fn locate(dir: &Path) -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}
