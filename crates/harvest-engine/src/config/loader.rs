use super::schema::RunConfig;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Names a configuration file that takes precedence over the default locations.
pub const CONFIG_ENV: &str = "HARVEST_CONFIG";

const LOCAL_CONFIG: &str = "harvest.yaml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the first configuration found, together with the file it came from:
    /// 1. `$HARVEST_CONFIG`, which must exist when set
    /// 2. ./harvest.yaml
    /// 3. ~/.harvest/config.yaml
    ///
    /// Falls back to the defaults with no source when none exists.
    pub async fn load_default() -> Result<(RunConfig, Option<PathBuf>), ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let home = dirs::home_dir();
        match Self::locate(explicit, Path::new("."), home.as_deref()) {
            Some(path) => {
                let config = Self::load_from(&path).await?;
                Ok((config, Some(path)))
            }
            None => Ok((RunConfig::default(), None)),
        }
    }

    /// Picks the file `load_default` reads. An explicit path is returned even
    /// when missing so the caller reports it instead of silently using defaults.
    pub fn locate(
        explicit: Option<PathBuf>,
        local_dir: &Path,
        home: Option<&Path>,
    ) -> Option<PathBuf> {
        if explicit.is_some() {
            return explicit;
        }

        let local = local_dir.join(LOCAL_CONFIG);
        if local.exists() {
            return Some(local);
        }

        home.map(|home| home.join(".harvest").join("config.yaml"))
            .filter(|path| path.exists())
    }

    /// An empty file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<RunConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(RunConfig::default());
        }
        let config: RunConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
