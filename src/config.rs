use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::horizon::HorizonKind;

pub const CONFIG_FILE: &str = "config.json";

fn default_workspace_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("horizons")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct HorizonsConfig {
    pub workspace_root: PathBuf,
    pub debug_logging: bool,
}

impl Default for HorizonsConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            debug_logging: false,
        }
    }
}

impl HorizonsConfig {
    /// `<config dir>/horizons/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("horizons").join(CONFIG_FILE))
    }

    /// Load from the standard location. A bad file is reported on stderr
    /// and in the log, then defaults are used. Call after the logger is up.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::read_from(&path).unwrap_or_else(|e| {
            eprintln!("warning: {}; using defaults", e);
            log::warn!("{}; using defaults", e);
            Self::default()
        })
    }

    /// Read `path`. A missing file yields defaults.
    pub fn read_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn horizon_dir(&self, kind: HorizonKind) -> PathBuf {
        self.workspace_root.join(kind.directory())
    }

    /// Ensure the workspace root and every horizon directory exist.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.workspace_root)?;
        for kind in HorizonKind::ALL {
            let dir = self.horizon_dir(kind);
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                log::info!("Created {}", dir.display());
            }
        }
        Ok(())
    }
}
