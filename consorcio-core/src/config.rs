use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

pub const DEFAULT_STORAGE_KEY: &str = "hiperban.consorcio.planos.v1";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogConfig {
    pub storage: StorageSection,
    #[serde(default)]
    pub catalog: CatalogSection,
    pub export: ExportSection,
    /// Directory the relative paths above are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl CatalogConfig {
    pub fn resolve_path<P: AsRef<Path>>(&self, candidate: P) -> PathBuf {
        let path = candidate.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve_path(&self.storage.database_path)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.resolve_path(&self.export.output_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    pub database_path: String,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSection {
    #[serde(default = "default_true")]
    pub seed_when_empty: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            seed_when_empty: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportSection {
    pub output_dir: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_true() -> bool {
    true
}

pub fn load_catalog_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let path = path.as_ref();
    let mut config: CatalogConfig = load_toml(path)?;
    if config.storage.storage_key.trim().is_empty() {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: "storage.storage_key must not be empty".to_string(),
        });
    }
    config.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(config)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
