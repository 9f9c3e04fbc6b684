use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::storage::SqliteConfig;
use crate::store::StoreConfig;

pub const DEFAULT_STORE: &str = "webdemo";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SameasConfig {
    pub database: Option<String>,
    pub store: Option<String>,
    pub slug: Option<String>,
    pub short_name: Option<String>,
    pub full_name: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

impl SameasConfig {
    /// Store parameters, with `name` (from the command line) taking precedence
    pub fn store_config(&self, name: Option<&str>) -> StoreConfig {
        let name = name
            .map(str::to_string)
            .or_else(|| self.store.clone())
            .unwrap_or_else(|| DEFAULT_STORE.to_string());
        StoreConfig {
            name,
            slug: self.slug.clone(),
            short_name: self.short_name.clone(),
            full_name: self.full_name.clone(),
        }
    }

    /// Backend parameters, with `database` (from the command line) taking precedence
    pub fn sqlite_config(&self, database: Option<&Path>) -> SqliteConfig {
        let path = database
            .map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_database_path);
        let mut config = SqliteConfig::file(path);
        if let Some(timeout) = self.busy_timeout_ms {
            config.busy_timeout_ms = timeout;
        }
        config
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("sameas.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("sameas.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SameasConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: SameasConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SameasConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
