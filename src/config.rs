//! Application-level configuration loading: catalog location, store file and listen port.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::catalog::CatalogSource;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "HIBURIM_CONFIG_PATH";
const DEFAULT_CATALOG: &str = "data/puzzles.json";
const DEFAULT_STORE_PATH: &str = "data/store.json";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    catalog: String,
    store_path: PathBuf,
    port: u16,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        catalog = %app_config.catalog,
                        store = %app_config.store_path.display(),
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Where the puzzle catalog is fetched from.
    pub fn catalog_source(&self) -> CatalogSource {
        CatalogSource::parse(&self.catalog)
    }

    /// File backing the key-value store.
    pub fn store_path(&self) -> &PathBuf {
        &self.store_path
    }

    /// Listen port; `PORT` or `SERVER_PORT` take precedence over the file.
    pub fn port(&self) -> u16 {
        env::var("PORT")
            .or_else(|_| env::var("SERVER_PORT"))
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_CATALOG.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// Every field is optional.
struct RawConfig {
    catalog: Option<String>,
    store_path: Option<PathBuf>,
    port: Option<u16>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            catalog: value.catalog.unwrap_or(defaults.catalog),
            store_path: value.store_path.unwrap_or(defaults.store_path),
            port: value.port.unwrap_or(defaults.port),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_keep_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{"catalog": "https://example.org/p.json"}"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.catalog, "https://example.org/p.json");
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn local_catalog_paths_stay_files() {
        let config = AppConfig::default();
        assert_eq!(
            config.catalog_source(),
            CatalogSource::File(PathBuf::from(DEFAULT_CATALOG))
        );
    }
}
