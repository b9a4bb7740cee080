//! Loading of the puzzle catalog document from disk or over HTTP.

use std::{error::Error, fmt, path::PathBuf};

use thiserror::Error;
use tracing::info;

use crate::{dao::models::CatalogEntity, state::catalog::Catalog};

/// Upper bound on fetching a remote catalog, connection included.
#[cfg(feature = "remote-catalog")]
const REMOTE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Where the catalog document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// JSON document on the local filesystem.
    File(PathBuf),
    /// JSON document served over HTTP(S).
    #[cfg(feature = "remote-catalog")]
    Remote(String),
}

impl CatalogSource {
    /// Interpret a configured location: URLs become remote sources, anything else a path.
    pub fn parse(location: &str) -> Self {
        #[cfg(feature = "remote-catalog")]
        {
            if location.starts_with("http://") || location.starts_with("https://") {
                return CatalogSource::Remote(location.to_string());
            }
        }
        CatalogSource::File(PathBuf::from(location))
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            #[cfg(feature = "remote-catalog")]
            CatalogSource::Remote(url) => f.write_str(url),
        }
    }
}

/// The catalog resource could not be read or parsed.
#[derive(Debug, Error)]
#[error("catalog `{location}` unavailable: {message}")]
pub struct CatalogError {
    /// Configured location of the catalog.
    pub location: String,
    /// Short description of the failing step.
    pub message: &'static str,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl CatalogError {
    fn new(
        source_location: &CatalogSource,
        message: &'static str,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            location: source_location.to_string(),
            message,
            source: Box::new(source),
        }
    }
}

/// Load and validate the catalog. Invalid puzzles are dropped, unreadable documents fail.
pub async fn load_catalog(source: &CatalogSource) -> Result<Catalog, CatalogError> {
    let entity = read_entity(source).await?;
    let published = entity.puzzles.len();
    let catalog = Catalog::from(entity);
    info!(
        location = %source,
        published,
        playable = catalog.len(),
        "loaded puzzle catalog"
    );
    Ok(catalog)
}

async fn read_entity(source: &CatalogSource) -> Result<CatalogEntity, CatalogError> {
    match source {
        CatalogSource::File(path) => {
            let contents = tokio::fs::read_to_string(path)
                .await
                .map_err(|err| CatalogError::new(source, "read failed", err))?;
            serde_json::from_str(&contents)
                .map_err(|err| CatalogError::new(source, "invalid document", err))
        }
        #[cfg(feature = "remote-catalog")]
        CatalogSource::Remote(url) => {
            let client = reqwest::Client::builder()
                .timeout(REMOTE_TIMEOUT)
                .build()
                .map_err(|err| CatalogError::new(source, "request failed", err))?;
            let response = client
                .get(url)
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(|err| CatalogError::new(source, "request failed", err))?;
            response
                .json::<CatalogEntity>()
                .await
                .map_err(|err| CatalogError::new(source, "invalid document", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::puzzle::fixtures::kitchen_entity;
    use tempfile::tempdir;

    #[tokio::test]
    async fn loads_catalog_from_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("puzzles.json");
        let entity = CatalogEntity {
            puzzles: vec![kitchen_entity("1", "05.03.2025")],
        };
        std::fs::write(&path, serde_json::to_string(&entity).unwrap()).unwrap();

        let catalog = load_catalog(&CatalogSource::File(path)).await.unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn missing_or_malformed_catalog_is_unavailable() {
        let dir = tempdir().expect("temp dir");
        let missing = CatalogSource::File(dir.path().join("absent.json"));
        assert_eq!(
            load_catalog(&missing).await.unwrap_err().message,
            "read failed"
        );

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"puzzles\": 3}").unwrap();
        let err = load_catalog(&CatalogSource::File(path)).await.unwrap_err();
        assert_eq!(err.message, "invalid document");
    }

    #[test]
    fn parses_locations() {
        assert_eq!(
            CatalogSource::parse("data/puzzles.json"),
            CatalogSource::File(PathBuf::from("data/puzzles.json"))
        );
        #[cfg(feature = "remote-catalog")]
        assert_eq!(
            CatalogSource::parse("https://example.org/puzzles.json"),
            CatalogSource::Remote("https://example.org/puzzles.json".into())
        );
    }
}
