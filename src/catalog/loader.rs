/// Catalog sources and the load-with-fallback policy

use crate::api::ApiClient;
use crate::error::CatalogError;

use super::definition::{parse_definitions, SoundDefinition};
use super::{Catalog, CatalogOrigin};

/// Path of the sound catalog endpoint
pub const CATALOG_PATH: &str = "/api/admin/sounds";

/// Where sound definitions come from
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<SoundDefinition>, CatalogError>;
}

/// Fetches the catalog from `GET /api/admin/sounds`
pub struct HttpCatalogSource {
    client: ApiClient,
}

impl HttpCatalogSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl CatalogSource for HttpCatalogSource {
    fn fetch(&self) -> Result<Vec<SoundDefinition>, CatalogError> {
        let url = self.client.url(CATALOG_PATH);

        let response = match self.client.get(CATALOG_PATH, "application/json") {
            None => return Err(CatalogError::MissingCredential),
            Some(Ok(response)) => response,
            Some(Err(ureq::Error::Status(status, _))) => {
                return Err(CatalogError::Status { url, status });
            }
            Some(Err(e)) => {
                return Err(CatalogError::Request {
                    url,
                    source: Box::new(e),
                });
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(CatalogError::Status { url, status });
        }

        let body: serde_json::Value = response.into_json().map_err(CatalogError::InvalidJson)?;
        parse_definitions(body)
    }
}

/// Source for hosts without API access; always falls back
pub struct OfflineCatalogSource;

impl CatalogSource for OfflineCatalogSource {
    fn fetch(&self) -> Result<Vec<SoundDefinition>, CatalogError> {
        Err(CatalogError::MissingCredential)
    }
}

/// Load a catalog from `source`, substituting the static catalog on any failure
pub fn load_catalog(source: &dyn CatalogSource) -> Catalog {
    match source.fetch() {
        Ok(definitions) => {
            let catalog = Catalog::new(definitions, CatalogOrigin::Remote);
            tracing::info!(
                "Loaded {} sound definitions for {} triggers",
                catalog.len(),
                catalog.trigger_count()
            );
            catalog
        }
        Err(e) => {
            tracing::warn!("Sound catalog unavailable ({}), using fallback sounds", e);
            Catalog::fallback()
        }
    }
}
