/// Audio asset sources
///
/// Supply the raw (still encoded) bytes of a sound that has an audio file.

use std::io::Read;

use crate::api::ApiClient;
use crate::catalog::SoundDefinition;
use crate::error::AudioError;

/// Upper bound on a single downloaded asset
const MAX_ASSET_BYTES: u64 = 16 * 1024 * 1024;

pub trait AssetSource: Send + Sync {
    fn fetch(&self, definition: &SoundDefinition) -> Result<Vec<u8>, AudioError>;
}

/// Downloads assets from `GET /api/admin/sounds/{id}/file`
pub struct HttpAssetSource {
    client: ApiClient,
}

impl HttpAssetSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn asset_path(definition: &SoundDefinition) -> String {
        format!("/api/admin/sounds/{}/file", definition.id)
    }
}

impl AssetSource for HttpAssetSource {
    fn fetch(&self, definition: &SoundDefinition) -> Result<Vec<u8>, AudioError> {
        let id = definition.id.to_string();
        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| AudioError::LoadFailed {
            id: id.clone(),
            source,
        };

        let response = match self.client.get(&Self::asset_path(definition), "audio/*") {
            None => return Err(AudioError::NoAsset(id.clone())),
            Some(result) => result.map_err(|e| load_failed(Box::new(e)))?,
        };

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_ASSET_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|e| load_failed(Box::new(e)))?;

        if bytes.is_empty() {
            return Err(AudioError::NoAsset(id));
        }

        tracing::debug!("Downloaded audio for sound {} ({} bytes)", id, bytes.len());
        Ok(bytes)
    }
}

/// Source with no assets; every cue is synthesized
pub struct NoAssets;

impl AssetSource for NoAssets {
    fn fetch(&self, definition: &SoundDefinition) -> Result<Vec<u8>, AudioError> {
        Err(AudioError::NoAsset(definition.id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fallback_definitions;
    use std::time::Duration;

    #[test]
    fn test_asset_path() {
        let definition = &fallback_definitions()[0];
        assert_eq!(
            HttpAssetSource::asset_path(definition),
            format!("/api/admin/sounds/{}/file", definition.id)
        );
    }

    #[test]
    fn test_without_token_nothing_is_fetched() {
        let client = ApiClient::new("http://127.0.0.1:9", None, Duration::from_secs(1));
        let source = HttpAssetSource::new(client);
        let definition = &fallback_definitions()[0];

        assert!(matches!(source.fetch(definition), Err(AudioError::NoAsset(_))));
    }

    #[test]
    fn test_no_assets() {
        let definition = &fallback_definitions()[0];
        assert!(NoAssets.fetch(definition).is_err());
    }
}
