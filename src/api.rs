/// Bearer-authenticated HTTP access to the GemPlay API
///
/// Shared by the catalog loader and the audio asset source.

use std::time::Duration;

use crate::config::EngineConfig;

#[derive(Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let user_agent = format!("gemplay-sounds/{}", env!("CARGO_PKG_VERSION"));
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build();

        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.api_base_url.clone(),
            config.auth_token.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` with the bearer token attached.
    ///
    /// Returns `None` when no token is configured; the request is not sent.
    pub fn get(&self, path: &str, accept: &str) -> Option<Result<ureq::Response, ureq::Error>> {
        let token = self.token.as_deref()?;
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        Some(
            self.agent
                .get(&url)
                .set("Authorization", &format!("Bearer {}", token))
                .set("Accept", accept)
                .call(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("https://api.gemplay.test/", None, Duration::from_secs(1));
        assert_eq!(
            client.url("/api/admin/sounds"),
            "https://api.gemplay.test/api/admin/sounds"
        );
        assert_eq!(
            client.url("api/admin/sounds/4/file"),
            "https://api.gemplay.test/api/admin/sounds/4/file"
        );
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let client = ApiClient::new("http://localhost", Some("  ".to_string()), Duration::from_secs(1));
        assert!(!client.has_token());
        assert!(client.get("/api/admin/sounds", "application/json").is_none());
    }
}
