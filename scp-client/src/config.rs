//! Client configuration

use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://openapi.samsungsdscloud.com";

/// Credentials and connection settings for the control plane
#[derive(Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub project_id: String,
    pub user_agent: String,
    /// Upper bound for a single HTTP exchange
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            project_id: project_id.into(),
            user_agent: default_user_agent(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

pub fn default_user_agent() -> String {
    format!("scp-provider/{}", env!("CARGO_PKG_VERSION"))
}

// Keys stay out of logs and panic messages
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_keys() {
        let config = ClientConfig::new("AK-123", "SK-456", "PROJECT-1");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("AK-123"));
        assert!(!rendered.contains("SK-456"));
        assert!(rendered.contains("PROJECT-1"));
    }

    #[test]
    fn endpoint_loses_trailing_slash() {
        let config = ClientConfig::new("a", "s", "p").with_endpoint("http://localhost:8080/");
        assert_eq!(config.endpoint, "http://localhost:8080");
    }
}
