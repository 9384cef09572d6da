//! Provider block and the Meta container shared by every handler

use scp_client::config::{DEFAULT_ENDPOINT, default_user_agent};
use scp_client::{ClientConfig, ScpClient};
use scp_core::provider::{ProviderError, ProviderResult};
use scp_core::resource::{Attributes, ResourceData, Value};
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use scp_core::waiter::WaitConfig;

pub const PROVIDER_NAME: &str = "scp";

/// Everything a handler needs besides its own attributes
#[derive(Clone)]
pub struct Meta {
    pub client: ScpClient,
    pub wait: WaitConfig,
    /// Region used when a resource omits `region`
    pub region: Option<String>,
}

impl Meta {
    pub fn new(client: ScpClient) -> Self {
        Self {
            client,
            wait: WaitConfig::default(),
            region: None,
        }
    }

    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

pub fn provider_schema() -> ResourceSchema {
    ResourceSchema::new(PROVIDER_NAME)
        .with_description("Samsung Cloud Platform")
        .attribute(
            AttributeSchema::new("endpoint", AttributeType::String)
                .with_default(Value::from(DEFAULT_ENDPOINT))
                .with_description("OpenAPI endpoint"),
        )
        .attribute(
            AttributeSchema::new("access_key", AttributeType::String)
                .required()
                .sensitive(),
        )
        .attribute(
            AttributeSchema::new("secret_key", AttributeType::String)
                .required()
                .sensitive(),
        )
        .attribute(AttributeSchema::new("project_id", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("region", AttributeType::String)
                .with_description("Region used by resources that do not set one"),
        )
        .attribute(
            AttributeSchema::new("user_agent", AttributeType::String)
                .with_default(Value::from(default_user_agent())),
        )
}

/// Build the Meta container from a provider block
pub fn configure(mut config: Attributes) -> ProviderResult<Meta> {
    provider_schema().apply_defaults(&mut config);
    let rd = ResourceData::new(config);

    let mut client_config = ClientConfig::new(
        rd.require_str("access_key")?,
        rd.require_str("secret_key")?,
        rd.require_str("project_id")?,
    );
    if let Some(endpoint) = rd.get_str("endpoint") {
        client_config = client_config.with_endpoint(endpoint);
    }
    if let Some(user_agent) = rd.get_str("user_agent") {
        client_config = client_config.with_user_agent(user_agent);
    }

    let client = ScpClient::new(client_config)
        .map_err(|e| ProviderError::from(e).context("failed to build SCP client"))?;
    let mut meta = Meta::new(client);
    if let Some(region) = rd.get_str("region") {
        meta = meta.with_region(region);
    }
    log::info!(
        "configured SCP provider for project {}",
        meta.client.config().project_id
    );
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scp_core::provider::ErrorKind;
    use std::collections::HashMap;

    fn block(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect::<HashMap<_, _>>()
    }

    #[test]
    fn configure_applies_defaults() {
        let meta = configure(block(&[
            ("access_key", "ak"),
            ("secret_key", "sk"),
            ("project_id", "PROJECT-1"),
        ]))
        .unwrap();
        assert_eq!(meta.client.config().endpoint, DEFAULT_ENDPOINT);
        assert!(meta.client.config().user_agent.starts_with("scp-provider/"));
        assert_eq!(meta.region, None);
    }

    #[test]
    fn configure_reads_region_and_endpoint() {
        let meta = configure(block(&[
            ("access_key", "ak"),
            ("secret_key", "sk"),
            ("project_id", "PROJECT-1"),
            ("endpoint", "http://localhost:9000/"),
            ("region", "KR-WEST"),
        ]))
        .unwrap();
        assert_eq!(meta.client.config().endpoint, "http://localhost:9000");
        assert_eq!(meta.region.as_deref(), Some("KR-WEST"));
    }

    #[test]
    fn missing_credentials_are_reported_by_attribute() {
        let err = configure(block(&[("access_key", "ak"), ("project_id", "p")]))
            .err()
            .unwrap();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.attribute.as_deref(), Some("secret_key"));
    }

    #[test]
    fn keys_are_sensitive() {
        assert_eq!(
            provider_schema().sensitive_attributes(),
            vec!["access_key", "secret_key"]
        );
    }
}
