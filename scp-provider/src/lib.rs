//! SCP Provider
//!
//! Resource and data-source handlers for Samsung Cloud Platform, assembled
//! into a [`ProviderDescriptor`] by [`provider`].

pub mod data_sources;
pub mod meta;
pub mod resources;
pub mod tags;
pub mod utils;

use std::sync::Arc;

use scp_core::provider::{ProviderDescriptor, ProviderResult};
use scp_core::registry::Registry;

pub use meta::{Meta, PROVIDER_NAME};

/// Register every handler and seal the result
pub fn provider() -> ProviderResult<ProviderDescriptor<Meta>> {
    let registry = Registry::new();
    resources::register_all(&registry)?;
    data_sources::register_all(&registry)?;
    let snapshot = registry.snapshot();
    log::debug!(
        "{} provider: {} resources, {} data sources",
        PROVIDER_NAME,
        snapshot.resources.len(),
        snapshot.data_sources.len()
    );

    Ok(ProviderDescriptor {
        schema: meta::provider_schema(),
        resources: snapshot.resources,
        data_sources: snapshot.data_sources,
        configure: Arc::new(|config| Box::pin(async move { meta::configure(config) })),
    })
}
