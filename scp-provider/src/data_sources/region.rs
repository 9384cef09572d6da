//! scp_region - Service zone of a region

use async_trait::async_trait;
use scp_core::context::OperationContext;
use scp_core::provider::{DataSourceHandler, ProviderError, ProviderResult};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::meta::Meta;
use crate::resources::computed;
use crate::utils::{call, normalize_region};

pub const KEY: &str = "scp_region";

pub struct RegionDataSource;

#[async_trait]
impl DataSourceHandler<Meta> for RegionDataSource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Looks up the service zone serving a region")
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .with_description("Region name; defaults to the provider region"),
            )
            .attribute(computed("service_zone_id", AttributeType::String))
            .attribute(computed("service_zone_name", AttributeType::String))
            .attribute(computed("location", AttributeType::String))
            .attribute(computed("is_multi_availability_zone", AttributeType::Bool))
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let region = rd
            .get_str("name")
            .map(String::from)
            .or_else(|| meta.region.clone())
            .ok_or_else(|| {
                ProviderError::validation("name", "no region given and the provider has none")
            })?;
        let region = normalize_region(&region);

        let zone = call(ctx, meta.client.project.find_service_zone(&region))
            .await?
            .ok_or_else(|| {
                ProviderError::validation("name", format!("no service zone found for region {}", region))
                    .for_resource(KEY)
            })?;
        log::debug!("region {} is served by {}", region, zone.service_zone_id);

        rd.set("name", region);
        rd.set("service_zone_name", zone.service_zone_name);
        rd.set("location", zone.service_zone_location);
        rd.set("is_multi_availability_zone", zone.is_multi_availability_zone);
        rd.set("service_zone_id", zone.service_zone_id.clone());
        rd.set_id(zone.service_zone_id);
        Ok(())
    }
}
