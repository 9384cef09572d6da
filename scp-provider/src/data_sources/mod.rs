//! Read-only data sources
//!
//! Most data sources are paged list queries: a [`ListSource`] supplies the
//! query and the generic [`ListDataSource`] handles paging, marshalling and
//! the `filter` block.

pub mod lists;
pub mod region;

use async_trait::async_trait;
use scp_client::{ListResponse, PageRequest};
use scp_core::context::OperationContext;
use scp_core::filter::{Filter, apply_filters, filter_schema};
use scp_core::marshal::{Marshaller, to_attribute_rows};
use scp_core::provider::{DataSourceDescriptor, DataSourceHandler, ProviderError, ProviderResult};
use scp_core::registry::{Registry, RegistryError};
use scp_core::resource::{ResourceData, Value};
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use serde::Serialize;

use crate::meta::Meta;
use crate::utils::rows_value;
use scp_client::services::routing::RoutingScope;

pub const DEFAULT_PAGE: i64 = 0;
pub const DEFAULT_SIZE: i64 = 20;

pub fn register_all(registry: &Registry<Meta>) -> Result<(), RegistryError> {
    fn add(
        registry: &Registry<Meta>,
        handler: impl DataSourceHandler<Meta> + 'static,
    ) -> Result<(), RegistryError> {
        let descriptor = DataSourceDescriptor::new(handler);
        let key = descriptor.schema.resource_type.clone();
        registry.register_data_source(key, descriptor)
    }

    add(registry, region::RegionDataSource)?;
    add(registry, ListDataSource::new(lists::Vpcs))?;
    add(registry, ListDataSource::new(lists::Subnets))?;
    add(registry, ListDataSource::new(lists::RoutingRules(RoutingScope::Vpc)))?;
    add(
        registry,
        ListDataSource::new(lists::RoutingRules(RoutingScope::TransitGateway)),
    )?;
    add(registry, ListDataSource::new(lists::StandardImages))?;
    add(registry, ListDataSource::new(lists::LoadBalancers))?;
    add(registry, ListDataSource::new(lists::AutoScalingGroups))?;
    add(registry, ListDataSource::new(lists::DnsDomains))?;
    add(registry, ListDataSource::new(lists::DnsRecords))?;
    add(registry, ListDataSource::new(lists::ResourceGroups))?;
    Ok(())
}

/// One paged list endpoint exposed as a data source
#[async_trait]
pub trait ListSource: Send + Sync {
    type Row: Serialize + Send + Sync;

    /// Data source key, e.g. `scp_vpcs`
    fn key(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Service-specific query arguments
    fn arguments(&self) -> Vec<AttributeSchema> {
        Vec::new()
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<Self::Row>>;
}

pub struct ListDataSource<S> {
    source: S,
}

impl<S: ListSource> ListDataSource<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

fn page_request(rd: &ResourceData) -> ProviderResult<PageRequest> {
    let number = |key: &str, default: i64| {
        let value = rd.get_int(key).unwrap_or(default);
        u32::try_from(value)
            .map_err(|_| ProviderError::validation(key, format!("{} is out of range", value)))
    };
    Ok(PageRequest::new(
        number("page", DEFAULT_PAGE)?,
        number("size", DEFAULT_SIZE)?,
    ))
}

#[async_trait]
impl<S: ListSource> DataSourceHandler<Meta> for ListDataSource<S> {
    fn schema(&self) -> ResourceSchema {
        let row = ResourceSchema::new(format!("{}_row", self.source.key()));
        let schema = ResourceSchema::new(self.source.key())
            .with_description(self.source.description())
            .attribute(
                AttributeSchema::new("page", types::non_negative_int())
                    .with_default(Value::Int(DEFAULT_PAGE)),
            )
            .attribute(
                AttributeSchema::new("size", types::positive_int())
                    .with_default(Value::Int(DEFAULT_SIZE)),
            )
            .attribute(filter_schema())
            .attribute(
                AttributeSchema::new("contents", AttributeType::Block(Box::new(row))).computed(),
            )
            .attribute(AttributeSchema::new("total_count", AttributeType::Int).computed());
        self.source
            .arguments()
            .into_iter()
            .fold(schema, ResourceSchema::attribute)
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let page = page_request(rd)?;
        let filters = Filter::from_resource_data(rd);

        let list = self.source.list(ctx, rd, meta, page).await?;
        let rows = to_attribute_rows(&list.contents, &Marshaller::new())?;
        let fetched = rows.len();
        let rows = apply_filters(&filters, rows)?;
        log::debug!(
            "{}: {} of {} rows kept by {} filters (server total {})",
            self.source.key(),
            rows.len(),
            fetched,
            filters.len(),
            list.total_count
        );

        rd.set("total_count", rows.len() as i64);
        rd.set("contents", rows_value(rows));
        rd.set_id(uuid::Uuid::new_v4().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scp_core::resource::Attributes;

    #[test]
    fn every_data_source_registers_once() {
        let registry = Registry::new();
        register_all(&registry).unwrap();
        let snapshot = registry.snapshot();
        let mut keys: Vec<&str> = snapshot.data_sources.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "scp_auto_scaling_groups",
                "scp_dns_domains",
                "scp_dns_records",
                "scp_load_balancers",
                "scp_region",
                "scp_resource_groups",
                "scp_standard_images",
                "scp_subnets",
                "scp_transit_gateway_routing_rules",
                "scp_vpc_routing_rules",
                "scp_vpcs",
            ]
        );
    }

    #[test]
    fn page_defaults_apply() {
        let rd = ResourceData::new(Attributes::new());
        assert_eq!(page_request(&rd).unwrap(), PageRequest::new(0, 20));
    }

    #[test]
    fn negative_page_is_rejected() {
        let mut config = Attributes::new();
        config.insert("page".to_string(), Value::Int(-1));
        let err = page_request(&ResourceData::new(config)).unwrap_err();
        assert_eq!(err.attribute.as_deref(), Some("page"));
    }

    #[test]
    fn list_schema_carries_paging_and_filter() {
        let schema = ListDataSource::new(lists::Vpcs).schema();
        for key in ["page", "size", "filter", "contents", "total_count", "name"] {
            assert!(schema.attributes.contains_key(key), "missing {}", key);
        }
    }
}
