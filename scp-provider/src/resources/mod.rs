//! Resource handlers
//!
//! Each submodule implements [`ResourceHandler`] for one resource type.
//! [`register_all`] is the only place resource types are registered.

pub mod auto_scaling_group;
pub mod auto_scaling_policy;
pub mod direct_connect;
pub mod dns_domain;
pub mod dns_record;
pub mod lb_profile;
pub mod lb_server_group;
pub mod lb_service;
pub mod load_balancer;
pub mod postgresql_cluster;
pub mod resource_group;
pub mod routing_rule;
pub mod subnet;
pub mod vpc;

use scp_client::services::routing::RoutingScope;
use scp_core::provider::{ResourceDescriptor, ResourceHandler};
use scp_core::registry::{Registry, RegistryError};
use scp_core::resource::Value;
use scp_core::schema::{AttributeSchema, AttributeType};

use crate::meta::Meta;

// Lifecycle state sets handed to the waiter
pub(crate) const CREATE_PENDING: &[&str] = &["CREATING"];
pub(crate) const EDIT_PENDING: &[&str] = &["EDITING"];
pub(crate) const DELETE_PENDING: &[&str] = &["DELETING", "TERMINATING"];
pub(crate) const ACTIVE: &[&str] = &["ACTIVE"];
pub(crate) const DELETED: &[&str] = &[scp_core::waiter::DELETED];

pub fn register_all(registry: &Registry<Meta>) -> Result<(), RegistryError> {
    fn add(
        registry: &Registry<Meta>,
        handler: impl ResourceHandler<Meta> + 'static,
    ) -> Result<(), RegistryError> {
        let descriptor = ResourceDescriptor::new(handler);
        let key = descriptor.schema.resource_type.clone();
        registry.register_resource(key, descriptor)
    }

    add(registry, vpc::VpcResource)?;
    add(registry, subnet::SubnetResource)?;
    add(registry, routing_rule::RoutingRuleResource::new(RoutingScope::Vpc))?;
    add(
        registry,
        routing_rule::RoutingRuleResource::new(RoutingScope::TransitGateway),
    )?;
    add(registry, load_balancer::LoadBalancerResource)?;
    add(registry, lb_profile::LbProfileResource)?;
    add(registry, lb_server_group::LbServerGroupResource)?;
    add(registry, lb_service::LbServiceResource)?;
    add(registry, auto_scaling_group::AutoScalingGroupResource)?;
    add(registry, auto_scaling_policy::AutoScalingPolicyResource)?;
    add(registry, dns_domain::DnsDomainResource)?;
    add(registry, dns_record::DnsRecordResource)?;
    add(registry, postgresql_cluster::PostgresqlClusterResource)?;
    add(registry, resource_group::ResourceGroupResource)?;
    add(registry, direct_connect::DirectConnectResource)?;
    Ok(())
}

// =========================================================================
// Attribute schemas shared by several resources
// =========================================================================

pub(crate) fn name_schema() -> AttributeSchema {
    AttributeSchema::new("name", AttributeType::String)
        .required()
        .force_new()
}

pub(crate) fn description_schema() -> AttributeSchema {
    AttributeSchema::new("description", AttributeType::String).with_default(Value::from(""))
}

pub(crate) fn region_schema() -> AttributeSchema {
    AttributeSchema::new("region", AttributeType::String)
        .force_new()
        .with_description("Region name; defaults to the provider region")
}

pub(crate) fn computed(name: &str, attr_type: AttributeType) -> AttributeSchema {
    AttributeSchema::new(name, attr_type).computed()
}

pub(crate) fn enum_type(values: &[&str]) -> AttributeType {
    AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
}
