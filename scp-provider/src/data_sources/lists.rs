//! List queries behind the paged data sources

use async_trait::async_trait;
use scp_client::services::auto_scaling::{AutoScalingGroup, AutoScalingGroupListQuery};
use scp_client::services::dns::{DnsDomain, DnsRecord, DnsRecordListQuery, RECORD_TYPES};
use scp_client::services::image::{StandardImage, StandardImageQuery};
use scp_client::services::load_balancer::{LoadBalancer, LoadBalancerListQuery};
use scp_client::services::resource_group::ResourceGroup;
use scp_client::services::routing::{RoutingRule, RoutingScope};
use scp_client::services::subnet::{SUBNET_TYPES, Subnet, SubnetListQuery};
use scp_client::services::vpc::{Vpc, VpcListQuery};
use scp_client::{ListResponse, PageRequest};
use scp_core::context::OperationContext;
use scp_core::provider::ProviderResult;
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType};

use super::ListSource;
use crate::meta::Meta;
use crate::resources::enum_type;
use crate::utils::{call, resolve_service_zone};

fn optional(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String)
}

fn required(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String).required()
}

fn opt(rd: &ResourceData, key: &str) -> Option<String> {
    rd.get_str(key).map(String::from)
}

pub struct Vpcs;

#[async_trait]
impl ListSource for Vpcs {
    type Row = Vpc;

    fn key(&self) -> &'static str {
        "scp_vpcs"
    }

    fn description(&self) -> &'static str {
        "VPCs of the project"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![optional("name"), optional("state"), optional("service_zone_id")]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<Vpc>> {
        let query = VpcListQuery {
            vpc_name: opt(rd, "name"),
            vpc_state: opt(rd, "state"),
            service_zone_id: opt(rd, "service_zone_id"),
        };
        call(ctx, meta.client.vpc.list(&query, page)).await
    }
}

pub struct Subnets;

#[async_trait]
impl ListSource for Subnets {
    type Row = Subnet;

    fn key(&self) -> &'static str {
        "scp_subnets"
    }

    fn description(&self) -> &'static str {
        "Subnets, optionally restricted to one VPC"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![
            optional("vpc_id"),
            optional("name"),
            AttributeSchema::new("type", enum_type(SUBNET_TYPES)),
        ]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<Subnet>> {
        let query = SubnetListQuery {
            vpc_id: opt(rd, "vpc_id"),
            subnet_name: opt(rd, "name"),
            subnet_type: opt(rd, "type"),
        };
        call(ctx, meta.client.subnet.list(&query, page)).await
    }
}

/// Rules of one VPC or transit-gateway routing table
pub struct RoutingRules(pub RoutingScope);

#[async_trait]
impl ListSource for RoutingRules {
    type Row = RoutingRule;

    fn key(&self) -> &'static str {
        match self.0 {
            RoutingScope::Vpc => "scp_vpc_routing_rules",
            RoutingScope::TransitGateway => "scp_transit_gateway_routing_rules",
        }
    }

    fn description(&self) -> &'static str {
        "Rules of a routing table"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![required("routing_table_id")]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<RoutingRule>> {
        let table_id = rd.require_str("routing_table_id")?;
        call(
            ctx,
            meta.client.routing.list_rules(self.0, table_id, None, page),
        )
        .await
    }
}

pub struct StandardImages;

#[async_trait]
impl ListSource for StandardImages {
    type Row = StandardImage;

    fn key(&self) -> &'static str {
        "scp_standard_images"
    }

    fn description(&self) -> &'static str {
        "Standard OS images offered in a region"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![
            optional("service_group").with_description("e.g. COMPUTE, DATABASE"),
            optional("service").with_description("e.g. Virtual Server, PostgreSQL"),
            optional("region"),
        ]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<StandardImage>> {
        let service_zone_id = resolve_service_zone(ctx, rd, meta).await?;
        let query = StandardImageQuery {
            service_group: opt(rd, "service_group"),
            service: opt(rd, "service"),
            service_zone_id: Some(service_zone_id),
        };
        call(ctx, meta.client.image.list_standard_images(&query, page)).await
    }
}

pub struct LoadBalancers;

#[async_trait]
impl ListSource for LoadBalancers {
    type Row = LoadBalancer;

    fn key(&self) -> &'static str {
        "scp_load_balancers"
    }

    fn description(&self) -> &'static str {
        "Load balancers of the project"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![optional("name"), optional("vpc_id")]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<LoadBalancer>> {
        let query = LoadBalancerListQuery {
            load_balancer_name: opt(rd, "name"),
            vpc_id: opt(rd, "vpc_id"),
        };
        call(ctx, meta.client.load_balancer.list(&query, page)).await
    }
}

pub struct AutoScalingGroups;

#[async_trait]
impl ListSource for AutoScalingGroups {
    type Row = AutoScalingGroup;

    fn key(&self) -> &'static str {
        "scp_auto_scaling_groups"
    }

    fn description(&self) -> &'static str {
        "Auto-scaling groups of the project"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![optional("name"), optional("vpc_id")]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<AutoScalingGroup>> {
        let query = AutoScalingGroupListQuery {
            asg_name: opt(rd, "name"),
            vpc_id: opt(rd, "vpc_id"),
        };
        call(ctx, meta.client.auto_scaling.list(&query, page)).await
    }
}

pub struct DnsDomains;

#[async_trait]
impl ListSource for DnsDomains {
    type Row = DnsDomain;

    fn key(&self) -> &'static str {
        "scp_dns_domains"
    }

    fn description(&self) -> &'static str {
        "Private DNS domains of the project"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![optional("name")]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<DnsDomain>> {
        call(ctx, meta.client.dns.list_domains(rd.get_str("name"), page)).await
    }
}

/// Records keep the order the server returns them in
pub struct DnsRecords;

#[async_trait]
impl ListSource for DnsRecords {
    type Row = DnsRecord;

    fn key(&self) -> &'static str {
        "scp_dns_records"
    }

    fn description(&self) -> &'static str {
        "Records of one DNS domain"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![
            required("dns_domain_id"),
            optional("name"),
            AttributeSchema::new("type", enum_type(RECORD_TYPES)),
        ]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<DnsRecord>> {
        let domain_id = rd.require_str("dns_domain_id")?;
        let query = DnsRecordListQuery {
            dns_record_name: opt(rd, "name"),
            dns_record_type: opt(rd, "type"),
        };
        call(ctx, meta.client.dns.list_records(domain_id, &query, page)).await
    }
}

pub struct ResourceGroups;

#[async_trait]
impl ListSource for ResourceGroups {
    type Row = ResourceGroup;

    fn key(&self) -> &'static str {
        "scp_resource_groups"
    }

    fn description(&self) -> &'static str {
        "Resource groups of the project"
    }

    fn arguments(&self) -> Vec<AttributeSchema> {
        vec![optional("name")]
    }

    async fn list(
        &self,
        ctx: &OperationContext,
        rd: &ResourceData,
        meta: &Meta,
        page: PageRequest,
    ) -> ProviderResult<ListResponse<ResourceGroup>> {
        call(ctx, meta.client.resource_group.list(rd.get_str("name"), page)).await
    }
}
