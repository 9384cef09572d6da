//! scp_vpc_routing_rule / scp_transit_gateway_routing_rule
//!
//! Both routing-table flavours share one handler parameterised by
//! [`RoutingScope`]. The ID is `<routing_table_id>:<routing_rule_id>`.

use async_trait::async_trait;
use scp_client::services::routing::{CreateRoutingRuleRequest, RoutingRule, RoutingScope};
use scp_client::{ClientResult, ScpClient};
use scp_core::composite_id::CompositeId;
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use scp_core::waiter::wait_for_status;

use super::{ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, computed};
use crate::meta::Meta;
use crate::utils::{call, created_id, deleted_or_gone, found_or_gone};

pub const VPC_KEY: &str = "scp_vpc_routing_rule";
pub const TRANSIT_GATEWAY_KEY: &str = "scp_transit_gateway_routing_rule";

pub struct RoutingRuleResource {
    scope: RoutingScope,
}

impl RoutingRuleResource {
    pub fn new(scope: RoutingScope) -> Self {
        Self { scope }
    }

    fn key(&self) -> &'static str {
        match self.scope {
            RoutingScope::Vpc => VPC_KEY,
            RoutingScope::TransitGateway => TRANSIT_GATEWAY_KEY,
        }
    }
}

async fn probe(
    client: &ScpClient,
    scope: RoutingScope,
    id: &CompositeId,
) -> ClientResult<(RoutingRule, String)> {
    let rule = client.routing.get_rule(scope, &id.parent, &id.child).await?;
    let state = rule.routing_rule_state.clone();
    Ok((rule, state))
}

fn create_request(rd: &ResourceData) -> ProviderResult<CreateRoutingRuleRequest> {
    Ok(CreateRoutingRuleRequest {
        destination_network_cidr: rd.require_str("destination_network_cidr")?.to_string(),
        source_service_interface_id: rd.require_str("source_service_interface_id")?.to_string(),
        source_service_interface_name: rd.get_string("source_service_interface_name"),
        rule_description: rd.get_string("description"),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for RoutingRuleResource {
    fn schema(&self) -> ResourceSchema {
        let owner = match self.scope {
            RoutingScope::Vpc => "VPC",
            RoutingScope::TransitGateway => "transit gateway",
        };
        ResourceSchema::new(self.key())
            .with_description(format!("Static rule in a {} routing table", owner))
            .attribute(
                AttributeSchema::new("routing_table_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("destination_network_cidr", types::cidr())
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("source_service_interface_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("source_service_interface_name", AttributeType::String)
                    .force_new(),
            )
            .attribute(AttributeSchema::new("description", AttributeType::String).force_new())
            .attribute(computed("routing_rule_id", AttributeType::String))
            .attribute(computed("routing_rule_state", AttributeType::String))
            .attribute(computed("editable", AttributeType::Bool))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let table_id = rd.require_str("routing_table_id")?.to_string();
        let request = create_request(rd)?;

        let response = call(
            ctx,
            meta.client.routing.create_rule(self.scope, &table_id, &request),
        )
        .await?;
        let id = created_id(&table_id, &response.resource_id, "routing rule")?;
        log::info!(
            "creating routing rule {} for {}",
            id,
            request.destination_network_cidr
        );

        wait_for_status(ctx, &meta.wait, CREATE_PENDING, ACTIVE, true, || {
            probe(&meta.client, self.scope, &id)
        })
        .await?;

        rd.set_id(id.merge());
        self.read(ctx, rd, meta).await
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;
        let result = ctx
            .run(meta.client.routing.get_rule(self.scope, &id.parent, &id.child))
            .await?;
        let Some(rule) = found_or_gone(rd, self.key(), result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["ruleDescription", "createdDt"])
            .to_attributes(&rule)?;
        rd.set_attributes(attributes);
        rd.set("routing_table_id", id.parent);
        rd.set("description", rule.rule_description);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        // Every argument forces replacement
        self.read(ctx, rd, meta).await
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;
        let result = ctx
            .run(meta.client.routing.delete_rules(
                self.scope,
                &id.parent,
                std::slice::from_ref(&id.child),
            ))
            .await?;
        if deleted_or_gone(result)? {
            wait_for_status(ctx, &meta.wait, DELETE_PENDING, DELETED, false, || {
                probe(&meta.client, self.scope, &id)
            })
            .await?;
        } else {
            log::debug!("routing rule {} already deleted", id);
        }
        rd.set_id("");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_selects_resource_key() {
        assert_eq!(
            RoutingRuleResource::new(RoutingScope::Vpc).schema().resource_type,
            VPC_KEY
        );
        assert_eq!(
            RoutingRuleResource::new(RoutingScope::TransitGateway)
                .schema()
                .resource_type,
            TRANSIT_GATEWAY_KEY
        );
    }

    #[test]
    fn malformed_id_is_a_validation_error() {
        let err = CompositeId::split("RULE-1").unwrap_err();
        assert_eq!(err.attribute.as_deref(), Some("id"));
    }
}
