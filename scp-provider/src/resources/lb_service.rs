//! scp_lb_service - Listener of a load balancer
//!
//! ID is `<load_balancer_id>:<lb_service_id>`. Forwarding rules reference
//! server groups, so they are detached before the service is deleted.

use async_trait::async_trait;
use scp_client::services::load_balancer::{
    CreateLbServiceRequest, LAYER_TYPES, LbService, LbServiceRule, UpdateLbServiceRequest,
};
use scp_client::{ClientResult, ScpClient};
use scp_core::composite_id::CompositeId;
use scp_core::context::OperationContext;
use scp_core::marshal::{Marshaller, to_attribute_rows};
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::{ResourceData, Value};
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use scp_core::waiter::wait_for_status;

use super::{
    ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, EDIT_PENDING, computed, enum_type,
    name_schema,
};
use crate::meta::Meta;
use crate::utils::{
    block_int, block_str, call, created_id, deleted_or_gone, found_or_gone, rows_value,
};

pub const KEY: &str = "scp_lb_service";

pub struct LbServiceResource;

async fn probe(client: &ScpClient, id: &CompositeId) -> ClientResult<(LbService, String)> {
    let service = client
        .load_balancer
        .get_service(&id.parent, &id.child)
        .await?;
    let state = service.lb_service_state.clone();
    Ok((service, state))
}

fn rule_schema() -> ResourceSchema {
    ResourceSchema::new("rule")
        .attribute(AttributeSchema::new("lb_server_group_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("pattern_url", AttributeType::String))
        .attribute(AttributeSchema::new("seq", types::non_negative_int()))
}

/// Rules in configuration order; `seq` defaults to the position
fn rules(rd: &ResourceData) -> Vec<LbServiceRule> {
    rd.get_list("rules")
        .iter()
        .filter_map(Value::as_map)
        .enumerate()
        .map(|(i, r)| LbServiceRule {
            lb_server_group_id: block_str(r, "lb_server_group_id"),
            pattern_url: block_str(r, "pattern_url"),
            seq: block_int(r, "seq").unwrap_or(i as i64 + 1),
        })
        .collect()
}

fn update_request(rd: &ResourceData, rules: Vec<LbServiceRule>) -> UpdateLbServiceRequest {
    UpdateLbServiceRequest {
        service_port: rd.get_int("service_port").unwrap_or_default(),
        application_profile_id: rd.get_string("application_profile_id"),
        lb_service_rules: rules,
    }
}

#[async_trait]
impl ResourceHandler<Meta> for LbServiceResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Listener forwarding traffic to server groups")
            .attribute(
                AttributeSchema::new("load_balancer_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(name_schema())
            .attribute(
                AttributeSchema::new("layer_type", enum_type(LAYER_TYPES))
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("protocol", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("service_port", types::port_number()).required())
            .attribute(
                AttributeSchema::new("service_ip_address", AttributeType::String)
                    .force_new()
                    .with_description("Virtual IP; assigned by the platform when omitted"),
            )
            .attribute(AttributeSchema::new(
                "application_profile_id",
                AttributeType::String,
            ))
            .attribute(AttributeSchema::new(
                "rules",
                AttributeType::Block(Box::new(rule_schema())),
            ))
            .attribute(computed("lb_service_state", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let lb_id = rd.require_str("load_balancer_id")?.to_string();
        let request = CreateLbServiceRequest {
            lb_service_name: rd.require_str("name")?.to_string(),
            layer_type: rd.require_str("layer_type")?.to_string(),
            protocol: rd.require_str("protocol")?.to_string(),
            service_port: rd.require_int("service_port")?,
            service_ip_address: rd.get_string("service_ip_address"),
            application_profile_id: rd.get_string("application_profile_id"),
            lb_service_rules: rules(rd),
        };

        let response = call(ctx, meta.client.load_balancer.create_service(&lb_id, &request)).await?;
        let id = created_id(&lb_id, &response.resource_id, "LB service")?;
        log::info!(
            "creating LB service {} ({}) on port {}",
            request.lb_service_name,
            id,
            request.service_port
        );

        wait_for_status(ctx, &meta.wait, CREATE_PENDING, ACTIVE, true, || {
            probe(&meta.client, &id)
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
            .run(meta.client.load_balancer.get_service(&id.parent, &id.child))
            .await?;
        let Some(service) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["lbServiceName", "lbServiceRules"])
            .to_attributes(&service)?;
        let rules = to_attribute_rows(&service.lb_service_rules, &Marshaller::new())?;

        rd.set_attributes(attributes);
        rd.set("load_balancer_id", id.parent);
        rd.set("name", service.lb_service_name);
        rd.set("rules", rows_value(rules));
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;

        if rd.has_changes(&["service_port", "application_profile_id", "rules"]) {
            let request = update_request(rd, rules(rd));
            call(
                ctx,
                meta.client
                    .load_balancer
                    .update_service(&id.parent, &id.child, &request),
            )
            .await?;
            wait_for_status(ctx, &meta.wait, EDIT_PENDING, ACTIVE, true, || {
                probe(&meta.client, &id)
            })
            .await?;
        }

        self.read(ctx, rd, meta).await
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;

        // TODO: drop once the control plane deletes services that still hold rules
        if !rd.get_list("rules").is_empty() {
            log::debug!("detaching rules of LB service {}", id);
            let request = update_request(rd, Vec::new());
            let result = ctx
                .run(
                    meta.client
                        .load_balancer
                        .update_service(&id.parent, &id.child, &request),
                )
                .await?;
            if !deleted_or_gone(result)? {
                rd.set_id("");
                return Ok(());
            }
            wait_for_status(ctx, &meta.wait, EDIT_PENDING, ACTIVE, true, || {
                probe(&meta.client, &id)
            })
            .await?;
        }

        let result = ctx
            .run(meta.client.load_balancer.delete_service(&id.parent, &id.child))
            .await?;
        if deleted_or_gone(result)? {
            wait_for_status(ctx, &meta.wait, DELETE_PENDING, DELETED, false, || {
                probe(&meta.client, &id)
            })
            .await?;
        }
        rd.set_id("");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scp_core::resource::Attributes;
    use std::collections::HashMap;

    #[test]
    fn rule_sequence_defaults_to_position() {
        let rule = |group: &str, seq: Option<i64>| {
            let mut m = HashMap::new();
            m.insert("lb_server_group_id".to_string(), Value::from(group));
            if let Some(seq) = seq {
                m.insert("seq".to_string(), Value::Int(seq));
            }
            Value::Map(m)
        };
        let mut config = Attributes::new();
        config.insert(
            "rules".to_string(),
            Value::List(vec![rule("SG-1", None), rule("SG-2", Some(7)), rule("SG-3", None)]),
        );
        let rd = ResourceData::new(config);

        let seqs: Vec<i64> = rules(&rd).iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 7, 3]);
    }

    #[test]
    fn blanking_request_keeps_port_and_profile() {
        let mut config = Attributes::new();
        config.insert("service_port".to_string(), Value::Int(443));
        config.insert("application_profile_id".to_string(), Value::from("PROF-1"));
        let rd = ResourceData::new(config);

        let request = update_request(&rd, Vec::new());
        assert_eq!(request.service_port, 443);
        assert_eq!(request.application_profile_id, "PROF-1");
        assert!(request.lb_service_rules.is_empty());
    }
}
