//! scp_lb_server_group - Backend pool of a load balancer
//!
//! ID is `<load_balancer_id>:<lb_server_group_id>`.

use async_trait::async_trait;
use scp_client::services::load_balancer::{
    CreateLbServerGroupRequest, LB_METHODS, LbHealthCheck, LbServerGroup, LbServerGroupMember,
    UpdateLbServerGroupRequest,
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

pub const KEY: &str = "scp_lb_server_group";

const PROTOCOLS: &[&str] = &["TCP", "UDP", "HTTP", "HTTPS"];

pub struct LbServerGroupResource;

async fn probe(client: &ScpClient, id: &CompositeId) -> ClientResult<(LbServerGroup, String)> {
    let group = client
        .load_balancer
        .get_server_group(&id.parent, &id.child)
        .await?;
    let state = group.lb_server_group_state.clone();
    Ok((group, state))
}

fn member_schema() -> ResourceSchema {
    ResourceSchema::new("member")
        .attribute(AttributeSchema::new("object_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("object_port", types::port_number()).required())
        .attribute(AttributeSchema::new("weight", types::positive_int()))
}

fn health_check_schema() -> ResourceSchema {
    ResourceSchema::new("health_check")
        .attribute(AttributeSchema::new("protocol", enum_type(PROTOCOLS)).required())
        .attribute(AttributeSchema::new("port", types::port_number()).required())
        .attribute(AttributeSchema::new("interval_seconds", types::positive_int()))
        .attribute(AttributeSchema::new("timeout_seconds", types::positive_int()))
}

fn members(rd: &ResourceData) -> Vec<LbServerGroupMember> {
    rd.get_list("members")
        .iter()
        .filter_map(Value::as_map)
        .map(|m| LbServerGroupMember {
            object_id: block_str(m, "object_id"),
            object_port: block_int(m, "object_port").unwrap_or_default(),
            weight: block_int(m, "weight").unwrap_or(1),
        })
        .collect()
}

fn health_check(rd: &ResourceData) -> Option<LbHealthCheck> {
    rd.get_block("health_check").map(|h| LbHealthCheck {
        protocol: block_str(h, "protocol"),
        port: block_int(h, "port").unwrap_or_default(),
        interval_seconds: block_int(h, "interval_seconds").unwrap_or(5),
        timeout_seconds: block_int(h, "timeout_seconds").unwrap_or(5),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for LbServerGroupResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Pool of backend servers behind a load balancer")
            .attribute(
                AttributeSchema::new("load_balancer_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(name_schema())
            .attribute(
                AttributeSchema::new("protocol", enum_type(PROTOCOLS))
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("lb_method", enum_type(LB_METHODS))
                    .with_default(Value::from("ROUND_ROBIN")),
            )
            .attribute(AttributeSchema::new(
                "members",
                AttributeType::Block(Box::new(member_schema())),
            ))
            .attribute(AttributeSchema::new(
                "health_check",
                AttributeType::Block(Box::new(health_check_schema())),
            ))
            .attribute(computed("lb_server_group_state", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let lb_id = rd.require_str("load_balancer_id")?.to_string();
        let request = CreateLbServerGroupRequest {
            lb_server_group_name: rd.require_str("name")?.to_string(),
            lb_method: rd.get_string("lb_method"),
            protocol: rd.require_str("protocol")?.to_string(),
            health_check: health_check(rd),
            lb_server_group_members: members(rd),
        };

        let response = call(
            ctx,
            meta.client.load_balancer.create_server_group(&lb_id, &request),
        )
        .await?;
        let id = created_id(&lb_id, &response.resource_id, "LB server group")?;
        log::info!(
            "creating LB server group {} ({}) with {} members",
            request.lb_server_group_name,
            id,
            request.lb_server_group_members.len()
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
            .run(meta.client.load_balancer.get_server_group(&id.parent, &id.child))
            .await?;
        let Some(group) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["lbServerGroupName", "lbServerGroupMembers"])
            .to_attributes(&group)?;
        let members = to_attribute_rows(&group.lb_server_group_members, &Marshaller::new())?;

        rd.set_attributes(attributes);
        rd.set("load_balancer_id", id.parent);
        rd.set("name", group.lb_server_group_name);
        rd.set("members", rows_value(members));
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;

        if rd.has_changes(&["lb_method", "members", "health_check"]) {
            let request = UpdateLbServerGroupRequest {
                lb_method: rd.get_string("lb_method"),
                health_check: health_check(rd),
                lb_server_group_members: members(rd),
            };
            call(
                ctx,
                meta.client
                    .load_balancer
                    .update_server_group(&id.parent, &id.child, &request),
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
        let result = ctx
            .run(
                meta.client
                    .load_balancer
                    .delete_server_group(&id.parent, &id.child),
            )
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
