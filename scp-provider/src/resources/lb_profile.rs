//! scp_lb_profile - Application profile of a load balancer
//!
//! ID is `<load_balancer_id>:<lb_profile_id>`.

use async_trait::async_trait;
use scp_client::services::load_balancer::{
    CreateLbProfileRequest, LAYER_TYPES, LbProfile, UpdateLbProfileRequest,
};
use scp_client::{ClientResult, ScpClient};
use scp_core::composite_id::CompositeId;
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::{ResourceData, Value};
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use scp_core::waiter::wait_for_status;

use super::{
    ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, EDIT_PENDING, computed, enum_type,
    name_schema,
};
use crate::meta::Meta;
use crate::utils::{call, created_id, deleted_or_gone, found_or_gone};

pub const KEY: &str = "scp_lb_profile";

pub struct LbProfileResource;

async fn probe(client: &ScpClient, id: &CompositeId) -> ClientResult<(LbProfile, String)> {
    let profile = client
        .load_balancer
        .get_profile(&id.parent, &id.child)
        .await?;
    let state = profile.lb_profile_state.clone();
    Ok((profile, state))
}

fn session_idle_timeout(rd: &ResourceData) -> i64 {
    rd.get_int("session_idle_timeout").unwrap_or(60)
}

#[async_trait]
impl ResourceHandler<Meta> for LbProfileResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Session and redirect settings shared by load balancer services")
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
                AttributeSchema::new("session_idle_timeout", types::positive_int())
                    .with_default(Value::Int(60))
                    .with_description("Idle session timeout in seconds"),
            )
            .attribute(AttributeSchema::new("redirect_type", AttributeType::String))
            .attribute(computed("lb_profile_state", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let lb_id = rd.require_str("load_balancer_id")?.to_string();
        let request = CreateLbProfileRequest {
            lb_profile_name: rd.require_str("name")?.to_string(),
            layer_type: rd.require_str("layer_type")?.to_string(),
            session_idle_timeout: session_idle_timeout(rd),
            redirect_type: rd.get_string("redirect_type"),
        };

        let response = call(ctx, meta.client.load_balancer.create_profile(&lb_id, &request)).await?;
        let id = created_id(&lb_id, &response.resource_id, "LB profile")?;
        log::info!("creating LB profile {} ({})", request.lb_profile_name, id);

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
            .run(meta.client.load_balancer.get_profile(&id.parent, &id.child))
            .await?;
        let Some(profile) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["lbProfileName"])
            .to_attributes(&profile)?;
        rd.set_attributes(attributes);
        rd.set("load_balancer_id", id.parent);
        rd.set("name", profile.lb_profile_name);
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;

        if rd.has_changes(&["session_idle_timeout", "redirect_type"]) {
            let request = UpdateLbProfileRequest {
                session_idle_timeout: session_idle_timeout(rd),
                redirect_type: rd.get_string("redirect_type"),
            };
            call(
                ctx,
                meta.client
                    .load_balancer
                    .update_profile(&id.parent, &id.child, &request),
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
            .run(meta.client.load_balancer.delete_profile(&id.parent, &id.child))
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
