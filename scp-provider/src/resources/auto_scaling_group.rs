//! scp_auto_scaling_group

use async_trait::async_trait;
use scp_client::services::auto_scaling::{
    AutoScalingGroup, CreateAutoScalingGroupRequest, STATE_IN_SERVICE, STATE_TERMINATING,
    ServerCountRequest,
};
use scp_client::{ClientResult, ScpClient};
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderError, ProviderResult, ResourceHandler};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use scp_core::waiter::wait_for_status;

use super::{CREATE_PENDING, DELETED, computed, name_schema, region_schema};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{
    call, deleted_or_gone, ensure_unique, found_or_gone, region_of, resolve_service_zone,
};

pub const KEY: &str = "scp_auto_scaling_group";

const IN_SERVICE: &[&str] = &[STATE_IN_SERVICE];
const SCALING: &[&str] = &["EDITING", "SCALE OUT", "SCALE IN"];
const TERMINATING: &[&str] = &[STATE_TERMINATING];

pub struct AutoScalingGroupResource;

async fn probe(client: &ScpClient, id: &str) -> ClientResult<(AutoScalingGroup, String)> {
    let asg = client.auto_scaling.get(id).await?;
    let state = asg.asg_state.clone();
    Ok((asg, state))
}

/// Server counts with `min <= desired <= max` checked
fn server_count(rd: &ResourceData) -> ProviderResult<ServerCountRequest> {
    let counts = ServerCountRequest {
        desired_server_count: rd.require_int("desired_server_count")?,
        min_server_count: rd.require_int("min_server_count")?,
        max_server_count: rd.require_int("max_server_count")?,
    };
    if counts.min_server_count > counts.desired_server_count {
        return Err(ProviderError::validation(
            "min_server_count",
            format!(
                "min_server_count ({}) must not be greater than desired_server_count ({})",
                counts.min_server_count, counts.desired_server_count
            ),
        ));
    }
    if counts.desired_server_count > counts.max_server_count {
        return Err(ProviderError::validation(
            "max_server_count",
            format!(
                "desired_server_count ({}) must not be greater than max_server_count ({})",
                counts.desired_server_count, counts.max_server_count
            ),
        ));
    }
    Ok(counts)
}

fn create_request(
    rd: &ResourceData,
    counts: ServerCountRequest,
    service_zone_id: String,
) -> ProviderResult<CreateAutoScalingGroupRequest> {
    Ok(CreateAutoScalingGroupRequest {
        asg_name: rd.require_str("name")?.to_string(),
        image_id: rd.require_str("image_id")?.to_string(),
        server_type: rd.require_str("server_type")?.to_string(),
        vpc_id: rd.require_str("vpc_id")?.to_string(),
        subnet_ids: rd.get_string_list("subnet_ids"),
        security_group_ids: rd.get_string_list("security_group_ids"),
        lb_server_group_ids: rd.get_string_list("lb_server_group_ids"),
        desired_server_count: counts.desired_server_count,
        min_server_count: counts.min_server_count,
        max_server_count: counts.max_server_count,
        service_zone_id,
        tags: configured_tags(rd),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for AutoScalingGroupResource {
    fn schema(&self) -> ResourceSchema {
        let forced = |name: &str| {
            AttributeSchema::new(name, AttributeType::String)
                .required()
                .force_new()
        };
        ResourceSchema::new(KEY)
            .with_description("Group of identical servers scaled by policy")
            .attribute(name_schema())
            .attribute(forced("image_id"))
            .attribute(forced("server_type"))
            .attribute(forced("vpc_id"))
            .attribute(
                AttributeSchema::new("subnet_ids", types::string_list())
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("security_group_ids", types::string_list()).force_new())
            .attribute(AttributeSchema::new("lb_server_group_ids", types::string_list()).force_new())
            .attribute(
                AttributeSchema::new("desired_server_count", types::non_negative_int()).required(),
            )
            .attribute(AttributeSchema::new("min_server_count", types::non_negative_int()).required())
            .attribute(AttributeSchema::new("max_server_count", types::non_negative_int()).required())
            .attribute(region_schema())
            .attribute(tags_schema())
            .attribute(computed("asg_state", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let counts = server_count(rd)?;
        let service_zone_id = resolve_service_zone(ctx, rd, meta).await?;
        let request = create_request(rd, counts, service_zone_id)?;

        let duplicated = call(
            ctx,
            meta.client.auto_scaling.is_name_duplicated(&request.asg_name),
        )
        .await?;
        ensure_unique(duplicated, "auto-scaling group name", &request.asg_name)?;

        let response = call(ctx, meta.client.auto_scaling.create(&request)).await?;
        let id = response.resource_id;
        log::info!("creating auto-scaling group {} ({})", request.asg_name, id);

        wait_for_status(ctx, &meta.wait, CREATE_PENDING, IN_SERVICE, true, || {
            probe(&meta.client, &id)
        })
        .await?;

        rd.set_id(&id);
        self.read(ctx, rd, meta).await
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let result = ctx.run(meta.client.auto_scaling.get(rd.id())).await?;
        let Some(asg) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["asgName"])
            .to_attributes(&asg)?;
        rd.set_attributes(attributes);
        rd.set("name", asg.asg_name);
        rd.set("region", region_of(ctx, meta, &asg.service_zone_id).await);

        set_tags(ctx, rd, meta, &asg.asg_id).await
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let counts = server_count(rd)?;
        let id = rd.id().to_string();

        if rd.has_changes(&[
            "desired_server_count",
            "min_server_count",
            "max_server_count",
        ]) {
            log::info!(
                "resizing auto-scaling group {} to {}/{}/{}",
                id,
                counts.min_server_count,
                counts.desired_server_count,
                counts.max_server_count
            );
            call(ctx, meta.client.auto_scaling.update_server_count(&id, &counts)).await?;
            wait_for_status(ctx, &meta.wait, SCALING, IN_SERVICE, true, || {
                probe(&meta.client, &id)
            })
            .await?;
        }
        update_tags(ctx, rd, meta, &id).await?;

        self.read(ctx, rd, meta).await
    }

    async fn delete(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = rd.id().to_string();
        let result = ctx.run(meta.client.auto_scaling.delete(&id)).await?;
        if deleted_or_gone(result)? {
            wait_for_status(ctx, &meta.wait, TERMINATING, DELETED, false, || {
                probe(&meta.client, &id)
            })
            .await?;
        }
        rd.set_id("");
        Ok(())
    }
}
