//! scp_direct_connect - Dedicated line into a service zone

use async_trait::async_trait;
use scp_client::services::direct_connect::{
    BANDWIDTHS_GBPS, CreateDirectConnectRequest, DirectConnect,
};
use scp_client::{ClientResult, ScpClient};
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderError, ProviderResult, ResourceHandler};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use scp_core::waiter::wait_for_status;

use super::{
    ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, EDIT_PENDING, computed, description_schema,
    name_schema, region_schema,
};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{call, deleted_or_gone, found_or_gone, region_of, resolve_service_zone};

pub const KEY: &str = "scp_direct_connect";

pub struct DirectConnectResource;

async fn probe(client: &ScpClient, id: &str) -> ClientResult<(DirectConnect, String)> {
    let dc = client.direct_connect.get(id).await?;
    let state = dc.direct_connect_state.clone();
    Ok((dc, state))
}

fn bandwidth(rd: &ResourceData) -> ProviderResult<i64> {
    let gbps = rd.require_int("bandwidth_gbps")?;
    if BANDWIDTHS_GBPS.contains(&gbps) {
        Ok(gbps)
    } else {
        Err(ProviderError::validation(
            "bandwidth_gbps",
            format!("bandwidth must be one of {:?} Gbps, got {}", BANDWIDTHS_GBPS, gbps),
        ))
    }
}

#[async_trait]
impl ResourceHandler<Meta> for DirectConnectResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Dedicated connection between an on-premise network and SCP")
            .attribute(name_schema())
            .attribute(
                AttributeSchema::new("bandwidth_gbps", AttributeType::Int)
                    .required()
                    .force_new(),
            )
            .attribute(description_schema())
            .attribute(region_schema())
            .attribute(tags_schema())
            .attribute(computed("direct_connect_state", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let bandwidth_gbps = bandwidth(rd)?;
        let service_zone_id = resolve_service_zone(ctx, rd, meta).await?;
        let request = CreateDirectConnectRequest {
            direct_connect_name: rd.require_str("name")?.to_string(),
            direct_connect_description: rd.get_string("description"),
            bandwidth_gbps,
            service_zone_id,
            tags: configured_tags(rd),
        };

        let response = call(ctx, meta.client.direct_connect.create(&request)).await?;
        let id = response.resource_id;
        log::info!(
            "creating direct connect {} ({}) at {} Gbps",
            request.direct_connect_name,
            id,
            bandwidth_gbps
        );

        wait_for_status(ctx, &meta.wait, CREATE_PENDING, ACTIVE, true, || {
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
        let result = ctx.run(meta.client.direct_connect.get(rd.id())).await?;
        let Some(dc) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["directConnectName", "directConnectDescription"])
            .to_attributes(&dc)?;
        rd.set_attributes(attributes);
        rd.set("name", dc.direct_connect_name);
        rd.set("description", dc.direct_connect_description);
        rd.set("region", region_of(ctx, meta, &dc.service_zone_id).await);

        set_tags(ctx, rd, meta, &dc.direct_connect_id).await
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = rd.id().to_string();

        if rd.has_change("description") {
            let description = rd.get_string("description");
            call(
                ctx,
                meta.client.direct_connect.update_description(&id, &description),
            )
            .await?;
            wait_for_status(ctx, &meta.wait, EDIT_PENDING, ACTIVE, true, || {
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
        let result = ctx.run(meta.client.direct_connect.delete(&id)).await?;
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
