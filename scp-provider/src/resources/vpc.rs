//! scp_vpc - Virtual private cloud

use async_trait::async_trait;
use scp_client::ScpClient;
use scp_client::services::vpc::{CreateVpcRequest, Vpc};
use scp_client::ClientResult;
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeType, ResourceSchema};
use scp_core::waiter::wait_for_status;

use super::{
    ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, EDIT_PENDING, computed, description_schema,
    name_schema, region_schema,
};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{
    call, deleted_or_gone, ensure_unique, found_or_gone, region_of, resolve_service_zone,
};

pub const KEY: &str = "scp_vpc";

pub struct VpcResource;

async fn probe(client: &ScpClient, id: &str) -> ClientResult<(Vpc, String)> {
    let vpc = client.vpc.get(id).await?;
    let state = vpc.vpc_state.clone();
    Ok((vpc, state))
}

fn create_request(rd: &ResourceData, service_zone_id: String) -> ProviderResult<CreateVpcRequest> {
    Ok(CreateVpcRequest {
        vpc_name: rd.require_str("name")?.to_string(),
        vpc_description: rd.get_string("description"),
        service_zone_id,
        tags: configured_tags(rd),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for VpcResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Isolated virtual network")
            .attribute(name_schema())
            .attribute(description_schema())
            .attribute(region_schema())
            .attribute(tags_schema())
            .attribute(computed("vpc_state", AttributeType::String))
            .attribute(computed("service_zone_id", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let service_zone_id = resolve_service_zone(ctx, rd, meta).await?;
        let request = create_request(rd, service_zone_id)?;

        let duplicated = call(ctx, meta.client.vpc.is_name_duplicated(&request.vpc_name)).await?;
        ensure_unique(duplicated, "VPC name", &request.vpc_name)?;

        let response = call(ctx, meta.client.vpc.create(&request)).await?;
        let id = response.resource_id;
        log::info!("creating VPC {} ({})", request.vpc_name, id);

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
        let result = ctx.run(meta.client.vpc.get(rd.id())).await?;
        let Some(vpc) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["vpcName", "vpcDescription"])
            .to_attributes(&vpc)?;
        rd.set_attributes(attributes);
        rd.set("name", vpc.vpc_name);
        rd.set("description", vpc.vpc_description);
        rd.set("region", region_of(ctx, meta, &vpc.service_zone_id).await);

        set_tags(ctx, rd, meta, &vpc.vpc_id).await
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
            call(ctx, meta.client.vpc.update_description(&id, &description)).await?;
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
        let result = ctx.run(meta.client.vpc.delete(&id)).await?;
        if deleted_or_gone(result)? {
            wait_for_status(ctx, &meta.wait, DELETE_PENDING, DELETED, false, || {
                probe(&meta.client, &id)
            })
            .await?;
            log::info!("deleted VPC {}", id);
        }
        rd.set_id("");
        Ok(())
    }
}
