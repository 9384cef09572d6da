//! scp_load_balancer

use async_trait::async_trait;
use scp_client::services::load_balancer::{CreateLoadBalancerRequest, LB_SIZES, LoadBalancer};
use scp_client::{ClientResult, ScpClient};
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::{ResourceData, Value};
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use scp_core::waiter::wait_for_status;

use super::{
    ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, EDIT_PENDING, computed, description_schema,
    enum_type, name_schema, region_schema,
};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{
    call, deleted_or_gone, ensure_unique, found_or_gone, region_of, resolve_service_zone,
};

pub const KEY: &str = "scp_load_balancer";

pub struct LoadBalancerResource;

pub(crate) async fn probe(client: &ScpClient, id: &str) -> ClientResult<(LoadBalancer, String)> {
    let lb = client.load_balancer.get(id).await?;
    let state = lb.load_balancer_state.clone();
    Ok((lb, state))
}

fn create_request(
    rd: &ResourceData,
    service_zone_id: String,
) -> ProviderResult<CreateLoadBalancerRequest> {
    Ok(CreateLoadBalancerRequest {
        load_balancer_name: rd.require_str("name")?.to_string(),
        load_balancer_description: rd.get_string("description"),
        load_balancer_size: rd.require_str("size")?.to_string(),
        vpc_id: rd.require_str("vpc_id")?.to_string(),
        service_ip_cidr_block: rd.require_str("service_ip_cidr_block")?.to_string(),
        firewall_enabled: rd.get_bool("firewall_enabled").unwrap_or(false),
        service_zone_id,
        tags: configured_tags(rd),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for LoadBalancerResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Load balancer attached to a VPC")
            .attribute(name_schema())
            .attribute(
                AttributeSchema::new("vpc_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("size", enum_type(LB_SIZES))
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("service_ip_cidr_block", types::cidr())
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("firewall_enabled", AttributeType::Bool)
                    .with_default(Value::Bool(false))
                    .force_new(),
            )
            .attribute(description_schema())
            .attribute(region_schema())
            .attribute(tags_schema())
            .attribute(computed("load_balancer_state", AttributeType::String))
            .attribute(computed("link_ip_cidr_block", AttributeType::String))
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

        let duplicated = call(
            ctx,
            meta.client
                .load_balancer
                .is_name_duplicated(&request.load_balancer_name),
        )
        .await?;
        ensure_unique(duplicated, "load balancer name", &request.load_balancer_name)?;

        let response = call(ctx, meta.client.load_balancer.create(&request)).await?;
        let id = response.resource_id;
        log::info!(
            "creating load balancer {} ({})",
            request.load_balancer_name,
            id
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
        let result = ctx.run(meta.client.load_balancer.get(rd.id())).await?;
        let Some(lb) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&[
                "loadBalancerName",
                "loadBalancerDescription",
                "loadBalancerSize",
            ])
            .to_attributes(&lb)?;
        rd.set_attributes(attributes);
        rd.set("name", lb.load_balancer_name);
        rd.set("description", lb.load_balancer_description);
        rd.set("size", lb.load_balancer_size);
        rd.set("region", region_of(ctx, meta, &lb.service_zone_id).await);

        set_tags(ctx, rd, meta, &lb.load_balancer_id).await
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
                meta.client.load_balancer.update_description(&id, &description),
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
        let result = ctx.run(meta.client.load_balancer.delete(&id)).await?;
        if deleted_or_gone(result)? {
            wait_for_status(ctx, &meta.wait, DELETE_PENDING, DELETED, false, || {
                probe(&meta.client, &id)
            })
            .await?;
            log::info!("deleted load balancer {}", id);
        }
        rd.set_id("");
        Ok(())
    }
}
