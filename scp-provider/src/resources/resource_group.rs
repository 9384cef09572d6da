//! scp_resource_group - Named grouping of project resources
//!
//! The resource-group API answers synchronously; no waiter is involved.

use async_trait::async_trait;
use scp_client::services::resource_group::{
    CreateResourceGroupRequest, ResourceGroup, UpdateResourceGroupRequest,
};
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{computed, description_schema, name_schema};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{call, deleted_or_gone, found_or_gone};

pub const KEY: &str = "scp_resource_group";

pub struct ResourceGroupResource;

impl ResourceGroupResource {
    async fn set_group(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
        group: ResourceGroup,
    ) -> ProviderResult<()> {
        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["resourceGroupName", "resourceGroupDescription"])
            .to_attributes(&group)?;
        rd.set_attributes(attributes);
        rd.set("name", group.resource_group_name);
        rd.set("description", group.resource_group_description);

        set_tags(ctx, rd, meta, &group.resource_group_id).await
    }
}

#[async_trait]
impl ResourceHandler<Meta> for ResourceGroupResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Group of resources selected by type and tag")
            .attribute(name_schema())
            .attribute(description_schema())
            .attribute(
                AttributeSchema::new("target_resource_types", types::string_list())
                    .with_description("Resource types the group may contain"),
            )
            .attribute(tags_schema())
            .attribute(computed("resource_group_id", AttributeType::String))
            .attribute(computed("created_by", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let request = CreateResourceGroupRequest {
            resource_group_name: rd.require_str("name")?.to_string(),
            resource_group_description: rd.get_string("description"),
            target_resource_types: rd.get_string_list("target_resource_types"),
            tags: configured_tags(rd),
        };

        let group = call(ctx, meta.client.resource_group.create(&request)).await?;
        log::info!(
            "created resource group {} ({})",
            group.resource_group_name,
            group.resource_group_id
        );
        rd.set_id(&group.resource_group_id);
        self.set_group(ctx, rd, meta, group).await
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let result = ctx.run(meta.client.resource_group.get(rd.id())).await?;
        let Some(group) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };
        self.set_group(ctx, rd, meta, group).await
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = rd.id().to_string();

        if rd.has_changes(&["description", "target_resource_types"]) {
            let request = UpdateResourceGroupRequest {
                resource_group_description: rd.get_string("description"),
                target_resource_types: rd.get_string_list("target_resource_types"),
            };
            call(ctx, meta.client.resource_group.update(&id, &request)).await?;
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
        let result = ctx.run(meta.client.resource_group.delete(rd.id())).await?;
        deleted_or_gone(result)?;
        rd.set_id("");
        Ok(())
    }
}
