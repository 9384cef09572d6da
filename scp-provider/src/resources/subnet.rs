//! scp_subnet - Subnet of a VPC

use async_trait::async_trait;
use scp_client::ClientResult;
use scp_client::ScpClient;
use scp_client::services::subnet::{CreateSubnetRequest, SUBNET_TYPES, Subnet};
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use scp_core::waiter::wait_for_status;

use super::{
    ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, EDIT_PENDING, computed, description_schema,
    enum_type, name_schema,
};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{call, deleted_or_gone, ensure_unique, found_or_gone};

pub const KEY: &str = "scp_subnet";

pub struct SubnetResource;

async fn probe(client: &ScpClient, id: &str) -> ClientResult<(Subnet, String)> {
    let subnet = client.subnet.get(id).await?;
    let state = subnet.subnet_state.clone();
    Ok((subnet, state))
}

fn create_request(rd: &ResourceData) -> ProviderResult<CreateSubnetRequest> {
    Ok(CreateSubnetRequest {
        vpc_id: rd.require_str("vpc_id")?.to_string(),
        subnet_name: rd.require_str("name")?.to_string(),
        subnet_type: rd.require_str("type")?.to_string(),
        subnet_cidr_block: rd.require_str("cidr_block")?.to_string(),
        subnet_description: rd.get_string("description"),
        tags: configured_tags(rd),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for SubnetResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Subnet carved out of a VPC")
            .attribute(
                AttributeSchema::new("vpc_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(name_schema())
            .attribute(
                AttributeSchema::new("type", enum_type(SUBNET_TYPES))
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("cidr_block", types::cidr())
                    .required()
                    .force_new(),
            )
            .attribute(description_schema())
            .attribute(tags_schema())
            .attribute(computed("subnet_state", AttributeType::String))
            .attribute(computed("subnet_gateway_ip_address", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let request = create_request(rd)?;

        let duplicated = call(
            ctx,
            meta.client
                .subnet
                .is_cidr_duplicated(&request.vpc_id, &request.subnet_cidr_block),
        )
        .await?;
        ensure_unique(duplicated, "subnet CIDR block", &request.subnet_cidr_block)?;

        let response = call(ctx, meta.client.subnet.create(&request)).await?;
        let id = response.resource_id;
        log::info!("creating subnet {} ({}) in {}", request.subnet_name, id, request.vpc_id);

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
        let result = ctx.run(meta.client.subnet.get(rd.id())).await?;
        let Some(subnet) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&[
                "subnetName",
                "subnetType",
                "subnetCidrBlock",
                "subnetDescription",
            ])
            .to_attributes(&subnet)?;
        rd.set_attributes(attributes);
        rd.set("name", subnet.subnet_name);
        rd.set("type", subnet.subnet_type);
        rd.set("cidr_block", subnet.subnet_cidr_block);
        rd.set("description", subnet.subnet_description);

        set_tags(ctx, rd, meta, &subnet.subnet_id).await
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
            call(ctx, meta.client.subnet.update_description(&id, &description)).await?;
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
        let result = ctx.run(meta.client.subnet.delete(&id)).await?;
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
    use scp_core::resource::{Attributes, Value};

    #[test]
    fn schema_rejects_unknown_subnet_type() {
        let schema = SubnetResource.schema();
        let mut config = Attributes::new();
        config.insert("vpc_id".to_string(), Value::from("VPC-1"));
        config.insert("name".to_string(), Value::from("web"));
        config.insert("type".to_string(), Value::from("DMZ"));
        config.insert("cidr_block".to_string(), Value::from("10.0.0.0/24"));
        assert!(schema.validate(&config).is_err());

        config.insert("type".to_string(), Value::from("PRIVATE"));
        assert!(schema.validate(&config).is_ok());
    }

    #[test]
    fn create_request_requires_cidr() {
        let mut config = Attributes::new();
        config.insert("vpc_id".to_string(), Value::from("VPC-1"));
        config.insert("name".to_string(), Value::from("web"));
        config.insert("type".to_string(), Value::from("PUBLIC"));
        let err = create_request(&ResourceData::new(config)).unwrap_err();
        assert_eq!(err.attribute.as_deref(), Some("cidr_block"));
    }
}
