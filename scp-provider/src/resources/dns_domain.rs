//! scp_dns_domain - Private DNS zone
//!
//! A freshly created domain may answer 404 for a while before it becomes
//! visible; the create waiter tolerates that.

use async_trait::async_trait;
use scp_client::services::dns::{CreateDnsDomainRequest, DnsDomain};
use scp_client::{ClientResult, ScpClient};
use scp_core::context::OperationContext;
use scp_core::marshal::Marshaller;
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::ResourceData;
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use scp_core::waiter::wait_for_status;

use super::{
    ACTIVE, CREATE_PENDING, DELETE_PENDING, DELETED, EDIT_PENDING, computed, description_schema,
    name_schema,
};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{call, deleted_or_gone, ensure_unique, found_or_gone};

pub const KEY: &str = "scp_dns_domain";

pub struct DnsDomainResource;

pub(crate) async fn probe(client: &ScpClient, id: &str) -> ClientResult<(DnsDomain, String)> {
    let domain = client.dns.get_domain(id).await?;
    let state = domain.dns_domain_state.clone();
    Ok((domain, state))
}

fn create_request(rd: &ResourceData) -> ProviderResult<CreateDnsDomainRequest> {
    Ok(CreateDnsDomainRequest {
        dns_domain_name: rd.require_str("name")?.to_string(),
        dns_root_domain_name: rd.require_str("root_domain_name")?.to_string(),
        dns_description: rd.get_string("description"),
        tags: configured_tags(rd),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for DnsDomainResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Private DNS zone resolvable from the project's VPCs")
            .attribute(name_schema())
            .attribute(
                AttributeSchema::new("root_domain_name", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(description_schema())
            .attribute(tags_schema())
            .attribute(computed("dns_domain_state", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let request = create_request(rd)?;

        let duplicated = call(ctx, meta.client.dns.is_name_duplicated(&request.dns_domain_name)).await?;
        ensure_unique(duplicated, "DNS domain name", &request.dns_domain_name)?;

        let response = call(ctx, meta.client.dns.create_domain(&request)).await?;
        let id = response.resource_id;
        log::info!("creating DNS domain {} ({})", request.dns_domain_name, id);

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
        let result = ctx.run(meta.client.dns.get_domain(rd.id())).await?;
        let Some(domain) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["dnsDomainName", "dnsRootDomainName", "dnsDescription"])
            .to_attributes(&domain)?;
        rd.set_attributes(attributes);
        rd.set("name", domain.dns_domain_name);
        rd.set("root_domain_name", domain.dns_root_domain_name);
        rd.set("description", domain.dns_description);

        set_tags(ctx, rd, meta, &domain.dns_domain_id).await
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
            call(ctx, meta.client.dns.update_domain_description(&id, &description)).await?;
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
        let result = ctx.run(meta.client.dns.delete_domain(&id)).await?;
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
