//! scp_dns_record - Record inside a DNS domain
//!
//! ID is `<dns_domain_id>:<dns_record_id>`.

use async_trait::async_trait;
use scp_client::services::dns::{
    CreateDnsRecordRequest, DnsRecord, DnsRecordMapping, RECORD_TYPES, UpdateDnsRecordRequest,
};
use scp_client::{ClientResult, ScpClient};
use scp_core::composite_id::CompositeId;
use scp_core::context::OperationContext;
use scp_core::marshal::{Marshaller, to_attribute_rows};
use scp_core::provider::{ProviderError, ProviderResult, ResourceHandler};
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

pub const KEY: &str = "scp_dns_record";

pub struct DnsRecordResource;

async fn probe(client: &ScpClient, id: &CompositeId) -> ClientResult<(DnsRecord, String)> {
    let record = client.dns.get_record(&id.parent, &id.child).await?;
    let state = record.dns_record_state.clone();
    Ok((record, state))
}

fn mapping_schema() -> ResourceSchema {
    ResourceSchema::new("mapping")
        .attribute(AttributeSchema::new("record_destination", AttributeType::String).required())
        .attribute(AttributeSchema::new("preference", types::non_negative_int()))
}

fn mappings(rd: &ResourceData) -> ProviderResult<Vec<DnsRecordMapping>> {
    let mappings: Vec<DnsRecordMapping> = rd
        .get_list("mappings")
        .iter()
        .filter_map(Value::as_map)
        .map(|m| DnsRecordMapping {
            record_destination: block_str(m, "record_destination"),
            preference: block_int(m, "preference").unwrap_or_default(),
        })
        .collect();
    if mappings.is_empty() {
        return Err(ProviderError::validation(
            "mappings",
            "at least one mapping is required",
        ));
    }
    Ok(mappings)
}

#[async_trait]
impl ResourceHandler<Meta> for DnsRecordResource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(KEY)
            .with_description("Resource record in a private DNS domain")
            .attribute(
                AttributeSchema::new("dns_domain_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(name_schema())
            .attribute(
                AttributeSchema::new("type", enum_type(RECORD_TYPES))
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("ttl", types::positive_int()).with_default(Value::Int(300)),
            )
            .attribute(
                AttributeSchema::new(
                    "mappings",
                    AttributeType::Block(Box::new(mapping_schema())),
                )
                .required(),
            )
            .attribute(computed("dns_record_state", AttributeType::String))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let domain_id = rd.require_str("dns_domain_id")?.to_string();
        let request = CreateDnsRecordRequest {
            dns_record_name: rd.require_str("name")?.to_string(),
            dns_record_type: rd.require_str("type")?.to_string(),
            ttl: rd.get_int("ttl").unwrap_or(300),
            dns_record_mapping: mappings(rd)?,
        };

        let response = call(ctx, meta.client.dns.create_record(&domain_id, &request)).await?;
        let id = created_id(&domain_id, &response.resource_id, "DNS record")?;
        log::info!(
            "creating DNS record {} {} ({})",
            request.dns_record_type,
            request.dns_record_name,
            id
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
            .run(meta.client.dns.get_record(&id.parent, &id.child))
            .await?;
        let Some(record) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["dnsRecordName", "dnsRecordType", "dnsRecordMapping"])
            .to_attributes(&record)?;
        let mappings = to_attribute_rows(&record.dns_record_mapping, &Marshaller::new())?;

        rd.set_attributes(attributes);
        rd.set("dns_domain_id", id.parent);
        rd.set("name", record.dns_record_name);
        rd.set("type", record.dns_record_type);
        rd.set("mappings", rows_value(mappings));
        Ok(())
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = CompositeId::split(rd.id())?;

        if rd.has_changes(&["ttl", "mappings"]) {
            let request = UpdateDnsRecordRequest {
                ttl: rd.get_int("ttl").unwrap_or(300),
                dns_record_mapping: mappings(rd)?,
            };
            call(
                ctx,
                meta.client
                    .dns
                    .update_record(&id.parent, &id.child, &request),
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
            .run(meta.client.dns.delete_record(&id.parent, &id.child))
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
