//! scp_postgresql_cluster - Managed PostgreSQL cluster
//!
//! Compute size is configured as `cpu_count` / `memory_size_gb` and resolved
//! to a server type through the product catalogue. Scaling is applied one
//! cluster member at a time.

use async_trait::async_trait;
use scp_client::services::postgresql::{
    CreatePostgresqlClusterRequest, DatabaseServer, PostgresqlCluster, SCALE_PENDING_STATES,
    SCALE_TARGET_STATES, STATE_CREATING, STATE_RUNNING, STATE_TERMINATING,
};
use scp_client::{ClientError, ClientResult, ScpClient};
use scp_core::context::OperationContext;
use scp_core::marshal::{Marshaller, to_attribute_rows};
use scp_core::provider::{ProviderResult, ResourceHandler};
use scp_core::resource::{ResourceData, Value};
use scp_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use scp_core::waiter::{aggregate_state, wait_for_status};

use super::{DELETED, computed, region_schema};
use crate::meta::Meta;
use crate::tags::{configured_tags, set_tags, tags_schema, update_tags};
use crate::utils::{
    call, deleted_or_gone, found_or_gone, region_of, resolve_service_zone, rows_value,
};

pub const KEY: &str = "scp_postgresql_cluster";

/// Product group of PostgreSQL server types
const PRODUCT_GROUP: &str = "POSTGRESQL";

const CREATING: &[&str] = &[STATE_CREATING];
const TERMINATING: &[&str] = &[STATE_TERMINATING];

/// Member still serving on its old server type after a scale request
const SCALE_QUEUED: &str = "SCALE_QUEUED";

pub struct PostgresqlClusterResource;

/// Cluster state folded over its members
async fn probe(client: &ScpClient, id: &str) -> ClientResult<(PostgresqlCluster, String)> {
    let cluster = client.postgresql.get(id).await?;
    let state = if cluster.servers.is_empty() {
        cluster.database_cluster_state.clone()
    } else {
        aggregate_state(
            cluster.servers.iter().map(|s| s.server_state.as_str()),
            SCALE_TARGET_STATES,
        )
        .unwrap_or_else(|| STATE_RUNNING.to_string())
    };
    Ok((cluster, state))
}

async fn probe_server(
    client: &ScpClient,
    cluster_id: &str,
    server_id: &str,
) -> ClientResult<(DatabaseServer, String)> {
    let cluster = client.postgresql.get(cluster_id).await?;
    let server = cluster
        .servers
        .into_iter()
        .find(|s| s.server_id == server_id)
        .ok_or_else(|| {
            ClientError::NotFound(format!("server {} of cluster {}", server_id, cluster_id))
        })?;
    let state = server.server_state.clone();
    Ok((server, state))
}

/// Member state during a scale
///
/// A member reports its old running state until the request is picked up, so
/// a target state only counts once the member runs `server_type`.
async fn probe_scaled_server(
    client: &ScpClient,
    cluster_id: &str,
    server_id: &str,
    server_type: &str,
) -> ClientResult<(DatabaseServer, String)> {
    let (server, state) = probe_server(client, cluster_id, server_id).await?;
    if SCALE_TARGET_STATES.contains(&state.as_str()) && server.server_type != server_type {
        return Ok((server, SCALE_QUEUED.to_string()));
    }
    Ok((server, state))
}

fn server_schema() -> ResourceSchema {
    ["server_id", "server_name", "server_role", "server_state", "server_type"]
        .into_iter()
        .fold(ResourceSchema::new("server"), |schema, name| {
            schema.attribute(AttributeSchema::new(name, AttributeType::String))
        })
}

async fn resolve_server_type(
    ctx: &OperationContext,
    rd: &ResourceData,
    meta: &Meta,
) -> ProviderResult<String> {
    let cpu = rd.require_int("cpu_count")?;
    let memory = rd.require_int("memory_size_gb")?;
    let product = call(
        ctx,
        meta.client
            .product
            .resolve_scale_product(PRODUCT_GROUP, cpu, memory),
    )
    .await
    .map_err(|e| e.for_resource(KEY))?;
    log::debug!("{} vCPU / {} GB resolves to {}", cpu, memory, product.server_type);
    Ok(product.server_type)
}

fn create_request(
    rd: &ResourceData,
    server_type: String,
    service_zone_id: String,
) -> ProviderResult<CreatePostgresqlClusterRequest> {
    Ok(CreatePostgresqlClusterRequest {
        database_cluster_name: rd.require_str("name")?.to_string(),
        database_name: rd.require_str("database_name")?.to_string(),
        database_user_name: rd.require_str("database_user_name")?.to_string(),
        database_user_password: rd.require_str("database_user_password")?.to_string(),
        database_port: rd.get_int("database_port").unwrap_or(5432),
        image_id: rd.require_str("image_id")?.to_string(),
        server_type,
        subnet_id: rd.require_str("subnet_id")?.to_string(),
        security_group_ids: rd.get_string_list("security_group_ids"),
        service_zone_id,
        block_storage_size_gb: rd.require_int("block_storage_size_gb")?,
        timezone: rd.get_string("timezone"),
        tags: configured_tags(rd),
    })
}

#[async_trait]
impl ResourceHandler<Meta> for PostgresqlClusterResource {
    fn schema(&self) -> ResourceSchema {
        let forced = |name: &str, attr_type: AttributeType| {
            AttributeSchema::new(name, attr_type).required().force_new()
        };
        ResourceSchema::new(KEY)
            .with_description("Managed PostgreSQL database cluster")
            .attribute(forced("name", AttributeType::String))
            .attribute(forced("database_name", AttributeType::String))
            .attribute(forced("database_user_name", AttributeType::String))
            .attribute(forced("database_user_password", AttributeType::String).sensitive())
            .attribute(
                AttributeSchema::new("database_port", types::port_number())
                    .with_default(Value::Int(5432))
                    .force_new(),
            )
            .attribute(forced("image_id", AttributeType::String))
            .attribute(forced("subnet_id", AttributeType::String))
            .attribute(AttributeSchema::new("security_group_ids", types::string_list()).force_new())
            .attribute(forced("block_storage_size_gb", types::positive_int()))
            .attribute(
                AttributeSchema::new("timezone", AttributeType::String)
                    .with_default(Value::from("Asia/Seoul"))
                    .force_new(),
            )
            .attribute(AttributeSchema::new("cpu_count", types::positive_int()).required())
            .attribute(AttributeSchema::new("memory_size_gb", types::positive_int()).required())
            .attribute(region_schema())
            .attribute(tags_schema())
            .attribute(computed("server_type", AttributeType::String))
            .attribute(computed("database_cluster_state", AttributeType::String))
            .attribute(computed("database_version", AttributeType::String))
            .attribute(computed(
                "servers",
                AttributeType::Block(Box::new(server_schema())),
            ))
            .attribute(computed("created_dt", AttributeType::String))
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let service_zone_id = resolve_service_zone(ctx, rd, meta).await?;
        let server_type = resolve_server_type(ctx, rd, meta).await?;
        let request = create_request(rd, server_type, service_zone_id)?;

        let response = call(ctx, meta.client.postgresql.create(&request)).await?;
        let id = response.resource_id;
        log::info!(
            "creating PostgreSQL cluster {} ({}) as {}",
            request.database_cluster_name,
            id,
            request.server_type
        );

        wait_for_status(ctx, &meta.wait, CREATING, SCALE_TARGET_STATES, true, || {
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
        let result = ctx.run(meta.client.postgresql.get(rd.id())).await?;
        let Some(cluster) = found_or_gone(rd, KEY, result)? else {
            return Ok(());
        };

        let schema = self.schema();
        let attributes = Marshaller::new()
            .with_schema(&schema)
            .ignore(&["databaseClusterName", "servers"])
            .to_attributes(&cluster)?;
        let servers = to_attribute_rows(&cluster.servers, &Marshaller::new())?;

        rd.set_attributes(attributes);
        rd.set("name", cluster.database_cluster_name);
        rd.set("servers", rows_value(servers));
        rd.set("region", region_of(ctx, meta, &cluster.service_zone_id).await);

        set_tags(ctx, rd, meta, &cluster.database_cluster_id).await
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        rd: &mut ResourceData,
        meta: &Meta,
    ) -> ProviderResult<()> {
        let id = rd.id().to_string();

        if rd.has_changes(&["cpu_count", "memory_size_gb"]) {
            let server_type = resolve_server_type(ctx, rd, meta).await?;
            let cluster = call(ctx, meta.client.postgresql.get(&id)).await?;
            log::info!(
                "scaling {} servers of cluster {} to {}",
                cluster.servers.len(),
                id,
                server_type
            );

            let pending: Vec<&str> = SCALE_PENDING_STATES
                .iter()
                .copied()
                .chain([SCALE_QUEUED])
                .collect();
            for server in &cluster.servers {
                call(
                    ctx,
                    meta.client
                        .postgresql
                        .scale_server_type(&id, &server.server_id, &server_type),
                )
                .await?;
                wait_for_status(ctx, &meta.wait, &pending, SCALE_TARGET_STATES, true, || {
                    probe_scaled_server(&meta.client, &id, &server.server_id, &server_type)
                })
                .await?;
            }
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
        let result = ctx.run(meta.client.postgresql.delete(&id)).await?;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_sensitive() {
        let schema = PostgresqlClusterResource.schema();
        assert_eq!(schema.sensitive_attributes(), vec!["database_user_password"]);
    }
}
