//! Helpers shared by resource and data-source handlers

use std::collections::HashMap;
use std::future::Future;

use scp_client::ClientResult;
use scp_core::composite_id::CompositeId;
use scp_core::context::OperationContext;
use scp_core::provider::{ErrorKind, ProviderError, ProviderResult};
use scp_core::resource::{Attributes, ResourceData, Value};

use crate::meta::Meta;

/// Run a client call under the operation context
pub async fn call<F, T>(ctx: &OperationContext, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    ctx.run(fut).await?.map_err(ProviderError::from)
}

/// Outcome of a Read GET: `None` when the object is gone
///
/// A gone object clears the ID so the engine plans a re-create. Any other
/// failure clears the ID as well and is returned.
pub fn found_or_gone<T>(
    rd: &mut ResourceData,
    resource: &str,
    result: ClientResult<T>,
) -> ProviderResult<Option<T>> {
    match result {
        Ok(object) => Ok(Some(object)),
        Err(err) if scp_client::is_deleted(&err) => {
            log::warn!("{} {} no longer exists, removing from state", resource, rd.id());
            rd.set_id("");
            Ok(None)
        }
        Err(err) => {
            let id = rd.id().to_string();
            rd.set_id("");
            Err(ProviderError::from(err)
                .context(format!("failed to read {}", id))
                .for_resource(resource))
        }
    }
}

/// Result of a DELETE call; an object that is already gone counts as deleted
pub fn deleted_or_gone<T>(result: ClientResult<T>) -> ProviderResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(err) if scp_client::is_deleted(&err) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// String field of a nested block entry
pub fn block_str(block: &HashMap<String, Value>, key: &str) -> String {
    block
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Integer field of a nested block entry
pub fn block_int(block: &HashMap<String, Value>, key: &str) -> Option<i64> {
    block.get(key).and_then(Value::as_int)
}

/// Marshalled rows as a block value (list of maps)
pub fn rows_value(rows: Vec<Attributes>) -> Value {
    Value::List(rows.into_iter().map(Value::Map).collect())
}

/// Normalize region value (e.g., "scp.Region.KR_WEST_1" -> "KR-WEST-1")
pub fn normalize_region(s: &str) -> String {
    let region_part = if s.contains('.') {
        s.split('.').next_back().unwrap_or(s)
    } else {
        s
    };
    region_part.replace('_', "-")
}

/// Service zone ID for the resource's region, falling back to the provider default
pub async fn resolve_service_zone(
    ctx: &OperationContext,
    rd: &ResourceData,
    meta: &Meta,
) -> ProviderResult<String> {
    let region = rd
        .get_str("region")
        .map(String::from)
        .or_else(|| meta.region.clone())
        .ok_or_else(|| {
            ProviderError::validation("region", "region is not set on the resource or provider")
        })?;
    let region = normalize_region(&region);
    call(ctx, meta.client.project.find_service_zone(&region))
        .await?
        .map(|zone| zone.service_zone_id)
        .ok_or_else(|| {
            ProviderError::validation("region", format!("no service zone found for region {}", region))
        })
}

/// Region name of a service zone
///
/// Lookup failures are not fatal: the provider's default region is reported
/// instead and a warning is logged.
pub async fn region_of(ctx: &OperationContext, meta: &Meta, service_zone_id: &str) -> String {
    let fallback = meta.region.clone().unwrap_or_default();
    if service_zone_id.is_empty() {
        return fallback;
    }
    match call(ctx, meta.client.project.list_service_zones()).await {
        Ok(zones) => zones
            .into_iter()
            .find(|z| z.service_zone_id == service_zone_id)
            .map(|z| z.service_zone_location)
            .unwrap_or_else(|| {
                log::warn!("unknown service zone {}, using default region", service_zone_id);
                fallback
            }),
        Err(e) => {
            log::warn!("failed to resolve region of {}: {}", service_zone_id, e);
            fallback
        }
    }
}

/// Fail with a Conflict error when a pre-flight probe found a duplicate
pub fn ensure_unique(duplicated: bool, what: &str, value: &str) -> ProviderResult<()> {
    if duplicated {
        Err(ProviderError::conflict(format!("{} '{}' is already in use", what, value)))
    } else {
        Ok(())
    }
}

/// ID of a child object from an accepted create call
///
/// The object may already exist remotely, so an unusable ID in the response
/// is an API failure, not a validation error.
pub fn created_id(parent: &str, child: &str, what: &str) -> ProviderResult<CompositeId> {
    CompositeId::new(parent, child).map_err(|e| {
        ProviderError::new(format!(
            "create response for {} under {} returned unusable id '{}' ({}); the object may have been created",
            what, parent, child, e.message
        ))
        .with_kind(ErrorKind::Api)
    })
}
