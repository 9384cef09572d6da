//! Tag sub-resource shared by every taggable resource
//!
//! Tags live behind their own endpoint and have no lifecycle state, so no
//! waiting is involved.

use scp_client::services::tag::{Tag, tags_from_map, tags_to_map};
use scp_core::context::OperationContext;
use scp_core::provider::ProviderResult;
use scp_core::resource::{ResourceData, Value};
use scp_core::schema::{AttributeSchema, types};

use crate::meta::Meta;
use crate::utils::call;

pub const TAGS: &str = "tags";

pub fn tags_schema() -> AttributeSchema {
    AttributeSchema::new(TAGS, types::tags()).with_description("Key/value labels")
}

/// Tags from the configuration, as sent in create requests
pub fn configured_tags(rd: &ResourceData) -> Vec<Tag> {
    tags_from_map(&rd.get_string_map(TAGS))
}

/// Read the remote tags of `resource_id` into `tags`
pub async fn set_tags(
    ctx: &OperationContext,
    rd: &mut ResourceData,
    meta: &Meta,
    resource_id: &str,
) -> ProviderResult<()> {
    let tags = call(ctx, meta.client.tag.list_tags(resource_id)).await?;
    rd.set(TAGS, Value::from(tags_to_map(&tags)));
    Ok(())
}

/// Apply the difference between the prior and planned tag maps
///
/// Keys removed or changed are deleted in one call; keys added or changed
/// are written in a second call.
pub async fn update_tags(
    ctx: &OperationContext,
    rd: &ResourceData,
    meta: &Meta,
    resource_id: &str,
) -> ProviderResult<()> {
    if !rd.has_change(TAGS) {
        return Ok(());
    }
    let (old, new) = rd.get_string_map_change(TAGS);

    let mut removed: Vec<String> = old
        .iter()
        .filter(|(k, v)| new.get(*k) != Some(*v))
        .map(|(k, _)| k.clone())
        .collect();
    removed.sort();

    let added: Vec<Tag> = tags_from_map(
        &new.iter()
            .filter(|(k, v)| old.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    );

    if !removed.is_empty() {
        log::debug!("removing tags {:?} from {}", removed, resource_id);
        call(ctx, meta.client.tag.remove_tags(resource_id, &removed)).await?;
    }
    if !added.is_empty() {
        log::debug!("adding {} tags to {}", added.len(), resource_id);
        call(ctx, meta.client.tag.add_tags(resource_id, &added)).await?;
    }
    Ok(())
}
