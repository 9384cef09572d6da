//! Tag service: key/value labels attached to any resource ID

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{ListResponse, PageRequest, Query};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    pub tag_key: String,
    pub tag_value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag_key: key.into(),
            tag_value: value.into(),
        }
    }
}

/// Tags in a stable order (sorted by key) for request bodies
pub fn tags_from_map(map: &HashMap<String, String>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = map.iter().map(|(k, v)| Tag::new(k, v)).collect();
    tags.sort_by(|a, b| a.tag_key.cmp(&b.tag_key));
    tags
}

pub fn tags_to_map(tags: &[Tag]) -> HashMap<String, String> {
    tags.iter()
        .map(|t| (t.tag_key.clone(), t.tag_value.clone()))
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddTagsRequest<'a> {
    tags: &'a [Tag],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoveTagsRequest<'a> {
    tag_keys: &'a [String],
}

#[derive(Clone)]
pub struct TagClient {
    http: HttpClient,
}

impl TagClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn path(resource_id: &str) -> String {
        format!("/tag/v2/resources/{}/tags", resource_id)
    }

    pub async fn list_tags(&self, resource_id: &str) -> ClientResult<Vec<Tag>> {
        let query = Query::new().page(PageRequest::all());
        let list: ListResponse<Tag> = self.http.get(&Self::path(resource_id), &query).await?;
        Ok(list.contents)
    }

    pub async fn add_tags(&self, resource_id: &str, tags: &[Tag]) -> ClientResult<()> {
        let _: Option<serde_json::Value> = self
            .http
            .post(&Self::path(resource_id), &AddTagsRequest { tags })
            .await?;
        Ok(())
    }

    pub async fn remove_tags(&self, resource_id: &str, keys: &[String]) -> ClientResult<()> {
        let _: Option<serde_json::Value> = self
            .http
            .delete_with_body(&Self::path(resource_id), &RemoveTagsRequest { tag_keys: keys })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_from_map_is_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());
        assert_eq!(tags_from_map(&map), vec![Tag::new("a", "1"), Tag::new("b", "2")]);
        assert_eq!(tags_to_map(&tags_from_map(&map)), map);
    }
}
