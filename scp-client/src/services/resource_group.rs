//! Resource groups; every call completes synchronously

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{ListResponse, PageRequest, Query};
use crate::services::tag::Tag;

const BASE: &str = "/resource-group/v2/resource-groups";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceGroup {
    pub resource_group_id: String,
    pub resource_group_name: String,
    pub resource_group_description: String,
    pub target_resource_types: Vec<String>,
    pub created_by: String,
    pub created_dt: Option<DateTime<Utc>>,
    pub modified_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceGroupRequest {
    pub resource_group_name: String,
    pub resource_group_description: String,
    pub target_resource_types: Vec<String>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceGroupRequest {
    pub resource_group_description: String,
    pub target_resource_types: Vec<String>,
}

#[derive(Clone)]
pub struct ResourceGroupClient {
    http: HttpClient,
}

impl ResourceGroupClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create(&self, request: &CreateResourceGroupRequest) -> ClientResult<ResourceGroup> {
        self.http.post(BASE, request).await
    }

    pub async fn get(&self, group_id: &str) -> ClientResult<ResourceGroup> {
        self.http
            .get(&format!("{}/{}", BASE, group_id), &Query::new())
            .await
    }

    pub async fn update(
        &self,
        group_id: &str,
        request: &UpdateResourceGroupRequest,
    ) -> ClientResult<ResourceGroup> {
        self.http
            .put(&format!("{}/{}", BASE, group_id), request)
            .await
    }

    pub async fn delete(&self, group_id: &str) -> ClientResult<()> {
        let _: Option<serde_json::Value> =
            self.http.delete(&format!("{}/{}", BASE, group_id)).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> ClientResult<ListResponse<ResourceGroup>> {
        let query = Query::new().opt("resourceGroupName", name).page(page);
        self.http.get(BASE, &query).await
    }
}
