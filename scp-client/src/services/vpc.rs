//! VPC service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{AsyncResponse, CheckResponse, ListResponse, PageRequest, Query};
use crate::services::tag::Tag;

pub const STATE_CREATING: &str = "CREATING";
pub const STATE_ACTIVE: &str = "ACTIVE";
pub const STATE_EDITING: &str = "EDITING";
pub const STATE_DELETING: &str = "DELETING";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Vpc {
    pub vpc_id: String,
    pub vpc_name: String,
    pub vpc_description: String,
    pub vpc_state: String,
    pub service_zone_id: String,
    pub project_id: String,
    pub created_by: String,
    pub created_dt: Option<DateTime<Utc>>,
    pub modified_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateVpcRequest {
    pub vpc_name: String,
    pub vpc_description: String,
    pub service_zone_id: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default)]
pub struct VpcListQuery {
    pub vpc_name: Option<String>,
    pub vpc_state: Option<String>,
    pub service_zone_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDescriptionRequest<'a> {
    vpc_description: &'a str,
}

#[derive(Clone)]
pub struct VpcClient {
    http: HttpClient,
}

impl VpcClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create(&self, request: &CreateVpcRequest) -> ClientResult<AsyncResponse> {
        self.http.post("/vpc/v3/vpcs", request).await
    }

    pub async fn get(&self, vpc_id: &str) -> ClientResult<Vpc> {
        self.http
            .get(&format!("/vpc/v2/vpcs/{}", vpc_id), &Query::new())
            .await
    }

    pub async fn update_description(
        &self,
        vpc_id: &str,
        description: &str,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("/vpc/v2/vpcs/{}/description", vpc_id),
                &UpdateDescriptionRequest {
                    vpc_description: description,
                },
            )
            .await
    }

    pub async fn delete(&self, vpc_id: &str) -> ClientResult<Option<AsyncResponse>> {
        self.http.delete(&format!("/vpc/v2/vpcs/{}", vpc_id)).await
    }

    pub async fn list(
        &self,
        query: &VpcListQuery,
        page: PageRequest,
    ) -> ClientResult<ListResponse<Vpc>> {
        let query = Query::new()
            .opt("vpcName", query.vpc_name.as_deref())
            .opt("vpcState", query.vpc_state.as_deref())
            .opt("serviceZoneId", query.service_zone_id.as_deref())
            .page(page);
        self.http.get("/vpc/v2/vpcs", &query).await
    }

    /// True when a VPC with `name` already exists in the project
    pub async fn is_name_duplicated(&self, name: &str) -> ClientResult<bool> {
        let query = Query::new().param("vpcName", name);
        let check: CheckResponse = self
            .http
            .get("/vpc/v2/vpcs/vpc-name-duplication", &query)
            .await?;
        Ok(check.result)
    }
}
