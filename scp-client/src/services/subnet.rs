//! Subnet service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{AsyncResponse, CheckResponse, ListResponse, PageRequest, Query};
use crate::services::tag::Tag;

pub const SUBNET_TYPES: &[&str] = &["PUBLIC", "PRIVATE", "LOCAL"];

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnet {
    pub subnet_id: String,
    pub subnet_name: String,
    pub subnet_description: String,
    pub subnet_state: String,
    pub subnet_type: String,
    pub subnet_cidr_block: String,
    pub subnet_gateway_ip_address: String,
    pub vpc_id: String,
    pub created_by: String,
    pub created_dt: Option<DateTime<Utc>>,
    pub modified_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubnetRequest {
    pub vpc_id: String,
    pub subnet_name: String,
    pub subnet_type: String,
    pub subnet_cidr_block: String,
    pub subnet_description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default)]
pub struct SubnetListQuery {
    pub vpc_id: Option<String>,
    pub subnet_name: Option<String>,
    pub subnet_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDescriptionRequest<'a> {
    subnet_description: &'a str,
}

#[derive(Clone)]
pub struct SubnetClient {
    http: HttpClient,
}

impl SubnetClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create(&self, request: &CreateSubnetRequest) -> ClientResult<AsyncResponse> {
        self.http.post("/subnet/v2/subnets", request).await
    }

    pub async fn get(&self, subnet_id: &str) -> ClientResult<Subnet> {
        self.http
            .get(&format!("/subnet/v2/subnets/{}", subnet_id), &Query::new())
            .await
    }

    pub async fn update_description(
        &self,
        subnet_id: &str,
        description: &str,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("/subnet/v2/subnets/{}/description", subnet_id),
                &UpdateDescriptionRequest {
                    subnet_description: description,
                },
            )
            .await
    }

    pub async fn delete(&self, subnet_id: &str) -> ClientResult<Option<AsyncResponse>> {
        self.http
            .delete(&format!("/subnet/v2/subnets/{}", subnet_id))
            .await
    }

    pub async fn list(
        &self,
        query: &SubnetListQuery,
        page: PageRequest,
    ) -> ClientResult<ListResponse<Subnet>> {
        let query = Query::new()
            .opt("vpcId", query.vpc_id.as_deref())
            .opt("subnetName", query.subnet_name.as_deref())
            .opt("subnetType", query.subnet_type.as_deref())
            .page(page);
        self.http.get("/subnet/v2/subnets", &query).await
    }

    /// True when `cidr` overlaps a subnet already present in the VPC
    pub async fn is_cidr_duplicated(&self, vpc_id: &str, cidr: &str) -> ClientResult<bool> {
        let query = Query::new()
            .param("vpcId", vpc_id)
            .param("subnetCidrBlock", cidr);
        let check: CheckResponse = self
            .http
            .get("/subnet/v2/subnets/subnet-cidr-range-duplication", &query)
            .await?;
        Ok(check.result)
    }
}
