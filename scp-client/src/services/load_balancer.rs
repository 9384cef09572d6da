//! Load balancer service and its child objects
//!
//! Profiles, server groups and services live under their load balancer and
//! are always addressed through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{AsyncResponse, CheckResponse, ListResponse, PageRequest, Query};
use crate::services::tag::Tag;

pub const LB_SIZES: &[&str] = &["SMALL", "MEDIUM", "LARGE"];
pub const LAYER_TYPES: &[&str] = &["L4", "L7"];
pub const LB_METHODS: &[&str] = &["ROUND_ROBIN", "LEAST_CONNECTION", "IP_HASH"];

const BASE: &str = "/load-balancer/v2/load-balancers";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadBalancer {
    pub load_balancer_id: String,
    pub load_balancer_name: String,
    pub load_balancer_description: String,
    pub load_balancer_size: String,
    pub load_balancer_state: String,
    pub vpc_id: String,
    pub service_ip_cidr_block: String,
    pub link_ip_cidr_block: String,
    pub firewall_enabled: bool,
    pub service_zone_id: String,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoadBalancerRequest {
    pub load_balancer_name: String,
    pub load_balancer_description: String,
    pub load_balancer_size: String,
    pub vpc_id: String,
    pub service_ip_cidr_block: String,
    pub firewall_enabled: bool,
    pub service_zone_id: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadBalancerListQuery {
    pub load_balancer_name: Option<String>,
    pub vpc_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LbProfile {
    pub lb_profile_id: String,
    pub lb_profile_name: String,
    pub lb_profile_state: String,
    pub layer_type: String,
    pub session_idle_timeout: i64,
    pub redirect_type: String,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLbProfileRequest {
    pub lb_profile_name: String,
    pub layer_type: String,
    pub session_idle_timeout: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub redirect_type: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLbProfileRequest {
    pub session_idle_timeout: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub redirect_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LbServerGroupMember {
    pub object_id: String,
    pub object_port: i64,
    pub weight: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LbHealthCheck {
    pub protocol: String,
    pub port: i64,
    pub interval_seconds: i64,
    pub timeout_seconds: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LbServerGroup {
    pub lb_server_group_id: String,
    pub lb_server_group_name: String,
    pub lb_server_group_state: String,
    pub lb_method: String,
    pub protocol: String,
    pub health_check: Option<LbHealthCheck>,
    pub lb_server_group_members: Vec<LbServerGroupMember>,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLbServerGroupRequest {
    pub lb_server_group_name: String,
    pub lb_method: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<LbHealthCheck>,
    pub lb_server_group_members: Vec<LbServerGroupMember>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLbServerGroupRequest {
    pub lb_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<LbHealthCheck>,
    pub lb_server_group_members: Vec<LbServerGroupMember>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LbServiceRule {
    pub lb_server_group_id: String,
    pub pattern_url: String,
    pub seq: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LbService {
    pub lb_service_id: String,
    pub lb_service_name: String,
    pub lb_service_state: String,
    pub layer_type: String,
    pub protocol: String,
    pub service_port: i64,
    pub service_ip_address: String,
    pub application_profile_id: String,
    pub lb_service_rules: Vec<LbServiceRule>,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLbServiceRequest {
    pub lb_service_name: String,
    pub layer_type: String,
    pub protocol: String,
    pub service_port: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service_ip_address: String,
    pub application_profile_id: String,
    pub lb_service_rules: Vec<LbServiceRule>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLbServiceRequest {
    pub service_port: i64,
    pub application_profile_id: String,
    pub lb_service_rules: Vec<LbServiceRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDescriptionRequest<'a> {
    load_balancer_description: &'a str,
}

#[derive(Clone)]
pub struct LoadBalancerClient {
    http: HttpClient,
}

impl LoadBalancerClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    // =========================================================================
    // Load balancers
    // =========================================================================

    pub async fn create(&self, request: &CreateLoadBalancerRequest) -> ClientResult<AsyncResponse> {
        self.http.post(BASE, request).await
    }

    pub async fn get(&self, lb_id: &str) -> ClientResult<LoadBalancer> {
        self.http
            .get(&format!("{}/{}", BASE, lb_id), &Query::new())
            .await
    }

    pub async fn update_description(
        &self,
        lb_id: &str,
        description: &str,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}/description", BASE, lb_id),
                &UpdateDescriptionRequest {
                    load_balancer_description: description,
                },
            )
            .await
    }

    pub async fn delete(&self, lb_id: &str) -> ClientResult<Option<AsyncResponse>> {
        self.http.delete(&format!("{}/{}", BASE, lb_id)).await
    }

    pub async fn list(
        &self,
        query: &LoadBalancerListQuery,
        page: PageRequest,
    ) -> ClientResult<ListResponse<LoadBalancer>> {
        let query = Query::new()
            .opt("loadBalancerName", query.load_balancer_name.as_deref())
            .opt("vpcId", query.vpc_id.as_deref())
            .page(page);
        self.http.get(BASE, &query).await
    }

    pub async fn is_name_duplicated(&self, name: &str) -> ClientResult<bool> {
        let query = Query::new().param("loadBalancerName", name);
        let check: CheckResponse = self
            .http
            .get(&format!("{}/name-duplication", BASE), &query)
            .await?;
        Ok(check.result)
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    pub async fn create_profile(
        &self,
        lb_id: &str,
        request: &CreateLbProfileRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .post(&format!("{}/{}/lb-profiles", BASE, lb_id), request)
            .await
    }

    pub async fn get_profile(&self, lb_id: &str, profile_id: &str) -> ClientResult<LbProfile> {
        self.http
            .get(
                &format!("{}/{}/lb-profiles/{}", BASE, lb_id, profile_id),
                &Query::new(),
            )
            .await
    }

    pub async fn update_profile(
        &self,
        lb_id: &str,
        profile_id: &str,
        request: &UpdateLbProfileRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}/lb-profiles/{}", BASE, lb_id, profile_id),
                request,
            )
            .await
    }

    pub async fn delete_profile(
        &self,
        lb_id: &str,
        profile_id: &str,
    ) -> ClientResult<Option<AsyncResponse>> {
        self.http
            .delete(&format!("{}/{}/lb-profiles/{}", BASE, lb_id, profile_id))
            .await
    }

    // =========================================================================
    // Server groups
    // =========================================================================

    pub async fn create_server_group(
        &self,
        lb_id: &str,
        request: &CreateLbServerGroupRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .post(&format!("{}/{}/lb-server-groups", BASE, lb_id), request)
            .await
    }

    pub async fn get_server_group(
        &self,
        lb_id: &str,
        group_id: &str,
    ) -> ClientResult<LbServerGroup> {
        self.http
            .get(
                &format!("{}/{}/lb-server-groups/{}", BASE, lb_id, group_id),
                &Query::new(),
            )
            .await
    }

    pub async fn update_server_group(
        &self,
        lb_id: &str,
        group_id: &str,
        request: &UpdateLbServerGroupRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}/lb-server-groups/{}", BASE, lb_id, group_id),
                request,
            )
            .await
    }

    pub async fn delete_server_group(
        &self,
        lb_id: &str,
        group_id: &str,
    ) -> ClientResult<Option<AsyncResponse>> {
        self.http
            .delete(&format!("{}/{}/lb-server-groups/{}", BASE, lb_id, group_id))
            .await
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub async fn create_service(
        &self,
        lb_id: &str,
        request: &CreateLbServiceRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .post(&format!("{}/{}/lb-services", BASE, lb_id), request)
            .await
    }

    pub async fn get_service(&self, lb_id: &str, service_id: &str) -> ClientResult<LbService> {
        self.http
            .get(
                &format!("{}/{}/lb-services/{}", BASE, lb_id, service_id),
                &Query::new(),
            )
            .await
    }

    pub async fn update_service(
        &self,
        lb_id: &str,
        service_id: &str,
        request: &UpdateLbServiceRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}/lb-services/{}", BASE, lb_id, service_id),
                request,
            )
            .await
    }

    pub async fn delete_service(
        &self,
        lb_id: &str,
        service_id: &str,
    ) -> ClientResult<Option<AsyncResponse>> {
        self.http
            .delete(&format!("{}/{}/lb-services/{}", BASE, lb_id, service_id))
            .await
    }
}
