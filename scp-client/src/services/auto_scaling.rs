//! Auto-scaling groups and their scaling policies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{AsyncResponse, CheckResponse, ListResponse, PageRequest, Query};
use crate::services::tag::Tag;

pub const STATE_IN_SERVICE: &str = "IN SERVICE";
pub const STATE_TERMINATING: &str = "TERMINATING";

pub const POLICY_TYPES: &[&str] = &["SCALE_OUT", "SCALE_IN"];
pub const METRIC_TYPES: &[&str] = &["CPU", "MEMORY", "NETWORK_IN", "NETWORK_OUT"];
pub const COMPARISON_OPERATORS: &[&str] = &["GE", "GT", "LE", "LT"];
pub const SCALE_METHODS: &[&str] = &["COUNT", "PERCENT", "FIXED"];

const BASE: &str = "/auto-scaling/v2/auto-scaling-groups";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoScalingGroup {
    pub asg_id: String,
    pub asg_name: String,
    pub asg_state: String,
    pub image_id: String,
    pub server_type: String,
    pub vpc_id: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub lb_server_group_ids: Vec<String>,
    pub desired_server_count: i64,
    pub min_server_count: i64,
    pub max_server_count: i64,
    pub service_zone_id: String,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAutoScalingGroupRequest {
    pub asg_name: String,
    pub image_id: String,
    pub server_type: String,
    pub vpc_id: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub lb_server_group_ids: Vec<String>,
    pub desired_server_count: i64,
    pub min_server_count: i64,
    pub max_server_count: i64,
    pub service_zone_id: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServerCountRequest {
    pub desired_server_count: i64,
    pub min_server_count: i64,
    pub max_server_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AutoScalingGroupListQuery {
    pub asg_name: Option<String>,
    pub vpc_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoScalingPolicy {
    pub policy_id: String,
    pub policy_name: String,
    pub policy_type: String,
    pub metric_type: String,
    pub comparison_operator: String,
    pub threshold: i64,
    pub evaluation_minutes: i64,
    pub scale_method: String,
    pub scale_value: i64,
    pub cooldown_seconds: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRequest {
    pub policy_name: String,
    pub policy_type: String,
    pub metric_type: String,
    pub comparison_operator: String,
    pub threshold: i64,
    pub evaluation_minutes: i64,
    pub scale_method: String,
    pub scale_value: i64,
    pub cooldown_seconds: i64,
}

#[derive(Clone)]
pub struct AutoScalingClient {
    http: HttpClient,
}

impl AutoScalingClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create(
        &self,
        request: &CreateAutoScalingGroupRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http.post(BASE, request).await
    }

    pub async fn get(&self, asg_id: &str) -> ClientResult<AutoScalingGroup> {
        self.http
            .get(&format!("{}/{}", BASE, asg_id), &Query::new())
            .await
    }

    pub async fn update_server_count(
        &self,
        asg_id: &str,
        request: &ServerCountRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(&format!("{}/{}/server-count", BASE, asg_id), request)
            .await
    }

    pub async fn delete(&self, asg_id: &str) -> ClientResult<Option<AsyncResponse>> {
        self.http.delete(&format!("{}/{}", BASE, asg_id)).await
    }

    pub async fn list(
        &self,
        query: &AutoScalingGroupListQuery,
        page: PageRequest,
    ) -> ClientResult<ListResponse<AutoScalingGroup>> {
        let query = Query::new()
            .opt("asgName", query.asg_name.as_deref())
            .opt("vpcId", query.vpc_id.as_deref())
            .page(page);
        self.http.get(BASE, &query).await
    }

    pub async fn is_name_duplicated(&self, name: &str) -> ClientResult<bool> {
        let query = Query::new().param("asgName", name);
        let check: CheckResponse = self
            .http
            .get(&format!("{}/name-duplication", BASE), &query)
            .await?;
        Ok(check.result)
    }

    // Policies change synchronously; no state to wait for

    pub async fn create_policy(
        &self,
        asg_id: &str,
        request: &PolicyRequest,
    ) -> ClientResult<AutoScalingPolicy> {
        self.http
            .post(&format!("{}/{}/policies", BASE, asg_id), request)
            .await
    }

    pub async fn get_policy(&self, asg_id: &str, policy_id: &str) -> ClientResult<AutoScalingPolicy> {
        self.http
            .get(
                &format!("{}/{}/policies/{}", BASE, asg_id, policy_id),
                &Query::new(),
            )
            .await
    }

    pub async fn update_policy(
        &self,
        asg_id: &str,
        policy_id: &str,
        request: &PolicyRequest,
    ) -> ClientResult<AutoScalingPolicy> {
        self.http
            .put(
                &format!("{}/{}/policies/{}", BASE, asg_id, policy_id),
                request,
            )
            .await
    }

    pub async fn delete_policy(&self, asg_id: &str, policy_id: &str) -> ClientResult<()> {
        let _: Option<serde_json::Value> = self
            .http
            .delete(&format!("{}/{}/policies/{}", BASE, asg_id, policy_id))
            .await?;
        Ok(())
    }
}
