//! PostgreSQL database clusters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{AsyncResponse, Query};
use crate::services::tag::Tag;

pub const STATE_RUNNING: &str = "RUNNING";
pub const STATE_CREATING: &str = "CREATING";
pub const STATE_EDITING: &str = "EDITING";
pub const STATE_TERMINATING: &str = "TERMINATING";

/// Server states while a scale request is applied
pub const SCALE_PENDING_STATES: &[&str] = &["Scale Out", "Scale Up", "Attach to LB", "EDITING"];
pub const SCALE_TARGET_STATES: &[&str] = &["In Service", "RUNNING"];

const BASE: &str = "/postgresql/v2/clusters";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseServer {
    pub server_id: String,
    pub server_name: String,
    pub server_role: String,
    pub server_state: String,
    pub server_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PostgresqlCluster {
    pub database_cluster_id: String,
    pub database_cluster_name: String,
    pub database_cluster_state: String,
    pub database_name: String,
    pub database_user_name: String,
    pub database_port: i64,
    pub database_version: String,
    pub image_id: String,
    pub server_type: String,
    pub subnet_id: String,
    pub service_zone_id: String,
    pub block_storage_size_gb: i64,
    pub servers: Vec<DatabaseServer>,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostgresqlClusterRequest {
    pub database_cluster_name: String,
    pub database_name: String,
    pub database_user_name: String,
    pub database_user_password: String,
    pub database_port: i64,
    pub image_id: String,
    pub server_type: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    pub service_zone_id: String,
    pub block_storage_size_gb: i64,
    pub timezone: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScaleRequest<'a> {
    server_type: &'a str,
}

#[derive(Clone)]
pub struct PostgresqlClient {
    http: HttpClient,
}

impl PostgresqlClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create(
        &self,
        request: &CreatePostgresqlClusterRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http.post(BASE, request).await
    }

    pub async fn get(&self, cluster_id: &str) -> ClientResult<PostgresqlCluster> {
        self.http
            .get(&format!("{}/{}", BASE, cluster_id), &Query::new())
            .await
    }

    pub async fn delete(&self, cluster_id: &str) -> ClientResult<Option<AsyncResponse>> {
        self.http.delete(&format!("{}/{}", BASE, cluster_id)).await
    }

    /// Change the server type (CPU/memory product) of one cluster member
    pub async fn scale_server_type(
        &self,
        cluster_id: &str,
        server_id: &str,
        server_type: &str,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}/servers/{}/server-type", BASE, cluster_id, server_id),
                &ScaleRequest { server_type },
            )
            .await
    }
}
