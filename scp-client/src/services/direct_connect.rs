//! Direct connect: dedicated lines into a service zone

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{AsyncResponse, Query};
use crate::services::tag::Tag;

pub const BANDWIDTHS_GBPS: &[i64] = &[1, 10];

const BASE: &str = "/direct-connect/v2/direct-connects";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectConnect {
    pub direct_connect_id: String,
    pub direct_connect_name: String,
    pub direct_connect_description: String,
    pub direct_connect_state: String,
    pub bandwidth_gbps: i64,
    pub service_zone_id: String,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDirectConnectRequest {
    pub direct_connect_name: String,
    pub direct_connect_description: String,
    pub bandwidth_gbps: i64,
    pub service_zone_id: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDescriptionRequest<'a> {
    direct_connect_description: &'a str,
}

#[derive(Clone)]
pub struct DirectConnectClient {
    http: HttpClient,
}

impl DirectConnectClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create(&self, request: &CreateDirectConnectRequest) -> ClientResult<AsyncResponse> {
        self.http.post(BASE, request).await
    }

    pub async fn get(&self, id: &str) -> ClientResult<DirectConnect> {
        self.http
            .get(&format!("{}/{}", BASE, id), &Query::new())
            .await
    }

    pub async fn update_description(
        &self,
        id: &str,
        description: &str,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}/description", BASE, id),
                &UpdateDescriptionRequest {
                    direct_connect_description: description,
                },
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> ClientResult<Option<AsyncResponse>> {
        self.http.delete(&format!("{}/{}", BASE, id)).await
    }
}
