//! Project service: service zones available to the configured project

use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{ListResponse, Query};

/// A service zone; `service_zone_location` is the region name users write
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceZone {
    pub service_zone_id: String,
    pub service_zone_name: String,
    pub service_zone_location: String,
    pub is_multi_availability_zone: bool,
}

#[derive(Clone)]
pub struct ProjectClient {
    http: HttpClient,
}

impl ProjectClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list_service_zones(&self) -> ClientResult<Vec<ServiceZone>> {
        let list: ListResponse<ServiceZone> = self
            .http
            .get("/project/v2/service-zones", &Query::new())
            .await?;
        Ok(list.contents)
    }

    /// Service zone whose location or name equals `region`
    pub async fn find_service_zone(&self, region: &str) -> ClientResult<Option<ServiceZone>> {
        let zones = self.list_service_zones().await?;
        Ok(zones.into_iter().find(|z| {
            z.service_zone_location.eq_ignore_ascii_case(region)
                || z.service_zone_name.eq_ignore_ascii_case(region)
        }))
    }
}
