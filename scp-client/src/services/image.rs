//! Image service: standard OS images

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{ListResponse, PageRequest, Query};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StandardImage {
    pub image_id: String,
    pub image_name: String,
    pub image_state: String,
    pub os_type: String,
    pub service_group: String,
    pub service: String,
    pub product_group: String,
    pub service_zone_id: String,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct StandardImageQuery {
    /// e.g. `COMPUTE`, `DATABASE`
    pub service_group: Option<String>,
    /// e.g. `Virtual Server`, `PostgreSQL`
    pub service: Option<String>,
    pub service_zone_id: Option<String>,
}

#[derive(Clone)]
pub struct ImageClient {
    http: HttpClient,
}

impl ImageClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list_standard_images(
        &self,
        query: &StandardImageQuery,
        page: PageRequest,
    ) -> ClientResult<ListResponse<StandardImage>> {
        let query = Query::new()
            .opt("serviceGroup", query.service_group.as_deref())
            .opt("service", query.service.as_deref())
            .opt("serviceZoneId", query.service_zone_id.as_deref())
            .page(page);
        self.http.get("/image/v2/standard-images", &query).await
    }
}
