//! Product catalogue: server types a service can scale to

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::http::HttpClient;
use crate::page::{ListResponse, PageRequest, Query};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScaleProduct {
    pub product_id: String,
    pub product_group: String,
    /// Server type name passed to scale calls, e.g. `db1v2m4`
    pub server_type: String,
    pub cpu_count: i64,
    pub memory_size_gb: i64,
}

#[derive(Clone)]
pub struct ProductClient {
    http: HttpClient,
}

impl ProductClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list_scale_products(&self, product_group: &str) -> ClientResult<Vec<ScaleProduct>> {
        let query = Query::new()
            .param("productGroup", product_group)
            .page(PageRequest::all());
        let list: ListResponse<ScaleProduct> =
            self.http.get("/product/v2/scale-products", &query).await?;
        Ok(list.contents)
    }

    /// Product matching the requested CPU and memory sizes
    pub async fn resolve_scale_product(
        &self,
        product_group: &str,
        cpu_count: i64,
        memory_size_gb: i64,
    ) -> ClientResult<ScaleProduct> {
        self.list_scale_products(product_group)
            .await?
            .into_iter()
            .find(|p| p.cpu_count == cpu_count && p.memory_size_gb == memory_size_gb)
            .ok_or_else(|| {
                ClientError::InvalidRequest(format!(
                    "no {} product with {} vCPU and {} GB memory",
                    product_group, cpu_count, memory_size_gb
                ))
            })
    }
}
