//! DNS domains and records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::http::HttpClient;
use crate::page::{AsyncResponse, CheckResponse, ListResponse, PageRequest, Query};
use crate::services::tag::Tag;

pub const RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX", "TXT", "SPF"];

const BASE: &str = "/dns/v2/dns-domains";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsDomain {
    pub dns_domain_id: String,
    pub dns_domain_name: String,
    pub dns_root_domain_name: String,
    pub dns_domain_state: String,
    pub dns_description: String,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDnsDomainRequest {
    pub dns_domain_name: String,
    pub dns_root_domain_name: String,
    pub dns_description: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsRecordMapping {
    pub record_destination: String,
    pub preference: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DnsRecord {
    pub dns_record_id: String,
    pub dns_record_name: String,
    pub dns_record_type: String,
    pub dns_record_state: String,
    pub ttl: i64,
    pub dns_record_mapping: Vec<DnsRecordMapping>,
    pub created_dt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDnsRecordRequest {
    pub dns_record_name: String,
    pub dns_record_type: String,
    pub ttl: i64,
    pub dns_record_mapping: Vec<DnsRecordMapping>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDnsRecordRequest {
    pub ttl: i64,
    pub dns_record_mapping: Vec<DnsRecordMapping>,
}

#[derive(Debug, Clone, Default)]
pub struct DnsRecordListQuery {
    pub dns_record_name: Option<String>,
    pub dns_record_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateDomainRequest<'a> {
    dns_description: &'a str,
}

#[derive(Clone)]
pub struct DnsClient {
    http: HttpClient,
}

impl DnsClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create_domain(
        &self,
        request: &CreateDnsDomainRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http.post(BASE, request).await
    }

    pub async fn get_domain(&self, domain_id: &str) -> ClientResult<DnsDomain> {
        self.http
            .get(&format!("{}/{}", BASE, domain_id), &Query::new())
            .await
    }

    pub async fn update_domain_description(
        &self,
        domain_id: &str,
        description: &str,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}", BASE, domain_id),
                &UpdateDomainRequest {
                    dns_description: description,
                },
            )
            .await
    }

    pub async fn delete_domain(&self, domain_id: &str) -> ClientResult<Option<AsyncResponse>> {
        self.http.delete(&format!("{}/{}", BASE, domain_id)).await
    }

    pub async fn list_domains(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> ClientResult<ListResponse<DnsDomain>> {
        let query = Query::new().opt("dnsDomainName", name).page(page);
        self.http.get(BASE, &query).await
    }

    pub async fn is_name_duplicated(&self, name: &str) -> ClientResult<bool> {
        let query = Query::new().param("dnsDomainName", name);
        let check: CheckResponse = self
            .http
            .get(&format!("{}/name-duplication", BASE), &query)
            .await?;
        Ok(check.result)
    }

    pub async fn create_record(
        &self,
        domain_id: &str,
        request: &CreateDnsRecordRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .post(&format!("{}/{}/dns-records", BASE, domain_id), request)
            .await
    }

    pub async fn get_record(&self, domain_id: &str, record_id: &str) -> ClientResult<DnsRecord> {
        self.http
            .get(
                &format!("{}/{}/dns-records/{}", BASE, domain_id, record_id),
                &Query::new(),
            )
            .await
    }

    pub async fn update_record(
        &self,
        domain_id: &str,
        record_id: &str,
        request: &UpdateDnsRecordRequest,
    ) -> ClientResult<AsyncResponse> {
        self.http
            .put(
                &format!("{}/{}/dns-records/{}", BASE, domain_id, record_id),
                request,
            )
            .await
    }

    pub async fn delete_record(
        &self,
        domain_id: &str,
        record_id: &str,
    ) -> ClientResult<Option<AsyncResponse>> {
        self.http
            .delete(&format!("{}/{}/dns-records/{}", BASE, domain_id, record_id))
            .await
    }

    /// Records in the order the server returns them
    pub async fn list_records(
        &self,
        domain_id: &str,
        query: &DnsRecordListQuery,
        page: PageRequest,
    ) -> ClientResult<ListResponse<DnsRecord>> {
        let query = Query::new()
            .opt("dnsRecordName", query.dns_record_name.as_deref())
            .opt("dnsRecordType", query.dns_record_type.as_deref())
            .page(page);
        self.http
            .get(&format!("{}/{}/dns-records", BASE, domain_id), &query)
            .await
    }
}
