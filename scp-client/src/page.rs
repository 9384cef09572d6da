//! Pagination, query strings and the common response envelopes

use serde::{Deserialize, Serialize};

/// Page selector sent as `page` / `size` query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// One large page, used when the provider enumerates internally
    pub fn all() -> Self {
        Self {
            page: 0,
            size: 10000,
        }
    }
}

/// Query string parameters in insertion order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query(Vec<(&'static str, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Add `key` only when a non-empty value is present
    pub fn opt(self, key: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.param(key, v),
            _ => self,
        }
    }

    pub fn page(self, page: PageRequest) -> Self {
        self.param("page", page.page).param("size", page.size)
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `{"contents": [...], "totalCount": n}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub contents: Vec<T>,
    #[serde(default)]
    pub total_count: i64,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            contents: Vec::new(),
            total_count: 0,
        }
    }
}

/// Answer of an asynchronous mutation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AsyncResponse {
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub request_id: String,
}

/// `{"result": bool}` answer of the duplication checks
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub result: bool,
}
