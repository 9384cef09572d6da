//! HTTP transport for the SCP OpenAPI
//!
//! Signs every request, logs the request line and turns non-2xx answers
//! into [`ClientError::Api`] with the status code attached.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::page::Query;

pub const HEADER_ACCESS_KEY: &str = "X-Cmp-AccessKey";
pub const HEADER_TIMESTAMP: &str = "X-Cmp-Timestamp";
pub const HEADER_CLIENT_TYPE: &str = "X-Cmp-ClientType";
pub const HEADER_PROJECT_ID: &str = "X-Cmp-ProjectId";
pub const HEADER_SIGNATURE: &str = "X-Cmp-Signature";
pub const CLIENT_TYPE: &str = "OpenApi";

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body and strip control characters before logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };
    truncated.replace(|c: char| c.is_control(), "")
}

/// base64(HMAC-SHA256(secret, method + url + timestamp + access key + project + client type))
pub fn signature(
    secret_key: &str,
    method: &str,
    url: &str,
    timestamp: &str,
    access_key: &str,
    project_id: &str,
) -> ClientResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret_key.as_bytes())
        .map_err(|e| ClientError::InvalidRequest(format!("HMAC-SHA256 key error: {e}")))?;
    mac.update(method.as_bytes());
    mac.update(url.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(access_key.as_bytes());
    mac.update(project_id.as_bytes());
    mac.update(CLIENT_TYPE.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    message: Option<String>,
}

/// Signed HTTP client shared by every sub-client
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> ClientResult<T> {
        self.send(Method::GET, path, query, None::<&()>).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, &Query::new(), Some(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PUT, path, &Query::new(), Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(Method::DELETE, path, &Query::new(), None::<&()>).await
    }

    /// DELETE carrying a JSON body (bulk deletes such as routing rules)
    pub async fn delete_with_body<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::DELETE, path, &Query::new(), Some(body)).await
    }

    fn url(&self, path: &str, query: &Query) -> ClientResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.config.endpoint, path))
            .map_err(|e| ClientError::InvalidRequest(format!("invalid URL for {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        Ok(url)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        log::debug!("{} {}", method, url);

        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let signature = signature(
            &self.config.secret_key,
            method.as_str(),
            url.as_str(),
            &timestamp,
            &self.config.access_key,
            &self.config.project_id,
        )?;

        let mut request = self
            .client
            .request(method, url)
            .header(HEADER_ACCESS_KEY, &self.config.access_key)
            .header(HEADER_TIMESTAMP, &timestamp)
            .header(HEADER_CLIENT_TYPE, CLIENT_TYPE)
            .header(HEADER_PROJECT_ID, &self.config.project_id)
            .header(HEADER_SIGNATURE, signature);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::debug!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(api_error(status.as_u16(), &text));
        }

        // Empty bodies decode as null, which fits `()` and `Option<_>`
        let text = if text.trim().is_empty() {
            "null"
        } else {
            text.as_str()
        };
        serde_json::from_str(text).map_err(|source| ClientError::Decode {
            status: status.as_u16(),
            source,
        })
    }
}

fn api_error(status: u16, text: &str) -> ClientError {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody { code, message }) => ClientError::Api {
            status,
            code: code.map(|c| match c {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            message: message.unwrap_or_else(|| format!("request failed with status {}", status)),
        },
        Err(_) => ClientError::Api {
            status,
            code: None,
            message: if text.trim().is_empty() {
                format!("request failed with status {}", status)
            } else {
                sanitize_for_log(text)
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        let a = signature("secret", "GET", "https://x/vpc", "1700000000000", "ak", "p").unwrap();
        let b = signature("secret", "GET", "https://x/vpc", "1700000000000", "ak", "p").unwrap();
        assert_eq!(a, b);
        // 32-byte digest in base64
        assert_eq!(STANDARD.decode(&a).unwrap().len(), 32);
    }

    #[test]
    fn signature_covers_every_component() {
        let base = signature("secret", "GET", "https://x/vpc", "1", "ak", "p").unwrap();
        assert_ne!(base, signature("other", "GET", "https://x/vpc", "1", "ak", "p").unwrap());
        assert_ne!(base, signature("secret", "POST", "https://x/vpc", "1", "ak", "p").unwrap());
        assert_ne!(base, signature("secret", "GET", "https://x/subnet", "1", "ak", "p").unwrap());
        assert_ne!(base, signature("secret", "GET", "https://x/vpc", "2", "ak", "p").unwrap());
        assert_ne!(base, signature("secret", "GET", "https://x/vpc", "1", "ak2", "p").unwrap());
        assert_ne!(base, signature("secret", "GET", "https://x/vpc", "1", "ak", "p2").unwrap());
    }

    #[test]
    fn api_error_reads_code_and_message() {
        let err = api_error(409, r#"{"code":"DUPLICATED","message":"name in use"}"#);
        match err {
            ClientError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(code.as_deref(), Some("DUPLICATED"));
                assert_eq!(message, "name in use");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error(502, "<html>bad gateway</html>");
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.len() < body.len());
        assert!(sanitized.contains("500 bytes total"));
    }
}
