use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Result};

/// Characters `encodeURIComponent` leaves alone.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Issues GET requests against API paths such as `/organizations/acme/repos/`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;
}

pub struct SentryClient {
    client: Client,
    base_url: String,
}

impl SentryClient {
    pub fn new(base_url: &str, token: Option<&str>) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(concat!("release-card/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ApiClient for SentryClient {
    async fn get(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn encodes_like_encode_uri_component() {
        assert_eq!(encode_path_segment("1.2.3"), "1.2.3");
        assert_eq!(encode_path_segment("a/b?c"), "a%2Fb%3Fc");
        assert_eq!(encode_path_segment("pkg@1.0+build"), "pkg%401.0%2Bbuild");
        assert_eq!(encode_path_segment("it's (ok)!~*"), "it's%20(ok)!~*");
    }

    #[tokio::test]
    async fn sends_token_and_parses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/0/organizations/acme/repos/")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"name": "acme/web"}]"#)
            .create_async()
            .await;

        let base = format!("{}/api/0/", server.url());
        let client = SentryClient::new(&base, Some("secret")).unwrap();
        let value = client.get("/organizations/acme/repos/").await.unwrap();

        assert_eq!(value, json!([{"name": "acme/web"}]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/acme/repos/")
            .with_status(403)
            .create_async()
            .await;

        let client = SentryClient::new(&server.url(), None).unwrap();
        let err = client.get("/organizations/acme/repos/").await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::Status { status, .. } if status == reqwest::StatusCode::FORBIDDEN
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/organizations/acme/repos/")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let client = SentryClient::new(&server.url(), None).unwrap();
        let err = client.get("/organizations/acme/repos/").await.unwrap_err();

        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
