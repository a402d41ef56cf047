use crate::error::ClientError;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use zoekt_nav_core::NavConfig;
use zoekt_nav_protocol::SearchRequest;
use zoekt_nav_protocol::SearchResponse;

const SEARCH_PATH: &str = "/api/search";

/// Sends a query to a Zoekt backend.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;
}

#[async_trait]
impl<T: SearchTransport + ?Sized> SearchTransport for Arc<T> {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        (**self).search(request).await
    }
}

/// JSON client for `zoekt-webserver`'s `/api/search`.
#[derive(Clone, Debug)]
pub struct ZoektClient {
    http: reqwest::Client,
    base_url: String,
}

impl ZoektClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &NavConfig) -> Result<Self> {
        Self::new(
            config.backend_url()?,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SearchTransport for ZoektClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = format!("{}{SEARCH_PATH}", self.base_url);
        debug!("POST {url} q={:?}", request.query);
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(request)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;
    use wiremock::matchers::body_partial_json;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use zoekt_nav_protocol::SearchOptions;

    fn client(server: &MockServer) -> ZoektClient {
        ZoektClient::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn posts_query_and_decodes_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_partial_json(json!({
                "Q": "needle",
                "Opts": { "NumContextLines": 0, "MaxDocDisplayCount": 100 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Result": {
                    "Duration": 5_000_000,
                    "FileCount": 1,
                    "MatchCount": 1,
                    "Files": [{
                        "FileName": "a.rs",
                        "Repository": "github.com/acme/web",
                        "Branches": ["main"],
                        "Version": "v1",
                        "LineMatches": null
                    }],
                    "RepoURLs": null,
                    "LineFragments": {}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .search(&SearchRequest::new("needle", SearchOptions::default()))
            .await
            .unwrap();
        assert_eq!(response.result.duration_ms(), 5);
        assert_eq!(response.result.files.len(), 1);
        assert!(response.result.files[0].line_matches.is_empty());
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("shard crashed"))
            .mount(&server)
            .await;

        let err = client(&server)
            .search(&SearchRequest::new("needle", SearchOptions::default()))
            .await
            .unwrap_err();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "shard crashed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn from_config_requires_url() {
        let err = ZoektClient::from_config(&NavConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let config = NavConfig {
            url: Some("http://zoekt:6070/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ZoektClient::from_config(&config).unwrap().base_url(),
            "http://zoekt:6070"
        );
    }
}
