//! HTTP client for the MCP memory service REST API.

use super::{BackendStats, Capability, CapabilityClient, ClientError, MemoryItem, StoredMemory};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Live [`CapabilityClient`] talking to a running memory service.
pub struct HttpMemoryClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMemoryClient {
    /// Build a client for `base_url`, bounding every request by `timeout`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("memprobe/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Unavailable(err.to_string()))?;
        let base_url = normalize_base_url(base_url).map_err(ClientError::Validation)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = api_key.as_deref().is_some_and(|key| !key.is_empty()),
            timeout_secs = timeout.as_secs(),
            "Initialized memory service HTTP client"
        );
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(
            &config.service_url,
            config.api_key.clone(),
            config.probe_timeout,
        )
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.bearer_auth(api_key);
        }
        req
    }

    async fn send<T: DeserializeOwned>(
        &self,
        capability: Capability,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = req.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|err| {
                tracing::error!(%capability, error = %err, "Undecodable memory service response");
                ClientError::Unavailable(format!("unexpected response body: {err}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let error = status_error(capability, status, body);
        tracing::error!(%capability, %status, error = %error, "Memory service request failed");
        Err(error)
    }
}

#[async_trait]
impl CapabilityClient for HttpMemoryClient {
    async fn store(&self, item: &MemoryItem) -> Result<String, ClientError> {
        item.validate()?;
        let req = self.request(Method::POST, "api/memories").json(item);
        let response: StoreResponse = self.send(Capability::Store, req).await?;
        if !response.success {
            return Err(ClientError::Validation(
                response
                    .message
                    .unwrap_or_else(|| "memory service rejected the item".into()),
            ));
        }
        response.content_hash.ok_or_else(|| {
            ClientError::Unavailable("store response did not include a content hash".into())
        })
    }

    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<StoredMemory>, ClientError> {
        let req = self
            .request(Method::POST, "api/search")
            .json(&json!({ "query": query, "n_results": limit }));
        let response: SearchResponse = self.send(Capability::Retrieve, req).await?;
        Ok(response.into_memories())
    }

    async fn search_by_tag(&self, tags: &[String]) -> Result<Vec<StoredMemory>, ClientError> {
        if tags.is_empty() {
            return Err(ClientError::Validation("at least one tag is required".into()));
        }
        let req = self
            .request(Method::POST, "api/search/by-tag")
            .json(&json!({ "tags": tags, "match_all": false }));
        let response: SearchResponse = self.send(Capability::SearchByTag, req).await?;
        Ok(response.into_memories())
    }

    async fn stats(&self) -> Result<BackendStats, ClientError> {
        let req = self.request(Method::GET, "api/health/detailed");
        let response: HealthResponse = self.send(Capability::Stats, req).await?;
        let storage = response.storage.unwrap_or_default();
        Ok(BackendStats {
            total_items: storage.total_memories.unwrap_or(0),
            backend_name: storage.backend.unwrap_or_else(|| "unknown".into()),
        })
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Unavailable(format!("request timed out: {err}"))
    } else {
        ClientError::Unavailable(err.to_string())
    }
}

fn status_error(capability: Capability, status: StatusCode, body: String) -> ClientError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(format!("{status}: {body}"))
        }
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
            ClientError::Unsupported(capability)
        }
        _ => ClientError::Unavailable(format!("{status}: {body}")),
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| format!("{url}: {err}"))?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[derive(Deserialize)]
struct StoreResponse {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    content_hash: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

impl SearchResponse {
    fn into_memories(self) -> Vec<StoredMemory> {
        self.results
            .into_iter()
            .map(|result| StoredMemory {
                id: result.memory.content_hash,
                content: result.memory.content,
                tags: result.memory.tags,
                score: result.similarity_score,
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct SearchResult {
    memory: MemoryPayload,
    #[serde(default)]
    similarity_score: Option<f32>,
}

#[derive(Deserialize)]
struct MemoryPayload {
    #[serde(default)]
    content_hash: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    #[serde(default)]
    storage: Option<StoragePayload>,
}

#[derive(Deserialize, Default)]
struct StoragePayload {
    #[serde(default)]
    backend: Option<String>,
    #[serde(default)]
    total_memories: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    fn client_for(server: &MockServer) -> HttpMemoryClient {
        HttpMemoryClient::new(
            &server.base_url(),
            Some("secret".into()),
            Duration::from_secs(5),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn store_posts_item_and_returns_content_hash() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/memories")
                    .header("authorization", "Bearer secret")
                    .json_body_partial(r#"{ "content": "hello", "tags": ["a"] }"#);
                then.status(200).json_body(json!({
                    "success": true,
                    "message": "stored",
                    "content_hash": "abc123"
                }));
            })
            .await;

        let item = MemoryItem {
            content: "hello".into(),
            tags: vec!["a".into()],
            ..Default::default()
        };
        let id = client_for(&server).store(&item).await.expect("store");
        mock.assert_async().await;
        assert_eq!(id, "abc123");
    }

    #[tokio::test]
    async fn store_rejection_is_a_validation_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/memories");
                then.status(422).body("content too long");
            })
            .await;

        let item = MemoryItem {
            content: "hello".into(),
            ..Default::default()
        };
        let err = client_for(&server).store(&item).await.expect_err("rejected");
        assert!(matches!(err, ClientError::Validation(ref msg) if msg.contains("content too long")));
    }

    #[tokio::test]
    async fn retrieve_maps_search_results() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/search")
                    .json_body(json!({ "query": "automation migration", "n_results": 5 }));
                then.status(200).json_body(json!({
                    "results": [
                        {
                            "memory": {
                                "content": "Automation Hub migrated",
                                "content_hash": "h1",
                                "tags": ["automation-hub"]
                            },
                            "similarity_score": 0.8
                        }
                    ],
                    "total_found": 1
                }));
            })
            .await;

        let hits = client_for(&server)
            .retrieve("automation migration", 5)
            .await
            .expect("retrieve");
        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "h1");
        assert_eq!(hits[0].tags, vec!["automation-hub".to_string()]);
        assert!((hits[0].score.expect("score") - 0.8).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn tag_search_with_no_results_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/search/by-tag");
                then.status(200).json_body(json!({ "results": [] }));
            })
            .await;

        let hits = client_for(&server)
            .search_by_tag(&["automation-hub".into()])
            .await
            .expect("tag search");
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn stats_reads_detailed_health() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health/detailed");
                then.status(200).json_body(json!({
                    "status": "healthy",
                    "storage": { "backend": "sqlite_vec", "total_memories": 42 }
                }));
            })
            .await;

        let stats = client_for(&server).stats().await.expect("stats");
        assert_eq!(stats.total_items, 42);
        assert_eq!(stats.backend_name, "sqlite_vec");
    }

    #[tokio::test]
    async fn server_errors_map_to_unavailable_and_missing_routes_to_unsupported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health/detailed");
                then.status(503).body("warming up");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/search/by-tag");
                then.status(404);
            })
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.stats().await,
            Err(ClientError::Unavailable(_))
        ));
        assert!(matches!(
            client.search_by_tag(&["x".into()]).await,
            Err(ClientError::Unsupported(Capability::SearchByTag))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let client = HttpMemoryClient::new("http://127.0.0.1:9", None, Duration::from_secs(2))
            .expect("client");
        assert!(matches!(
            client.stats().await,
            Err(ClientError::Unavailable(_))
        ));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpMemoryClient::new("not a url", None, Duration::from_secs(1));
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[test]
    fn endpoint_formatting_handles_slashes() {
        assert_eq!(
            format_endpoint("http://host:8000/", "/api/search"),
            "http://host:8000/api/search"
        );
        assert_eq!(
            normalize_base_url("http://host:8000/prefix/").expect("url"),
            "http://host:8000/prefix"
        );
    }
}
