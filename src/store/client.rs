// file: src/store/client.rs
// description: Elasticsearch REST client implementing the index store capabilities
// reference: https://docs.rs/reqwest

use crate::config::StoreConfig;
use crate::error::{Result, SyncError};
use crate::store::bulk::{self, BulkOperation, BulkResponse};
use crate::store::schema::IndexMapping;
use crate::store::{CreateOutcome, DeleteOutcome, IndexStore};
use crate::utils::validation::Validator;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Clone)]
pub struct ElasticClient {
    http: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

impl ElasticClient {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        Validator::validate_url(&config.url)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                SyncError::store("connect", format!("Failed to build HTTP client: {}", e))
            })?;

        info!("Using Elasticsearch at {}", config.url);

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.http.request(method, url);

        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> Result<Response> {
        builder
            .send()
            .await
            .map_err(|e| SyncError::store(operation, format!("Request failed: {}", e)))
    }

    async fn status_error(operation: &'static str, response: Response) -> SyncError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        SyncError::store(
            operation,
            format!(
                "Elasticsearch returned {}: {}",
                status,
                Validator::truncate_text(&body, MAX_ERROR_BODY_CHARS)
            ),
        )
    }
}

impl IndexStore for ElasticClient {
    async fn ping(&self) -> Result<()> {
        debug!("Checking Elasticsearch connection");

        let response = self.send("ping", self.request(Method::GET, "/")).await?;
        if !response.status().is_success() {
            return Err(Self::status_error("ping", response).await);
        }

        info!("Elasticsearch connection successful");
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let response = self
            .send("index_exists", self.request(Method::HEAD, index))
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::status_error("index_exists", response).await),
        }
    }

    async fn delete_index(&self, index: &str) -> Result<DeleteOutcome> {
        let response = self
            .send("delete_index", self.request(Method::DELETE, index))
            .await?;

        match response.status() {
            status if status.is_success() => {
                info!("Deleted index {}", index);
                Ok(DeleteOutcome::Deleted)
            }
            StatusCode::NOT_FOUND => {
                debug!("Index {} not found, nothing to delete", index);
                Ok(DeleteOutcome::NotFound)
            }
            _ => Err(Self::status_error("delete_index", response).await),
        }
    }

    async fn create_index(&self, index: &str, mapping: &IndexMapping) -> Result<CreateOutcome> {
        if self.index_exists(index).await? {
            debug!("Index {} already exists, keeping its mapping", index);
            return Ok(CreateOutcome::AlreadyExists);
        }

        let response = self
            .send(
                "create_index",
                self.request(Method::PUT, index).json(mapping.as_json()),
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Created index {}", index);
            return Ok(CreateOutcome::Created);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            warn!("Index {} was created concurrently", index);
            return Ok(CreateOutcome::AlreadyExists);
        }

        Err(SyncError::store(
            "create_index",
            format!(
                "Elasticsearch returned {}: {}",
                status,
                Validator::truncate_text(&body, MAX_ERROR_BODY_CHARS)
            ),
        ))
    }

    async fn bulk_index(
        &self,
        index: &str,
        operations: &[BulkOperation<'_>],
    ) -> Result<BulkResponse> {
        let body = bulk::encode_body(index, operations)?;
        debug!(
            "Submitting bulk request: {} operations, {} bytes",
            operations.len(),
            body.len()
        );

        let response = self
            .send(
                "bulk",
                self.request(Method::POST, "_bulk")
                    .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
                    .body(body),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("bulk", response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| SyncError::store("bulk", format!("Failed to read bulk response: {}", e)))?;

        BulkResponse::from_json(&text)
    }

    async fn count_documents(&self, index: &str) -> Result<u64> {
        let response = self
            .send(
                "count",
                self.request(Method::GET, &format!("{}/_count", index)),
            )
            .await?;

        match response.status() {
            status if status.is_success() => {
                let count: CountResponse = response.json().await.map_err(|e| {
                    SyncError::store("count", format!("Failed to parse count response: {}", e))
                })?;
                Ok(count.count)
            }
            StatusCode::NOT_FOUND => Ok(0),
            _ => Err(Self::status_error("count", response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_config(url: String) -> StoreConfig {
        StoreConfig {
            url,
            username: None,
            password: None,
            index_name: "indicepa_pec".to_string(),
            timeout_secs: 5,
            mapping_path: None,
        }
    }

    async fn client_for(server: &MockServer) -> ElasticClient {
        ElasticClient::new(&store_config(server.uri())).unwrap()
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = ElasticClient::new(&store_config("localhost:9200".to_string()));
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = ElasticClient::new(&store_config("http://es:9200/".to_string())).unwrap();
        assert_eq!(client.base_url(), "http://es:9200");
    }

    #[tokio::test]
    async fn test_delete_missing_index_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/indicepa_pec"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"type": "index_not_found_exception"},
                "status": 404
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .await
            .delete_index("indicepa_pec")
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_delete_existing_index() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/indicepa_pec"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .await
            .delete_index("indicepa_pec")
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_delete_server_error_is_store_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503).set_body_string("cluster unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .delete_index("indicepa_pec")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::StoreUnavailable {
                operation: "delete_index",
                ..
            }
        ));
        assert!(err.to_string().contains("cluster unavailable"));
    }

    #[tokio::test]
    async fn test_create_index_when_missing() {
        let server = MockServer::start().await;
        let mapping = IndexMapping::default();

        Mock::given(method("HEAD"))
            .and(path("/indicepa_pec"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/indicepa_pec"))
            .and(body_json(mapping.as_json()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .await
            .create_index("indicepa_pec", &mapping)
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
    }

    #[tokio::test]
    async fn test_create_index_when_present_is_noop() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/indicepa_pec"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .await
            .create_index("indicepa_pec", &IndexMapping::default())
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_index_race_is_already_exists() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"type": "resource_already_exists_exception"},
                "status": 400
            })))
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .await
            .create_index("indicepa_pec", &IndexMapping::default())
            .await
            .unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_bulk_index_sends_ndjson() {
        let server = MockServer::start().await;
        let doc = Document::new("0001", "Ministry A", "X", "ministryA@pec.it");
        let ops = [BulkOperation {
            id: "0",
            document: &doc,
        }];
        let expected_body = bulk::encode_body("indicepa_pec", &ops).unwrap();

        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .and(header("content-type", "application/x-ndjson"))
            .and(body_string(expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "took": 3,
                "errors": false,
                "items": [
                    {"index": {"_index": "indicepa_pec", "_id": "0", "status": 201, "result": "created"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server)
            .await
            .bulk_index("indicepa_pec", &ops)
            .await
            .unwrap();
        assert_eq!(response.indexed(), 1);
        assert_eq!(response.items[0].id, "0");
    }

    #[tokio::test]
    async fn test_bulk_request_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_bulk"))
            .respond_with(ResponseTemplate::new(413).set_body_string("Request Entity Too Large"))
            .mount(&server)
            .await;

        let doc = Document::new("0001", "Ministry A", "X", "ministryA@pec.it");
        let ops = [BulkOperation {
            id: "0",
            document: &doc,
        }];
        let err = client_for(&server)
            .await
            .bulk_index("indicepa_pec", &ops)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::StoreUnavailable {
                operation: "bulk",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_basic_auth_and_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indicepa_pec/_count"))
            .and(basic_auth("elastic", "changeme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 23041})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = store_config(server.uri());
        config.username = Some("elastic".to_string());
        config.password = Some("changeme".to_string());

        let client = ElasticClient::new(&config).unwrap();
        assert_eq!(client.count_documents("indicepa_pec").await.unwrap(), 23041);
    }

    #[tokio::test]
    async fn test_count_missing_index_is_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indicepa_pec/_count"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let count = client_for(&server)
            .await
            .count_documents("indicepa_pec")
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        let config = store_config("http://127.0.0.1:1".to_string());
        let client = ElasticClient::new(&config).unwrap();
        assert!(matches!(
            client.ping().await,
            Err(SyncError::StoreUnavailable {
                operation: "ping",
                ..
            })
        ));
    }
}
