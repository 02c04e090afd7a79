//! Search-backend client.
//!
//! Talks to an OpenSearch-compatible cluster over its REST API with reqwest.
//! Two authentication modes are supported, selected by configuration:
//!
//! - **Basic auth** — static username/password (local or self-managed
//!   clusters).
//! - **SigV4** — AWS-signed requests for managed domains, see [`sigv4`].
//!
//! [`OpenSearchClient::connect`] performs one liveness probe before
//! returning, so a process never starts serving traffic with a broken
//! backend handle.
//!
//! The [`SearchBackend`] trait is the seam the request handlers depend on;
//! tests substitute it with in-memory doubles.

pub mod sigv4;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::config::BackendConfig;
use sigv4::SigV4Signer;

/// Errors surfaced by backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The requested document does not exist in the index.
    #[error("document '{id}' not found in index '{index}'")]
    NotFound { index: String, id: String },

    /// The backend answered with a non-success status.
    #[error("backend error (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    /// The request never completed (connection, TLS, timeout).
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a body this client cannot interpret.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

/// Stateless query/get operations against the document store.
///
/// Implemented by [`OpenSearchClient`] in production and by mock backends in
/// the integration tests. The handle is shared read-only across all
/// concurrent requests.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a query against an index (or alias) and return the raw hit
    /// objects from `hits.hits`.
    async fn search(&self, index: &str, body: Value) -> Result<Vec<Value>, BackendError>;

    /// Fetch one document's `_source` by id.
    async fn get(&self, index: &str, id: &str) -> Result<Value, BackendError>;
}

enum Auth {
    Basic { username: String, password: String },
    SigV4(SigV4Signer),
}

/// Reqwest-backed client for an OpenSearch cluster.
pub struct OpenSearchClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    auth: Auth,
}

impl OpenSearchClient {
    /// Connect to the cluster described by `config`.
    ///
    /// Builds the HTTP client, selects the auth mode, and probes the cluster
    /// root endpoint once. A failed probe is a fatal startup error — the
    /// caller is expected to exit rather than serve requests against a dead
    /// backend.
    pub async fn connect(config: &BackendConfig) -> Result<OpenSearchClient> {
        let base_url = config.url();
        info!(url = %base_url, use_aws = config.use_aws, verify_certs = config.verify_certs,
            "connecting to OpenSearch");

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_certs)
            .build()
            .context("Failed to build HTTP client")?;

        let auth = if config.use_aws {
            Auth::SigV4(SigV4Signer::from_env()?)
        } else {
            Auth::Basic {
                username: config.username.clone(),
                password: config.password.clone(),
            }
        };

        let client = OpenSearchClient {
            http,
            host: format!("{}:{}", config.host, config.port),
            base_url,
            auth,
        };

        let cluster_info = client
            .request(Method::GET, "/", None)
            .await
            .with_context(|| format!("OpenSearch liveness probe failed for {}", client.base_url))?;
        info!(
            version = cluster_info
                .pointer("/version/number")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown"),
            "connected to OpenSearch"
        );

        Ok(client)
    }

    /// POST a JSON body to an arbitrary cluster path.
    ///
    /// Also used by the summarization gateway, whose ML predict endpoint
    /// lives on the same cluster.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        let payload = match body {
            Some(b) => serde_json::to_vec(b)
                .map_err(|e| BackendError::InvalidResponse(e.to_string()))?,
            None => Vec::new(),
        };

        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .header("Content-Type", "application/json");

        match &self.auth {
            Auth::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            Auth::SigV4(signer) => {
                for (name, value) in signer.sign(method.as_str(), &self.host, path, &payload) {
                    req = req.header(name, value);
                }
            }
        }

        if body.is_some() {
            req = req.body(payload);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body: body_text.chars().take(500).collect(),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SearchBackend for OpenSearchClient {
    async fn search(&self, index: &str, body: Value) -> Result<Vec<Value>, BackendError> {
        let response = self.post_json(&format!("/{}/_search", index), &body).await?;
        Ok(extract_hits(&response))
    }

    async fn get(&self, index: &str, id: &str) -> Result<Value, BackendError> {
        let path = format!("/{}/_doc/{}", index, id);
        match self.request(Method::GET, &path, None).await {
            Ok(doc) => Ok(doc
                .get("_source")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()))),
            Err(BackendError::Http { status: 404, .. }) => Err(BackendError::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Pull the hit array out of a `_search` response.
///
/// A response without `hits.hits` counts as zero hits, matching the
/// permissive reads the cluster API allows.
pub fn extract_hits(response: &Value) -> Vec<Value> {
    response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Build the type-ahead query: multi-match with best-fields scoring over the
/// configured field list, capped at `size` hits.
pub fn multi_match_body(query: &str, fields: &[String], size: usize) -> Value {
    serde_json::json!({
        "size": size,
        "query": {
            "multi_match": {
                "query": query,
                "fields": fields,
                "type": "best_fields"
            }
        }
    })
}

/// Build the communication-events query: exact `member_id` match, newest
/// first by `last_updated`, capped at `size` events.
pub fn events_body(member_id: &Value, size: usize) -> Value {
    serde_json::json!({
        "size": size,
        "query": {
            "term": {
                "member_id": member_id
            }
        },
        "sort": [
            {"last_updated": {"order": "desc"}}
        ]
    })
}
