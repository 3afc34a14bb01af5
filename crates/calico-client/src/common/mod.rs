//! Common utilities for the Calico API client
//!
//! Provides the authenticated HTTP wrapper and error-body decoding shared by
//! every resource operation.

use crate::error::CalicoError;
use kube::Resource;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kubernetes `Status` object returned by the API server on failure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiStatus {
    pub message: String,
    pub reason: String,
    pub code: u16,
}

/// HTTP client wrapper with bearer-token authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Path of a single named object under a collection path
    pub fn object_path(collection: &str, name: &str) -> String {
        format!("{}/{}", collection, urlencoding::encode(name))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CalicoError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::decode(response).await
    }

    /// Make a POST request
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CalicoError> {
        let url = self.build_url(path);
        debug!("POST {} with body: {}", url, serde_json::to_string(body)?);

        let response = self
            .authorize(self.client.post(&url))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Make a PUT request (full-object replace)
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CalicoError> {
        let url = self.build_url(path);
        debug!("PUT {} with body: {}", url, serde_json::to_string(body)?);

        let response = self
            .authorize(self.client.put(&url))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), CalicoError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self.authorize(self.client.delete(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CalicoError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn status_error(status: StatusCode, response: Response) -> CalicoError {
        let body = response.text().await.unwrap_or_default();
        error_from_body(status, &body)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Name of an object about to be sent, required for every write
pub fn resource_name<K: Resource<DynamicType = ()>>(object: &K) -> Result<String, CalicoError> {
    object
        .meta()
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            CalicoError::InvalidRequest(format!("{} is missing metadata.name", K::kind(&())))
        })
}

/// Reject an empty object name before it reaches a URL.
///
/// An empty name would address the whole collection.
pub fn require_name(kind: &str, name: &str) -> Result<(), CalicoError> {
    if name.is_empty() {
        return Err(CalicoError::InvalidRequest(format!("{} name must not be empty", kind)));
    }
    Ok(())
}

/// Turn a failed response into a [`CalicoError`].
///
/// 401/403 are authentication failures; everything else keeps the status code
/// so callers can map it to a resource-specific error.
pub fn error_from_body(status: StatusCode, body: &str) -> CalicoError {
    let parsed: ApiStatus = serde_json::from_str(body).unwrap_or_default();
    let message = if parsed.message.is_empty() {
        body.chars().take(500).collect()
    } else {
        parsed.message
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return CalicoError::Authentication(format!("{} - {}", status, message));
    }

    let reason = if parsed.reason.is_empty() {
        status.canonical_reason().unwrap_or("Unknown").to_string()
    } else {
        parsed.reason
    };

    CalicoError::Status {
        code: status.as_u16(),
        reason,
        message,
    }
}
