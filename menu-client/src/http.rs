//! HTTP client for the menu backend REST API

use crate::storage::{SharedStore, keys, load_json, save_json};
use crate::{ClientConfig, ClientError, ClientResult};
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::AccessToken;
use std::sync::Arc;

/// HTTP client for making requests to the menu backend
///
/// Clones share the admin token, so a 401 seen by one clone logs out all.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    store: Option<SharedStore>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
            store: None,
        })
    }

    /// Persist the admin token in `store`, restoring a previously saved one
    pub fn with_store(mut self, store: SharedStore) -> Self {
        if let Some(token) = load_json::<String>(store.as_ref(), keys::ADMIN_TOKEN) {
            tracing::debug!("Restored admin token from storage");
            *self.token.write() = Some(token);
        }
        self.store = Some(store);
        self
    }

    /// Set the authentication token (memory only)
    pub fn with_token(self, token: impl Into<String>) -> Self {
        *self.token.write() = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Drop the token from memory and durable storage
    pub fn clear_token(&self) {
        *self.token.write() = None;
        if let Some(store) = &self.store
            && let Err(e) = store.remove(keys::ADMIN_TOKEN)
        {
            tracing::warn!("Failed to remove stored admin token: {e}");
        }
    }

    fn set_token(&self, token: String) {
        if let Some(store) = &self.store
            && let Err(e) = save_json(store.as_ref(), keys::ADMIN_TOKEN, &token)
        {
            tracing::warn!("Failed to persist admin token: {e}");
        }
        *self.token.write() = Some(token);
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request with the authorization header attached
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = self.token.read().as_deref() {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    /// Make a PUT request without body, discarding the response body
    pub async fn put_empty(&self, path: &str) -> ClientResult<()> {
        let response = self.request(Method::PUT, path).send().await?;
        self.check_status(response).await.map(drop)
    }

    /// Make a DELETE request, discarding the response body
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        self.check_status(response).await.map(drop)
    }

    /// Make a multipart POST request
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        self.send(self.request(Method::POST, path).multipart(form)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let response = self.check_status(response).await?;
        response.json().await.map_err(Into::into)
    }

    /// Map non-2xx responses to errors; a 401 also logs the admin out
    async fn check_status(&self, response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = error_detail(&text);
        Err(match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Admin session rejected by server, clearing token");
                self.clear_token();
                ClientError::Unauthorized
            }
            StatusCode::FORBIDDEN => ClientError::Forbidden(detail),
            StatusCode::NOT_FOUND => ClientError::NotFound(detail),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(detail)
            }
            _ => ClientError::Internal(format!("{status}: {detail}")),
        })
    }

    // ========== Auth API ==========

    /// Login with username and password; the token is kept and persisted
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AccessToken> {
        let form = [("username", username), ("password", password)];
        let token: AccessToken = self
            .send(self.client.post(self.url("/admin/token")).form(&form))
            .await?;
        self.set_token(token.access_token.clone());
        tracing::info!(username, "Admin logged in");
        Ok(token)
    }

    /// Logout (local only, the backend keeps no session)
    pub fn logout(&self) {
        self.clear_token();
        tracing::info!("Admin logged out");
    }
}

/// Extract a readable message from an error body.
///
/// The backend answers `{"detail": "..."}`, or a list of
/// `{"msg": ...}` objects for request validation failures.
pub(crate) fn error_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    match value.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => body.to_string(),
    }
}
