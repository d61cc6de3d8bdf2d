//! API client
//!
//! This module provides an HTTP client for the tool server.
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::api::ApiClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = ApiClient::new("http://127.0.0.1:8080");
//!     client.health_check().await?;
//!
//!     let history = client
//!         .call_tool("user_purchase_history", serde_json::json!({ "user_id": "c1" }))
//!         .await?;
//!     println!("{} purchases", history.len());
//!     Ok(())
//! }
//! ```

use serde_json::Value as JsonValue;

/// Client-side error
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// API client
///
/// Provides methods for interacting with the deck_db tool server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base URL of the API server
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the API server (e.g., "http://127.0.0.1:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Health check
    ///
    /// # Returns
    /// `Ok(())` if server is healthy, `Err` otherwise
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(format!("Health check failed: {}", response.status()).into());
        }
        Ok(())
    }

    /// Tool descriptors served by the server
    pub async fn list_tools(&self) -> Result<Vec<JsonValue>, ClientError> {
        let url = format!("{}/tools", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(format!("API request failed: {}", response.status()).into());
        }
        Ok(response.json().await?)
    }

    /// Invoke a tool
    ///
    /// # Arguments
    /// * `name` - Tool name, e.g. `run_query`
    /// * `arguments` - JSON argument object
    ///
    /// # Returns
    /// One JSON object per record, or the server's error message
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: JsonValue,
    ) -> Result<Vec<JsonValue>, ClientError> {
        let url = format!("{}/tools/{}", self.base_url, name);
        let response = self.http.post(&url).json(&arguments).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body: JsonValue = response.json().await.unwrap_or(JsonValue::Null);
            let message = body["error"].as_str().unwrap_or("no error message");
            return Err(format!("Tool {} failed ({}): {}", name, status, message).into());
        }

        Ok(response.json().await?)
    }
}
