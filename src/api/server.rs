//! API server
//!
//! Serves the query gateway over HTTP using Axum. Each gateway operation is
//! a named tool invoked with a JSON argument object:
//!
//! - `GET /health`
//! - `GET /tools` lists the tool descriptors
//! - `POST /tools/{name}` runs a tool and returns its records as a JSON array
//!
//! Failures come back as `{"error": "..."}` with status 400 (rejected query,
//! bad arguments), 404 (unknown tool) or 500.
//!
//! # Example
//!
//! ```rust,no_run
//! use deck_db::api::ApiServer;
//! use deck_db::database::SqliteBackend;
//! use deck_db::query::QueryGateway;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let backend = SqliteBackend::connect("sqlite://mcp_deck.db").await?;
//!     let server = ApiServer::new("127.0.0.1:8080".parse()?, QueryGateway::new(Arc::new(backend)));
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

use crate::error::DeckError;
use crate::query::QueryGateway;
use crate::types::Record;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Name and arguments of a tool
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolDescriptor {
    /// Tool name used in `POST /tools/{name}`
    pub name: &'static str,
    /// What the tool returns
    pub description: &'static str,
    /// Required argument keys
    pub arguments: &'static [&'static str],
}

/// Tools served by [`ApiServer`]
pub const TOOLS: [ToolDescriptor; 3] = [
    ToolDescriptor {
        name: "run_query",
        description: "Execute a read-only SQL statement and return the result rows",
        arguments: &["sql"],
    },
    ToolDescriptor {
        name: "user_purchase_history",
        description: "Transactions of a customer, oldest first",
        arguments: &["user_id"],
    },
    ToolDescriptor {
        name: "product_details",
        description: "Article rows for the given article ids",
        arguments: &["product_ids"],
    },
];

/// `run_query` arguments
#[derive(Debug, Deserialize)]
struct RunQueryArgs {
    sql: String,
}

/// `user_purchase_history` arguments
#[derive(Debug, Deserialize)]
struct PurchaseHistoryArgs {
    user_id: Identifier,
}

/// `product_details` arguments
#[derive(Debug, Deserialize)]
struct ProductDetailsArgs {
    product_ids: Vec<Identifier>,
}

/// Customer or article id sent either as a JSON number or a string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Identifier {
    Number(i64),
    Text(String),
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        match id {
            Identifier::Number(n) => n.to_string(),
            Identifier::Text(s) => s,
        }
    }
}

/// Error response with a JSON body
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<DeckError> for ApiError {
    fn from(err: DeckError) -> Self {
        let status = if err.is_query_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// API server
///
/// Exposes a [`QueryGateway`] as HTTP tools.
pub struct ApiServer {
    /// Server address
    addr: SocketAddr,
    gateway: QueryGateway,
}

impl ApiServer {
    /// Create a new API server
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to
    /// * `gateway` - Gateway every tool call goes through
    pub fn new(addr: SocketAddr, gateway: QueryGateway) -> Self {
        Self { addr, gateway }
    }

    /// Routes with the gateway as shared state
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/tools", get(list_tools))
            .route("/tools/{name}", post(call_tool))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(self.gateway.clone())
    }

    /// Bind the configured address and serve until shutdown
    pub async fn start(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        info!("Tool server listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await
    }
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

async fn list_tools() -> Json<&'static [ToolDescriptor]> {
    Json(&TOOLS[..])
}

/// Tool invocation endpoint
async fn call_tool(
    State(gateway): State<QueryGateway>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Vec<Record>>, ApiError> {
    let result = dispatch(&gateway, &name, &body).await;
    if let Err(err) = &result {
        warn!("Tool {} failed ({}): {}", name, err.status, err.message);
    }
    result.map(Json)
}

async fn dispatch(gateway: &QueryGateway, name: &str, body: &[u8]) -> Result<Vec<Record>, ApiError> {
    let records = match name {
        "run_query" => {
            let args: RunQueryArgs = parse_args(name, body)?;
            gateway.run_query(&args.sql).await?
        }
        "user_purchase_history" => {
            let args: PurchaseHistoryArgs = parse_args(name, body)?;
            gateway.get_purchase_history(&String::from(args.user_id)).await?
        }
        "product_details" => {
            let args: ProductDetailsArgs = parse_args(name, body)?;
            let ids: Vec<String> = args.product_ids.into_iter().map(String::from).collect();
            gateway.get_product_details(&ids).await?
        }
        _ => {
            return Err(ApiError {
                status: StatusCode::NOT_FOUND,
                message: format!("unknown tool '{}'", name),
            })
        }
    };
    Ok(records)
}

/// Decode tool arguments; an empty body counts as `{}`
fn parse_args<T: DeserializeOwned>(tool: &str, body: &[u8]) -> Result<T, ApiError> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("invalid arguments for '{}': {}", tool, e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::query::gateway::tests::seeded;
    use tempfile::TempDir;

    /// Seeded gateway served on an ephemeral port
    pub(crate) async fn spawn_server() -> (TempDir, String) {
        let (dir, gateway) = seeded().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = ApiServer::new(addr, gateway);
        tokio::spawn(async move { server.serve(listener).await });
        (dir, format!("http://{}", addr))
    }

    async fn post(base: &str, tool: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let response = reqwest::Client::new()
            .post(format!("{}/tools/{}", base, tool))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[test]
    fn test_product_ids_accept_numbers_and_strings() {
        let args: ProductDetailsArgs =
            parse_args("product_details", br#"{"product_ids": [108775015, "0110065001"]}"#).unwrap();
        let ids: Vec<String> = args.product_ids.into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["108775015", "0110065001"]);
    }

    #[test]
    fn test_user_id_accepts_numbers_and_strings() {
        let args: PurchaseHistoryArgs =
            parse_args("user_purchase_history", br#"{"user_id": 42}"#).unwrap();
        assert_eq!(String::from(args.user_id), "42");

        let args: PurchaseHistoryArgs =
            parse_args("user_purchase_history", br#"{"user_id": "c1"}"#).unwrap();
        assert_eq!(String::from(args.user_id), "c1");

        assert!(parse_args::<PurchaseHistoryArgs>("user_purchase_history", br#"{"user_id": true}"#).is_err());
    }

    #[test]
    fn test_missing_arguments() {
        let err = parse_args::<RunQueryArgs>("run_query", b"").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("sql"));
    }

    #[tokio::test]
    async fn test_tools_over_http() {
        let (_dir, base) = spawn_server().await;

        let (status, rows) = post(
            &base,
            "user_purchase_history",
            serde_json::json!({ "user_id": "x" }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(rows.as_array().unwrap().len(), 3);
        assert_eq!(rows[0]["customer_id"], "x");

        let (status, rows) = post(
            &base,
            "user_purchase_history",
            serde_json::json!({ "user_id": 7 }),
        )
        .await;
        assert_eq!(status, 200);
        assert!(rows.as_array().unwrap().is_empty());

        let (status, rows) = post(
            &base,
            "product_details",
            serde_json::json!({ "product_ids": [108775015, "110065001"] }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(rows.as_array().unwrap().len(), 2);

        let (status, rows) = post(
            &base,
            "run_query",
            serde_json::json!({ "sql": "SELECT COUNT(*) AS n FROM articles" }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(rows[0]["n"], 3);
    }

    #[tokio::test]
    async fn test_tool_errors() {
        let (_dir, base) = spawn_server().await;

        let (status, body) = post(
            &base,
            "run_query",
            serde_json::json!({ "sql": "DROP TABLE articles" }),
        )
        .await;
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("rejected"));

        let (status, _) = post(
            &base,
            "run_query",
            serde_json::json!({ "sql": "SELECT * FROM missing_table" }),
        )
        .await;
        assert_eq!(status, 400);

        let (status, body) = post(&base, "drop_everything", serde_json::json!({})).await;
        assert_eq!(status, 404);
        assert!(body["error"].as_str().unwrap().contains("drop_everything"));
    }

    #[tokio::test]
    async fn test_health_and_tools() {
        let (_dir, base) = spawn_server().await;

        let health: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let tools: serde_json::Value = reqwest::get(format!("{}/tools", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<_> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["run_query", "user_purchase_history", "product_details"]);
    }
}
