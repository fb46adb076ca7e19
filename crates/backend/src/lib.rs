//! testtool demo backend
//!
//! Answers the endpoints the bundled modules post to, so the console and
//! the CLI can be exercised without a real service behind them.

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Widget {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Thing {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AddressCheck {
    pub valid: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub newsletter_opt_in: bool,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    result: Vec<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

fn bad_request(text: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, text).into_response()
}

/// Decode a JSON body, answering 400 on anything malformed
fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejecting request body: {}", e);
        bad_request("Invalid request body")
    })
}

fn message(text: String) -> Response {
    Json(MessageResponse { message: text }).into_response()
}

async fn create_widget_handler(body: Bytes) -> Response {
    let widget: Widget = match decode(&body) {
        Ok(w) => w,
        Err(res) => return res,
    };
    if widget.name.is_empty() {
        return bad_request("Missing widget name");
    }
    info!("Created widget {}", widget.name);
    message(format!("Created {}", widget.name))
}

async fn search_list_handler(body: Bytes) -> Response {
    let req: SearchRequest = match decode(&body) {
        Ok(r) => r,
        Err(res) => return res,
    };
    debug!("Search for id {:?}", req.id);
    Json(SearchResponse {
        result: (1..=10).collect(),
    })
    .into_response()
}

async fn create_thing_handler(body: Bytes) -> Response {
    let thing: Thing = match decode(&body) {
        Ok(t) => t,
        Err(res) => return res,
    };
    if thing.firstname.is_empty() {
        return bad_request("Missing firstname");
    }
    info!("Created thing {} ({:?})", thing.firstname, thing.phone);
    message(format!("Created thing for {}", thing.firstname))
}

/// Check that every address part is present and the ZIP has five digits
pub fn check_address(query: &AddressQuery) -> AddressCheck {
    let missing: Vec<&str> = [
        ("address", &query.address),
        ("city", &query.city),
        ("state", &query.state),
        ("zip", &query.zip),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return AddressCheck {
            valid: false,
            message: format!("Address is incomplete: missing {}", missing.join(", ")),
        };
    }
    let zip = query.zip.trim();
    if zip.len() != 5 || !zip.chars().all(|c| c.is_ascii_digit()) {
        return AddressCheck {
            valid: false,
            message: format!("Unknown ZIP code: {}", zip),
        };
    }
    AddressCheck {
        valid: true,
        message: "Address is valid".to_string(),
    }
}

async fn validate_address_handler(Query(query): Query<AddressQuery>) -> impl IntoResponse {
    let check = check_address(&query);
    debug!("Address check: {}", check.message);
    Json(check)
}

async fn signup_handler(body: Bytes) -> Response {
    let req: SignUpRequest = match decode(&body) {
        Ok(r) => r,
        Err(res) => return res,
    };
    if req.first_name.is_empty() || req.email.is_empty() {
        return bad_request("Missing first_name or email");
    }
    info!(
        "Signed up {} {} <{}> (newsletter: {})",
        req.first_name, req.last_name, req.email, req.newsletter_opt_in
    );
    message(format!("Welcome, {}!", req.first_name))
}

// ============================================================================
// Router
// ============================================================================

/// Routes of the demo backend
pub fn backend_router() -> Router {
    Router::new()
        .route("/create-widget", post(create_widget_handler))
        .route("/search-list", post(search_list_handler))
        .route("/create-thing", post(create_thing_handler))
        .route("/validate-address", get(validate_address_handler))
        .route("/signup", post(signup_handler))
}

/// Serve the demo backend until the process exits
pub async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Demo backend listening on http://{}", listener.local_addr()?);
    axum::serve(listener, backend_router().layer(TraceLayer::new_for_http())).await?;
    Ok(())
}
