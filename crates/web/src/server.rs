//! Web server implementation

use crate::render;
use crate::static_files::StaticFiles;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use testtool_common::fields::model_from_inputs;
use testtool_common::{
    BespokeKind, Error, FormView, HttpTransport, ModuleRegistry, Shell, ToolConfig, Transport,
};

/// Web server configuration
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Base URL module endpoints resolve against
    pub backend_url: String,

    /// Per-request timeout for module submissions
    pub request_timeout: Duration,

    /// Also serve the demo backend routes
    pub mount_demo_backend: bool,
}

impl WebServerConfig {
    pub fn from_tool_config(config: &ToolConfig) -> Self {
        Self {
            backend_url: config.backend_url.clone(),
            request_timeout: config.request_timeout(),
            mount_demo_backend: config.web.mount_demo_backend,
        }
    }
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_tool_config(&ToolConfig::default())
    }
}

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<WebServerState>,
}

struct WebServerState {
    registry: Arc<ModuleRegistry>,
    /// The single active form; submissions are serialized through this lock
    shell: Mutex<Shell>,
    transport: Arc<dyn Transport>,
    static_files: StaticFiles,
    mount_demo_backend: bool,
}

pub async fn serve(addr: SocketAddr, config: &ToolConfig) -> anyhow::Result<()> {
    let registry = config.registry()?;
    let server = WebServer::new(registry, WebServerConfig::from_tool_config(config))?;
    server.serve(addr).await
}

impl WebServer {
    /// Create a new web server talking to the configured backend over HTTP
    pub fn new(registry: ModuleRegistry, cfg: WebServerConfig) -> testtool_common::Result<Self> {
        let transport = HttpTransport::new(&cfg.backend_url, cfg.request_timeout)?;
        info!("Module endpoints resolve against {}", transport.base_url());
        Self::with_transport(registry, Arc::new(transport), cfg.mount_demo_backend)
    }

    /// Create a web server with an explicit transport
    pub fn with_transport(
        registry: ModuleRegistry,
        transport: Arc<dyn Transport>,
        mount_demo_backend: bool,
    ) -> testtool_common::Result<Self> {
        let registry = Arc::new(registry);
        let shell = Shell::new(registry.clone())?;
        Ok(Self {
            state: Arc::new(WebServerState {
                registry,
                shell: Mutex::new(shell),
                transport,
                static_files: StaticFiles::new(),
                mount_demo_backend,
            }),
        })
    }

    /// Create router
    pub fn router(&self) -> Router {
        let router = Router::new()
            // Console pages
            .route("/", get(index_handler))
            .route("/modules/:id", get(select_module_handler))
            .route("/modules/:id/submit", post(submit_form_handler))
            .route("/modules/:id/actions/:action", post(form_action_handler))
            .route("/static/*path", get(static_handler))

            // JSON API
            .route("/api/health", get(health_handler))
            .route("/api/modules", get(list_modules_handler))
            .route("/api/modules/:id", get(get_module_handler))
            .route("/api/modules/:id/submit", post(api_submit_handler))
            .route("/api/modules/:id/actions/:action", post(api_action_handler))

            // Fallback
            .fallback(not_found_handler)
            .with_state(self.state.clone());

        let router = if self.state.mount_demo_backend {
            info!("Mounting demo backend routes");
            router.merge(testtool_backend::backend_router())
        } else {
            router
        };

        router
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .layer(TraceLayer::new_for_http())
    }

    /// Start the web server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("Web console starting on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Make `id` the active module unless it already is
fn ensure_selected(shell: &mut Shell, id: &str) -> testtool_common::Result<()> {
    if shell.active_id() != Some(id) {
        shell.select(id)?;
    }
    Ok(())
}

/// Coerce posted form inputs against the active form's fields
fn model_from_form(shell: &Shell, inputs: &[(String, String)]) -> Value {
    let fields = shell.active().map(|form| form.fields()).unwrap_or_default();
    model_from_inputs(&fields, inputs)
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Http(_) | Error::Submission(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: &Error) -> Response {
    (
        status_for(err),
        Json(serde_json::json!({"error": err.to_string()})),
    )
        .into_response()
}

/// Render the shell, with an optional alert for errors that happen
/// before a form can take them
fn render_page(shell: &Shell, status: StatusCode, alert: Option<&str>) -> Response {
    (status, Html(render::page(&shell.render(), alert))).into_response()
}

/// Status and page for the outcome of a submit or action
fn outcome_page(shell: &Shell, outcome: testtool_common::Result<()>) -> Response {
    match outcome {
        Ok(()) => render_page(shell, StatusCode::OK, None),
        Err(e @ Error::Validation(_)) => {
            debug!("{}", e);
            render_page(shell, StatusCode::UNPROCESSABLE_ENTITY, None)
        }
        Err(e) => {
            warn!("{}", e);
            render_page(shell, status_for(&e), Some(&e.to_string()))
        }
    }
}

fn form_json(shell: &Shell, status: StatusCode) -> Response {
    match shell.active() {
        Some(form) => (status, Json(form.render())).into_response(),
        None => (status, Json(serde_json::json!({}))).into_response(),
    }
}

// ============================================================================
// Console handlers
// ============================================================================

async fn index_handler(State(state): State<Arc<WebServerState>>) -> Response {
    let shell = state.shell.lock().await;
    render_page(&shell, StatusCode::OK, None)
}

async fn select_module_handler(
    State(state): State<Arc<WebServerState>>,
    Path(id): Path<String>,
) -> Response {
    let mut shell = state.shell.lock().await;
    match shell.select(&id) {
        Ok(()) => render_page(&shell, StatusCode::OK, None),
        Err(e) => {
            warn!("{}", e);
            render_page(&shell, StatusCode::NOT_FOUND, Some(&format!("Unknown module: {}", id)))
        }
    }
}

async fn submit_form_handler(
    State(state): State<Arc<WebServerState>>,
    Path(id): Path<String>,
    Form(inputs): Form<Vec<(String, String)>>,
) -> Response {
    let mut shell = state.shell.lock().await;
    if ensure_selected(&mut shell, &id).is_err() {
        return render_page(&shell, StatusCode::NOT_FOUND, Some(&format!("Unknown module: {}", id)));
    }
    let model = model_from_form(&shell, &inputs);
    let outcome = shell.submit(state.transport.as_ref(), model).await;
    outcome_page(&shell, outcome)
}

async fn form_action_handler(
    State(state): State<Arc<WebServerState>>,
    Path((id, action)): Path<(String, String)>,
    Form(inputs): Form<Vec<(String, String)>>,
) -> Response {
    let mut shell = state.shell.lock().await;
    if ensure_selected(&mut shell, &id).is_err() {
        return render_page(&shell, StatusCode::NOT_FOUND, Some(&format!("Unknown module: {}", id)));
    }
    let model = model_from_form(&shell, &inputs);
    let outcome = shell.run_action(&action, state.transport.as_ref(), model).await;
    outcome_page(&shell, outcome)
}

async fn static_handler(
    State(state): State<Arc<WebServerState>>,
    Path(path): Path<String>,
) -> Response {
    state.static_files.serve(&path)
}

// ============================================================================
// API handlers
// ============================================================================

#[derive(Debug, Serialize)]
struct ModuleSummary {
    id: String,
    label: String,
    endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bespoke: Option<BespokeKind>,
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "testtool-web",
        "version": testtool_common::VERSION,
    }))
}

async fn list_modules_handler(State(state): State<Arc<WebServerState>>) -> impl IntoResponse {
    let modules: Vec<ModuleSummary> = state
        .registry
        .iter()
        .map(|entry| ModuleSummary {
            id: entry.id().to_string(),
            label: entry.label().to_string(),
            endpoint: entry.descriptor.meta.endpoint.clone(),
            bespoke: entry.bespoke,
        })
        .collect();
    Json(modules)
}

#[derive(Debug, Serialize)]
struct ModuleDetail<'a> {
    descriptor: &'a testtool_common::ModuleDescriptor,
    form: FormView,
}

/// Descriptor plus a fresh render; the active selection is left alone
async fn get_module_handler(
    State(state): State<Arc<WebServerState>>,
    Path(id): Path<String>,
) -> Response {
    let Some(entry) = state.registry.get(&id) else {
        return api_error(&Error::NotFound {
            kind: "module".to_string(),
            id,
        });
    };
    match state.registry.mount(&id) {
        Ok(form) => Json(ModuleDetail {
            descriptor: &entry.descriptor,
            form: form.render(),
        })
        .into_response(),
        Err(e) => api_error(&e),
    }
}

async fn api_submit_handler(
    State(state): State<Arc<WebServerState>>,
    Path(id): Path<String>,
    Json(model): Json<Value>,
) -> Response {
    let mut shell = state.shell.lock().await;
    if let Err(e) = ensure_selected(&mut shell, &id) {
        return api_error(&e);
    }
    match shell.submit(state.transport.as_ref(), model).await {
        Ok(()) => form_json(&shell, StatusCode::OK),
        Err(Error::Validation(_)) => form_json(&shell, StatusCode::UNPROCESSABLE_ENTITY),
        Err(e) => api_error(&e),
    }
}

async fn api_action_handler(
    State(state): State<Arc<WebServerState>>,
    Path((id, action)): Path<(String, String)>,
    Json(model): Json<Value>,
) -> Response {
    let mut shell = state.shell.lock().await;
    if let Err(e) = ensure_selected(&mut shell, &id) {
        return api_error(&e);
    }
    match shell.run_action(&action, state.transport.as_ref(), model).await {
        Ok(()) => form_json(&shell, StatusCode::OK),
        Err(Error::Validation(_)) => form_json(&shell, StatusCode::UNPROCESSABLE_ENTITY),
        Err(e) => api_error(&e),
    }
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
