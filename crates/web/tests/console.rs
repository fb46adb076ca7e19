//! Console routes driven end to end against the demo backend

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use testtool_common::{HttpTransport, ModuleRegistry, Transport};
use testtool_web::{WebServer, WebServerConfig};

async fn spawn_backend() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, testtool_backend::backend_router())
            .await
            .unwrap();
    });
    addr
}

fn console(backend: SocketAddr, mount_demo_backend: bool) -> WebServer {
    WebServer::new(
        ModuleRegistry::builtin().unwrap(),
        WebServerConfig {
            backend_url: format!("http://{}", backend),
            request_timeout: Duration::from_secs(5),
            mount_demo_backend,
        },
    )
    .unwrap()
}

async fn send(router: Router, req: Request<Body>) -> (StatusCode, String) {
    let res = router.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(server: &WebServer, path: &str) -> (StatusCode, String) {
    send(server.router(), Request::get(path).body(Body::empty()).unwrap()).await
}

async fn post_form(server: &WebServer, path: &str, form: &str) -> (StatusCode, String) {
    let req = Request::post(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(server.router(), req).await
}

async fn post_json(server: &WebServer, path: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, text) = send(server.router(), req).await;
    (status, serde_json::from_str(&text).unwrap())
}

#[tokio::test]
async fn test_index_selects_first_module() {
    let server = console(spawn_backend().await, false);
    let (status, html) = get(&server, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<a href=\"/modules/createThing\" class=\"active\">Create Thing</a>"));
    assert!(html.contains("<link rel=\"stylesheet\" href=\"/static/console.css\">"));

    let (status, _) = get(&server, "/static/console.css").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_widget_message_banner() {
    let server = console(spawn_backend().await, false);
    let (status, html) = post_form(&server, "/modules/createWidget/submit", "name=gizmo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<div class=\"alert alert-success\">Created gizmo</div>"));
}

#[tokio::test]
async fn test_search_list_results_table() {
    let server = console(spawn_backend().await, false);
    let (status, html) = post_form(&server, "/modules/searchList/submit", "id=4").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<th>Result</th>"));
    assert!(html.contains("<td>1</td>"));
    assert!(html.contains("<td>10</td>"));
}

#[tokio::test]
async fn test_validation_blocks_submit() {
    let server = console(spawn_backend().await, false);
    let (status, html) = post_form(&server, "/modules/searchList/submit", "id=").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(html.contains("field-error"));
    assert!(!html.contains("<table"));
}

#[tokio::test]
async fn test_reselect_clears_results() {
    let server = console(spawn_backend().await, false);
    post_form(&server, "/modules/searchList/submit", "id=4").await;
    let (_, html) = get(&server, "/modules/searchList").await;
    assert!(!html.contains("<table"));
}

#[tokio::test]
async fn test_unknown_module() {
    let server = console(spawn_backend().await, false);
    let (status, html) = get(&server, "/modules/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("Unknown module: nope"));
}

#[tokio::test]
async fn test_sign_up_requires_address_check() {
    let server = console(spawn_backend().await, false);
    let form = "firstName=Ada&lastName=Lovelace&email=ada%40example.test\
                &address=1+Main+St&city=Springfield&state=IL&zip=62701&newsletter=false";

    let (_, html) = post_form(&server, "/modules/signUp/submit", form).await;
    assert!(html.contains("Please validate your address before signing up."));

    let (status, html) = post_form(&server, "/modules/signUp/actions/validate-address", form).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<div class=\"alert alert-success\">Address is valid</div>"));

    let (status, html) = post_form(&server, "/modules/signUp/submit", form).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Welcome, Ada!"));
}

#[tokio::test]
async fn test_backend_down_shows_failure_banner() {
    // bind and drop to get a port nobody listens on
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let server = console(closed, false);
    let (status, html) = post_form(&server, "/modules/createWidget/submit", "name=gizmo").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<div class=\"alert alert-danger\">Failed to create</div>"));
}

#[tokio::test]
async fn test_api_modules_and_submit() {
    let server = console(spawn_backend().await, false);

    let (status, body) = get(&server, "/api/modules").await;
    assert_eq!(status, StatusCode::OK);
    let modules: Value = serde_json::from_str(&body).unwrap();
    let ids: Vec<&str> = modules
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["createThing", "createWidget", "searchList", "signUp"]);

    let (status, view) = post_json(&server, "/api/modules/createWidget/submit", json!({"name": "x"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["success"], "Created x");

    let (status, view) = post_json(&server, "/api/modules/searchList/submit", json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(view["field_errors"][0]["field"], "id");

    let (status, _) = post_json(&server, "/api/modules/nope/submit", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_module_detail_keeps_selection() {
    let server = console(spawn_backend().await, false);
    let (status, body) = get(&server, "/api/modules/signUp").await;
    assert_eq!(status, StatusCode::OK);
    let detail: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(detail["descriptor"]["meta"]["endpoint"], "/signup");
    assert_eq!(detail["form"]["actions"][1]["name"], "validate-address");

    let (_, html) = get(&server, "/").await;
    assert!(html.contains("<a href=\"/modules/createThing\" class=\"active\">"));
}

#[tokio::test]
async fn test_mounted_demo_backend() {
    let server = console(spawn_backend().await, true);
    let req = Request::post("/create-widget")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"inline"}"#))
        .unwrap();
    let (status, body) = send(server.router(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), r#"{"message":"Created inline"}"#);
}

/// Echoes the request's content type and parsed JSON body
async fn spawn_echo() -> SocketAddr {
    async fn echo(headers: axum::http::HeaderMap, body: axum::body::Bytes) -> axum::Json<Value> {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        axum::Json(json!({"contentType": content_type, "body": body}))
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().route("/echo", axum::routing::post(echo)))
            .await
            .unwrap();
    });
    addr
}

#[tokio::test]
async fn test_transport_posts_json_content_type() {
    let addr = spawn_echo().await;
    let transport =
        HttpTransport::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();

    let sent = json!({"name": "gizmo", "count": 3});
    let reply = transport.post_json("/echo", &sent).await.unwrap();
    assert_eq!(reply.status, 200);

    let echoed: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(echoed["contentType"], "application/json");
    assert_eq!(echoed["body"], sent);
}
