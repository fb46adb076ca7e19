//! Static file serving

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Embedded console assets
pub struct StaticFiles {}

impl StaticFiles {
    pub fn new() -> Self {
        Self {}
    }

    /// Serve a static file
    pub fn serve(&self, path: &str) -> Response {
        match path {
            "console.css" => serve_embedded(CONSOLE_CSS, guess_content_type(path)),
            _ => (StatusCode::NOT_FOUND, "File not found").into_response(),
        }
    }
}

impl Default for StaticFiles {
    fn default() -> Self {
        Self::new()
    }
}

fn guess_content_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn serve_embedded(content: &'static str, content_type: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        content,
    )
        .into_response()
}

const CONSOLE_CSS: &str = r#"
* { box-sizing: border-box; }
body {
    margin: 0;
    display: flex;
    min-height: 100vh;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    color: #212529;
}
.sidebar {
    width: 220px;
    background: #343a40;
    color: #fff;
    padding: 1rem 0;
}
.sidebar .brand { font-weight: 600; padding: 0 1rem 1rem; }
.sidebar ul { list-style: none; margin: 0; padding: 0; }
.sidebar a {
    display: block;
    padding: 0.5rem 1rem;
    color: #ced4da;
    text-decoration: none;
}
.sidebar a:hover { background: #495057; color: #fff; }
.sidebar a.active { background: #0d6efd; color: #fff; }
main { flex: 1; padding: 1.5rem 2rem; max-width: 900px; }
.alert { padding: 0.75rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
.alert-success { background: #d1e7dd; color: #0f5132; }
.alert-warning { background: #fff3cd; color: #664d03; }
.alert-danger { background: #f8d7da; color: #842029; }
.field { margin-bottom: 1rem; display: flex; flex-direction: column; }
.field label { font-weight: 500; margin-bottom: 0.25rem; }
.field input[type=text], .field input[type=number], .field select, .field textarea {
    padding: 0.375rem 0.75rem;
    border: 1px solid #ced4da;
    border-radius: 4px;
}
.field.invalid input, .field.invalid select, .field.invalid textarea { border-color: #dc3545; }
.field-error, .errors { color: #dc3545; font-size: 0.875rem; }
.field small { color: #6c757d; }
.actions button {
    padding: 0.375rem 0.75rem;
    margin-right: 0.5rem;
    border: 1px solid #6c757d;
    border-radius: 4px;
    background: #fff;
    cursor: pointer;
}
.actions button.primary { background: #0d6efd; border-color: #0d6efd; color: #fff; }
table.results { border-collapse: collapse; margin-top: 1.5rem; width: 100%; }
table.results th, table.results td { border: 1px solid #dee2e6; padding: 0.5rem; text-align: left; }
table.results thead { background: #f8f9fa; }
"#;
