//! testtool web console
//!
//! Server-rendered console over the shared module shell: a sidebar of
//! modules, the active form with its banners and result table, and a JSON
//! mirror of the same operations under `/api`.

pub mod render;
pub mod server;
pub mod static_files;

pub use server::{WebServer, WebServerConfig};
