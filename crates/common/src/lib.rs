//! testtool common library
//!
//! Schema-driven module forms: descriptors, validation, request and
//! response mapping, the module registry and the shell that hosts the
//! active form. The web console and the CLI are thin front ends over this.

pub mod bespoke;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fields;
pub mod form;
pub mod mapping;
pub mod registry;
pub mod shell;
pub mod transport;
pub mod validator;

// Re-export commonly used types
pub use bespoke::BespokeKind;
pub use config::{ModuleConfig, ToolConfig, WebConfig};
pub use descriptor::{ModuleDescriptor, ModuleMeta, RequestMapping, ResponseMapping};
pub use error::{Error, FieldError, Result, ValidationErrors};
pub use fields::{model_from_inputs, FieldKind, FieldSpec};
pub use form::{FormAction, FormState, FormView, ModuleForm, Notice, Tone};
pub use mapping::{ResultTable, SuccessView};
pub use registry::{ModuleEntry, ModuleRegistry, ModuleSource};
pub use shell::{Shell, ShellView, SidebarItem};
pub use transport::{HttpReply, HttpTransport, Transport};
pub use validator::{SchemaValidator, ValidatorCache};

/// testtool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    std::env::var_os("TESTTOOL_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("testtool.toml"))
}
