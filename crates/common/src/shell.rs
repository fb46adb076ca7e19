//! Shell: module selection and the active form

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::form::{FormView, ModuleForm};
use crate::registry::ModuleRegistry;
use crate::transport::Transport;

pub const WELCOME_TITLE: &str = "Welcome";
pub const WELCOME_TEXT: &str = "Select an option from the sidebar.";

/// One sidebar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarItem {
    pub id: String,
    pub label: String,
    pub active: bool,
}

/// Sidebar plus either the active form or the welcome state
#[derive(Debug, Clone, Serialize)]
pub struct ShellView {
    pub sidebar: Vec<SidebarItem>,
    /// `None` renders the welcome state
    pub form: Option<FormView>,
}

/// Holds the registry and the single active form instance
pub struct Shell {
    registry: Arc<ModuleRegistry>,
    active: Option<Box<dyn ModuleForm>>,
}

impl Shell {
    /// Start with the first registered module selected, if any
    pub fn new(registry: Arc<ModuleRegistry>) -> Result<Self> {
        let active = match registry.first() {
            Some(entry) => Some(registry.mount(entry.id())?),
            None => None,
        };
        Ok(Self { registry, active })
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_ref().map(|form| form.descriptor().id.as_str())
    }

    pub fn active(&self) -> Option<&dyn ModuleForm> {
        self.active.as_deref()
    }

    /// Mount a fresh instance of `id`, discarding the previous form and all
    /// of its display state. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: &str) -> Result<()> {
        let form = self.registry.mount(id)?;
        debug!("Selected module {}", id);
        self.active = Some(form);
        Ok(())
    }

    pub fn sidebar(&self) -> Vec<SidebarItem> {
        let active = self.active_id();
        self.registry
            .iter()
            .map(|entry| SidebarItem {
                id: entry.id().to_string(),
                label: entry.label().to_string(),
                active: active == Some(entry.id()),
            })
            .collect()
    }

    pub fn render(&self) -> ShellView {
        ShellView {
            sidebar: self.sidebar(),
            form: self.active.as_ref().map(|form| form.render()),
        }
    }

    fn active_mut(&mut self) -> Result<&mut Box<dyn ModuleForm>> {
        self.active.as_mut().ok_or_else(|| Error::NotFound {
            kind: "module".to_string(),
            id: "(none selected)".to_string(),
        })
    }

    /// Submit the active form
    pub async fn submit(&mut self, transport: &dyn Transport, model: Value) -> Result<()> {
        self.active_mut()?.submit(transport, model).await
    }

    /// Run a secondary action on the active form
    pub async fn run_action(&mut self, action: &str, transport: &dyn Transport, model: Value) -> Result<()> {
        self.active_mut()?.run_action(action, transport, model).await
    }
}
