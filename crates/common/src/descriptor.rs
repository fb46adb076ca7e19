//! Module descriptors
//!
//! A descriptor is the static record that defines one form: its id, label,
//! JSON Schema and endpoint metadata. Descriptors are parsed from JSON with
//! camelCase keys and shape-checked once at load time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use indexmap::IndexMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Response key read when no `responseMapping.message` is configured
pub const DEFAULT_MESSAGE_KEY: &str = "message";

/// Submit control label when none is configured
pub const DEFAULT_SUBMIT_LABEL: &str = "Submit";

/// Outbound key renames; iteration follows the descriptor's key order
pub type RequestMapping = IndexMap<String, String>;

/// Static configuration record for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub id: String,
    pub label: String,
    pub schema: Value,
    pub meta: ModuleMeta,
}

/// Endpoint metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMeta {
    /// Submission target; relative paths resolve against the backend URL
    pub endpoint: String,

    /// form field name -> outbound payload key, in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_mapping: Option<RequestMapping>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mapping: Option<ResponseMapping>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,

    /// Module-specific keys, kept verbatim for bespoke forms
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which response fields hold the display message and the result list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
}

impl ModuleDescriptor {
    /// Parse and shape-check a descriptor from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let descriptor: Self = serde_json::from_str(text)?;
        descriptor.check()?;
        Ok(descriptor)
    }

    /// Load a descriptor file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Serialization(e) => {
                Error::InvalidConfig(format!("{}: {}", path.display(), e))
            }
            other => other,
        })
    }

    /// Shape checks that serde cannot express
    pub fn check(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidConfig("module id must not be empty".into()));
        }
        if self.label.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "module {}: label must not be empty",
                self.id
            )));
        }
        if !self.schema.is_object() {
            return Err(Error::InvalidConfig(format!(
                "module {}: schema must be a JSON object",
                self.id
            )));
        }
        if self.meta.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "module {}: meta.endpoint must not be empty",
                self.id
            )));
        }
        if let Some(mapping) = &self.meta.request_mapping {
            if let Some((source, _)) = mapping.iter().find(|(_, target)| target.is_empty()) {
                return Err(Error::InvalidConfig(format!(
                    "module {}: requestMapping.{} has an empty target",
                    self.id, source
                )));
            }
        }
        Ok(())
    }

    /// Response key holding the success message
    pub fn message_key(&self) -> &str {
        self.meta
            .response_mapping
            .as_ref()
            .and_then(|m| m.message.as_deref())
            .unwrap_or(DEFAULT_MESSAGE_KEY)
    }

    /// Response key holding the result list, if tabular display is configured
    pub fn results_key(&self) -> Option<&str> {
        self.meta
            .response_mapping
            .as_ref()
            .and_then(|m| m.results.as_deref())
    }

    pub fn submit_label(&self) -> &str {
        self.meta.submit_label.as_deref().unwrap_or(DEFAULT_SUBMIT_LABEL)
    }

    /// String value of a module-specific meta key
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.meta.extra.get(key).and_then(Value::as_str)
    }
}
