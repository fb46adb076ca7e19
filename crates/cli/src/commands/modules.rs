//! Module Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;

use testtool_common::fields::{FieldKind, FieldSpec};
use testtool_common::mapping::display_value;
use testtool_common::registry::{ModuleEntry, ModuleRegistry};

use crate::output::{print_item, print_list, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum ModulesCommands {
    /// List registered modules
    List,

    /// Show a module and its fields
    Show {
        /// Module ID
        id: String,
    },
}

/// Module display wrapper for serialization
#[derive(Debug, Serialize)]
pub struct ModuleDisplay {
    pub id: String,
    pub label: String,
    pub endpoint: String,
    pub form: String,
    pub submit_label: String,
}

impl From<&ModuleEntry> for ModuleDisplay {
    fn from(entry: &ModuleEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            label: entry.label().to_string(),
            endpoint: entry.descriptor.meta.endpoint.clone(),
            form: entry
                .bespoke
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "generic".to_string()),
            submit_label: entry.descriptor.submit_label().to_string(),
        }
    }
}

impl TableDisplay for ModuleDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Label", "Endpoint", "Form", "Submit"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.label.clone(),
            self.endpoint.clone(),
            self.form.clone(),
            self.submit_label.clone(),
        ]
    }
}

/// Field display wrapper for serialization
#[derive(Debug, Serialize)]
pub struct FieldDisplay {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
    pub default: String,
}

impl From<FieldSpec> for FieldDisplay {
    fn from(field: FieldSpec) -> Self {
        let kind = match &field.kind {
            FieldKind::Text => "text".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::Number => "number".to_string(),
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::Choice { options } => {
                let options: Vec<String> = options.iter().map(display_value).collect();
                format!("choice({})", options.join("|"))
            }
            FieldKind::Json => "json".to_string(),
        };
        Self {
            default: field.default_text(),
            name: field.name,
            label: field.label,
            kind,
            required: field.required,
        }
    }
}

impl TableDisplay for FieldDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Label", "Kind", "Required", "Default"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.label.clone(),
            self.kind.clone(),
            self.required.to_string(),
            self.default.clone(),
        ]
    }
}

pub async fn execute(cmd: ModulesCommands, registry: &ModuleRegistry, format: OutputFormat) -> Result<()> {
    match cmd {
        ModulesCommands::List => {
            let displays: Vec<ModuleDisplay> = registry.iter().map(ModuleDisplay::from).collect();
            print_list(&displays, format);
        }

        ModulesCommands::Show { id } => {
            let entry = registry
                .get(&id)
                .ok_or_else(|| anyhow::anyhow!("Unknown module: {}", id))?;
            print_item(&ModuleDisplay::from(entry), format);

            // fields as the mounted form renders them
            let form = registry.mount(&id)?;
            let fields: Vec<FieldDisplay> = form.fields().into_iter().map(FieldDisplay::from).collect();
            print_list(&fields, format);
        }
    }

    Ok(())
}
