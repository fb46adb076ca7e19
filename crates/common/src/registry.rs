//! Module registry
//!
//! The registry is built once at startup from an explicit list of module
//! sources: descriptors embedded in the binary or descriptor files named in
//! the configuration. Nothing is discovered by scanning directories.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::bespoke::BespokeKind;
use crate::descriptor::ModuleDescriptor;
use crate::error::{Error, Result};
use crate::form::{GenericModuleForm, ModuleForm};
use crate::validator::ValidatorCache;

/// A descriptor compiled into the binary
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub id: &'static str,
    pub json: &'static str,
    pub bespoke: Option<BespokeKind>,
}

/// Modules shipped with testtool, in sidebar order
pub const BUILTINS: &[Builtin] = &[
    Builtin {
        id: "createThing",
        json: include_str!("../modules/createThing.json"),
        bespoke: Some(BespokeKind::CreateThing),
    },
    Builtin {
        id: "createWidget",
        json: include_str!("../modules/createWidget.json"),
        bespoke: Some(BespokeKind::CreateWidget),
    },
    Builtin {
        id: "searchList",
        json: include_str!("../modules/searchList.json"),
        bespoke: None,
    },
    Builtin {
        id: "signUp",
        json: include_str!("../modules/signUp.json"),
        bespoke: Some(BespokeKind::SignUp),
    },
];

/// Where one module comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    Builtin(String),
    File {
        path: PathBuf,
        bespoke: Option<BespokeKind>,
    },
}

/// A registered module
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    pub descriptor: Arc<ModuleDescriptor>,
    pub bespoke: Option<BespokeKind>,
}

impl ModuleEntry {
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn label(&self) -> &str {
        &self.descriptor.label
    }
}

/// All modules known to the tool, plus their compiled validators
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
    validators: ValidatorCache,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in module
    pub fn builtin() -> Result<Self> {
        let sources: Vec<ModuleSource> = BUILTINS
            .iter()
            .map(|b| ModuleSource::Builtin(b.id.to_string()))
            .collect();
        Self::from_sources(&sources)
    }

    /// Build a registry from an enumerated source list, in order
    pub fn from_sources(sources: &[ModuleSource]) -> Result<Self> {
        let mut registry = Self::new();
        for source in sources {
            match source {
                ModuleSource::Builtin(id) => {
                    let builtin = BUILTINS.iter().find(|b| b.id == id).ok_or_else(|| {
                        Error::NotFound {
                            kind: "builtin module".to_string(),
                            id: id.clone(),
                        }
                    })?;
                    let descriptor = ModuleDescriptor::from_json(builtin.json)?;
                    registry.register(descriptor, builtin.bespoke)?;
                }
                ModuleSource::File { path, bespoke } => {
                    let descriptor = ModuleDescriptor::load(path)?;
                    debug!("Loaded module {} from {}", descriptor.id, path.display());
                    registry.register(descriptor, *bespoke)?;
                }
            }
        }
        info!("Registered {} module(s)", registry.len());
        Ok(registry)
    }

    /// Add a module; its id must be new and its schema must compile
    pub fn register(&mut self, descriptor: ModuleDescriptor, bespoke: Option<BespokeKind>) -> Result<()> {
        descriptor.check()?;
        if self.get(&descriptor.id).is_some() {
            return Err(Error::DuplicateModule { id: descriptor.id });
        }
        self.validators
            .get_or_compile(&descriptor.schema)
            .map_err(|e| Error::InvalidConfig(format!("module {}: {}", descriptor.id, e)))?;

        self.entries.push(ModuleEntry {
            descriptor: Arc::new(descriptor),
            bespoke,
        });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn first(&self) -> Option<&ModuleEntry> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn validators(&self) -> &ValidatorCache {
        &self.validators
    }

    /// Mount a fresh form instance for a module
    pub fn mount(&self, id: &str) -> Result<Box<dyn ModuleForm>> {
        let entry = self.get(id).ok_or_else(|| Error::NotFound {
            kind: "module".to_string(),
            id: id.to_string(),
        })?;
        let validator = self.validators.get_or_compile(&entry.descriptor.schema)?;

        Ok(match entry.bespoke {
            Some(kind) => kind.mount(entry.descriptor.clone(), validator),
            None => Box::new(GenericModuleForm::new(entry.descriptor.clone(), validator)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn descriptor(id: &str) -> ModuleDescriptor {
        serde_json::from_value(json!({
            "id": id,
            "label": id.to_uppercase(),
            "schema": {"type": "object", "properties": {"q": {"type": "string"}}},
            "meta": {"endpoint": "/q"}
        }))
        .unwrap()
    }

    #[test]
    fn test_builtins_load_in_order() {
        let registry = ModuleRegistry::builtin().unwrap();
        let ids: Vec<&str> = registry.iter().map(|e| e.id()).collect();
        assert_eq!(ids, ["createThing", "createWidget", "searchList", "signUp"]);
        assert_eq!(registry.get("signUp").unwrap().bespoke, Some(BespokeKind::SignUp));
        assert_eq!(registry.get("searchList").unwrap().bespoke, None);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = ModuleRegistry::new();
        registry.register(descriptor("a"), None).unwrap();
        let err = registry.register(descriptor("a"), None).unwrap_err();
        assert!(matches!(err, Error::DuplicateModule { id } if id == "a"));
    }

    #[test]
    fn test_uncompilable_schema_rejected() {
        let mut d = descriptor("bad");
        d.schema = json!({"type": "object", "properties": {"q": {"type": 12}}});
        let err = ModuleRegistry::new().register(d, None).unwrap_err();
        assert!(err.to_string().contains("module bad"));
    }

    #[test]
    fn test_file_sources() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("orders.json");
        std::fs::write(&path, serde_json::to_string(&descriptor("orders")).unwrap()).unwrap();

        let registry = ModuleRegistry::from_sources(&[
            ModuleSource::Builtin("searchList".into()),
            ModuleSource::File { path, bespoke: None },
        ])
        .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.first().unwrap().id(), "searchList");
        assert_eq!(registry.get("orders").unwrap().label(), "ORDERS");
    }

    #[test]
    fn test_unknown_builtin_rejected() {
        let err = ModuleRegistry::from_sources(&[ModuleSource::Builtin("nope".into())]).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_mount_shares_compiled_validator() {
        let mut registry = ModuleRegistry::new();
        registry.register(descriptor("a"), None).unwrap();
        registry.register(descriptor("b"), None).unwrap();

        // identical schemas compile once
        assert_eq!(registry.validators().len(), 1);
        let form = registry.mount("b").unwrap();
        assert_eq!(form.descriptor().id, "b");
        assert!(registry.mount("c").is_err());
    }

    #[test]
    fn test_debug_lists_entries() {
        let registry = ModuleRegistry::builtin().unwrap();
        let text = format!("{:?}", registry);
        assert!(text.contains("createWidget"));
        assert!(text.contains("ValidatorCache"));
    }
}
