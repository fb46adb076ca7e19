//! Schema validator adapter
//!
//! Wraps the `jsonschema` engine into a single validate call that reports
//! every failing field, and keeps compiled validators in a cache keyed by
//! schema identity.

use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, FieldError, Result, ValidationErrors};

/// Field name used when the engine reports no instance path
pub const UNRESOLVED_FIELD: &str = "field";

/// A compiled JSON Schema
pub struct SchemaValidator {
    compiled: JSONSchema,
    schema: Value,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile a schema
    pub fn compile(schema: &Value) -> Result<Self> {
        let compiled = JSONSchema::compile(schema)
            .map_err(|e| Error::InvalidConfig(format!("schema does not compile: {}", e)))?;
        Ok(Self {
            compiled,
            schema: schema.clone(),
        })
    }

    /// Validate a candidate model.
    ///
    /// Schema defaults are written into `model` first, so the caller sees the
    /// defaulted model whether or not validation passes. All errors are
    /// returned, in the order the engine reports them.
    pub fn validate(&self, model: &mut Value) -> std::result::Result<(), ValidationErrors> {
        apply_defaults(&self.schema, model);

        let errors: Vec<FieldError> = match self.compiled.validate(model) {
            Ok(()) => return Ok(()),
            Err(errors) => errors.map(to_field_error).collect(),
        };
        Err(ValidationErrors(errors))
    }
}

fn to_field_error(err: jsonschema::ValidationError<'_>) -> FieldError {
    let mut segments = err.instance_path.clone().into_vec();
    if let ValidationErrorKind::Required { property } = &err.kind {
        if let Some(name) = property.as_str() {
            segments.push(name.to_string());
        }
    }

    let field = if segments.is_empty() {
        UNRESOLVED_FIELD.to_string()
    } else {
        segments.join("/")
    };

    FieldError {
        field,
        message: err.to_string(),
    }
}

/// Fill in `default` values from `properties`, recursing into nested objects
pub fn apply_defaults(schema: &Value, model: &mut Value) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    let Some(object) = model.as_object_mut() else {
        return;
    };

    for (name, property_schema) in properties {
        if !object.contains_key(name) {
            if let Some(default) = property_schema.get("default") {
                object.insert(name.clone(), default.clone());
            }
        }
        if let Some(child) = object.get_mut(name) {
            apply_defaults(property_schema, child);
        }
    }
}

/// Hex SHA-256 of the schema's JSON text
pub fn schema_fingerprint(schema: &Value) -> String {
    hex::encode(Sha256::digest(schema.to_string().as_bytes()))
}

/// Compiled validators keyed by schema fingerprint
#[derive(Debug, Default)]
pub struct ValidatorCache {
    entries: RwLock<HashMap<String, Arc<SchemaValidator>>>,
}

impl ValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached validator for `schema`, compiling it on first use
    pub fn get_or_compile(&self, schema: &Value) -> Result<Arc<SchemaValidator>> {
        let key = schema_fingerprint(schema);
        if let Some(hit) = self.entries.read().get(&key) {
            return Ok(hit.clone());
        }

        let compiled = Arc::new(SchemaValidator::compile(schema)?);
        debug!("Compiled schema {}", &key[..12]);
        let mut entries = self.entries.write();
        Ok(entries.entry(key).or_insert(compiled).clone())
    }

    /// Drop the cached validator for `schema`; returns whether one existed
    pub fn invalidate(&self, schema: &Value) -> bool {
        self.entries.write().remove(&schema_fingerprint(schema)).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "age": {"type": "integer", "minimum": 0},
                "country": {"type": "string", "default": "NZ"}
            },
            "required": ["name", "age"]
        })
    }

    #[test]
    fn test_missing_required_names_field() {
        let v = SchemaValidator::compile(&person_schema()).unwrap();
        let mut model = json!({"age": 3});

        let errors = v.validate(&mut model).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.0[0].field, "name");
    }

    #[test]
    fn test_collects_all_errors() {
        let v = SchemaValidator::compile(&person_schema()).unwrap();
        let mut model = json!({"name": "", "age": -1});

        let errors = v.validate(&mut model).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(errors.len(), 2);
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"age"));
    }

    #[test]
    fn test_defaults_applied_in_place() {
        let v = SchemaValidator::compile(&person_schema()).unwrap();
        let mut model = json!({"name": "Ada", "age": 36});

        v.validate(&mut model).unwrap();
        assert_eq!(model["country"], "NZ");
    }

    #[test]
    fn test_defaults_applied_even_when_invalid() {
        let v = SchemaValidator::compile(&person_schema()).unwrap();
        let mut model = json!({});

        assert!(v.validate(&mut model).is_err());
        assert_eq!(model["country"], "NZ");
    }

    #[test]
    fn test_nested_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {"country": {"type": "string", "default": "NZ"}}
                }
            }
        });
        let mut model = json!({"address": {}});
        apply_defaults(&schema, &mut model);
        assert_eq!(model["address"]["country"], "NZ");
    }

    #[test]
    fn test_nested_error_path() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {"zip": {"type": "string"}},
                    "required": ["zip"]
                }
            }
        });
        let v = SchemaValidator::compile(&schema).unwrap();
        let mut model = json!({"address": {}});

        let errors = v.validate(&mut model).unwrap_err();
        assert_eq!(errors.0[0].field, "address/zip");
    }

    #[test]
    fn test_root_error_falls_back_to_literal() {
        let v = SchemaValidator::compile(&json!({"type": "object"})).unwrap();
        let mut model = json!(42);

        let errors = v.validate(&mut model).unwrap_err();
        assert_eq!(errors.0[0].field, UNRESOLVED_FIELD);
    }

    #[test]
    fn test_bad_schema_rejected() {
        let err = SchemaValidator::compile(&json!({"type": "no-such-type"})).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_cache_reuses_and_invalidates() {
        let cache = ValidatorCache::new();
        let schema = person_schema();

        let a = cache.get_or_compile(&schema).unwrap();
        let b = cache.get_or_compile(&schema).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&schema));
        assert!(cache.is_empty());
        assert!(!cache.invalidate(&schema));
    }
}
