//! Form fields derived from a JSON Schema
//!
//! Front ends render `FieldSpec`s and hand raw text input back through
//! [`model_from_inputs`], which coerces it into a JSON model the validator
//! understands.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::mapping::display_value;

/// Input widget kind for a field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Number,
    Boolean,
    Choice { options: Vec<Value> },
    /// Objects and arrays, entered as JSON text
    Json,
}

/// One renderable form field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    fn from_property(name: &str, property: &Value, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: property
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            kind: kind_of(property),
            required,
            default: property.get("default").cloned(),
            description: property
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Plain text field for names the schema does not describe
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            kind: FieldKind::Text,
            required: false,
            default: None,
            description: None,
        }
    }

    /// Display text of the default value, empty if none
    pub fn default_text(&self) -> String {
        self.default.as_ref().map(display_value).unwrap_or_default()
    }

    /// Coerce one raw input; `None` means "leave the key out"
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let value = match &self.kind {
            FieldKind::Text => Value::String(raw.to_string()),
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            FieldKind::Number => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
            FieldKind::Boolean => Value::Bool(matches!(
                trimmed.to_ascii_lowercase().as_str(),
                "true" | "on" | "1" | "yes"
            )),
            FieldKind::Choice { options } => options
                .iter()
                .find(|option| display_value(option) == trimmed)
                .cloned()
                .unwrap_or_else(|| Value::String(raw.to_string())),
            FieldKind::Json => serde_json::from_str(trimmed)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        Some(value)
    }
}

fn kind_of(property: &Value) -> FieldKind {
    if let Some(options) = property.get("enum").and_then(Value::as_array) {
        return FieldKind::Choice {
            options: options.clone(),
        };
    }

    let ty = match property.get("type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    };

    match ty {
        Some("integer") => FieldKind::Integer,
        Some("number") => FieldKind::Number,
        Some("boolean") => FieldKind::Boolean,
        Some("object") | Some("array") => FieldKind::Json,
        _ => FieldKind::Text,
    }
}

fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Every top-level property of the schema, in declaration order
pub fn fields_from_schema(schema: &Value) -> Vec<FieldSpec> {
    let required = required_names(schema);
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| {
            properties
                .iter()
                .map(|(name, property)| {
                    FieldSpec::from_property(name, property, required.contains(&name.as_str()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// A fixed subset of fields, in the given order
pub fn fields_named(schema: &Value, names: &[&str]) -> Vec<FieldSpec> {
    let all = fields_from_schema(schema);
    names
        .iter()
        .map(|name| {
            all.iter()
                .find(|f| f.name == *name)
                .cloned()
                .unwrap_or_else(|| FieldSpec::text(name))
        })
        .collect()
}

/// Build a JSON model from raw `(name, value)` inputs.
///
/// Later pairs win over earlier ones. Inputs that name no field are dropped.
pub fn model_from_inputs(fields: &[FieldSpec], inputs: &[(String, String)]) -> Value {
    let mut model = Map::new();
    for field in fields {
        let raw = inputs
            .iter()
            .rev()
            .find(|(name, _)| *name == field.name)
            .map(|(_, value)| value.as_str());
        if let Some(value) = raw.and_then(|raw| field.coerce(raw)) {
            model.insert(field.name.clone(), value);
        }
    }
    Value::Object(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "title": "Widget name"},
                "count": {"type": "integer", "default": 1},
                "ratio": {"type": "number"},
                "active": {"type": "boolean"},
                "size": {"enum": ["small", "large", 3]},
                "tags": {"type": "array", "items": {"type": "string"}},
                "note": {"type": ["string", "null"]}
            },
            "required": ["name"]
        })
    }

    #[test]
    fn test_fields_follow_declaration_order() {
        let fields = fields_from_schema(&schema());
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "count", "ratio", "active", "size", "tags", "note"]);
        assert_eq!(fields[0].label, "Widget name");
        assert!(fields[0].required);
        assert!(!fields[1].required);
        assert_eq!(fields[1].default_text(), "1");
        assert_eq!(fields[6].kind, FieldKind::Text);
    }

    #[test]
    fn test_coercion_by_kind() {
        let fields = fields_from_schema(&schema());
        let inputs: Vec<(String, String)> = [
            ("name", "gizmo"),
            ("count", "4"),
            ("ratio", "0.5"),
            ("active", "on"),
            ("size", "3"),
            ("tags", r#"["a","b"]"#),
            ("unknown", "dropped"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let model = model_from_inputs(&fields, &inputs);
        assert_eq!(
            model,
            json!({
                "name": "gizmo",
                "count": 4,
                "ratio": 0.5,
                "active": true,
                "size": 3,
                "tags": ["a", "b"]
            })
        );
    }

    #[test]
    fn test_blank_inputs_are_omitted() {
        let fields = fields_from_schema(&schema());
        let inputs = vec![("name".to_string(), "   ".to_string())];
        assert_eq!(model_from_inputs(&fields, &inputs), json!({}));
    }

    #[test]
    fn test_unparseable_number_kept_as_text() {
        let fields = fields_from_schema(&schema());
        let inputs = vec![("count".to_string(), "many".to_string())];
        assert_eq!(model_from_inputs(&fields, &inputs), json!({"count": "many"}));
    }

    #[test]
    fn test_last_input_wins() {
        let fields = fields_from_schema(&schema());
        let inputs = vec![
            ("active".to_string(), "false".to_string()),
            ("active".to_string(), "true".to_string()),
        ];
        assert_eq!(model_from_inputs(&fields, &inputs), json!({"active": true}));
    }

    #[test]
    fn test_fields_named_fills_gaps() {
        let fields = fields_named(&schema(), &["name", "phone"]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1], FieldSpec::text("phone"));
    }
}
