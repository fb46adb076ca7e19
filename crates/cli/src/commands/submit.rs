//! Submit Command

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use tracing::debug;

use testtool_common::fields::FieldSpec;
use testtool_common::{Error, ModuleRegistry, Transport};

use crate::output::{print_form_view, OutputFormat};

#[derive(Args)]
pub struct SubmitArgs {
    /// Module ID
    pub id: String,

    /// Form model as a JSON object
    #[arg(long)]
    pub data: Option<String>,

    /// Set one field (name=value), coerced like console input; repeatable
    #[arg(short, long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// Run a form action before submitting (e.g. validate-address); repeatable
    #[arg(long, value_name = "ACTION")]
    pub before: Vec<String>,
}

/// Build the submit model from `--data` and `--field` arguments.
///
/// Fields are applied over the JSON data in order; a blank value removes
/// the key. Names the form does not render are kept as text.
pub fn build_model(fields: &[FieldSpec], data: Option<&str>, pairs: &[String]) -> Result<Value> {
    let mut model = match data {
        Some(text) => match serde_json::from_str(text).context("--data is not valid JSON")? {
            Value::Object(map) => map,
            _ => bail!("--data must be a JSON object"),
        },
        None => Map::new(),
    };

    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("--field expects NAME=VALUE, got '{}'", pair);
        };
        let spec = fields
            .iter()
            .find(|f| f.name == name)
            .cloned()
            .unwrap_or_else(|| FieldSpec::text(name));
        match spec.coerce(raw) {
            Some(value) => {
                model.insert(name.to_string(), value);
            }
            None => {
                model.remove(name);
            }
        }
    }
    Ok(Value::Object(model))
}

/// Submit once; returns whether the form ended without errors
pub async fn execute(
    args: SubmitArgs,
    registry: &ModuleRegistry,
    transport: &dyn Transport,
    format: OutputFormat,
) -> Result<bool> {
    let mut form = registry.mount(&args.id)?;
    let model = build_model(&form.fields(), args.data.as_deref(), &args.fields)?;
    debug!("Submitting {} with {}", args.id, model);

    for action in &args.before {
        form.run_action(action, transport, model.clone()).await?;
    }

    match form.submit(transport, model).await {
        Ok(()) | Err(Error::Validation(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let view = form.render();
    print_form_view(&view, format);
    Ok(view.error.is_none() && view.field_errors.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use testtool_common::fields::FieldKind;

    fn fields() -> Vec<FieldSpec> {
        let mut id = FieldSpec::text("id");
        id.kind = FieldKind::Integer;
        let mut flag = FieldSpec::text("flag");
        flag.kind = FieldKind::Boolean;
        vec![id, flag, FieldSpec::text("name")]
    }

    #[test]
    fn test_fields_coerced_over_data() {
        let model = build_model(
            &fields(),
            Some(r#"{"name": "from-data", "extra": [1]}"#),
            &["id=42".to_string(), "flag=on".to_string(), "name=override".to_string()],
        )
        .unwrap();
        assert_eq!(
            model,
            json!({"name": "override", "extra": [1], "id": 42, "flag": true})
        );
    }

    #[test]
    fn test_blank_field_removes_key() {
        let model = build_model(&fields(), Some(r#"{"id": 1}"#), &["id=".to_string()]).unwrap();
        assert_eq!(model, json!({}));
    }

    #[test]
    fn test_unknown_field_kept_as_text() {
        let model = build_model(&fields(), None, &["note=42".to_string()]).unwrap();
        assert_eq!(model, json!({"note": "42"}));
    }

    #[test]
    fn test_bad_arguments_rejected() {
        assert!(build_model(&fields(), Some("[1, 2]"), &[]).is_err());
        assert!(build_model(&fields(), Some("{"), &[]).is_err());
        assert!(build_model(&fields(), None, &["novalue".to_string()]).is_err());
    }
}
