//! Request remap, response extraction and the results table

use serde::Serialize;
use serde_json::{Map, Value};
use crate::descriptor::{ModuleDescriptor, RequestMapping};

/// Column header used when the result list holds scalars
pub const SCALAR_COLUMN: &str = "Result";

/// Render a JSON value as cell/banner text
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the outbound payload from form data.
///
/// With a mapping, the payload holds only the mapping targets, each taken
/// from `form_data[source]`; sources missing from the form data are left
/// out. Form keys the mapping does not mention are dropped. Payload keys
/// follow the mapping's order, and when two sources share a target the one
/// declared last wins. Without a mapping the form data passes through
/// unchanged.
pub fn remap_request(mapping: Option<&RequestMapping>, form_data: &Value) -> Value {
    let Some(mapping) = mapping else {
        return form_data.clone();
    };

    let mut payload = Map::new();
    for (source, target) in mapping {
        if let Some(value) = form_data.get(source) {
            payload.insert(target.clone(), value.clone());
        }
    }
    Value::Object(payload)
}

/// What a successful submission displays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuccessView {
    /// Success banner text; an empty string shows no banner
    Message { text: String },
    /// Tabular result set; `None` when the list was empty or not a list
    Results { table: Option<ResultTable> },
}

impl SuccessView {
    /// Pick the display for a parsed 2xx response body
    pub fn from_response(descriptor: &ModuleDescriptor, body: &Value) -> Self {
        match descriptor.results_key() {
            Some(key) => SuccessView::Results {
                table: ResultTable::from_value(body.get(key)),
            },
            None => SuccessView::Message {
                text: body
                    .get(descriptor.message_key())
                    .map(display_value)
                    .unwrap_or_default(),
            },
        }
    }
}

/// Rows and columns of a result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// Build a table from a result list.
    ///
    /// Columns come from the keys of the first element only; later records
    /// with other keys lose those cells. A list of scalars yields the single
    /// `Result` column.
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        let items = value?.as_array()?;
        let first = items.first()?;

        let table = match first {
            Value::Object(record) => {
                let columns: Vec<String> = record.keys().cloned().collect();
                let rows = items
                    .iter()
                    .map(|item| {
                        columns
                            .iter()
                            .map(|column| item.get(column).map(display_value).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                Self { columns, rows }
            }
            _ => Self {
                columns: vec![SCALAR_COLUMN.to_string()],
                rows: items.iter().map(|item| vec![display_value(item)]).collect(),
            },
        };
        Some(table)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(meta: Value) -> ModuleDescriptor {
        serde_json::from_value(json!({
            "id": "m",
            "label": "M",
            "schema": {"type": "object"},
            "meta": meta
        }))
        .unwrap()
    }

    #[test]
    fn test_remap_drops_unmapped_keys() {
        let mapping: RequestMapping =
            [("a", "x"), ("b", "y")].iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let payload = remap_request(Some(&mapping), &json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(payload, json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_remap_skips_missing_sources() {
        let mapping: RequestMapping =
            [("a".to_string(), "x".to_string())].into_iter().collect();
        assert_eq!(remap_request(Some(&mapping), &json!({"b": 2})), json!({}));
    }

    #[test]
    fn test_remap_follows_declaration_order() {
        let mapping: RequestMapping = [("zeta", "z"), ("alpha", "a")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let payload = remap_request(Some(&mapping), &json!({"alpha": 2, "zeta": 1}));
        let keys: Vec<&str> = payload.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn test_remap_shared_target_last_declared_wins() {
        let mapping: RequestMapping = [("zeta", "out"), ("alpha", "out")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let payload = remap_request(Some(&mapping), &json!({"alpha": "a", "zeta": "z"}));
        assert_eq!(payload, json!({"out": "a"}));
    }

    #[test]
    fn test_no_mapping_passes_through() {
        let data = json!({"a": 1, "nested": {"b": [1, 2]}});
        assert_eq!(remap_request(None, &data), data);
    }

    #[test]
    fn test_record_table() {
        let table = ResultTable::from_value(Some(&json!([{"n": 1}, {"n": 2}]))).unwrap();
        assert_eq!(table.columns, ["n"]);
        assert_eq!(table.rows, [["1"], ["2"]]);
    }

    #[test]
    fn test_columns_come_from_first_record() {
        let value = json!([{"a": 1, "b": "x"}, {"a": 2, "c": true}]);
        let table = ResultTable::from_value(Some(&value)).unwrap();
        assert_eq!(table.columns, ["a", "b"]);
        assert_eq!(table.rows[1], ["2", ""]);
    }

    #[test]
    fn test_scalar_table() {
        let table = ResultTable::from_value(Some(&json!([1, "two", null]))).unwrap();
        assert_eq!(table.columns, [SCALAR_COLUMN]);
        assert_eq!(table.rows, [["1"], ["two"], [""]]);
    }

    #[test]
    fn test_empty_or_non_list_renders_nothing() {
        assert!(ResultTable::from_value(Some(&json!([]))).is_none());
        assert!(ResultTable::from_value(Some(&json!({"n": 1}))).is_none());
        assert!(ResultTable::from_value(None).is_none());
    }

    #[test]
    fn test_success_view_message_default_key() {
        let d = descriptor(json!({"endpoint": "/x"}));
        let view = SuccessView::from_response(&d, &json!({"message": "ok"}));
        assert_eq!(view, SuccessView::Message { text: "ok".into() });
    }

    #[test]
    fn test_success_view_mapped_message_key() {
        let d = descriptor(json!({"endpoint": "/x", "responseMapping": {"message": "status"}}));
        let view = SuccessView::from_response(&d, &json!({"status": "queued", "message": "no"}));
        assert_eq!(view, SuccessView::Message { text: "queued".into() });
    }

    #[test]
    fn test_success_view_results() {
        let d = descriptor(json!({"endpoint": "/x", "responseMapping": {"results": "result"}}));
        let view = SuccessView::from_response(&d, &json!({"result": [1, 2, 3]}));
        match view {
            SuccessView::Results { table: Some(table) } => assert_eq!(table.rows.len(), 3),
            other => panic!("unexpected view: {:?}", other),
        }
    }
}
