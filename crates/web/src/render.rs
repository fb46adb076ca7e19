//! Server-side HTML for the console

use serde_json::Value;
use testtool_common::fields::{FieldKind, FieldSpec};
use testtool_common::form::{FormView, Tone, SUBMIT_ACTION};
use testtool_common::mapping::{display_value, ResultTable};
use testtool_common::shell::{ShellView, SidebarItem, WELCOME_TEXT, WELCOME_TITLE};

/// Escape text for HTML bodies and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full console page: sidebar plus the active form or the welcome panel.
/// `alert` is an extra banner above the content, e.g. for unknown modules.
pub fn page(view: &ShellView, alert: Option<&str>) -> String {
    let title = view
        .form
        .as_ref()
        .map(|form| form.label.as_str())
        .unwrap_or(WELCOME_TITLE);

    let mut main = String::new();
    if let Some(text) = alert {
        main.push_str(&banner(Tone::Danger, text));
    }
    match &view.form {
        Some(form) => main.push_str(&form_panel(form)),
        None => main.push_str(&format!(
            "<h1>{}</h1>\n<p>{}</p>\n",
            escape(WELCOME_TITLE),
            escape(WELCOME_TEXT)
        )),
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - testtool</title>
    <link rel="stylesheet" href="/static/console.css">
</head>
<body>
<nav class="sidebar">
<div class="brand">testtool</div>
<ul>
{sidebar}</ul>
</nav>
<main>
{main}</main>
</body>
</html>
"#,
        title = escape(title),
        sidebar = sidebar(&view.sidebar),
        main = main,
    )
}

fn sidebar(items: &[SidebarItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "<li><a href=\"/modules/{id}\"{class}>{label}</a></li>\n",
                id = escape(&item.id),
                class = if item.active { " class=\"active\"" } else { "" },
                label = escape(&item.label),
            )
        })
        .collect()
}

fn banner(tone: Tone, text: &str) -> String {
    let class = match tone {
        Tone::Success => "success",
        Tone::Warning => "warning",
        Tone::Danger => "danger",
    };
    format!("<div class=\"alert alert-{}\">{}</div>\n", class, escape(text))
}

fn form_panel(form: &FormView) -> String {
    let id = escape(&form.id);
    let mut html = format!("<h1>{}</h1>\n", escape(&form.label));

    for notice in &form.notices {
        html.push_str(&banner(notice.tone, &notice.text));
    }
    if let Some(text) = &form.success {
        html.push_str(&banner(Tone::Success, text));
    }
    if let Some(text) = &form.error {
        html.push_str(&banner(Tone::Danger, text));
    }

    html.push_str(&format!(
        "<form method=\"post\" action=\"/modules/{}/submit\">\n",
        id
    ));
    for field in &form.fields {
        html.push_str(&field_row(form, field));
    }

    // errors that point at no rendered field
    let orphans: Vec<String> = form
        .field_errors
        .iter()
        .filter(|e| {
            let top = e.field.split('/').next().unwrap_or_default();
            !form.fields.iter().any(|f| f.name == top)
        })
        .map(|e| format!("<li>{}: {}</li>", escape(&e.field), escape(&e.message)))
        .collect();
    if !orphans.is_empty() {
        html.push_str(&format!("<ul class=\"errors\">{}</ul>\n", orphans.join("")));
    }

    html.push_str("<div class=\"actions\">\n");
    for action in &form.actions {
        if action.name == SUBMIT_ACTION {
            html.push_str(&format!(
                "<button type=\"submit\" class=\"primary\">{}</button>\n",
                escape(&action.label)
            ));
        } else {
            html.push_str(&format!(
                "<button type=\"submit\" formaction=\"/modules/{}/actions/{}\">{}</button>\n",
                id,
                escape(&action.name),
                escape(&action.label)
            ));
        }
    }
    html.push_str("</div>\n</form>\n");

    if let Some(table) = &form.table {
        html.push_str(&result_table(table));
    }
    html
}

fn field_row(form: &FormView, field: &FieldSpec) -> String {
    let name = escape(&field.name);
    let current = form.values.get(&field.name);
    let text = current
        .map(display_value)
        .unwrap_or_else(|| field.default_text());
    let required = if field.required { " required" } else { "" };

    let input = match &field.kind {
        FieldKind::Boolean => {
            let checked = current
                .or(field.default.as_ref())
                .and_then(Value::as_bool)
                .unwrap_or(false);
            // unchecked boxes are not posted; the hidden input sends false
            format!(
                "<input type=\"hidden\" name=\"{name}\" value=\"false\">\
                 <input type=\"checkbox\" id=\"f-{name}\" name=\"{name}\" value=\"true\"{checked}>",
                name = name,
                checked = if checked { " checked" } else { "" },
            )
        }
        FieldKind::Choice { options } => {
            let mut select = format!("<select id=\"f-{name}\" name=\"{name}\"{required}>", name = name, required = required);
            if !field.required {
                select.push_str("<option value=\"\"></option>");
            }
            for option in options {
                let value = display_value(option);
                select.push_str(&format!(
                    "<option value=\"{v}\"{selected}>{v}</option>",
                    v = escape(&value),
                    selected = if value == text { " selected" } else { "" },
                ));
            }
            select.push_str("</select>");
            select
        }
        FieldKind::Json => format!(
            "<textarea id=\"f-{name}\" name=\"{name}\" rows=\"3\"{required}>{text}</textarea>",
            name = name,
            required = required,
            text = escape(&text),
        ),
        kind => {
            let input_type = match kind {
                FieldKind::Integer | FieldKind::Number => "number",
                _ => "text",
            };
            let step = match kind {
                FieldKind::Number => " step=\"any\"",
                _ => "",
            };
            format!(
                "<input type=\"{ty}\"{step} id=\"f-{name}\" name=\"{name}\" value=\"{text}\"{required}>",
                ty = input_type,
                step = step,
                name = name,
                text = escape(&text),
                required = required,
            )
        }
    };

    let errors: String = form
        .field_errors
        .for_field(&field.name)
        .map(|e| format!("<div class=\"field-error\">{}</div>", escape(&e.message)))
        .collect();
    let description = field
        .description
        .as_deref()
        .map(|d| format!("<small>{}</small>", escape(d)))
        .unwrap_or_default();

    format!(
        "<div class=\"field{invalid}\">\n<label for=\"f-{name}\">{label}{star}</label>\n{input}\n{description}{errors}\n</div>\n",
        invalid = if errors.is_empty() { "" } else { " invalid" },
        name = name,
        label = escape(&field.label),
        star = if field.required { " *" } else { "" },
        input = input,
        description = description,
        errors = errors,
    )
}

fn result_table(table: &ResultTable) -> String {
    let head: String = table
        .columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape(c)))
        .collect();
    let body: String = table
        .rows
        .iter()
        .map(|row| {
            let cells: String = row.iter().map(|c| format!("<td>{}</td>", escape(c))).collect();
            format!("<tr>{}</tr>\n", cells)
        })
        .collect();
    format!(
        "<table class=\"results\">\n<thead><tr>{}</tr></thead>\n<tbody>\n{}</tbody>\n</table>\n",
        head, body
    )
}
