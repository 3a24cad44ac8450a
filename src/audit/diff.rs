//! Field diffs for audit entries

use serde_json::{Map, Value};

/// Top-level field changes, comma separated; `None` when nothing changed
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    join(collect(before, after, "", false))
}

/// Like [`generate_diff`] but descends into nested objects, so a budget
/// amount change reads `amount.amount: 100000 -> 120000` instead of
/// `amount: {2 fields} -> {2 fields}`
pub fn generate_detailed_diff(before: &Value, after: &Value) -> Option<String> {
    join(collect(before, after, "", true))
}

fn join(changes: Vec<String>) -> Option<String> {
    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn field_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn collect(before: &Value, after: &Value, prefix: &str, nested: bool) -> Vec<String> {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => collect_fields(b, a, prefix, nested),
        _ if before == after => Vec::new(),
        _ if prefix.is_empty() => vec![format!("{} -> {}", format_value(before), format_value(after))],
        _ => vec![format!(
            "{}: {} -> {}",
            prefix,
            format_value(before),
            format_value(after)
        )],
    }
}

fn collect_fields(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    prefix: &str,
    nested: bool,
) -> Vec<String> {
    let mut changes = Vec::new();

    for (key, old) in before {
        let path = field_path(prefix, key);
        match after.get(key) {
            Some(new) if old == new => {}
            Some(new) if nested && old.is_object() && new.is_object() => {
                changes.extend(collect(old, new, &path, nested));
            }
            Some(new) => changes.push(format!(
                "{}: {} -> {}",
                path,
                format_value(old),
                format_value(new)
            )),
            None => changes.push(format!("{}: {} -> (removed)", path, format_value(old))),
        }
    }

    for (key, new) in after {
        if !before.contains_key(key) {
            changes.push(format!(
                "{}: (added) -> {}",
                field_path(prefix, key),
                format_value(new)
            ));
        }
    }

    changes
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > 50 => {
            let head: String = s.chars().take(47).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
