use crate::number::format_number;
use crate::string::escape_str;
use serde_json::Value;

/// Recursively render a JSON value with sorted object keys, `,`/`:`
/// separators, and ECMAScript-compatible number/string formatting.
#[must_use]
pub fn dump_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            out.push_str(&format_number(n.as_f64().unwrap_or(f64::NAN)));
        }
        Value::String(s) => out.push_str(&escape_str(s)),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&escape_str(key));
                out.push(':');
                write_value(&map[*key], out);
            }
            out.push('}');
        }
    }
}
