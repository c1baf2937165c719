//! YAML pretty-printer (spec §6): `yaml/*.yaml` is block-style, with
//! double-quoted strings wherever quoting is required and `\n` escaped.
//! Like `output::lua`, this is a from-spec implementation — no original
//! Python source for the wiki-export side survived retrieval.

use serde_json::Value;

/// Whether a scalar string needs quoting to round-trip as YAML: anything
/// that would otherwise be read back as a different type, or that starts
/// with a character with block/flow significance, or that is empty.
fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if s.parse::<f64>().is_ok() || s == "true" || s == "false" || s == "null" || s == "~" {
        return true;
    }
    let first = s.chars().next().unwrap();
    if "-?:,[]{}#&*!|>'\"%@` ".contains(first) {
        return true;
    }
    s.contains(": ") || s.contains(" #") || s.ends_with(':') || s.contains('\n')
}

fn escape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if needs_quoting(s) => escape_quoted(s),
        Value::String(s) => s.clone(),
        other => scalar(&Value::String(other.to_string())),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn write_block(value: &Value, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]\n");
                return;
            }
            for item in items {
                if is_scalar(item) {
                    out.push_str(&format!("{pad}- {}\n", scalar(item)));
                } else {
                    out.push_str(&format!("{pad}-\n"));
                    write_block(item, indent + 1, out);
                }
            }
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{}\n");
                return;
            }
            for (key, val) in map {
                let key_str = if needs_quoting(key) { escape_quoted(key) } else { key.clone() };
                if is_scalar(val) {
                    out.push_str(&format!("{pad}{key_str}: {}\n", scalar(val)));
                } else {
                    out.push_str(&format!("{pad}{key_str}:\n"));
                    write_block(val, indent + 1, out);
                }
            }
        }
        other => out.push_str(&format!("{pad}{}\n", scalar(other))),
    }
}

/// Renders a JSON value as block-style YAML document text.
pub fn render(value: &Value) -> String {
    let mut out = String::new();
    write_block(value, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_strings_are_unquoted() {
        assert_eq!(scalar(&json!("hello")), "hello");
    }

    #[test]
    fn strings_that_look_like_other_types_get_quoted() {
        assert_eq!(scalar(&json!("42")), "\"42\"");
        assert_eq!(scalar(&json!("true")), "\"true\"");
        assert_eq!(scalar(&json!("")), "\"\"");
    }

    #[test]
    fn newlines_are_escaped_in_quoted_strings() {
        assert_eq!(scalar(&json!("a\nb")), "\"a\\nb\"");
    }

    #[test]
    fn block_mapping_renders_nested_indentation() {
        let out = render(&json!({"a": {"b": 1}}));
        assert_eq!(out, "a:\n  b: 1\n");
    }

    #[test]
    fn block_sequence_of_scalars() {
        let out = render(&json!(["x", "y"]));
        assert_eq!(out, "- x\n- y\n");
    }
}
