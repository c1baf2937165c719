//! Lua pretty-printer (spec §6): `lua/<PageName>.lua` is a
//! `return { version=…, key=…, configList=<table> }` literal. Grounded in
//! spec §6's exact escaping/rounding/quoting rules — no Python source for
//! this survived in `original_source/` (the wiki-export scripts are the
//! "external collaborator" half the spec calls out of scope), so this is a
//! from-spec implementation rather than a port.

use serde_json::Value;

use crate::helpers::{is_near_exact, round_to};

const FLOAT_DIGITS: u32 = 3;

/// A bare Lua identifier: `[A-Za-z_][A-Za-z0-9_]*`.
fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Escapes `\`, `\n`, `\r`, `"` for a double-quoted Lua string literal.
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn write_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        format!("[{}]", escape_string(key))
    }
}

fn write_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    let value = n.as_f64().unwrap_or(0.0);
    if is_near_exact(value, FLOAT_DIGITS) {
        let rounded = round_to(value, FLOAT_DIGITS);
        if rounded.fract() == 0.0 {
            format!("{rounded:.1}")
        } else {
            let mut s = format!("{rounded:.3}");
            while s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.push('0');
            }
            s
        }
    } else {
        format!("{value}")
    }
}

fn write_value(value: &Value, indent: usize) -> String {
    match value {
        Value::Null => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => write_number(n),
        Value::String(s) => escape_string(s),
        Value::Array(items) => write_table(items.iter().map(|v| (None, v)), indent),
        Value::Object(map) => write_table(map.iter().map(|(k, v)| (Some(k.as_str()), v)), indent),
    }
}

fn write_table<'a>(entries: impl Iterator<Item = (Option<&'a str>, &'a Value)>, indent: usize) -> String {
    let pad = "  ".repeat(indent + 1);
    let close_pad = "  ".repeat(indent);
    let mut lines = Vec::new();
    for (key, value) in entries {
        let rendered = write_value(value, indent + 1);
        match key {
            Some(key) => lines.push(format!("{pad}{} = {rendered},", write_key(key))),
            None => lines.push(format!("{pad}{rendered},")),
        }
    }
    if lines.is_empty() {
        "{}".to_string()
    } else {
        format!("{{\n{}\n{close_pad}}}", lines.join("\n"))
    }
}

/// Renders `return { version = …, key = …, configList = <table> }`.
pub fn render(version: &str, key: &str, config_list: &Value) -> String {
    let body = write_table(
        [(Some("version"), &Value::String(version.to_string())), (Some("key"), &Value::String(key.to_string()))]
            .into_iter()
            .chain(std::iter::once((Some("configList"), config_list))),
        0,
    );
    format!("return {body}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_identifier_keys_are_unquoted() {
        assert_eq!(write_key("itemId"), "itemId");
        assert_eq!(write_key("2nd"), "[\"2nd\"]");
    }

    #[test]
    fn strings_escape_backslash_newline_and_quote() {
        assert_eq!(escape_string("a\\b\n\"c\""), "\"a\\\\b\\n\\\"c\\\"\"");
    }

    #[test]
    fn near_exact_floats_round_to_three_decimals() {
        assert_eq!(write_number(&serde_json::Number::from_f64(1.0 / 3.0).unwrap()), "0.333");
        assert_eq!(write_number(&serde_json::Number::from_f64(2.0).unwrap()), "2.0");
    }

    #[test]
    fn render_wraps_config_list_in_a_return_statement() {
        let out = render("1.0", "Items", &json!([{"id": 1}]));
        assert!(out.starts_with("return {"));
        assert!(out.contains("configList = {"));
    }
}
