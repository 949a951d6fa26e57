//! `${address.attribute}` references embedded in attribute values.

use std::collections::BTreeSet;

use serde_json::Value;

use super::{Attributes, UNKNOWN};

/// Build a reference value such as `${VPC.id}`.
pub fn reference(address: &str, attribute: &str) -> Value {
    Value::String(format!("${{{}.{}}}", address, attribute))
}

/// Parse a string that is exactly one reference, returning `(address, attribute)`.
pub fn parse_exact(s: &str) -> Option<(String, String)> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains("${") || inner.contains('}') {
        return None;
    }
    split_reference(inner)
}

fn split_reference(inner: &str) -> Option<(String, String)> {
    let (address, attribute) = inner.split_once('.')?;
    if address.is_empty() || attribute.is_empty() {
        return None;
    }
    Some((address.to_string(), attribute.to_string()))
}

/// Collect every referenced address in a value.
pub fn collect_references(value: &Value, refs: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            for (address, _) in scan(s) {
                refs.insert(address);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, refs);
            }
        }
        Value::Object(entries) => {
            for v in entries.values() {
                collect_references(v, refs);
            }
        }
        _ => {}
    }
}

/// Scan a string for `${...}` segments.
fn scan(s: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    let mut remaining = s;
    while let Some(start) = remaining.find("${") {
        let Some(end) = remaining[start + 2..].find('}') else {
            break;
        };
        if let Some(parsed) = split_reference(&remaining[start + 2..start + 2 + end]) {
            found.push(parsed);
        }
        remaining = &remaining[start + 2 + end + 1..];
    }
    found
}

/// Substitute references in a value using `lookup(address, attribute)`.
///
/// A string that is exactly one reference takes the looked-up value as is.
/// References embedded in longer strings are interpolated; if any of them
/// cannot be resolved the whole string becomes [`UNKNOWN`].
pub fn resolve_value<F>(value: &Value, lookup: &F) -> Value
where
    F: Fn(&str, &str) -> Option<Value>,
{
    match value {
        Value::String(s) => resolve_string(s, lookup),
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_value(v, lookup)).collect()),
        Value::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, lookup)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_string<F>(s: &str, lookup: &F) -> Value
where
    F: Fn(&str, &str) -> Option<Value>,
{
    if let Some((address, attribute)) = parse_exact(s) {
        return lookup(&address, &attribute).unwrap_or_else(|| Value::String(UNKNOWN.to_string()));
    }
    if !s.contains("${") {
        return Value::String(s.to_string());
    }

    let mut out = String::with_capacity(s.len());
    let mut remaining = s;
    while let Some(start) = remaining.find("${") {
        let Some(end) = remaining[start + 2..].find('}') else {
            break;
        };
        let inner = &remaining[start + 2..start + 2 + end];
        out.push_str(&remaining[..start]);
        match split_reference(inner) {
            Some((address, attribute)) => match lookup(&address, &attribute) {
                Some(Value::String(v)) => out.push_str(&v),
                Some(Value::Null) | None => return Value::String(UNKNOWN.to_string()),
                Some(other) => out.push_str(&other.to_string()),
            },
            None => {
                out.push_str("${");
                out.push_str(inner);
                out.push('}');
            }
        }
        remaining = &remaining[start + 2 + end + 1..];
    }
    out.push_str(remaining);
    Value::String(out)
}

/// Resolve every attribute of a map.
pub fn resolve_attributes<F>(attributes: &Attributes, lookup: &F) -> Attributes
where
    F: Fn(&str, &str) -> Option<Value>,
{
    attributes
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, lookup)))
        .collect()
}

/// Whether a value still contains an unresolved placeholder.
pub fn is_unknown(value: &Value) -> bool {
    match value {
        Value::String(s) => s == UNKNOWN,
        Value::Array(items) => items.iter().any(is_unknown),
        Value::Object(entries) => entries.values().any(is_unknown),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup(address: &str, attribute: &str) -> Option<Value> {
        match (address, attribute) {
            ("VPC", "id") => Some(json!("vpc-123")),
            ("assetBucket", "id") => Some(json!("bucket-a")),
            _ => None,
        }
    }

    #[test]
    fn exact_reference_takes_value() {
        assert_eq!(resolve_value(&json!("${VPC.id}"), &lookup), json!("vpc-123"));
    }

    #[test]
    fn unresolved_reference_is_unknown() {
        let resolved = resolve_value(&json!(["${IGW.id}", "x"]), &lookup);
        assert!(is_unknown(&resolved));
    }

    #[test]
    fn embedded_reference_is_interpolated() {
        let resolved = resolve_value(&json!("aws s3 cp s3://${assetBucket.id}/sample ."), &lookup);
        assert_eq!(resolved, json!("aws s3 cp s3://bucket-a/sample ."));
    }

    #[test]
    fn collects_addresses_from_nested_values() {
        let mut refs = BTreeSet::new();
        collect_references(
            &json!({"ids": ["${A.id}", "${B.id}"], "text": "x ${C.name} y"}),
            &mut refs,
        );
        let refs: Vec<_> = refs.into_iter().collect();
        assert_eq!(refs, vec!["A", "B", "C"]);
    }

    #[test]
    fn parse_exact_rejects_embedded() {
        assert!(parse_exact("prefix ${VPC.id}").is_none());
        assert_eq!(
            parse_exact("${VPC.id}"),
            Some(("VPC".to_string(), "id".to_string()))
        );
    }
}
