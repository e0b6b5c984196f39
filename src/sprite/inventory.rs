//! Deciding whether a sandbox appears in `sprite list` output.

use regex::Regex;
use serde_json::Value;

/// Whether `name` appears in a `sprite list` listing.
///
/// JSON listings (an array of names, an array of objects with a `name`
/// field, or either wrapped as `{"sprites": [...]}`) are compared field by
/// field. Anything else is treated as text and searched for `name` as a whole
/// word, where hyphens count as part of the word so `my-app` does not match
/// inside `my-app-2`.
pub fn listing_contains(listing: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    if let Some(names) = structured_names(listing) {
        return names.iter().any(|n| n == name);
    }

    match whole_word(name) {
        Ok(re) => re.is_match(listing),
        Err(e) => {
            tracing::warn!("Could not build inventory pattern for {:?}: {}", name, e);
            false
        }
    }
}

fn whole_word(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?m)(?:^|[^A-Za-z0-9_-]){}(?:[^A-Za-z0-9_-]|$)",
        regex::escape(name)
    ))
}

/// Sandbox names from a structured listing, or `None` if the listing is not
/// JSON of a recognised shape.
fn structured_names(listing: &str) -> Option<Vec<String>> {
    let trimmed = listing.trim_start();
    if !trimmed.starts_with('[') && !trimmed.starts_with('{') {
        return None;
    }

    let value: Value = serde_json::from_str(listing).ok()?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map.get("sprites")?.as_array()?,
        _ => return None,
    };

    let mut names = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => names.push(s.clone()),
            Value::Object(obj) => {
                if let Some(Value::String(s)) = obj.get("name") {
                    names.push(s.clone());
                }
            }
            _ => {}
        }
    }
    Some(names)
}
